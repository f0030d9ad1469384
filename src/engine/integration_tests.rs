// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::backends::stub::{StubTool, StubToolFactory};
use crate::config::{Pipeline, RunConfig, RuntimeBuilder};
use crate::model::{OutputSubdir, StageKind};

fn config(root: &Path, body: &str) -> RunConfig {
    let yaml = format!("output_dir: {}\n{}", root.display(), body);
    serde_yaml::from_str(&yaml).unwrap()
}

fn pipeline(cfg: &RunConfig, tools: &StubToolFactory) -> Pipeline {
    RuntimeBuilder::from_config(cfg, CancellationToken::new(), tools).unwrap()
}

fn design_tool() -> StubTool {
    StubTool::new("boltzgen")
        .writes(OutputSubdir::Primary, "{task_id}_model_0.cif")
        .writes(OutputSubdir::Confidence, "{task_id}_confidence.json")
}

const SWEEP: &str = r#"
input:
  target: { id: egfr, path: inputs/egfr.cif }
  sweep: { min: 60, max: 120, step: 20, variants_per_value: 3 }
design:
  tool: { command: boltzgen }
"#;

/// End-to-end runs over stub tools
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RunReport;
    use crate::errors::ExecutionError;
    use crate::model::{collections, StageStatus, TaskStatus};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sweep_with_partial_confidence_pairs_ten_designs() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(
            tmp.path(),
            &format!(
                "{}stages:\n  interface_scoring:\n    enabled: true\n    tool: {{ command: ipsae }}\n  consolidation:\n    enabled: true\n",
                SWEEP
            ),
        );
        let tools = StubToolFactory::new()
            .with(
                StageKind::Design,
                design_tool()
                    .omitting("egfr_v80_1", OutputSubdir::Confidence)
                    .omitting("egfr_v120_2", OutputSubdir::Confidence),
            )
            .with(
                StageKind::InterfaceScoring,
                StubTool::new("ipsae").writes(OutputSubdir::Primary, "{param.key}_scores.csv"),
            );

        let outcome = pipeline(&cfg, &tools).run().await.unwrap();

        let design = &outcome.outputs[&StageKind::Design];
        assert_eq!(design.descriptors.len(), 13);
        assert_eq!(design.results.len(), 12);
        assert_eq!(design.failed_count(), 0);

        let scoring = &outcome.outputs[&StageKind::InterfaceScoring];
        assert_eq!(scoring.status, StageStatus::Completed);
        assert_eq!(scoring.results.len(), 10);
        assert_eq!(scoring.gaps.len(), 1);
        assert_eq!(scoring.gaps[0].missing_keys, 2);
        assert_eq!(tools.tool(StageKind::InterfaceScoring).unwrap().invocations(), 10);

        let task = &scoring.results[0];
        assert_eq!(task.task_id, "interface_scoring_egfr_v100_0");
        assert_eq!(task.collection(collections::SCORES)[0].key, "egfr_v100_0");

        // target, 12 variants, 10 scoring tasks
        assert_eq!(outcome.lineage.len(), 23);
        let ancestors: Vec<&str> = outcome
            .lineage
            .ancestors("interface_scoring_egfr_v60_0")
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ancestors, vec!["egfr_v60_0", "egfr"]);

        assert_eq!(outcome.consolidation.rows, 12);
        let table = std::fs::read_to_string(&outcome.consolidation.summary_path).unwrap();
        assert_eq!(table.lines().count(), 13);
        assert!(table.lines().any(|l| l.starts_with("egfr_v80_1\t") && l.ends_with("\t-\t-\t-")));
    }

    #[tokio::test]
    async fn test_disabled_stage_is_not_awaited() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(
            tmp.path(),
            &format!(
                "{}stages:\n  interface_scoring:\n    enabled: false\n    tool: {{ command: ipsae }}\n",
                SWEEP
            ),
        );
        let tools = StubToolFactory::new().with(StageKind::Design, design_tool());
        let pipeline = pipeline(&cfg, &tools);
        assert_eq!(pipeline.stages(), vec![StageKind::Design]);

        let outcome = pipeline.run().await.unwrap();
        assert_eq!(
            outcome.outputs[&StageKind::InterfaceScoring].status,
            StageStatus::Disabled
        );
        assert_eq!(outcome.consolidation.rows, 12);

        let table = std::fs::read_to_string(&outcome.consolidation.summary_path).unwrap();
        let header = table.lines().next().unwrap();
        assert_eq!(header, "design_key\tdesign_task\tdesign_artifacts");
    }

    #[tokio::test]
    async fn test_rerun_resumes_completed_tasks() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(
            tmp.path(),
            &format!(
                "{}stages:\n  affinity_prediction:\n    enabled: true\n    tool: {{ command: prodigy }}\n",
                SWEEP
            ),
        );
        let tools = StubToolFactory::new()
            .with(StageKind::Design, design_tool())
            .with(
                StageKind::AffinityPrediction,
                StubTool::new("prodigy")
                    .writes(OutputSubdir::Primary, "{param.key}_prodigy_summary.txt")
                    .failing_for("affinity_prediction_egfr_v60_0"),
            );

        let first = pipeline(&cfg, &tools).run().await.unwrap();
        let design_tool = tools.tool(StageKind::Design).unwrap();
        let affinity_tool = tools.tool(StageKind::AffinityPrediction).unwrap();
        assert_eq!(design_tool.invocations(), 12);
        assert_eq!(affinity_tool.invocations(), 12);

        let second = pipeline(&cfg, &tools).run().await.unwrap();
        assert_eq!(design_tool.invocations(), 12);
        // only the failed task runs again
        assert_eq!(affinity_tool.invocations(), 13);
        assert_eq!(
            first.outputs[&StageKind::Design].results,
            second.outputs[&StageKind::Design].results
        );
    }

    #[tokio::test]
    async fn test_resume_off_reruns_everything() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = config(tmp.path(), SWEEP);
        let tools = StubToolFactory::new().with(StageKind::Design, design_tool());

        pipeline(&cfg, &tools).run().await.unwrap();
        cfg.resume = false;
        pipeline(&cfg, &tools).run().await.unwrap();

        assert_eq!(tools.tool(StageKind::Design).unwrap().invocations(), 24);
    }

    #[tokio::test]
    async fn test_missing_resource_skips_stage_but_barrier_fires() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("afdb");
        let cfg = config(
            tmp.path(),
            &format!(
                "{}stages:\n  structural_search:\n    enabled: true\n    tool: {{ command: foldseek }}\n    required_resources: [{}]\n",
                SWEEP,
                missing.display()
            ),
        );
        let tools = StubToolFactory::new()
            .with(StageKind::Design, design_tool())
            .with(StageKind::StructuralSearch, StubTool::new("foldseek"));

        let outcome = pipeline(&cfg, &tools).run().await.unwrap();
        assert!(matches!(
            outcome.outputs[&StageKind::StructuralSearch].status,
            StageStatus::Skipped { .. }
        ));
        assert_eq!(tools.tool(StageKind::StructuralSearch).unwrap().invocations(), 0);
        assert_eq!(outcome.consolidation.rows, 12);
    }

    #[tokio::test]
    async fn test_refolding_chains_after_sequence_optimization() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(
            tmp.path(),
            r#"
input:
  tasks:
    - id: pdl1_a
      params: { length: 80 }
    - id: pdl1_b
      params: { length: 90 }
design:
  tool: { command: boltzgen }
stages:
  sequence_optimization:
    enabled: true
    tool: { command: proteinmpnn }
  refolding:
    enabled: true
    tool: { command: af3 }
"#,
        );
        let tools = StubToolFactory::new()
            .with(StageKind::Design, design_tool().failing_for("pdl1_b"))
            .with(
                StageKind::SequenceOptimization,
                StubTool::new("proteinmpnn").writes(OutputSubdir::Primary, "{param.key}.fa"),
            )
            .with(
                StageKind::Refolding,
                StubTool::new("af3").writes(OutputSubdir::Primary, "{param.key}_model_0.cif"),
            );

        let outcome = pipeline(&cfg, &tools).run().await.unwrap();
        let refolding = &outcome.outputs[&StageKind::Refolding];
        assert_eq!(refolding.results.len(), 1);
        assert_eq!(refolding.results[0].task_id, "refolding_pdl1_a");

        let descriptor = &refolding.descriptors[0];
        assert!(descriptor.input(collections::STRUCTURES).is_some());
        assert!(descriptor.input(collections::SEQUENCES).is_some());

        let report = RunReport::new(crate::engine::Mode::PreSpecified, &outcome);
        assert_eq!(report.failed_tasks(), 1);
        assert!(report
            .tasks
            .iter()
            .any(|t| t.task_id == "pdl1_b" && t.status == TaskStatus::Failed));

        let path = tmp.path().join("run_report.json");
        report.write(&path).await.unwrap();
        let reloaded: RunReport =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(reloaded, report);
    }

    #[tokio::test]
    async fn test_detected_pockets_each_get_a_sweep() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(
            tmp.path(),
            r#"
input:
  target: { id: kras, path: inputs/kras.pdb }
  pocket_detection:
    tool: { command: fpocket }
  sweep: { min: 50, max: 70, step: 20 }
design:
  tool: { command: boltzgen }
stages:
  consolidation:
    enabled: true
    tool: { command: summarize }
"#,
        );
        let tools = StubToolFactory::new()
            .with(
                StageKind::PocketDetection,
                StubTool::new("fpocket")
                    .writes(OutputSubdir::Primary, "pocket1_output.pdb")
                    .writes(OutputSubdir::Primary, "pocket2_output.pdb"),
            )
            .with(StageKind::Design, design_tool())
            .with(
                StageKind::Consolidation,
                StubTool::new("summarize").writes(OutputSubdir::Primary, "report.html"),
            );

        let outcome = pipeline(&cfg, &tools).run().await.unwrap();
        let design = &outcome.outputs[&StageKind::Design];

        // detection + 2 pockets x 2 lengths
        assert_eq!(design.results.len(), 5);
        assert_eq!(design.succeeded(StageKind::Design).count(), 4);
        assert_eq!(
            outcome.lineage.get("kras_pocket2_v70_0").unwrap().parent_id.as_deref(),
            Some("kras_pocket2")
        );

        let consolidation = outcome.consolidation.tool_result.as_ref().unwrap();
        assert!(consolidation.is_success());
        assert_eq!(consolidation.task_id, "consolidation");
        assert!(outcome.lineage.get("consolidation").is_some());
        assert_eq!(tools.tool(StageKind::Consolidation).unwrap().invocations(), 1);
    }

    #[tokio::test]
    async fn test_watchdog_expiry_cancels_the_run() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(tmp.path(), &format!("watchdog_seconds: 0\n{}", SWEEP));
        let tools = StubToolFactory::new().with(
            StageKind::Design,
            design_tool().with_delay(Duration::from_secs(30)),
        );

        let started = std::time::Instant::now();
        let err = pipeline(&cfg, &tools).run().await.unwrap_err();
        match err {
            ExecutionError::BarrierTimeout { missing, .. } => {
                assert_eq!(missing, vec![StageKind::Design]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
