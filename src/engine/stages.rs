// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::consts::{KEY_PARAM, POCKET_INPUT, POCKET_PARAM};
use crate::engine::pairing::pair;
use crate::engine::{TaskTemplate, VariantGenerator};
use crate::errors::{ExecutionError, MissingOptionalResource};
use crate::model::{collections, Params, StageKind, StageOutput, StageResult, TaskDescriptor};
use crate::observability::messages::engine::{StageCompleted, StageSkipped};
use crate::observability::messages::pairing::{NoPocketsDetected, PairingCompleted, PairingGapDetected};
use crate::observability::messages::StructuredLog;
use crate::traits::{Stage, StageContext};

/// Where the primary stage's descriptors come from.
#[derive(Debug, Clone)]
pub enum DesignInput {
    /// Descriptors given verbatim in the run configuration.
    PreSpecified(Vec<TaskDescriptor>),
    /// One target expanded by the sweep.
    Sweep {
        target: TaskDescriptor,
        generator: VariantGenerator,
    },
    /// Pockets detected on the target, each expanded by the sweep.
    PocketSweep {
        target: TaskDescriptor,
        generator: VariantGenerator,
        detector: TaskTemplate,
    },
}

/// The primary design stage. Always enabled, always level zero.
pub struct DesignStage {
    input: DesignInput,
    template: TaskTemplate,
}

impl DesignStage {
    pub fn new(input: DesignInput, template: TaskTemplate) -> Self {
        Self { input, template }
    }

    /// Dispatch pocket detection on the target and turn every detected pocket
    /// into an intermediate base descriptor.
    async fn detect_pockets(
        &self,
        ctx: &StageContext,
        target: &TaskDescriptor,
        detector: &TaskTemplate,
    ) -> (Vec<TaskDescriptor>, Vec<StageResult>) {
        let results = ctx
            .dispatcher
            .dispatch(detector, std::slice::from_ref(target))
            .await;

        let detected: Vec<_> = results
            .iter()
            .filter(|r| r.is_success())
            .flat_map(|r| r.collection(collections::POCKETS))
            .collect();
        let pairing = pair(&[(
            format!("{}.{}", StageKind::PocketDetection, collections::POCKETS),
            detected,
        )]);

        let pockets: Vec<TaskDescriptor> = pairing
            .tuples
            .iter()
            .map(|tuple| {
                let pocket = tuple.artifacts[0];
                TaskDescriptor::new(format!("{}_{}", target.id(), tuple.key), StageKind::Design)
                    .with_parent(target.id())
                    .with_params(target.params().clone())
                    .with_inputs(target.inputs().clone())
                    .with_param(POCKET_PARAM, tuple.key.as_str())
                    .with_input(POCKET_INPUT, pocket.path.clone())
            })
            .collect();

        if pockets.is_empty() {
            NoPocketsDetected { target: target.id() }.log();
        }
        (pockets, results)
    }
}

#[async_trait]
impl Stage for DesignStage {
    fn kind(&self) -> StageKind {
        StageKind::Design
    }

    fn dependencies(&self) -> Vec<StageKind> {
        Vec::new()
    }

    async fn run(&self, ctx: StageContext) -> Result<StageOutput, ExecutionError> {
        let started = Instant::now();
        let mut created = Vec::new();
        let mut results = Vec::new();

        let designs = match &self.input {
            DesignInput::PreSpecified(tasks) => tasks.clone(),
            DesignInput::Sweep { target, generator } => {
                created.push(target.clone());
                generator.generate(target)
            }
            DesignInput::PocketSweep {
                target,
                generator,
                detector,
            } => {
                created.push(target.clone());
                let (pockets, detection) = self.detect_pockets(&ctx, target, detector).await;
                results.extend(detection);

                let mut variants = Vec::new();
                for pocket in &pockets {
                    variants.extend(generator.generate(pocket));
                }
                created.extend(pockets);
                variants
            }
        };

        results.extend(ctx.dispatcher.dispatch(&self.template, &designs).await);
        created.extend(designs);

        let output = StageOutput::completed(StageKind::Design, created, results, Vec::new());
        StageCompleted {
            stage: StageKind::Design,
            tasks: output.results.len(),
            failed: output.failed_count(),
            duration: started.elapsed(),
        }
        .log();
        Ok(output)
    }
}

/// An optional downstream stage fed by pairing upstream collections.
pub struct PairedStage {
    kind: StageKind,
    template: TaskTemplate,
    params: Params,
    required_resources: Vec<PathBuf>,
}

impl PairedStage {
    pub fn new(
        kind: StageKind,
        template: TaskTemplate,
        params: Params,
        required_resources: Vec<PathBuf>,
    ) -> Self {
        Self {
            kind,
            template,
            params,
            required_resources,
        }
    }

    async fn missing_resource(&self) -> Option<MissingOptionalResource> {
        for path in &self.required_resources {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Some(MissingOptionalResource {
                    stage: self.kind,
                    path: path.clone(),
                });
            }
        }
        None
    }
}

#[async_trait]
impl Stage for PairedStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, ctx: StageContext) -> Result<StageOutput, ExecutionError> {
        let started = Instant::now();

        if let Some(missing) = self.missing_resource().await {
            let reason = missing.to_string();
            StageSkipped {
                stage: self.kind,
                reason: &reason,
            }
            .log();
            return Ok(StageOutput::skipped(self.kind, reason));
        }

        let mut inputs = Vec::with_capacity(self.kind.inputs().len());
        for input in self.kind.inputs() {
            let upstream = ctx.upstream(input.stage)?;
            let artifacts: Vec<_> = upstream
                .succeeded(input.stage)
                .flat_map(|r| r.collection(input.collection))
                .collect();
            inputs.push((format!("{}.{}", input.stage, input.collection), artifacts));
        }

        let pairing = pair(&inputs);
        for gap in &pairing.gaps {
            PairingGapDetected {
                stage: self.kind,
                gap,
            }
            .log();
        }
        PairingCompleted {
            stage: self.kind,
            collections: inputs.len(),
            tuples: pairing.tuples.len(),
        }
        .log();

        let descriptors: Vec<TaskDescriptor> = pairing
            .tuples
            .iter()
            .map(|tuple| {
                let mut descriptor =
                    TaskDescriptor::new(format!("{}_{}", self.kind, tuple.key), self.kind)
                        .with_parent(tuple.artifacts[0].producer.as_str())
                        .with_params(self.params.clone())
                        .with_param(KEY_PARAM, tuple.key.as_str());
                for (input, artifact) in self.kind.inputs().iter().zip(&tuple.artifacts) {
                    descriptor = descriptor.with_input(input.collection, artifact.path.clone());
                }
                descriptor
            })
            .collect();

        let results = ctx.dispatcher.dispatch(&self.template, &descriptors).await;
        let output = StageOutput::completed(self.kind, descriptors, results, pairing.gaps);

        StageCompleted {
            stage: self.kind,
            tasks: output.results.len(),
            failed: output.failed_count(),
            duration: started.elapsed(),
        }
        .log();
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubTool;
    use crate::engine::{CompletionStore, ResourcePool, SweepSpec, TaskDispatcher};
    use crate::model::{CollectionSpec, KeyDeriver, OutputSubdir, ParamValue, StageStatus};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    fn dispatcher(root: &std::path::Path) -> Arc<TaskDispatcher> {
        Arc::new(TaskDispatcher::new(
            ResourcePool::new(4, 1),
            CompletionStore::new(true),
            Arc::new(KeyDeriver::default()),
            root,
            CancellationToken::new(),
        ))
    }

    fn ctx(dispatcher: Arc<TaskDispatcher>) -> StageContext {
        StageContext {
            upstream: BTreeMap::new(),
            dispatcher,
        }
    }

    fn design_template() -> TaskTemplate {
        TaskTemplate {
            stage: StageKind::Design,
            tool: Arc::new(StubTool::new("design").writes(OutputSubdir::Primary, "{task_id}_model_0.cif")),
            outputs: vec![CollectionSpec::new(
                collections::STRUCTURES,
                OutputSubdir::Primary,
                &["*.cif"],
                true,
            )],
        }
    }

    fn sweep() -> VariantGenerator {
        VariantGenerator::new(SweepSpec {
            parameter: "length".to_string(),
            min: 60,
            max: 80,
            step: 20,
            variants_per_value: 2,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn sweep_records_target_before_variants() {
        let tmp = TempDir::new().unwrap();
        let target = TaskDescriptor::new("egfr", StageKind::Design).with_input("target", "egfr.cif");
        let stage = DesignStage::new(
            DesignInput::Sweep {
                target,
                generator: sweep(),
            },
            design_template(),
        );

        let output = stage.run(ctx(dispatcher(tmp.path()))).await.unwrap();
        assert_eq!(output.descriptors.len(), 5);
        assert_eq!(output.descriptors[0].id(), "egfr");
        assert_eq!(output.results.len(), 4);
        assert!(output.results.iter().all(|r| r.is_success()));
    }

    #[tokio::test]
    async fn detected_pockets_become_intermediate_bases() {
        let tmp = TempDir::new().unwrap();
        let target = TaskDescriptor::new("egfr", StageKind::PocketDetection).with_input("target", "egfr.cif");
        let detector = TaskTemplate {
            stage: StageKind::PocketDetection,
            tool: Arc::new(
                StubTool::new("pockets")
                    .writes(OutputSubdir::Primary, "pocket1_output.pdb")
                    .writes(OutputSubdir::Primary, "pocket2_output.pdb"),
            ),
            outputs: vec![CollectionSpec::new(
                collections::POCKETS,
                OutputSubdir::Primary,
                &["*.pdb"],
                false,
            )],
        };
        let stage = DesignStage::new(
            DesignInput::PocketSweep {
                target,
                generator: sweep(),
                detector,
            },
            design_template(),
        );

        let output = stage.run(ctx(dispatcher(tmp.path()))).await.unwrap();
        let ids: Vec<&str> = output.descriptors.iter().map(|d| d.id()).take(3).collect();
        assert_eq!(ids, vec!["egfr", "egfr_pocket1", "egfr_pocket2"]);

        let pocket = &output.descriptors[1];
        assert_eq!(pocket.parent_id(), Some("egfr"));
        assert_eq!(pocket.param("pocket"), Some(&ParamValue::from("pocket1")));
        assert!(pocket.input("pocket").is_some());

        // 1 detection task + 2 pockets x 2 values x 2 variants
        assert_eq!(output.results.len(), 9);
        assert_eq!(output.succeeded(StageKind::Design).count(), 8);
        assert_eq!(output.descriptors[3].parent_id(), Some("egfr_pocket1"));
    }

    #[tokio::test]
    async fn zero_pockets_yield_zero_designs() {
        let tmp = TempDir::new().unwrap();
        let target = TaskDescriptor::new("egfr", StageKind::PocketDetection);
        let detector = TaskTemplate {
            stage: StageKind::PocketDetection,
            tool: Arc::new(StubTool::new("pockets")),
            outputs: vec![CollectionSpec::new(
                collections::POCKETS,
                OutputSubdir::Primary,
                &["*.pdb"],
                false,
            )],
        };
        let stage = DesignStage::new(
            DesignInput::PocketSweep {
                target,
                generator: sweep(),
                detector,
            },
            design_template(),
        );

        let output = stage.run(ctx(dispatcher(tmp.path()))).await.unwrap();
        assert_eq!(output.descriptors.len(), 1);
        assert_eq!(output.results.len(), 1);
        assert_eq!(output.succeeded(StageKind::Design).count(), 0);
    }

    #[tokio::test]
    async fn missing_required_resource_skips_stage() {
        let tmp = TempDir::new().unwrap();
        let stage = PairedStage::new(
            StageKind::StructuralSearch,
            TaskTemplate {
                stage: StageKind::StructuralSearch,
                tool: Arc::new(StubTool::new("search")),
                outputs: Vec::new(),
            },
            Params::new(),
            vec![tmp.path().join("no-such-database")],
        );

        let output = stage.run(ctx(dispatcher(tmp.path()))).await.unwrap();
        assert!(matches!(output.status, StageStatus::Skipped { .. }));
        assert!(output.results.is_empty());
    }

    #[tokio::test]
    async fn paired_stage_without_upstream_is_an_internal_error() {
        let tmp = TempDir::new().unwrap();
        let stage = PairedStage::new(
            StageKind::AffinityPrediction,
            TaskTemplate {
                stage: StageKind::AffinityPrediction,
                tool: Arc::new(StubTool::new("affinity")),
                outputs: Vec::new(),
            },
            Params::new(),
            Vec::new(),
        );

        let err = stage.run(ctx(dispatcher(tmp.path()))).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Internal(_)));
    }
}
