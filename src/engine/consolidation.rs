// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Unified per-design summary table built when the barrier fires.
//!
//! One row per derived key of a design-stage structure. Every stage that ran
//! contributes three columns: the task id joined on that key, its status, and
//! the artifact paths it produced. Optionally an external consolidation tool
//! is then run once on the written table.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::consts::{CONSOLIDATED_DIR, CONSOLIDATION_TASK_ID, SUMMARY_FILE, SUMMARY_INPUT};
use crate::engine::{TaskDispatcher, TaskTemplate};
use crate::errors::ExecutionError;
use crate::model::{
    collections, Consolidation, StageKind, StageOutput, StageResult, StageStatus, TaskDescriptor,
    TaskStatus,
};
use crate::observability::messages::pairing::DesignTableWritten;
use crate::observability::messages::StructuredLog;
use crate::traits::Aggregator;

const MISSING: &str = "-";

pub struct DesignTableAggregator {
    dispatcher: Arc<TaskDispatcher>,
    tool: Option<TaskTemplate>,
}

impl DesignTableAggregator {
    pub fn new(dispatcher: Arc<TaskDispatcher>, tool: Option<TaskTemplate>) -> Self {
        Self { dispatcher, tool }
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dispatcher
            .output_root()
            .join(CONSOLIDATED_DIR)
            .join(SUMMARY_FILE)
    }
}

/// Render the table for the given stage outputs. Returns the TSV text and the
/// number of data rows.
pub fn render_design_table(outputs: &[Arc<StageOutput>]) -> (String, usize) {
    let mut designs: BTreeMap<&str, &StageResult> = BTreeMap::new();
    let mut design_paths: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for output in outputs.iter().filter(|o| o.stage == StageKind::Design) {
        for result in output.succeeded(StageKind::Design) {
            for artifact in result.collection(collections::STRUCTURES) {
                designs.entry(artifact.key.as_str()).or_insert(result);
                design_paths
                    .entry(artifact.key.as_str())
                    .or_default()
                    .push(artifact.path.display().to_string());
            }
        }
    }

    let downstream: Vec<(StageKind, BTreeMap<&str, &StageResult>)> = outputs
        .iter()
        .filter(|o| o.stage != StageKind::Design && o.status == StageStatus::Completed)
        .map(|o| {
            let by_id = o.results.iter().map(|r| (r.task_id.as_str(), r)).collect();
            (o.stage, by_id)
        })
        .collect();

    let mut table = String::from("design_key\tdesign_task\tdesign_artifacts");
    for (stage, _) in &downstream {
        let _ = write!(table, "\t{stage}_task\t{stage}_status\t{stage}_artifacts");
    }
    table.push('\n');

    for (key, design) in &designs {
        let paths = design_paths.get(key).map(|p| p.join(",")).unwrap_or_default();
        let _ = write!(table, "{}\t{}\t{}", key, design.task_id, paths);

        for (stage, by_id) in &downstream {
            let task_id = format!("{}_{}", stage, key);
            match by_id.get(task_id.as_str()) {
                Some(result) => {
                    let status = match result.status {
                        TaskStatus::Succeeded => "succeeded",
                        TaskStatus::Failed => "failed",
                    };
                    let artifacts = result
                        .artifacts()
                        .map(|a| a.path.display().to_string())
                        .collect::<Vec<_>>()
                        .join(",");
                    let artifacts = if artifacts.is_empty() {
                        MISSING.to_string()
                    } else {
                        artifacts
                    };
                    let _ = write!(table, "\t{}\t{}\t{}", task_id, status, artifacts);
                }
                None => {
                    let _ = write!(table, "\t{}\t{}\t{}", MISSING, MISSING, MISSING);
                }
            }
        }
        table.push('\n');
    }

    (table, designs.len())
}

#[async_trait]
impl Aggregator for DesignTableAggregator {
    async fn aggregate(&self, outputs: Vec<Arc<StageOutput>>) -> Result<Consolidation, ExecutionError> {
        let (table, rows) = render_design_table(&outputs);
        let summary_path = self.summary_path();

        if let Some(parent) = summary_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ExecutionError::Aggregation(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
        tokio::fs::write(&summary_path, table).await.map_err(|e| {
            ExecutionError::Aggregation(format!("cannot write {}: {}", summary_path.display(), e))
        })?;
        DesignTableWritten {
            path: &summary_path,
            rows,
        }
        .log();

        let mut consolidation = Consolidation {
            summary_path: summary_path.clone(),
            rows,
            descriptor: None,
            tool_result: None,
        };

        if let Some(template) = &self.tool {
            let descriptor = TaskDescriptor::new(CONSOLIDATION_TASK_ID, StageKind::Consolidation)
                .with_input(SUMMARY_INPUT, summary_path);
            let mut results = self
                .dispatcher
                .dispatch(template, std::slice::from_ref(&descriptor))
                .await;
            consolidation.descriptor = Some(descriptor);
            consolidation.tool_result = results.pop();
        }

        Ok(consolidation)
    }
}
