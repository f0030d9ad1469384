// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::engine::{Mode, RunOutcome};
use crate::model::{
    Consolidation, LineageRecord, PairingGap, StageKind, StageStatus, TaskStatus,
};

/// Machine-readable summary of a finished run, written as `run_report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: Mode,
    pub stages: Vec<StageSummary>,
    pub tasks: Vec<TaskReport>,
    pub lineage: Vec<LineageRecord>,
    pub consolidation: Consolidation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: StageKind,
    pub status: StageStatus,
    pub tasks: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub gaps: Vec<PairingGap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub task_id: String,
    pub stage: StageKind,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub output_dir: PathBuf,
    pub artifacts: Vec<PathBuf>,
}

impl RunReport {
    pub fn new(mode: Mode, outcome: &RunOutcome) -> Self {
        let stages = outcome
            .outputs
            .values()
            .map(|output| StageSummary {
                stage: output.stage,
                status: output.status.clone(),
                tasks: output.results.len(),
                succeeded: output.results.len() - output.failed_count(),
                failed: output.failed_count(),
                gaps: output.gaps.clone(),
            })
            .collect();

        let tasks = outcome
            .outputs
            .values()
            .flat_map(|output| output.results.iter())
            .chain(outcome.consolidation.tool_result.iter())
            .map(|result| TaskReport {
                task_id: result.task_id.clone(),
                stage: result.stage,
                status: result.status,
                failure: result.failure.clone(),
                output_dir: result.output_dir.clone(),
                artifacts: result.artifacts().map(|a| a.path.clone()).collect(),
            })
            .collect();

        Self {
            mode,
            stages,
            tasks,
            lineage: outcome.lineage.records().to_vec(),
            consolidation: outcome.consolidation.clone(),
        }
    }

    pub fn failed_tasks(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .count()
    }

    pub async fn write(&self, path: &Path) -> io::Result<()> {
        let body = serde_json::to_vec_pretty(self)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, body).await
    }
}
