// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{Artifact, StageKind, TaskDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded,
    Failed,
}

/// Terminal outcome of one dispatched descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub task_id: String,
    pub stage: StageKind,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<Artifact>>,
}

impl StageResult {
    pub fn failed(
        descriptor: &TaskDescriptor,
        output_dir: PathBuf,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            task_id: descriptor.id().to_string(),
            stage: descriptor.stage(),
            status: TaskStatus::Failed,
            failure: Some(reason.into()),
            output_dir,
            collections: BTreeMap::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }

    pub fn collection(&self, name: &str) -> &[Artifact] {
        self.collections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.collections.values().flatten()
    }
}

/// Keys one collection lacked relative to the others during pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingGap {
    pub collection: String,
    pub missing_keys: usize,
    pub sample: Vec<String>,
    #[serde(default)]
    pub duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Disabled,
    Skipped { reason: String },
}

/// Everything a stage produced, shared read-only with downstream stages and
/// the barrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    pub stage: StageKind,
    pub status: StageStatus,
    pub descriptors: Vec<TaskDescriptor>,
    pub results: Vec<StageResult>,
    #[serde(default)]
    pub gaps: Vec<PairingGap>,
}

impl StageOutput {
    pub fn completed(
        stage: StageKind,
        descriptors: Vec<TaskDescriptor>,
        results: Vec<StageResult>,
        gaps: Vec<PairingGap>,
    ) -> Self {
        Self {
            stage,
            status: StageStatus::Completed,
            descriptors,
            results,
            gaps,
        }
    }

    pub fn disabled(stage: StageKind) -> Self {
        Self {
            stage,
            status: StageStatus::Disabled,
            descriptors: Vec::new(),
            results: Vec::new(),
            gaps: Vec::new(),
        }
    }

    pub fn skipped(stage: StageKind, reason: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped {
                reason: reason.into(),
            },
            descriptors: Vec::new(),
            results: Vec::new(),
            gaps: Vec::new(),
        }
    }

    /// Succeeded results belonging to `stage`.
    ///
    /// The design stage output also carries pocket-detection results in
    /// detect-then-generate mode, so callers filter by the stage they pair on.
    pub fn succeeded(&self, stage: StageKind) -> impl Iterator<Item = &StageResult> {
        self.results
            .iter()
            .filter(move |r| r.stage == stage && r.is_success())
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }
}

/// What the barrier's aggregation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consolidation {
    pub summary_path: PathBuf,
    pub rows: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<TaskDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<StageResult>,
}
