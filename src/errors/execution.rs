// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use super::ConfigurationError;
use crate::model::StageKind;

/// Why a single task failed. Recorded on its `StageResult`, never propagated
/// to siblings.
#[derive(Debug, Error)]
pub enum TaskExecutionFailure {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tool exited with status {code}")]
    NonZeroExit { code: i32 },

    #[error("tool was terminated by a signal")]
    Terminated,

    #[error("required collection '{collection}' is empty")]
    MissingOutputs { collection: String },

    #[error("argument template error: {0}")]
    Template(String),

    #[error("task was cancelled")]
    Cancelled,

    #[error("cannot prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("consolidation barrier timed out after {waited:?}; missing stages: {missing:?}")]
    BarrierTimeout {
        waited: Duration,
        missing: Vec<StageKind>,
    },

    #[error("run was cancelled")]
    Cancelled,

    #[error("lineage violation: {0}")]
    Lineage(#[from] LineageError),

    #[error("aggregation failed: {0}")]
    Aggregation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineageError {
    #[error("descriptor '{id}' was recorded twice")]
    DuplicateId { id: String },

    #[error("descriptor '{id}' names parent '{parent_id}' which was not recorded earlier")]
    UnknownParent { id: String, parent_id: String },
}

/// An enabled stage's external resource is absent; the stage is skipped.
#[derive(Debug, Clone, Error)]
#[error("stage '{stage}' skipped: required resource {path} does not exist")]
pub struct MissingOptionalResource {
    pub stage: StageKind,
    pub path: PathBuf,
}
