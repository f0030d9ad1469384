// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

use crate::model::StageKind;

/// Fatal problems found before any task is dispatched.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The input section matches none of the known entry shapes
    #[error("input section matches no entry mode (found: {found})")]
    NoModeMatched { found: String },

    /// The input section matches more than one entry shape
    #[error("input section matches several entry modes: {candidates:?}")]
    AmbiguousMode { candidates: Vec<String> },

    /// An explicit mode disagrees with the detected input shape
    #[error("mode '{requested}' was requested but the input section has the shape of '{detected}'")]
    ModeOverrideConflict { requested: String, detected: String },

    #[error("invalid sweep over '{parameter}': {reason}")]
    InvalidSweep { parameter: String, reason: String },

    #[error("stage '{stage}' is enabled but its prerequisite '{prerequisite}' is not")]
    MissingPrerequisite {
        stage: StageKind,
        prerequisite: StageKind,
    },

    /// Only optional stages may appear under `stages`
    #[error("stage '{stage}' cannot be configured under 'stages'")]
    NotOptionalStage { stage: StageKind },

    #[error("stage '{stage}' is enabled but has no tool configured")]
    MissingTool { stage: StageKind },

    #[error("derived-key pattern '{pattern}' is not a valid regular expression: {source}")]
    InvalidKeyPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// An enabled stage needs a resource class with zero slots
    #[error("stage '{stage}' needs resource class '{class}' which has no slots")]
    NoCapacity { stage: StageKind, class: String },

    /// Ids name output directories and must come back unchanged from key
    /// derivation
    #[error("id '{id}' is not usable: {reason}")]
    InvalidId { id: String, reason: String },

    #[error("task id '{id}' is declared more than once")]
    DuplicateTaskId { id: String },

    #[error("input '{name}' of task '{task}' is invalid: {reason}")]
    InvalidTask {
        task: String,
        name: String,
        reason: String,
    },

    #[error("cannot read run configuration {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("run configuration is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Every problem found by pre-flight validation
    #[error("configuration validation failed:\n{}", render_all(.errors))]
    Rejected { errors: Vec<ConfigurationError> },
}

fn render_all(errors: &[ConfigurationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
