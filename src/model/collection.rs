// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// Subdirectories every task output directory is given before invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSubdir {
    Primary,
    Intermediate,
    Confidence,
}

impl OutputSubdir {
    pub const ALL: [OutputSubdir; 3] = [
        OutputSubdir::Primary,
        OutputSubdir::Intermediate,
        OutputSubdir::Confidence,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputSubdir::Primary => "primary",
            OutputSubdir::Intermediate => "intermediate",
            OutputSubdir::Confidence => "confidence",
        }
    }
}

/// A named artifact collection a tool is expected to leave behind.
///
/// # Example
/// ```yaml
/// name: structures
/// subdir: primary
/// patterns: ["*.cif", "*.pdb"]
/// required: true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub name: String,
    #[serde(default = "default_subdir")]
    pub subdir: OutputSubdir,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

fn default_subdir() -> OutputSubdir {
    OutputSubdir::Primary
}

impl CollectionSpec {
    pub fn new(name: &str, subdir: OutputSubdir, patterns: &[&str], required: bool) -> Self {
        Self {
            name: name.to_string(),
            subdir,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            required,
        }
    }
}
