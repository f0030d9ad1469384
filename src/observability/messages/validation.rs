// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for run configuration validation.
//!
//! This module contains message types for logging events related to:
//! * Successful pre-flight validation
//! * Rejected configurations

use crate::model::StageKind;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Run configuration passed every pre-flight check.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::validation::ConfigurationValidated;
///
/// let enabled = [StageKind::InterfaceScoring, StageKind::Consolidation];
/// let msg = ConfigurationValidated {
///     mode: "pre_specified",
///     enabled_stages: &enabled,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ConfigurationValidated<'a> {
    pub mode: &'a str,
    pub enabled_stages: &'a [StageKind],
}

impl ConfigurationValidated<'_> {
    fn stages(&self) -> String {
        self.enabled_stages
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Display for ConfigurationValidated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.enabled_stages.is_empty() {
            write!(
                f,
                "Configuration valid: {} mode, no optional stages",
                self.mode
            )
        } else {
            write!(
                f,
                "Configuration valid: {} mode, optional stages [{}]",
                self.mode,
                self.stages()
            )
        }
    }
}

impl StructuredLog for ConfigurationValidated<'_> {
    fn log(&self) {
        tracing::info!(
            mode = self.mode,
            enabled_stages = self.stages(),
            enabled_count = self.enabled_stages.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            mode = self.mode,
            enabled_count = self.enabled_stages.len(),
        )
    }
}

/// Run configuration rejected.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_bindery::observability::messages::validation::ConfigurationRejected;
///
/// let msg = ConfigurationRejected {
///     error_count: 3,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ConfigurationRejected {
    pub error_count: usize,
}

impl Display for ConfigurationRejected {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Configuration validation failed with {} errors",
            self.error_count
        )
    }
}

impl StructuredLog for ConfigurationRejected {
    fn log(&self) {
        tracing::error!(
            error_count = self.error_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            error_count = self.error_count,
        )
    }
}
