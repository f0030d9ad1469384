// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for fan-in and consolidation events.
//!
//! This module contains message types for logging events related to:
//! * Pairing upstream collections by derived key
//! * Keys present in only some collections
//! * Pocket detection results
//! * The unified design table

use crate::model::{PairingGap, StageKind};
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// Upstream collections joined into input tuples.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::pairing::PairingCompleted;
///
/// let msg = PairingCompleted {
///     stage: StageKind::InterfaceScoring,
///     collections: 2,
///     tuples: 10,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PairingCompleted {
    pub stage: StageKind,
    pub collections: usize,
    pub tuples: usize,
}

impl Display for PairingCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Paired {} collections into {} inputs for stage '{}'",
            self.collections, self.tuples, self.stage
        )
    }
}

impl StructuredLog for PairingCompleted {
    fn log(&self) {
        tracing::info!(
            stage = %self.stage,
            collections = self.collections,
            tuples = self.tuples,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pairing",
            span_name = name,
            stage = %self.stage,
            collections = self.collections,
            tuples = self.tuples,
        )
    }
}

/// Some derived keys of a collection found no partner.
///
/// # Log Level
/// `warn!` - Recovered condition; the unpaired keys are dropped
///
/// # Example
/// ```
/// use the_bindery::model::{PairingGap, StageKind};
/// use the_bindery::observability::messages::pairing::PairingGapDetected;
///
/// let gap = PairingGap {
///     collection: "design.confidence".to_string(),
///     missing_keys: 2,
///     sample: vec!["egfr_v80_1".to_string(), "egfr_v100_2".to_string()],
///     duplicates: 0,
/// };
/// let msg = PairingGapDetected {
///     stage: StageKind::InterfaceScoring,
///     gap: &gap,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct PairingGapDetected<'a> {
    pub stage: StageKind,
    pub gap: &'a PairingGap,
}

impl Display for PairingGapDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}': {} keys have no '{}' partner (e.g. {})",
            self.stage,
            self.gap.missing_keys,
            self.gap.collection,
            self.gap.sample.join(", ")
        )?;
        if self.gap.duplicates > 0 {
            write!(f, "; {} duplicate keys resolved", self.gap.duplicates)?;
        }
        Ok(())
    }
}

impl StructuredLog for PairingGapDetected<'_> {
    fn log(&self) {
        tracing::warn!(
            stage = %self.stage,
            collection = self.gap.collection.as_str(),
            missing_keys = self.gap.missing_keys,
            duplicates = self.gap.duplicates,
            sample = self.gap.sample.join(","),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "pairing_gap",
            span_name = name,
            stage = %self.stage,
            collection = self.gap.collection.as_str(),
            missing_keys = self.gap.missing_keys,
        )
    }
}

/// Pocket detection found nothing on the target; no designs follow.
///
/// # Log Level
/// `warn!` - Recovered condition
///
/// # Example
/// ```
/// use the_bindery::observability::messages::pairing::NoPocketsDetected;
///
/// let msg = NoPocketsDetected { target: "kras" };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct NoPocketsDetected<'a> {
    pub target: &'a str,
}

impl Display for NoPocketsDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "No pockets detected on target '{}'", self.target)
    }
}

impl StructuredLog for NoPocketsDetected<'_> {
    fn log(&self) {
        tracing::warn!(target_id = self.target, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("no_pockets", span_name = name, target_id = self.target)
    }
}

/// Unified design table written.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_bindery::observability::messages::pairing::DesignTableWritten;
/// use std::path::Path;
///
/// let msg = DesignTableWritten {
///     path: Path::new("results/egfr/consolidated/design_summary.tsv"),
///     rows: 12,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct DesignTableWritten<'a> {
    pub path: &'a Path,
    pub rows: usize,
}

impl Display for DesignTableWritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Wrote design table with {} rows to {}",
            self.rows,
            self.path.display()
        )
    }
}

impl StructuredLog for DesignTableWritten<'_> {
    fn log(&self) {
        tracing::info!(
            path = %self.path.display(),
            rows = self.rows,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "design_table",
            span_name = name,
            path = %self.path.display(),
            rows = self.rows,
        )
    }
}
