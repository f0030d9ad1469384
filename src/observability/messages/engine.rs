// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for stage scheduling and run lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Pipeline construction from a run configuration
//! * Level computation and stage start/completion
//! * Optional stages skipped for missing resources
//! * Consolidation barrier signals, firing and timeouts
//! * Run completion and failure

use crate::model::StageKind;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;
use tracing::Span;

fn join(stages: &[StageKind]) -> String {
    stages
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pipeline assembled from a run configuration.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::engine::PipelineBuilt;
/// use std::path::Path;
///
/// let stages = [StageKind::Design, StageKind::InterfaceScoring];
/// let msg = PipelineBuilt {
///     mode: "generate_from_target",
///     stages: &stages,
///     output_dir: Path::new("results/egfr"),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipelineBuilt<'a> {
    pub mode: &'a str,
    pub stages: &'a [StageKind],
    pub output_dir: &'a Path,
}

impl Display for PipelineBuilt<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline ready in {} mode with stages [{}], writing to {}",
            self.mode,
            join(self.stages),
            self.output_dir.display()
        )
    }
}

impl StructuredLog for PipelineBuilt<'_> {
    fn log(&self) {
        tracing::info!(
            mode = self.mode,
            stage_count = self.stages.len(),
            stages = join(self.stages),
            output_dir = %self.output_dir.display(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline",
            span_name = name,
            mode = self.mode,
            stage_count = self.stages.len(),
        )
    }
}

/// Stage graph grouped into topological levels.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_bindery::observability::messages::engine::LevelComputationCompleted;
///
/// let msg = LevelComputationCompleted {
///     level_count: 3,
///     stage_count: 5,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct LevelComputationCompleted {
    pub level_count: usize,
    pub stage_count: usize,
}

impl Display for LevelComputationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Computed {} levels for {} stages",
            self.level_count, self.stage_count
        )
    }
}

impl StructuredLog for LevelComputationCompleted {
    fn log(&self) {
        tracing::info!(
            level_count = self.level_count,
            stage_count = self.stage_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "level_computation",
            span_name = name,
            level_count = self.level_count,
            stage_count = self.stage_count,
        )
    }
}

/// Stage scheduled.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::engine::StageStarted;
///
/// let msg = StageStarted {
///     stage: StageKind::Refolding,
///     level: 2,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct StageStarted {
    pub stage: StageKind,
    pub level: usize,
}

impl Display for StageStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Starting stage '{}' at level {}", self.stage, self.level)
    }
}

impl StructuredLog for StageStarted {
    fn log(&self) {
        tracing::info!(
            stage = %self.stage,
            level = self.level,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage",
            span_name = name,
            stage = %self.stage,
            level = self.level,
        )
    }
}

/// Every task of a stage reached a terminal status.
///
/// # Log Level
/// `info!` - Important operational event; `warn!` when any task failed
///
/// # Example
/// ```
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::engine::StageCompleted;
/// use std::time::Duration;
///
/// let msg = StageCompleted {
///     stage: StageKind::InterfaceScoring,
///     tasks: 10,
///     failed: 0,
///     duration: Duration::from_secs(42),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct StageCompleted {
    pub stage: StageKind,
    pub tasks: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl Display for StageCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' completed: {} tasks, {} failed in {:?}",
            self.stage, self.tasks, self.failed, self.duration
        )
    }
}

impl StructuredLog for StageCompleted {
    fn log(&self) {
        if self.failed > 0 {
            tracing::warn!(
                stage = %self.stage,
                tasks = self.tasks,
                failed = self.failed,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            );
        } else {
            tracing::info!(
                stage = %self.stage,
                tasks = self.tasks,
                failed = self.failed,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage_completed",
            span_name = name,
            stage = %self.stage,
            tasks = self.tasks,
            failed = self.failed,
            duration = ?self.duration,
        )
    }
}

/// Optional stage skipped because a required resource is absent.
///
/// # Log Level
/// `warn!` - Recovered condition
///
/// # Example
/// ```
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::engine::StageSkipped;
///
/// let msg = StageSkipped {
///     stage: StageKind::StructuralSearch,
///     reason: "required resource /data/afdb is missing",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct StageSkipped<'a> {
    pub stage: StageKind,
    pub reason: &'a str,
}

impl Display for StageSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Skipping stage '{}': {}", self.stage, self.reason)
    }
}

impl StructuredLog for StageSkipped<'_> {
    fn log(&self) {
        tracing::warn!(
            stage = %self.stage,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "stage_skipped",
            span_name = name,
            stage = %self.stage,
            reason = self.reason,
        )
    }
}

/// Barrier accepted a stage signal.
///
/// # Log Level
/// `debug!` - Progress detail
///
/// # Example
/// ```
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::engine::BarrierSignalReceived;
///
/// let msg = BarrierSignalReceived {
///     stage: StageKind::Design,
///     remaining: 2,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct BarrierSignalReceived {
    pub stage: StageKind,
    pub remaining: usize,
}

impl Display for BarrierSignalReceived {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Barrier received signal from '{}', {} remaining",
            self.stage, self.remaining
        )
    }
}

impl StructuredLog for BarrierSignalReceived {
    fn log(&self) {
        tracing::debug!(
            stage = %self.stage,
            remaining = self.remaining,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "barrier_signal",
            span_name = name,
            stage = %self.stage,
            remaining = self.remaining,
        )
    }
}

/// Barrier dropped an unexpected or repeated signal.
///
/// # Log Level
/// `warn!` - Recovered condition
///
/// # Example
/// ```
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::engine::BarrierSignalIgnored;
///
/// let msg = BarrierSignalIgnored {
///     stage: StageKind::Refolding,
///     reason: "stage already signalled",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct BarrierSignalIgnored<'a> {
    pub stage: StageKind,
    pub reason: &'a str,
}

impl Display for BarrierSignalIgnored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Barrier ignored signal from '{}': {}",
            self.stage, self.reason
        )
    }
}

impl StructuredLog for BarrierSignalIgnored<'_> {
    fn log(&self) {
        tracing::warn!(
            stage = %self.stage,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "barrier_signal_ignored",
            span_name = name,
            stage = %self.stage,
            reason = self.reason,
        )
    }
}

/// Barrier watchdog expired before every expected stage signalled.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::engine::BarrierTimedOut;
/// use std::time::Duration;
///
/// let missing = [StageKind::StructuralSearch];
/// let msg = BarrierTimedOut {
///     waited: Duration::from_secs(86400),
///     missing: &missing,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct BarrierTimedOut<'a> {
    pub waited: Duration,
    pub missing: &'a [StageKind],
}

impl Display for BarrierTimedOut<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Consolidation barrier gave up after {:?}; missing stages: [{}]",
            self.waited,
            join(self.missing)
        )
    }
}

impl StructuredLog for BarrierTimedOut<'_> {
    fn log(&self) {
        tracing::error!(
            waited_ms = self.waited.as_millis() as u64,
            missing = join(self.missing),
            missing_count = self.missing.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "barrier_timeout",
            span_name = name,
            waited = ?self.waited,
            missing = join(self.missing),
        )
    }
}

/// Barrier collected every expected signal and is aggregating.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_bindery::observability::messages::engine::BarrierFired;
/// use std::time::Duration;
///
/// let msg = BarrierFired {
///     stages: 4,
///     waited: Duration::from_secs(3600),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct BarrierFired {
    pub stages: usize,
    pub waited: Duration,
}

impl Display for BarrierFired {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Consolidation barrier fired after {} stage signals in {:?}",
            self.stages, self.waited
        )
    }
}

impl StructuredLog for BarrierFired {
    fn log(&self) {
        tracing::info!(
            stages = self.stages,
            waited_ms = self.waited.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "barrier_fired",
            span_name = name,
            stages = self.stages,
            waited = ?self.waited,
        )
    }
}

/// Run finished and consolidation completed.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_bindery::observability::messages::engine::RunCompleted;
/// use std::time::Duration;
///
/// let msg = RunCompleted {
///     stages: 7,
///     tasks: 64,
///     failed: 3,
///     duration: Duration::from_secs(5400),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunCompleted {
    pub stages: usize,
    pub tasks: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl Display for RunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run completed: {} stages, {} tasks ({} failed) in {:?}",
            self.stages, self.tasks, self.failed, self.duration
        )
    }
}

impl StructuredLog for RunCompleted {
    fn log(&self) {
        tracing::info!(
            stages = self.stages,
            tasks = self.tasks,
            failed = self.failed,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            stages = self.stages,
            tasks = self.tasks,
            failed = self.failed,
            duration = ?self.duration,
        )
    }
}

/// Run aborted.
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_bindery::errors::ExecutionError;
/// use the_bindery::observability::messages::engine::ExecutionFailed;
///
/// let error = ExecutionError::Cancelled;
/// let msg = ExecutionFailed { error: &error };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ExecutionFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for ExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Run failed: {}", self.error)
    }
}

impl StructuredLog for ExecutionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "execution_failed",
            span_name = name,
            error = %self.error,
        )
    }
}
