// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for per-task dispatch events.
//!
//! This module contains message types for logging events related to:
//! * Task admission, success and failure
//! * Completion markers (resume, rejected markers, write failures)
//! * External process lifecycle

use crate::engine::ResourceClass;
use crate::model::StageKind;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Task admitted to the pool and handed to its tool.
///
/// # Log Level
/// `debug!` - Per-task detail
///
/// # Example
/// ```
/// use the_bindery::engine::ResourceClass;
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::task::TaskStarted;
///
/// let msg = TaskStarted {
///     task_id: "egfr_v60_0",
///     stage: StageKind::Design,
///     tool: "design:boltzgen",
///     class: ResourceClass::Accelerator,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct TaskStarted<'a> {
    pub task_id: &'a str,
    pub stage: StageKind,
    pub tool: &'a str,
    pub class: ResourceClass,
}

impl Display for TaskStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' ({}) started with '{}' on a {} slot",
            self.task_id, self.stage, self.tool, self.class
        )
    }
}

impl StructuredLog for TaskStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            task_id = self.task_id,
            stage = %self.stage,
            tool = self.tool,
            class = %self.class,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "task",
            span_name = name,
            task_id = self.task_id,
            stage = %self.stage,
            tool = self.tool,
        )
    }
}

/// Task finished and its outputs were collected.
///
/// # Log Level
/// `debug!` - Per-task detail
///
/// # Example
/// ```
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::task::TaskSucceeded;
/// use std::time::Duration;
///
/// let msg = TaskSucceeded {
///     task_id: "egfr_v60_0",
///     stage: StageKind::Design,
///     artifacts: 2,
///     duration: Duration::from_secs(95),
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct TaskSucceeded<'a> {
    pub task_id: &'a str,
    pub stage: StageKind,
    pub artifacts: usize,
    pub duration: Duration,
}

impl Display for TaskSucceeded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' ({}) produced {} artifacts in {:?}",
            self.task_id, self.stage, self.artifacts, self.duration
        )
    }
}

impl StructuredLog for TaskSucceeded<'_> {
    fn log(&self) {
        tracing::debug!(
            task_id = self.task_id,
            stage = %self.stage,
            artifacts = self.artifacts,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "task_succeeded",
            span_name = name,
            task_id = self.task_id,
            stage = %self.stage,
            artifacts = self.artifacts,
        )
    }
}

/// Task failed; siblings are unaffected.
///
/// # Log Level
/// `warn!` - Recorded on the task result, the run continues
///
/// # Example
/// ```
/// use the_bindery::errors::TaskExecutionFailure;
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::task::TaskFailed;
///
/// let error = TaskExecutionFailure::MissingOutputs {
///     collection: "structures".to_string(),
/// };
/// let msg = TaskFailed {
///     task_id: "refolding_egfr_v60_0",
///     stage: StageKind::Refolding,
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct TaskFailed<'a> {
    pub task_id: &'a str,
    pub stage: StageKind,
    pub error: &'a dyn std::error::Error,
}

impl Display for TaskFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' ({}) failed: {}",
            self.task_id, self.stage, self.error
        )
    }
}

impl StructuredLog for TaskFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            task_id = self.task_id,
            stage = %self.stage,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "task_failed",
            span_name = name,
            task_id = self.task_id,
            stage = %self.stage,
            error = %self.error,
        )
    }
}

/// Task skipped because a valid completion marker exists.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_bindery::model::StageKind;
/// use the_bindery::observability::messages::task::TaskResumed;
///
/// let msg = TaskResumed {
///     task_id: "egfr_v60_0",
///     stage: StageKind::Design,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct TaskResumed<'a> {
    pub task_id: &'a str,
    pub stage: StageKind,
}

impl Display for TaskResumed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' ({}) already completed, reusing recorded outputs",
            self.task_id, self.stage
        )
    }
}

impl StructuredLog for TaskResumed<'_> {
    fn log(&self) {
        tracing::info!(
            task_id = self.task_id,
            stage = %self.stage,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "task_resumed",
            span_name = name,
            task_id = self.task_id,
            stage = %self.stage,
        )
    }
}

/// Completion marker present but not trusted; the task runs again.
///
/// # Log Level
/// `warn!` - Recovered condition
///
/// # Example
/// ```
/// use the_bindery::observability::messages::task::MarkerIgnored;
///
/// let msg = MarkerIgnored {
///     task_id: "egfr_v60_0",
///     reason: "a recorded artifact no longer exists",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct MarkerIgnored<'a> {
    pub task_id: &'a str,
    pub reason: &'a str,
}

impl Display for MarkerIgnored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring completion marker of task '{}': {}",
            self.task_id, self.reason
        )
    }
}

impl StructuredLog for MarkerIgnored<'_> {
    fn log(&self) {
        tracing::warn!(
            task_id = self.task_id,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "marker_ignored",
            span_name = name,
            task_id = self.task_id,
            reason = self.reason,
        )
    }
}

/// Completion marker could not be written; the task will rerun next time.
///
/// # Log Level
/// `warn!` - Recovered condition
///
/// # Example
/// ```
/// use the_bindery::observability::messages::task::MarkerWriteFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
/// let msg = MarkerWriteFailed {
///     task_id: "egfr_v60_0",
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct MarkerWriteFailed<'a> {
    pub task_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for MarkerWriteFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cannot write completion marker for task '{}': {}",
            self.task_id, self.error
        )
    }
}

impl StructuredLog for MarkerWriteFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            task_id = self.task_id,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "marker_write_failed",
            span_name = name,
            task_id = self.task_id,
            error = %self.error,
        )
    }
}

/// External process started.
///
/// # Log Level
/// `trace!` - Process detail
///
/// # Example
/// ```
/// use the_bindery::observability::messages::task::ProcessSpawned;
///
/// let msg = ProcessSpawned {
///     task_id: "egfr_v60_0",
///     command: "boltzgen",
///     pid: Some(4242),
/// };
///
/// tracing::trace!("{}", msg);
/// ```
pub struct ProcessSpawned<'a> {
    pub task_id: &'a str,
    pub command: &'a str,
    pub pid: Option<u32>,
}

impl Display for ProcessSpawned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.pid {
            Some(pid) => write!(
                f,
                "Spawned '{}' for task '{}' (pid {})",
                self.command, self.task_id, pid
            ),
            None => write!(f, "Spawned '{}' for task '{}'", self.command, self.task_id),
        }
    }
}

impl StructuredLog for ProcessSpawned<'_> {
    fn log(&self) {
        tracing::trace!(
            task_id = self.task_id,
            command = self.command,
            pid = self.pid,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "process",
            span_name = name,
            task_id = self.task_id,
            command = self.command,
            pid = self.pid,
        )
    }
}

/// External process exited.
///
/// # Log Level
/// `trace!` - Process detail
///
/// # Example
/// ```
/// use the_bindery::observability::messages::task::ProcessExited;
///
/// let msg = ProcessExited {
///     task_id: "egfr_v60_0",
///     code: Some(0),
/// };
///
/// tracing::trace!("{}", msg);
/// ```
pub struct ProcessExited<'a> {
    pub task_id: &'a str,
    pub code: Option<i32>,
}

impl Display for ProcessExited<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "Process for task '{}' exited with {}", self.task_id, code),
            None => write!(f, "Process for task '{}' was terminated", self.task_id),
        }
    }
}

impl StructuredLog for ProcessExited<'_> {
    fn log(&self) {
        tracing::trace!(task_id = self.task_id, code = self.code, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "process_exited",
            span_name = name,
            task_id = self.task_id,
            code = self.code,
        )
    }
}

/// External process killed on cancellation.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_bindery::observability::messages::task::ProcessKilled;
///
/// let msg = ProcessKilled { task_id: "egfr_v60_0" };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ProcessKilled<'a> {
    pub task_id: &'a str,
}

impl Display for ProcessKilled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Killed process for cancelled task '{}'", self.task_id)
    }
}

impl StructuredLog for ProcessKilled<'_> {
    fn log(&self) {
        tracing::info!(task_id = self.task_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("process_killed", span_name = name, task_id = self.task_id)
    }
}
