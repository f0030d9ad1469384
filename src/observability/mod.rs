// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and
//! operational logging throughout The Bindery. Message types follow a
//! struct-based pattern with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep field names identical between the text and structured forms
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - stage scheduling, barrier and run lifecycle events
//! * `messages::pairing` - fan-in and consolidation events
//! * `messages::task` - per-task dispatch and process events
//! * `messages::validation` - configuration validation results
//!
//! # Usage
//!
//! ```rust
//! use the_bindery::errors::TaskExecutionFailure;
//! use the_bindery::model::StageKind;
//! use the_bindery::observability::messages::task::TaskFailed;
//!
//! let error = TaskExecutionFailure::NonZeroExit { code: 2 };
//! let msg = TaskFailed {
//!     task_id: "refolding_egfr_v60_0",
//!     stage: StageKind::Refolding,
//!     error: &error,
//! };
//!
//! tracing::error!("{}", msg);
//! ```

pub mod messages;
