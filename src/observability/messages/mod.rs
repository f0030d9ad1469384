// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! This module contains all message types used throughout The Bindery for
//! diagnostic and operational logging. Each message type implements the
//! `Display` trait to provide consistent, human-readable output, and
//! `StructuredLog` to emit the same event with typed fields.
//!
//! # Organization
//!
//! Messages are organized by subsystem:
//!
//! * `engine` - stage scheduling, barrier and run lifecycle events
//! * `pairing` - fan-in, pocket detection and design table events
//! * `task` - per-task dispatch, resume and process events
//! * `validation` - configuration validation results
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_bindery::model::StageKind;
//! use the_bindery::observability::messages::engine::StageStarted;
//! use the_bindery::observability::messages::StructuredLog;
//!
//! let msg = StageStarted {
//!     stage: StageKind::InterfaceScoring,
//!     level: 1,
//! };
//!
//! msg.log();
//! tracing::info!("{}", msg);
//! ```

use tracing::Span;

pub mod engine;
pub mod pairing;
pub mod task;
pub mod validation;

/// Emit a message as a structured `tracing` event, or open a span carrying
/// the same fields.
pub trait StructuredLog {
    /// Log at the level documented on the message type.
    fn log(&self);

    fn span(&self, name: &str) -> Span;
}
