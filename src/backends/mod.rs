// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tool backends for The Bindery.
//!
//! Every scientific tool a stage runs is reached through the `Tool` trait.
//! The engine never knows which program is behind it.
//!
//! # Available Backends
//!
//! ## Process Backend
//! Spawns an external program per task:
//! - **Arguments**: rendered from templates (`{task_id}`, `{output_dir}`, `{param.NAME}`, ...)
//! - **Logs**: stdout and stderr captured in the task's output directory
//! - **Cancellation**: the child is killed when the run is cancelled
//!
//! ## Stub Backend (Test-Only)
//! Writes artifact files straight from templates:
//! - **StubTool**: configurable outputs, per-task failures and omissions
//! - **FailingTool**: always exits non-zero
//! - **HangingTool**: runs until cancelled
//! - **Note**: NOT available in production builds
//!
//! # Architecture
//!
//! ```text
//! ToolConfig → ToolFactory → Arc<dyn Tool> → TaskTemplate → TaskDispatcher
//! ```
//!
//! # Example
//! ```rust
//! use the_bindery::backends::ProcessToolFactory;
//! use the_bindery::config::ToolConfig;
//! use the_bindery::engine::ResourceClass;
//! use the_bindery::model::StageKind;
//! use the_bindery::traits::{Tool, ToolFactory};
//!
//! let config = ToolConfig {
//!     command: "prodigy".to_string(),
//!     args: vec!["{input.structures}".to_string()],
//!     env: Default::default(),
//!     resource_class: ResourceClass::Cpu,
//! };
//!
//! let tool = ProcessToolFactory.create(StageKind::AffinityPrediction, &config)?;
//! assert_eq!(tool.name(), "affinity_prediction:prodigy");
//! # Ok::<(), the_bindery::errors::ConfigurationError>(())
//! ```

mod process;
#[cfg(test)]
pub mod stub;
mod template;

pub use process::{ProcessTool, ProcessToolFactory};
pub use template::render_template;
