// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod runtime;
mod validation;

pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, DerivedKeyConfig, DesignConfig, InputConfig,
    PocketDetectionConfig, ResourceConfig, RunConfig, StageConfig, TargetSpec, TaskSpec,
    ToolConfig,
};
pub use runtime::{Pipeline, RuntimeBuilder};
pub use validation::validate_run_config;
