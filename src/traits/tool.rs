// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::ToolConfig;
use crate::engine::ResourceClass;
use crate::errors::{ConfigurationError, TaskExecutionFailure};
use crate::model::{StageKind, TaskDescriptor};

/// Everything a tool needs to run one descriptor.
///
/// `output_dir` already contains the `primary/`, `intermediate/` and
/// `confidence/` subdirectories when the tool is invoked.
#[derive(Debug, Clone, Copy)]
pub struct ToolInvocation<'a> {
    pub descriptor: &'a TaskDescriptor,
    pub output_dir: &'a Path,
}

/// An external scientific tool, seen only through its invocation contract.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Run the tool to completion. Implementations must return promptly with
    /// `TaskExecutionFailure::Cancelled` once `cancel` fires.
    async fn invoke(
        &self,
        invocation: ToolInvocation<'_>,
        cancel: CancellationToken,
    ) -> Result<(), TaskExecutionFailure>;

    fn name(&self) -> &str;

    fn resource_class(&self) -> ResourceClass;
}

/// Builds tools from their configuration entries.
pub trait ToolFactory: Send + Sync {
    fn create(&self, stage: StageKind, config: &ToolConfig)
        -> Result<Arc<dyn Tool>, ConfigurationError>;
}
