// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::backends::render_template;
use crate::config::consts::{STDERR_FILE, STDOUT_FILE};
use crate::config::ToolConfig;
use crate::engine::ResourceClass;
use crate::errors::{ConfigurationError, TaskExecutionFailure};
use crate::model::StageKind;
use crate::observability::messages::task::{ProcessExited, ProcessKilled, ProcessSpawned};
use crate::observability::messages::StructuredLog;
use crate::traits::{Tool, ToolFactory, ToolInvocation};

/// Runs an external program once per task.
///
/// The program runs with the task's output directory as its working
/// directory, so relative paths are made absolute before it starts. Its
/// standard output and error go to `.command.out` and `.command.err` in that
/// directory. The child is killed when the task is cancelled or its future
/// is dropped.
pub struct ProcessTool {
    name: String,
    config: ToolConfig,
}

impl ProcessTool {
    pub fn new(stage: StageKind, config: ToolConfig) -> Self {
        Self {
            name: format!("{}:{}", stage, config.command),
            config,
        }
    }

    fn command(&self, invocation: ToolInvocation<'_>) -> Result<Command, TaskExecutionFailure> {
        let mut program = PathBuf::from(render_template(&self.config.command, invocation)?);
        // A bare name is looked up on PATH; anything with a directory part is
        // resolved before the working directory changes.
        if program.components().count() > 1 && program.is_relative() {
            program = std::path::absolute(&program).unwrap_or(program);
        }
        let mut command = Command::new(program);

        for arg in &self.config.args {
            command.arg(render_template(arg, invocation)?);
        }
        for (key, value) in &self.config.env {
            command.env(key, render_template(value, invocation)?);
        }

        command
            .current_dir(invocation.output_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        Ok(command)
    }
}

#[async_trait]
impl Tool for ProcessTool {
    async fn invoke(
        &self,
        invocation: ToolInvocation<'_>,
        cancel: CancellationToken,
    ) -> Result<(), TaskExecutionFailure> {
        let mut command = self.command(invocation)?;

        let log_file = |name: &str| {
            let path = invocation.output_dir.join(name);
            std::fs::File::create(&path)
                .map_err(|source| TaskExecutionFailure::OutputDir { path, source })
        };
        command
            .stdout(Stdio::from(log_file(STDOUT_FILE)?))
            .stderr(Stdio::from(log_file(STDERR_FILE)?));

        let task_id = invocation.descriptor.id();
        let mut child = command
            .spawn()
            .map_err(|source| TaskExecutionFailure::Spawn {
                command: self.config.command.clone(),
                source,
            })?;
        ProcessSpawned {
            task_id,
            command: &self.config.command,
            pid: child.id(),
        }
        .log();

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                ProcessKilled { task_id }.log();
                return Err(TaskExecutionFailure::Cancelled);
            }
            status = child.wait() => status.map_err(|source| TaskExecutionFailure::Spawn {
                command: self.config.command.clone(),
                source,
            })?,
        };

        ProcessExited {
            task_id,
            code: status.code(),
        }
        .log();
        match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(TaskExecutionFailure::NonZeroExit { code }),
            None => Err(TaskExecutionFailure::Terminated),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn resource_class(&self) -> ResourceClass {
        self.config.resource_class
    }
}

/// Creates a [`ProcessTool`] for every configured tool entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessToolFactory;

impl ToolFactory for ProcessToolFactory {
    fn create(
        &self,
        stage: StageKind,
        config: &ToolConfig,
    ) -> Result<Arc<dyn Tool>, ConfigurationError> {
        if config.command.trim().is_empty() {
            return Err(ConfigurationError::MissingTool { stage });
        }
        Ok(Arc::new(ProcessTool::new(stage, config.clone())))
    }
}
