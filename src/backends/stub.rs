// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::backends::render_template;
use crate::config::ToolConfig;
use crate::engine::ResourceClass;
use crate::errors::{ConfigurationError, TaskExecutionFailure};
use crate::model::{OutputSubdir, StageKind};
use crate::traits::{Tool, ToolFactory, ToolInvocation};

/// A tool that writes files from templates instead of spawning a process.
pub struct StubTool {
    name: String,
    class: ResourceClass,
    writes: Vec<(OutputSubdir, String)>,
    failing: HashSet<String>,
    omitting: HashSet<(String, OutputSubdir)>,
    delay: Option<Duration>,
    invocations: AtomicUsize,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl StubTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            class: ResourceClass::Cpu,
            writes: Vec::new(),
            failing: HashSet::new(),
            omitting: HashSet::new(),
            delay: None,
            invocations: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
        }
    }

    /// Write one file per invocation; the file name is an argument template.
    pub fn writes(mut self, subdir: OutputSubdir, template: &str) -> Self {
        self.writes.push((subdir, template.to_string()));
        self
    }

    /// Exit non-zero for this task id.
    pub fn failing_for(mut self, task_id: &str) -> Self {
        self.failing.insert(task_id.to_string());
        self
    }

    /// Skip every file destined for `subdir` when running `task_id`.
    pub fn omitting(mut self, task_id: &str, subdir: OutputSubdir) -> Self {
        self.omitting.insert((task_id.to_string(), subdir));
        self
    }

    pub fn on(mut self, class: ResourceClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Highest number of invocations observed running at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    async fn write_outputs(&self, invocation: ToolInvocation<'_>) -> Result<(), TaskExecutionFailure> {
        let task_id = invocation.descriptor.id();
        for (subdir, template) in &self.writes {
            if self.omitting.contains(&(task_id.to_string(), *subdir)) {
                continue;
            }
            let name = render_template(template, invocation)?;
            let path = invocation.output_dir.join(subdir.as_str()).join(name);
            tokio::fs::write(&path, task_id)
                .await
                .map_err(|source| TaskExecutionFailure::OutputDir { path, source })?;
        }
        Ok(())
    }
}

#[async_trait]
impl Tool for StubTool {
    async fn invoke(
        &self,
        invocation: ToolInvocation<'_>,
        cancel: CancellationToken,
    ) -> Result<(), TaskExecutionFailure> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(running, Ordering::SeqCst);

        let outcome = async {
            if let Some(delay) = self.delay {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(TaskExecutionFailure::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            if self.failing.contains(invocation.descriptor.id()) {
                return Err(TaskExecutionFailure::NonZeroExit { code: 1 });
            }
            self.write_outputs(invocation).await
        }
        .await;

        self.running.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn resource_class(&self) -> ResourceClass {
        self.class
    }
}

/// A tool that always exits non-zero.
pub struct FailingTool {
    name: String,
}

impl FailingTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Tool for FailingTool {
    async fn invoke(
        &self,
        _invocation: ToolInvocation<'_>,
        _cancel: CancellationToken,
    ) -> Result<(), TaskExecutionFailure> {
        Err(TaskExecutionFailure::NonZeroExit { code: 1 })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn resource_class(&self) -> ResourceClass {
        ResourceClass::Cpu
    }
}

/// A tool that never finishes on its own; only cancellation ends it.
pub struct HangingTool {
    name: String,
}

impl HangingTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Tool for HangingTool {
    async fn invoke(
        &self,
        _invocation: ToolInvocation<'_>,
        cancel: CancellationToken,
    ) -> Result<(), TaskExecutionFailure> {
        cancel.cancelled().await;
        Err(TaskExecutionFailure::Cancelled)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn resource_class(&self) -> ResourceClass {
        ResourceClass::Cpu
    }
}

/// Hands out pre-registered tools by stage, keeping every created tool so
/// tests can inspect invocation counts afterwards.
#[derive(Default)]
pub struct StubToolFactory {
    tools: BTreeMap<StageKind, Arc<StubTool>>,
    created: Mutex<Vec<StageKind>>,
}

impl StubToolFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stage: StageKind, tool: StubTool) -> Self {
        self.tools.insert(stage, Arc::new(tool));
        self
    }

    pub fn tool(&self, stage: StageKind) -> Option<Arc<StubTool>> {
        self.tools.get(&stage).cloned()
    }

    pub fn created(&self) -> Vec<StageKind> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl ToolFactory for StubToolFactory {
    fn create(
        &self,
        stage: StageKind,
        config: &ToolConfig,
    ) -> Result<Arc<dyn Tool>, ConfigurationError> {
        if let Ok(mut created) = self.created.lock() {
            created.push(stage);
        }
        let tool = match self.tools.get(&stage) {
            Some(tool) => Arc::clone(tool),
            None => Arc::new(StubTool::new(&config.command).on(config.resource_class)),
        };
        Ok(tool)
    }
}
