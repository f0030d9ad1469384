// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::engine::{CompletionStore, ResourcePool};
use crate::errors::TaskExecutionFailure;
use crate::model::{
    Artifact, CollectionSpec, KeyDeriver, OutputSubdir, StageKind, StageResult, TaskDescriptor,
    TaskStatus,
};
use crate::observability::messages::task::{
    MarkerWriteFailed, TaskFailed, TaskResumed, TaskStarted, TaskSucceeded,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{Tool, ToolInvocation};

/// How every task of one stage is run: which tool, and which collections it
/// is expected to leave in its output directory.
#[derive(Clone)]
pub struct TaskTemplate {
    pub stage: StageKind,
    pub tool: Arc<dyn Tool>,
    pub outputs: Vec<CollectionSpec>,
}

impl std::fmt::Debug for TaskTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskTemplate")
            .field("stage", &self.stage)
            .field("tool", &self.tool.name())
            .field("outputs", &self.outputs)
            .finish()
    }
}

/// Runs batches of independent descriptors against the shared resource pool.
///
/// ## Guarantees
/// - Exactly one `StageResult` per descriptor, in descriptor order
/// - A failing task never affects its siblings
/// - Succeeded tasks leave a completion marker and are skipped on re-run
/// - Once the cancellation token fires no further task is admitted
pub struct TaskDispatcher {
    pool: ResourcePool,
    store: CompletionStore,
    keys: Arc<KeyDeriver>,
    output_root: PathBuf,
    cancel: CancellationToken,
}

impl TaskDispatcher {
    pub fn new(
        pool: ResourcePool,
        store: CompletionStore,
        keys: Arc<KeyDeriver>,
        output_root: impl Into<PathBuf>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            pool,
            store,
            keys,
            output_root: output_root.into(),
            cancel,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn keys(&self) -> &KeyDeriver {
        &self.keys
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn task_dir(&self, stage: StageKind, task_id: &str) -> PathBuf {
        self.output_root.join(stage.as_str()).join(task_id)
    }

    pub async fn dispatch(
        self: &Arc<Self>,
        template: &TaskTemplate,
        descriptors: &[TaskDescriptor],
    ) -> Vec<StageResult> {
        let template = Arc::new(template.clone());
        let mut tasks = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let dispatcher = Arc::clone(self);
            let template = Arc::clone(&template);
            let descriptor = descriptor.clone();
            let task = tokio::spawn(async move { dispatcher.run_task(&template, &descriptor).await });
            tasks.push(task);
        }

        let mut results = Vec::with_capacity(descriptors.len());
        for (task, descriptor) in tasks.into_iter().zip(descriptors) {
            let result = match task.await {
                Ok(result) => result,
                Err(join_error) => {
                    let failure = TaskExecutionFailure::Panicked(join_error.to_string());
                    self.fail(descriptor, self.task_dir(descriptor.stage(), descriptor.id()), failure)
                }
            };
            results.push(result);
        }
        results
    }

    async fn run_task(&self, template: &TaskTemplate, descriptor: &TaskDescriptor) -> StageResult {
        let task_dir = self.task_dir(descriptor.stage(), descriptor.id());

        if let Some(recorded) = self.store.lookup(descriptor, &task_dir).await {
            TaskResumed {
                task_id: descriptor.id(),
                stage: descriptor.stage(),
            }
            .log();
            return recorded;
        }

        let class = template.tool.resource_class();
        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return self.fail(descriptor, task_dir, TaskExecutionFailure::Cancelled);
            }
            permit = self.pool.acquire(class) => match permit {
                Ok(permit) => permit,
                Err(_) => return self.fail(descriptor, task_dir, TaskExecutionFailure::Cancelled),
            },
        };

        if let Err(failure) = self.prepare(&task_dir).await {
            return self.fail(descriptor, task_dir, failure);
        }

        TaskStarted {
            task_id: descriptor.id(),
            stage: descriptor.stage(),
            tool: template.tool.name(),
            class,
        }
        .log();
        let started = Instant::now();

        let invocation = ToolInvocation {
            descriptor,
            output_dir: &task_dir,
        };
        let outcome = template
            .tool
            .invoke(invocation, self.cancel.child_token())
            .await;
        drop(permit);

        if let Err(failure) = outcome {
            return self.fail(descriptor, task_dir, failure);
        }

        let collections = match self.collect(descriptor, &task_dir, &template.outputs) {
            Ok(collections) => collections,
            Err(failure) => return self.fail(descriptor, task_dir, failure),
        };

        let result = StageResult {
            task_id: descriptor.id().to_string(),
            stage: descriptor.stage(),
            status: TaskStatus::Succeeded,
            failure: None,
            output_dir: task_dir,
            collections,
        };

        if let Err(e) = self.store.record(&result).await {
            MarkerWriteFailed {
                task_id: descriptor.id(),
                error: &e,
            }
            .log();
        }

        TaskSucceeded {
            task_id: descriptor.id(),
            stage: descriptor.stage(),
            artifacts: result.artifacts().count(),
            duration: started.elapsed(),
        }
        .log();
        result
    }

    async fn prepare(&self, task_dir: &Path) -> Result<(), TaskExecutionFailure> {
        self.store
            .invalidate(task_dir)
            .await
            .map_err(|source| TaskExecutionFailure::OutputDir {
                path: task_dir.to_path_buf(),
                source,
            })?;

        // Files left by an earlier attempt must not count as this attempt's output.
        for subdir in OutputSubdir::ALL {
            let path = task_dir.join(subdir.as_str());
            match tokio::fs::remove_dir_all(&path).await {
                Err(source) if source.kind() != std::io::ErrorKind::NotFound => {
                    return Err(TaskExecutionFailure::OutputDir { path, source });
                }
                _ => {}
            }
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|source| TaskExecutionFailure::OutputDir { path, source })?;
        }
        Ok(())
    }

    /// Glob every declared collection and enforce the required ones.
    fn collect(
        &self,
        descriptor: &TaskDescriptor,
        task_dir: &Path,
        outputs: &[CollectionSpec],
    ) -> Result<BTreeMap<String, Vec<Artifact>>, TaskExecutionFailure> {
        let mut collections = BTreeMap::new();

        for spec in outputs {
            let base = task_dir.join(spec.subdir.as_str());
            let mut paths = Vec::new();
            for pattern in &spec.patterns {
                let full = base.join(pattern);
                let entries = glob::glob(&full.to_string_lossy()).map_err(|e| {
                    TaskExecutionFailure::Template(format!(
                        "invalid pattern '{}' for collection '{}': {}",
                        pattern, spec.name, e
                    ))
                })?;
                paths.extend(entries.filter_map(Result::ok).filter(|p| p.is_file()));
            }
            paths.sort();
            paths.dedup();

            if spec.required && paths.is_empty() {
                return Err(TaskExecutionFailure::MissingOutputs {
                    collection: spec.name.clone(),
                });
            }

            let artifacts = paths
                .into_iter()
                .map(|path| Artifact::new(path, descriptor.id(), &self.keys))
                .collect();
            collections.insert(spec.name.clone(), artifacts);
        }

        Ok(collections)
    }

    fn fail(
        &self,
        descriptor: &TaskDescriptor,
        task_dir: PathBuf,
        failure: TaskExecutionFailure,
    ) -> StageResult {
        TaskFailed {
            task_id: descriptor.id(),
            stage: descriptor.stage(),
            error: &failure,
        }
        .log();
        StageResult::failed(descriptor, task_dir, failure.to_string())
    }
}
