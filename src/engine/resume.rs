// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::io;
use std::path::Path;

use crate::config::consts::MARKER_FILE;
use crate::model::{StageResult, TaskDescriptor};
use crate::observability::messages::task::MarkerIgnored;
use crate::observability::messages::StructuredLog;

/// Completion markers kept inside each task's output directory.
///
/// A marker is the serialized `StageResult` of a succeeded task. It is only
/// honoured when it names the same task and stage and every artifact it lists
/// still exists.
#[derive(Debug, Clone)]
pub struct CompletionStore {
    enabled: bool,
}

impl CompletionStore {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn lookup(&self, descriptor: &TaskDescriptor, task_dir: &Path) -> Option<StageResult> {
        if !self.enabled {
            return None;
        }

        let raw = tokio::fs::read(task_dir.join(MARKER_FILE)).await.ok()?;
        let recorded: StageResult = match serde_json::from_slice(&raw) {
            Ok(result) => result,
            Err(e) => {
                let reason = format!("unreadable marker: {}", e);
                MarkerIgnored {
                    task_id: descriptor.id(),
                    reason: &reason,
                }
                .log();
                return None;
            }
        };

        let reason = if recorded.task_id != descriptor.id() {
            Some("marker names a different task")
        } else if recorded.stage != descriptor.stage() {
            Some("marker names a different stage")
        } else if !recorded.is_success() {
            Some("marker records a failed task")
        } else {
            None
        };
        if let Some(reason) = reason {
            MarkerIgnored {
                task_id: descriptor.id(),
                reason,
            }
            .log();
            return None;
        }

        for artifact in recorded.artifacts() {
            if !tokio::fs::try_exists(&artifact.path).await.unwrap_or(false) {
                MarkerIgnored {
                    task_id: descriptor.id(),
                    reason: "a recorded artifact no longer exists",
                }
                .log();
                return None;
            }
        }

        Some(recorded)
    }

    /// Write the marker for a succeeded task via a temporary file and rename.
    pub async fn record(&self, result: &StageResult) -> io::Result<()> {
        if !result.is_success() {
            return Ok(());
        }

        let body = serde_json::to_vec_pretty(result)?;
        let marker = result.output_dir.join(MARKER_FILE);
        let staging = result.output_dir.join(format!("{}.tmp", MARKER_FILE));
        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &marker).await
    }

    /// Remove a stale marker before a task is re-run.
    pub async fn invalidate(&self, task_dir: &Path) -> io::Result<()> {
        match tokio::fs::remove_file(task_dir.join(MARKER_FILE)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Artifact, KeyDeriver, StageKind, TaskStatus};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn succeeded(dir: &Path, artifact: &Path) -> StageResult {
        let keys = KeyDeriver::default();
        let mut collections = BTreeMap::new();
        collections.insert(
            "structures".to_string(),
            vec![Artifact::new(artifact, "d1", &keys)],
        );
        StageResult {
            task_id: "d1".to_string(),
            stage: StageKind::Design,
            status: TaskStatus::Succeeded,
            failure: None,
            output_dir: dir.to_path_buf(),
            collections,
        }
    }

    #[tokio::test]
    async fn marker_round_trips_while_artifacts_exist() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("d1.cif");
        std::fs::write(&artifact, "data").unwrap();

        let store = CompletionStore::new(true);
        let result = succeeded(tmp.path(), &artifact);
        store.record(&result).await.unwrap();

        let descriptor = TaskDescriptor::new("d1", StageKind::Design);
        assert_eq!(store.lookup(&descriptor, tmp.path()).await, Some(result));

        std::fs::remove_file(&artifact).unwrap();
        assert_eq!(store.lookup(&descriptor, tmp.path()).await, None);
    }

    #[tokio::test]
    async fn marker_for_another_task_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("d1.cif");
        std::fs::write(&artifact, "data").unwrap();

        let store = CompletionStore::new(true);
        store.record(&succeeded(tmp.path(), &artifact)).await.unwrap();

        let other = TaskDescriptor::new("d2", StageKind::Design);
        assert_eq!(store.lookup(&other, tmp.path()).await, None);
        let other_stage = TaskDescriptor::new("d1", StageKind::Refolding);
        assert_eq!(store.lookup(&other_stage, tmp.path()).await, None);
    }

    #[tokio::test]
    async fn disabled_store_never_resumes() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("d1.cif");
        std::fs::write(&artifact, "data").unwrap();
        CompletionStore::new(true)
            .record(&succeeded(tmp.path(), &artifact))
            .await
            .unwrap();

        let descriptor = TaskDescriptor::new("d1", StageKind::Design);
        assert_eq!(CompletionStore::new(false).lookup(&descriptor, tmp.path()).await, None);
    }

    #[tokio::test]
    async fn failed_results_are_never_marked() {
        let tmp = TempDir::new().unwrap();
        let descriptor = TaskDescriptor::new("d1", StageKind::Design);
        let failed = StageResult::failed(&descriptor, tmp.path().to_path_buf(), "boom");

        let store = CompletionStore::new(true);
        store.record(&failed).await.unwrap();
        assert!(!tmp.path().join(MARKER_FILE).exists());
    }
}
