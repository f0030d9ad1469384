// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::engine::TaskDispatcher;
use crate::errors::ExecutionError;
use crate::model::{StageKind, StageOutput};

/// Read-only view a stage gets when it is scheduled.
///
/// `upstream` holds the terminal output of every stage in earlier levels, so a
/// stage sees all results of its dependencies.
#[derive(Clone)]
pub struct StageContext {
    pub upstream: BTreeMap<StageKind, Arc<StageOutput>>,
    pub dispatcher: Arc<TaskDispatcher>,
}

impl StageContext {
    pub fn upstream(&self, kind: StageKind) -> Result<&StageOutput, ExecutionError> {
        self.upstream.get(&kind).map(Arc::as_ref).ok_or_else(|| {
            ExecutionError::Internal(format!("upstream stage '{}' has not run", kind))
        })
    }
}

/// One node of the stage graph.
#[async_trait]
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    fn dependencies(&self) -> Vec<StageKind> {
        self.kind().dependencies()
    }

    /// Produce this stage's descriptors, dispatch them, and return once every
    /// task reached a terminal status.
    async fn run(&self, ctx: StageContext) -> Result<StageOutput, ExecutionError>;
}
