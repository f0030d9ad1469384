// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::ExecutionError;
use crate::model::{Consolidation, StageOutput};

/// Runs once the consolidation barrier has heard from every expected stage.
#[async_trait]
pub trait Aggregator: Send + Sync {
    async fn aggregate(
        &self,
        outputs: Vec<Arc<StageOutput>>,
    ) -> Result<Consolidation, ExecutionError>;
}
