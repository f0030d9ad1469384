// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod barrier;
pub mod composer;
pub mod consolidation;
pub mod dispatcher;
pub mod mode;
pub mod pairing;
pub mod pool;
pub mod report;
pub mod resume;
pub mod stages;
pub mod variants;
#[cfg(test)]
mod integration_tests;

pub use barrier::{BarrierSignaller, ConsolidationBarrier};
pub use composer::{RunOutcome, StageComposer};
pub use consolidation::DesignTableAggregator;
pub use dispatcher::{TaskDispatcher, TaskTemplate};
pub use mode::{resolve_mode, InputShape, Mode};
pub use pairing::{pair, PairedInputs, Pairing};
pub use pool::{ResourceClass, ResourcePool};
pub use report::{RunReport, StageSummary, TaskReport};
pub use resume::CompletionStore;
pub use stages::{DesignInput, DesignStage, PairedStage};
pub use variants::{SweepSpec, VariantGenerator};
