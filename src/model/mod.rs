// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Immutable records that flow through a run.
//!
//! Everything in here is created once and never mutated afterwards:
//! descriptors are built by the variant generator or the composer, artifacts
//! are discovered by the dispatcher, and results are terminal.

mod artifact;
mod collection;
mod descriptor;
mod lineage;
mod result;
mod stage;

pub use artifact::{Artifact, KeyDeriver};
pub use collection::{CollectionSpec, OutputSubdir};
pub use descriptor::{ParamValue, Params, TaskDescriptor};
pub use lineage::{LineageForest, LineageRecord};
pub use result::{
    Consolidation, PairingGap, StageOutput, StageResult, StageStatus, TaskStatus,
};
pub use stage::{collections, StageInput, StageKind};
