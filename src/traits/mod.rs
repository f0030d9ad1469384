// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod aggregator;
pub mod stage;
pub mod tool;

pub use aggregator::Aggregator;
pub use stage::{Stage, StageContext};
pub use tool::{Tool, ToolFactory, ToolInvocation};
