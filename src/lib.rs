// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // tool backends
pub mod config;     // run configuration + runtime builder
pub mod engine;     // dispatch, pairing, stages, barrier
pub mod errors;     // error handling
pub mod model;      // descriptors, artifacts, results, lineage
pub mod observability;
pub mod traits;     // unified abstractions
