// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fan-in of independently produced artifact collections.
//!
//! Each collection is reduced to a key -> artifact map, the key sets are
//! intersected, and one tuple is emitted per common key with its artifacts in
//! the order the collections were given. Tuples are sorted by key so the
//! result never depends on the order artifacts were discovered in.
//!
//! Keys missing from some collections and duplicate keys inside a collection
//! are reported as `PairingGap` diagnostics rather than errors.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::consts::GAP_SAMPLE_SIZE;
use crate::model::{Artifact, PairingGap};

/// Artifacts sharing one derived key, one per input collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedInputs<'a> {
    pub key: String,
    pub artifacts: Vec<&'a Artifact>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pairing<'a> {
    pub tuples: Vec<PairedInputs<'a>>,
    pub gaps: Vec<PairingGap>,
}

/// Pair named collections by derived key.
///
/// When a collection holds several artifacts with the same key, the one with
/// the lexicographically smallest path wins.
pub fn pair<'a>(collections: &[(String, Vec<&'a Artifact>)]) -> Pairing<'a> {
    if collections.is_empty() {
        return Pairing::default();
    }

    let mut by_key: Vec<BTreeMap<&'a str, &'a Artifact>> = Vec::with_capacity(collections.len());
    let mut duplicates = Vec::with_capacity(collections.len());

    for (_, artifacts) in collections {
        let mut map: BTreeMap<&'a str, &'a Artifact> = BTreeMap::new();
        let mut dupes = 0;
        for &artifact in artifacts {
            match map.get(artifact.key.as_str()) {
                Some(&existing) => {
                    dupes += 1;
                    if artifact.path < existing.path {
                        map.insert(artifact.key.as_str(), artifact);
                    }
                }
                None => {
                    map.insert(artifact.key.as_str(), artifact);
                }
            }
        }
        by_key.push(map);
        duplicates.push(dupes);
    }

    let all_keys: BTreeSet<&str> = by_key.iter().flat_map(|m| m.keys().copied()).collect();

    let tuples = all_keys
        .iter()
        .filter_map(|key| {
            let artifacts: Option<Vec<&'a Artifact>> =
                by_key.iter().map(|m| m.get(key).copied()).collect();
            artifacts.map(|artifacts| PairedInputs {
                key: key.to_string(),
                artifacts,
            })
        })
        .collect();

    let gaps = collections
        .iter()
        .zip(by_key.iter().zip(duplicates))
        .filter_map(|((name, _), (map, duplicates))| {
            let missing: Vec<&str> = all_keys
                .iter()
                .copied()
                .filter(|k| !map.contains_key(k))
                .collect();
            if missing.is_empty() && duplicates == 0 {
                return None;
            }
            Some(PairingGap {
                collection: name.clone(),
                missing_keys: missing.len(),
                sample: missing
                    .iter()
                    .take(GAP_SAMPLE_SIZE)
                    .map(|k| k.to_string())
                    .collect(),
                duplicates,
            })
        })
        .collect();

    Pairing { tuples, gaps }
}
