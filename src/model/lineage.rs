// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Params, StageKind, TaskDescriptor};
use crate::errors::LineageError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub stage: StageKind,
    #[serde(default)]
    pub attributes: Params,
}

/// Append-only forest of descriptor ancestry.
///
/// A record may only name a parent that was recorded strictly earlier, so the
/// insertion order is always a valid topological order of the forest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineageForest {
    records: Vec<LineageRecord>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl LineageForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, descriptor: &TaskDescriptor) -> Result<(), LineageError> {
        if self.index.contains_key(descriptor.id()) {
            return Err(LineageError::DuplicateId {
                id: descriptor.id().to_string(),
            });
        }
        if let Some(parent) = descriptor.parent_id() {
            if !self.index.contains_key(parent) {
                return Err(LineageError::UnknownParent {
                    id: descriptor.id().to_string(),
                    parent_id: parent.to_string(),
                });
            }
        }

        self.index
            .insert(descriptor.id().to_string(), self.records.len());
        self.records.push(LineageRecord {
            id: descriptor.id().to_string(),
            parent_id: descriptor.parent_id().map(str::to_string),
            stage: descriptor.stage(),
            attributes: descriptor.params().clone(),
        });
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&LineageRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// Parent chain from the immediate parent up to the root.
    pub fn ancestors(&self, id: &str) -> Vec<&LineageRecord> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|r| r.parent_id.as_deref());
        while let Some(parent) = current {
            match self.get(parent) {
                Some(record) => {
                    chain.push(record);
                    current = record.parent_id.as_deref();
                }
                None => break,
            }
        }
        chain
    }

    pub fn children(&self, id: &str) -> Vec<&LineageRecord> {
        self.records
            .iter()
            .filter(|r| r.parent_id.as_deref() == Some(id))
            .collect()
    }

    pub fn roots(&self) -> impl Iterator<Item = &LineageRecord> {
        self.records.iter().filter(|r| r.parent_id.is_none())
    }

    pub fn records(&self) -> &[LineageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
