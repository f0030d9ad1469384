// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::StageKind;

/// A scalar parameter value carried by a task descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// Named parameter bag, ordered so serialized reports are stable.
pub type Params = BTreeMap<String, ParamValue>;

/// Immutable description of one unit of work.
///
/// Descriptors are assembled with the consuming `with_*` methods and are never
/// changed once handed to the dispatcher or recorded in the lineage forest.
///
/// # Example
/// ```
/// use the_bindery::model::{StageKind, TaskDescriptor};
///
/// let base = TaskDescriptor::new("egfr", StageKind::Design)
///     .with_param("binder_type", "protein")
///     .with_input("target", "inputs/egfr.cif");
///
/// let child = TaskDescriptor::new("egfr_v60_0", StageKind::Design)
///     .with_parent(base.id())
///     .with_params(base.params().clone())
///     .with_param("length", 60);
///
/// assert_eq!(child.parent_id(), Some("egfr"));
/// assert_eq!(child.param("length").unwrap().to_string(), "60");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    id: String,
    parent_id: Option<String>,
    stage: StageKind,
    #[serde(default)]
    params: Params,
    #[serde(default)]
    inputs: BTreeMap<String, PathBuf>,
}

impl TaskDescriptor {
    pub fn new(id: impl Into<String>, stage: StageKind) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            stage,
            params: Params::new(),
            inputs: BTreeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_input(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.inputs.insert(name.into(), path.into());
        self
    }

    pub fn with_inputs(mut self, inputs: BTreeMap<String, PathBuf>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn stage(&self) -> StageKind {
        self.stage
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn inputs(&self) -> &BTreeMap<String, PathBuf> {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&Path> {
        self.inputs.get(name).map(PathBuf::as_path)
    }
}
