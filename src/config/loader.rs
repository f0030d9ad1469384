// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::consts::{
    default_outputs, DEFAULT_ACCELERATOR_SLOTS, DEFAULT_CPU_SLOTS, DEFAULT_KEY_SUFFIXES,
    DEFAULT_WATCHDOG_SECONDS,
};
use crate::engine::{Mode, ResourceClass, SweepSpec};
use crate::errors::ConfigurationError;
use crate::model::{CollectionSpec, Params, StageKind};

/// Complete configuration of one run.
///
/// Loaded once from YAML, validated, and never changed afterwards. Which
/// optional stages run is decided here and nowhere else.
///
/// # Example
/// ```yaml
/// output_dir: results/egfr
/// watchdog_seconds: 7200
/// resources:
///   cpu: 8
///   accelerator: 1
/// input:
///   target:
///     id: egfr
///     path: inputs/egfr.cif
///   sweep:
///     min: 60
///     max: 120
///     step: 20
///     variants_per_value: 3
/// design:
///   tool:
///     command: boltzgen
///     args: ["run", "{input.target}", "--length", "{param.length}", "--out", "{output_dir}"]
///     resource_class: accelerator
/// stages:
///   interface_scoring:
///     enabled: true
///     tool:
///       command: ipsae
///       args: ["{input.structures}", "{input.confidence}", "{output_dir}/primary"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    #[serde(default = "default_watchdog_seconds")]
    pub watchdog_seconds: u64,
    #[serde(default = "default_resume")]
    pub resume: bool,
    #[serde(default)]
    pub resources: ResourceConfig,
    #[serde(default)]
    pub derived_key: DerivedKeyConfig,
    pub input: InputConfig,
    pub design: DesignConfig,
    #[serde(default)]
    pub stages: BTreeMap<StageKind, StageConfig>,
}

fn default_watchdog_seconds() -> u64 {
    DEFAULT_WATCHDOG_SECONDS
}

fn default_resume() -> bool {
    true
}

impl RunConfig {
    pub fn watchdog(&self) -> Duration {
        Duration::from_secs(self.watchdog_seconds)
    }

    pub fn stage(&self, kind: StageKind) -> Option<&StageConfig> {
        self.stages.get(&kind)
    }

    pub fn is_enabled(&self, kind: StageKind) -> bool {
        self.stage(kind).map(|s| s.enabled).unwrap_or(false)
    }

    /// Enabled optional stages, in declaration order.
    pub fn enabled_stages(&self) -> Vec<StageKind> {
        StageKind::OPTIONAL
            .into_iter()
            .filter(|k| self.is_enabled(*k))
            .collect()
    }
}

/// Slot counts per resource class.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResourceConfig {
    #[serde(default = "default_cpu_slots")]
    pub cpu: usize,
    #[serde(default = "default_accelerator_slots")]
    pub accelerator: usize,
}

fn default_cpu_slots() -> usize {
    DEFAULT_CPU_SLOTS
}

fn default_accelerator_slots() -> usize {
    DEFAULT_ACCELERATOR_SLOTS
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            cpu: DEFAULT_CPU_SLOTS,
            accelerator: DEFAULT_ACCELERATOR_SLOTS,
        }
    }
}

impl ResourceConfig {
    pub fn slots(&self, class: ResourceClass) -> usize {
        match class {
            ResourceClass::Cpu => self.cpu,
            ResourceClass::Accelerator => self.accelerator,
        }
    }
}

/// Suffix patterns (regular expressions) stripped from artifact base names.
/// Setting `suffixes` replaces the built-in list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DerivedKeyConfig {
    pub suffixes: Option<Vec<String>>,
}

impl DerivedKeyConfig {
    pub fn patterns(&self) -> Vec<String> {
        match &self.suffixes {
            Some(suffixes) => suffixes.clone(),
            None => DEFAULT_KEY_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The input section. Its shape alone selects the entry mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputConfig {
    pub mode: Option<Mode>,
    pub tasks: Option<Vec<TaskSpec>>,
    pub target: Option<TargetSpec>,
    pub sweep: Option<SweepSpec>,
    pub pocket_detection: Option<PocketDetectionConfig>,
}

/// One pre-specified design task.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSpec {
    pub id: String,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub inputs: BTreeMap<String, PathBuf>,
}

/// The target structure a sweep is generated from.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSpec {
    pub id: String,
    pub path: PathBuf,
    #[serde(default)]
    pub params: Params,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PocketDetectionConfig {
    pub tool: ToolConfig,
    pub outputs: Option<Vec<CollectionSpec>>,
}

impl PocketDetectionConfig {
    pub fn outputs(&self) -> Vec<CollectionSpec> {
        self.outputs
            .clone()
            .unwrap_or_else(|| default_outputs(StageKind::PocketDetection))
    }
}

/// How one external tool is invoked.
///
/// `args`, `command` and `env` values may contain the placeholders
/// `{task_id}`, `{output_dir}`, `{stage}`, `{param.NAME}` and `{input.NAME}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub resource_class: ResourceClass,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DesignConfig {
    pub tool: ToolConfig,
    #[serde(default)]
    pub params: Params,
    pub outputs: Option<Vec<CollectionSpec>>,
}

impl DesignConfig {
    pub fn outputs(&self) -> Vec<CollectionSpec> {
        self.outputs
            .clone()
            .unwrap_or_else(|| default_outputs(StageKind::Design))
    }
}

/// One optional stage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageConfig {
    #[serde(default)]
    pub enabled: bool,
    pub tool: Option<ToolConfig>,
    #[serde(default)]
    pub params: Params,
    pub outputs: Option<Vec<CollectionSpec>>,
    #[serde(default)]
    pub required_resources: Vec<PathBuf>,
}

impl StageConfig {
    pub fn outputs(&self, kind: StageKind) -> Vec<CollectionSpec> {
        self.outputs.clone().unwrap_or_else(|| default_outputs(kind))
    }
}

/// Load a run configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, ConfigurationError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: RunConfig = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load a run configuration and run every pre-flight check on it.
///
/// All problems are reported together in `ConfigurationError::Rejected`.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, ConfigurationError> {
    let cfg = load_config(path)?;
    crate::config::validate_run_config(&cfg)
        .map_err(|errors| ConfigurationError::Rejected { errors })?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OutputSubdir, ParamValue};

    #[test]
    fn parse_minimal_config() {
        let yaml = r#"
output_dir: out
input:
  tasks:
    - id: d1
      params: { length: 80, binder_type: protein, temperature: 0.1, cyclic: false }
      inputs: { target: inputs/egfr.cif }
design:
  tool:
    command: boltzgen
"#;
        let cfg: RunConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.watchdog_seconds, DEFAULT_WATCHDOG_SECONDS);
        assert!(cfg.resume);
        assert_eq!(cfg.resources.cpu, DEFAULT_CPU_SLOTS);
        assert!(cfg.enabled_stages().is_empty());

        let task = &cfg.input.tasks.as_ref().unwrap()[0];
        assert_eq!(task.params["length"], ParamValue::Int(80));
        assert_eq!(task.params["temperature"], ParamValue::Float(0.1));
        assert_eq!(task.params["cyclic"], ParamValue::Bool(false));
        assert_eq!(task.params["binder_type"], ParamValue::from("protein"));
        assert_eq!(cfg.design.tool.resource_class, ResourceClass::Cpu);
        assert_eq!(cfg.design.outputs()[0].subdir, OutputSubdir::Primary);
    }

    #[test]
    fn parse_stage_section() {
        let yaml = r#"
output_dir: out
input:
  target: { id: egfr, path: egfr.cif }
  sweep: { min: 60, max: 120, step: 20 }
design:
  tool: { command: boltzgen, resource_class: accelerator }
stages:
  structural_search:
    enabled: true
    tool: { command: foldseek, args: ["easy-search", "{input.structures}"] }
    required_resources: [/data/afdb]
    outputs:
      - name: hits
        patterns: ["*.m8"]
  refolding:
    enabled: false
"#;
        let cfg: RunConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.enabled_stages(), vec![StageKind::StructuralSearch]);

        let search = cfg.stage(StageKind::StructuralSearch).unwrap();
        assert_eq!(search.required_resources, vec![PathBuf::from("/data/afdb")]);
        assert_eq!(search.outputs(StageKind::StructuralSearch)[0].patterns, vec!["*.m8"]);
        assert!(!search.outputs(StageKind::StructuralSearch)[0].required);
        assert_eq!(cfg.input.sweep.as_ref().unwrap().parameter, "length");
        assert_eq!(cfg.input.sweep.as_ref().unwrap().variants_per_value, 1);
    }

    #[test]
    fn unknown_stage_name_is_a_parse_error() {
        let yaml = r#"
output_dir: out
input: { tasks: [] }
design: { tool: { command: x } }
stages:
  docking: { enabled: true }
"#;
        assert!(serde_yaml::from_str::<RunConfig>(yaml).is_err());
    }

    #[test]
    fn unreadable_file_is_reported_with_its_path() {
        let err = load_config("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigurationError::Unreadable { .. }));
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }
}
