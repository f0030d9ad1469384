// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pre-flight validation of a run configuration.
//!
//! Every check runs and every problem is collected, so a rejected
//! configuration reports all of its errors at once. Nothing is dispatched
//! until validation passes.
//!
//! # Checks
//!
//! 1. **Entry mode**: the input section matches exactly one mode signature
//! 2. **Sweep**: positive step, `min <= max`, at least one variant per value
//! 3. **Stage keys**: only optional stages appear under `stages`
//! 4. **Prerequisites**: every enabled stage has its prerequisites enabled
//! 5. **Tools**: every enabled stage other than consolidation names a tool
//! 6. **Capacity**: every tool's resource class has at least one slot
//! 7. **Derived keys**: every suffix pattern is a valid regular expression
//! 8. **Ids**: task and target ids are unique, use only letters, digits, `_`
//!    and `-`, are not reserved, and survive key derivation unchanged
//!
//! # Example
//! ```rust
//! use the_bindery::config::{validate_run_config, RunConfig};
//!
//! let yaml = r#"
//! output_dir: out
//! input:
//!   tasks:
//!     - id: d1
//!     - id: d1
//! design:
//!   tool: { command: boltzgen }
//! "#;
//! let cfg: RunConfig = serde_yaml::from_str(yaml).unwrap();
//!
//! let errors = validate_run_config(&cfg).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! ```

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

use crate::config::consts::CONSOLIDATION_TASK_ID;
use crate::config::{RunConfig, ToolConfig};
use crate::engine::{resolve_mode, InputShape};
use crate::errors::ConfigurationError;
use crate::model::{KeyDeriver, StageKind};
use crate::observability::messages::validation::{ConfigurationRejected, ConfigurationValidated};
use crate::observability::messages::StructuredLog;

/// Validate a run configuration. Returns every problem found.
pub fn validate_run_config(cfg: &RunConfig) -> Result<(), Vec<ConfigurationError>> {
    let mut errors = Vec::new();

    let mode = match resolve_mode(InputShape::of(&cfg.input), cfg.input.mode) {
        Ok(mode) => Some(mode),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    if let Some(sweep) = &cfg.input.sweep {
        if let Err(e) = sweep.validate() {
            errors.push(e);
        }
    }

    validate_stage_keys(cfg, &mut errors);
    validate_prerequisites(cfg, &mut errors);
    validate_tools(cfg, &mut errors);
    validate_key_patterns(cfg, &mut errors);
    validate_tasks(cfg, &mut errors);

    if errors.is_empty() {
        ConfigurationValidated {
            mode: mode.map(|m| m.as_str()).unwrap_or_default(),
            enabled_stages: &cfg.enabled_stages(),
        }
        .log();
        Ok(())
    } else {
        ConfigurationRejected {
            error_count: errors.len(),
        }
        .log();
        Err(errors)
    }
}

fn validate_stage_keys(cfg: &RunConfig, errors: &mut Vec<ConfigurationError>) {
    for stage in cfg.stages.keys() {
        if !StageKind::OPTIONAL.contains(stage) {
            errors.push(ConfigurationError::NotOptionalStage { stage: *stage });
        }
    }
}

fn validate_prerequisites(cfg: &RunConfig, errors: &mut Vec<ConfigurationError>) {
    for stage in cfg.enabled_stages() {
        for prerequisite in stage.prerequisites() {
            if !cfg.is_enabled(*prerequisite) {
                errors.push(ConfigurationError::MissingPrerequisite {
                    stage,
                    prerequisite: *prerequisite,
                });
            }
        }
    }
}

fn validate_tools(cfg: &RunConfig, errors: &mut Vec<ConfigurationError>) {
    let mut check_capacity = |stage: StageKind, tool: &ToolConfig| {
        if cfg.resources.slots(tool.resource_class) == 0 {
            errors.push(ConfigurationError::NoCapacity {
                stage,
                class: tool.resource_class.to_string(),
            });
        }
    };

    check_capacity(StageKind::Design, &cfg.design.tool);
    if let Some(detection) = &cfg.input.pocket_detection {
        check_capacity(StageKind::PocketDetection, &detection.tool);
    }

    let mut missing = Vec::new();
    for stage in cfg.enabled_stages() {
        match cfg.stage(stage).and_then(|s| s.tool.as_ref()) {
            Some(tool) => check_capacity(stage, tool),
            None if stage == StageKind::Consolidation => {}
            None => missing.push(ConfigurationError::MissingTool { stage }),
        }
    }
    errors.extend(missing);
}

fn validate_key_patterns(cfg: &RunConfig, errors: &mut Vec<ConfigurationError>) {
    for pattern in cfg.derived_key.patterns() {
        if let Err(source) = Regex::new(&format!("(?:{})$", pattern)) {
            errors.push(ConfigurationError::InvalidKeyPattern { pattern, source });
        }
    }
}

fn validate_tasks(cfg: &RunConfig, errors: &mut Vec<ConfigurationError>) {
    let keys = KeyDeriver::new(cfg.derived_key.patterns()).ok();

    if let Some(target) = &cfg.input.target {
        if let Err(e) = check_id(&target.id, keys.as_ref()) {
            errors.push(e);
        }
    }

    let Some(tasks) = &cfg.input.tasks else {
        return;
    };

    let mut seen = HashSet::new();
    for task in tasks {
        if let Err(e) = check_id(&task.id, keys.as_ref()) {
            errors.push(e);
        }
        if !seen.insert(task.id.as_str()) {
            errors.push(ConfigurationError::DuplicateTaskId {
                id: task.id.clone(),
            });
        }
        for (name, path) in &task.inputs {
            if path.as_os_str().is_empty() {
                errors.push(ConfigurationError::InvalidTask {
                    task: task.id.clone(),
                    name: name.clone(),
                    reason: "path is empty".to_string(),
                });
            }
        }
    }
}

/// Ids become directory names and artifact base names, and artifacts are
/// joined on the key derived from those names.
fn check_id(id: &str, keys: Option<&KeyDeriver>) -> Result<(), ConfigurationError> {
    let invalid = |reason: &str| ConfigurationError::InvalidId {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("id must not be empty"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(invalid("only ASCII letters, digits, '_' and '-' are allowed"));
    }
    if id == CONSOLIDATION_TASK_ID {
        return Err(invalid("reserved for the consolidation task"));
    }
    if let Some(keys) = keys {
        if keys.derive(Path::new(id)) != id {
            return Err(invalid("ends in a derived-key suffix"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> RunConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    const TARGET_SWEEP: &str = r#"
output_dir: out
input:
  target: { id: egfr, path: egfr.cif }
  sweep: { min: 60, max: 120, step: 20 }
design:
  tool: { command: boltzgen, resource_class: accelerator }
"#;

    #[test]
    fn valid_configuration_passes() {
        assert!(validate_run_config(&parse(TARGET_SWEEP)).is_ok());
    }

    #[test]
    fn refolding_without_sequence_optimization_is_rejected() {
        let yaml = format!(
            "{}stages:\n  refolding:\n    enabled: true\n    tool: {{ command: af3 }}\n",
            TARGET_SWEEP
        );
        let errors = validate_run_config(&parse(&yaml)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            ConfigurationError::MissingPrerequisite {
                stage: StageKind::Refolding,
                prerequisite: StageKind::SequenceOptimization,
            }
        ));
    }

    #[test]
    fn every_problem_is_reported() {
        let yaml = r#"
output_dir: out
resources: { cpu: 2, accelerator: 0 }
derived_key:
  suffixes: ["_model_(\\d+"]
input:
  target: { id: egfr, path: egfr.cif }
  sweep: { min: 120, max: 60, step: 20 }
design:
  tool: { command: boltzgen, resource_class: accelerator }
stages:
  design: { enabled: true }
  interface_scoring: { enabled: true }
  consolidation: { enabled: true }
"#;
        let errors = validate_run_config(&parse(yaml)).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ConfigurationError::InvalidSweep { .. })));
        assert!(errors.iter().any(|e| matches!(e, ConfigurationError::NotOptionalStage { stage: StageKind::Design })));
        assert!(errors.iter().any(|e| matches!(e, ConfigurationError::NoCapacity { stage: StageKind::Design, .. })));
        assert!(errors.iter().any(|e| matches!(e, ConfigurationError::MissingTool { stage: StageKind::InterfaceScoring })));
        assert!(errors.iter().any(|e| matches!(e, ConfigurationError::InvalidKeyPattern { .. })));
        assert!(!errors.iter().any(|e| matches!(e, ConfigurationError::MissingTool { stage: StageKind::Consolidation })));
    }

    #[test]
    fn ambiguous_input_is_rejected() {
        let yaml = r#"
output_dir: out
input:
  tasks: [{ id: d1 }]
  target: { id: egfr, path: egfr.cif }
  sweep: { min: 60, max: 60, step: 1 }
design:
  tool: { command: boltzgen }
"#;
        let errors = validate_run_config(&parse(yaml)).unwrap_err();
        assert!(matches!(errors[0], ConfigurationError::NoModeMatched { .. }));
    }

    #[test]
    fn duplicate_and_empty_task_ids_are_rejected() {
        let yaml = r#"
output_dir: out
input:
  tasks:
    - id: d1
    - id: d1
    - id: ""
      inputs: { target: "" }
design:
  tool: { command: boltzgen }
"#;
        let errors = validate_run_config(&parse(yaml)).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(&errors[0], ConfigurationError::DuplicateTaskId { id } if id == "d1"));
        assert!(matches!(&errors[1], ConfigurationError::InvalidId { id, .. } if id.is_empty()));
    }

    #[test]
    fn ids_must_survive_key_derivation_and_stay_inside_the_output_root() {
        let yaml = r#"
output_dir: out
input:
  tasks:
    - id: egfr.1
    - id: egfr.2
    - id: ../escape
    - id: nested/dir
    - id: pdl1_model_3
    - id: consolidation
    - id: pdl1-helix_80
design:
  tool: { command: boltzgen }
"#;
        let errors = validate_run_config(&parse(yaml)).unwrap_err();
        let rejected: Vec<&str> = errors
            .iter()
            .filter_map(|e| match e {
                ConfigurationError::InvalidId { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            rejected,
            vec!["egfr.1", "egfr.2", "../escape", "nested/dir", "pdl1_model_3", "consolidation"]
        );
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn target_id_is_checked_with_configured_suffixes() {
        let yaml = r#"
output_dir: out
derived_key:
  suffixes: ["_rank\\d+"]
input:
  target: { id: egfr_rank1, path: egfr.cif }
  sweep: { min: 60, max: 120, step: 20 }
design:
  tool: { command: boltzgen }
"#;
        let errors = validate_run_config(&parse(yaml)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ConfigurationError::InvalidId { id, .. } if id == "egfr_rank1"));
    }
}
