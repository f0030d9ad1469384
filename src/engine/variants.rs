// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::config::consts::{DEFAULT_SWEEP_PARAMETER, VARIANT_INDEX_PARAM};
use crate::errors::ConfigurationError;
use crate::model::{StageKind, TaskDescriptor};

/// Integer parameter sweep applied to a base descriptor.
///
/// # Example
/// ```yaml
/// sweep:
///   parameter: length
///   min: 60
///   max: 120
///   step: 20
///   variants_per_value: 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSpec {
    #[serde(default = "default_parameter")]
    pub parameter: String,
    pub min: i64,
    pub max: i64,
    pub step: i64,
    #[serde(default = "default_variants_per_value")]
    pub variants_per_value: usize,
}

fn default_parameter() -> String {
    DEFAULT_SWEEP_PARAMETER.to_string()
}

fn default_variants_per_value() -> usize {
    1
}

impl SweepSpec {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let reason = if self.step <= 0 {
            Some(format!("step must be positive, got {}", self.step))
        } else if self.min > self.max {
            Some(format!("min {} is greater than max {}", self.min, self.max))
        } else if self.variants_per_value == 0 {
            Some("variants_per_value must be at least 1".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ConfigurationError::InvalidSweep {
                parameter: self.parameter.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Swept values from `min` in `step` increments; `max` is always the last
    /// value even when it does not land on a step boundary.
    pub fn values(&self) -> Vec<i64> {
        let mut values = Vec::new();
        if self.step <= 0 || self.min > self.max {
            return values;
        }

        let mut value = self.min;
        while value < self.max {
            values.push(value);
            match value.checked_add(self.step) {
                Some(next) => value = next,
                None => break,
            }
        }
        values.push(self.max);
        values
    }

    pub fn descriptor_count(&self) -> usize {
        self.values().len() * self.variants_per_value
    }
}

/// Expands one base descriptor into the full sweep.
#[derive(Debug, Clone)]
pub struct VariantGenerator {
    sweep: SweepSpec,
}

impl VariantGenerator {
    pub fn new(sweep: SweepSpec) -> Result<Self, ConfigurationError> {
        sweep.validate()?;
        Ok(Self { sweep })
    }

    pub fn sweep(&self) -> &SweepSpec {
        &self.sweep
    }

    pub fn generate(&self, base: &TaskDescriptor) -> Vec<TaskDescriptor> {
        let mut variants = Vec::with_capacity(self.sweep.descriptor_count());
        for value in self.sweep.values() {
            for index in 0..self.sweep.variants_per_value {
                let variant = TaskDescriptor::new(
                    format!("{}_v{}_{}", base.id(), value, index),
                    StageKind::Design,
                )
                .with_parent(base.id())
                .with_params(base.params().clone())
                .with_inputs(base.inputs().clone())
                .with_param(self.sweep.parameter.as_str(), value)
                .with_param(VARIANT_INDEX_PARAM, index as i64);
                variants.push(variant);
            }
        }
        variants
    }
}
