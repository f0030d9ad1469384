// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::InputConfig;
use crate::errors::ConfigurationError;

/// Entry strategy selected from the shape of the input section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    PreSpecified,
    GenerateFromTarget,
    DetectThenGenerate,
}

impl Mode {
    pub const ALL: [Mode; 3] = [
        Mode::PreSpecified,
        Mode::GenerateFromTarget,
        Mode::DetectThenGenerate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::PreSpecified => "pre_specified",
            Mode::GenerateFromTarget => "generate_from_target",
            Mode::DetectThenGenerate => "detect_then_generate",
        }
    }

    /// The exact input shape this mode accepts.
    pub fn signature(self) -> InputShape {
        match self {
            Mode::PreSpecified => InputShape {
                tasks: true,
                target: false,
                sweep: false,
                pocket_detection: false,
            },
            Mode::GenerateFromTarget => InputShape {
                tasks: false,
                target: true,
                sweep: true,
                pocket_detection: false,
            },
            Mode::DetectThenGenerate => InputShape {
                tasks: false,
                target: true,
                sweep: true,
                pocket_detection: true,
            },
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which input sections are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputShape {
    pub tasks: bool,
    pub target: bool,
    pub sweep: bool,
    pub pocket_detection: bool,
}

impl InputShape {
    pub fn of(input: &InputConfig) -> Self {
        Self {
            tasks: input.tasks.is_some(),
            target: input.target.is_some(),
            sweep: input.sweep.is_some(),
            pocket_detection: input.pocket_detection.is_some(),
        }
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present: Vec<&str> = [
            ("tasks", self.tasks),
            ("target", self.target),
            ("sweep", self.sweep),
            ("pocket_detection", self.pocket_detection),
        ]
        .iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| *name)
        .collect();

        if present.is_empty() {
            f.write_str("nothing")
        } else {
            f.write_str(&present.join(", "))
        }
    }
}

/// Pick the single mode whose signature matches `shape`.
///
/// An explicit `requested` mode must agree with the detected one; it never
/// overrides the shape.
pub fn resolve_mode(shape: InputShape, requested: Option<Mode>) -> Result<Mode, ConfigurationError> {
    let candidates: Vec<Mode> = Mode::ALL
        .into_iter()
        .filter(|m| m.signature() == shape)
        .collect();

    let detected = match candidates.as_slice() {
        [] => {
            return Err(ConfigurationError::NoModeMatched {
                found: shape.to_string(),
            })
        }
        [only] => *only,
        many => {
            return Err(ConfigurationError::AmbiguousMode {
                candidates: many.iter().map(|m| m.to_string()).collect(),
            })
        }
    };

    match requested {
        Some(requested) if requested != detected => Err(ConfigurationError::ModeOverrideConflict {
            requested: requested.to_string(),
            detected: detected.to_string(),
        }),
        _ => Ok(detected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(tasks: bool, target: bool, sweep: bool, pocket_detection: bool) -> InputShape {
        InputShape {
            tasks,
            target,
            sweep,
            pocket_detection,
        }
    }

    #[test]
    fn each_signature_resolves_to_its_mode() {
        for mode in Mode::ALL {
            assert_eq!(resolve_mode(mode.signature(), None).unwrap(), mode);
        }
    }

    #[test]
    fn empty_input_matches_nothing() {
        let err = resolve_mode(InputShape::default(), None).unwrap_err();
        assert!(matches!(err, ConfigurationError::NoModeMatched { .. }));
    }

    #[test]
    fn mixed_shapes_are_rejected() {
        assert!(resolve_mode(shape(true, true, true, false), None).is_err());
        assert!(resolve_mode(shape(false, true, false, false), None).is_err());
        assert!(resolve_mode(shape(false, false, true, true), None).is_err());
    }

    #[test]
    fn agreeing_override_is_accepted() {
        let mode = resolve_mode(shape(false, true, true, false), Some(Mode::GenerateFromTarget));
        assert_eq!(mode.unwrap(), Mode::GenerateFromTarget);
    }

    #[test]
    fn conflicting_override_is_rejected() {
        let err = resolve_mode(shape(true, false, false, false), Some(Mode::DetectThenGenerate))
            .unwrap_err();
        match err {
            ConfigurationError::ModeOverrideConflict {
                requested,
                detected,
            } => {
                assert_eq!(requested, "detect_then_generate");
                assert_eq!(detected, "pre_specified");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
