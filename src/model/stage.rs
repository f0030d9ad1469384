// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known artifact collection names shared by stage declarations and
/// default tool output layouts.
pub mod collections {
    pub const STRUCTURES: &str = "structures";
    pub const CONFIDENCE: &str = "confidence";
    pub const SEQUENCES: &str = "sequences";
    pub const POCKETS: &str = "pockets";
    pub const SCORES: &str = "scores";
    pub const HITS: &str = "hits";
    pub const REPORT: &str = "report";
}

/// Every phase a run can contain.
///
/// `Design` is the primary stage and always runs. `PocketDetection` only runs
/// as part of the primary stage in detect-then-generate mode. The remaining
/// kinds are optional and toggled by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    PocketDetection,
    Design,
    SequenceOptimization,
    Refolding,
    InterfaceScoring,
    AffinityPrediction,
    StructuralSearch,
    Consolidation,
}

/// One upstream collection a stage consumes, in the argument order the
/// stage's tool expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageInput {
    pub stage: StageKind,
    pub collection: &'static str,
}

const fn input(stage: StageKind, collection: &'static str) -> StageInput {
    StageInput { stage, collection }
}

impl StageKind {
    /// Optional stages in declaration order.
    pub const OPTIONAL: [StageKind; 6] = [
        StageKind::SequenceOptimization,
        StageKind::Refolding,
        StageKind::InterfaceScoring,
        StageKind::AffinityPrediction,
        StageKind::StructuralSearch,
        StageKind::Consolidation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::PocketDetection => "pocket_detection",
            StageKind::Design => "design",
            StageKind::SequenceOptimization => "sequence_optimization",
            StageKind::Refolding => "refolding",
            StageKind::InterfaceScoring => "interface_scoring",
            StageKind::AffinityPrediction => "affinity_prediction",
            StageKind::StructuralSearch => "structural_search",
            StageKind::Consolidation => "consolidation",
        }
    }

    /// Upstream collections paired to build this stage's tasks.
    ///
    /// The consolidation stage has no paired inputs; it is driven by the
    /// barrier instead.
    pub fn inputs(self) -> &'static [StageInput] {
        use collections::*;
        use StageKind::*;

        const SEQUENCE_OPTIMIZATION: [StageInput; 1] = [input(Design, STRUCTURES)];
        const REFOLDING: [StageInput; 2] = [
            input(Design, STRUCTURES),
            input(SequenceOptimization, SEQUENCES),
        ];
        const INTERFACE_SCORING: [StageInput; 2] =
            [input(Design, STRUCTURES), input(Design, CONFIDENCE)];
        const AFFINITY_PREDICTION: [StageInput; 1] = [input(Design, STRUCTURES)];
        const STRUCTURAL_SEARCH: [StageInput; 1] = [input(Design, STRUCTURES)];

        match self {
            SequenceOptimization => &SEQUENCE_OPTIMIZATION,
            Refolding => &REFOLDING,
            InterfaceScoring => &INTERFACE_SCORING,
            AffinityPrediction => &AFFINITY_PREDICTION,
            StructuralSearch => &STRUCTURAL_SEARCH,
            PocketDetection | Design | Consolidation => &[],
        }
    }

    /// Optional stages that must be enabled for this one to be enabled.
    pub fn prerequisites(self) -> &'static [StageKind] {
        match self {
            StageKind::Refolding => &[StageKind::SequenceOptimization],
            _ => &[],
        }
    }

    /// Distinct upstream stages, in first-use order.
    pub fn dependencies(self) -> Vec<StageKind> {
        let mut deps = Vec::new();
        for input in self.inputs() {
            if !deps.contains(&input.stage) {
                deps.push(input.stage);
            }
        }
        deps
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refolding_depends_on_design_and_sequence_optimization() {
        assert_eq!(
            StageKind::Refolding.dependencies(),
            vec![StageKind::Design, StageKind::SequenceOptimization]
        );
        assert_eq!(
            StageKind::Refolding.prerequisites(),
            &[StageKind::SequenceOptimization]
        );
    }

    #[test]
    fn interface_scoring_pairs_two_design_collections() {
        let inputs = StageKind::InterfaceScoring.inputs();
        assert_eq!(inputs.len(), 2);
        assert_eq!(StageKind::InterfaceScoring.dependencies(), vec![StageKind::Design]);
        assert_eq!(inputs[0].collection, collections::STRUCTURES);
        assert_eq!(inputs[1].collection, collections::CONFIDENCE);
    }

    #[test]
    fn serde_names_match_display() {
        for kind in StageKind::OPTIONAL {
            let yaml = serde_yaml::to_string(&kind).unwrap();
            assert_eq!(yaml.trim(), kind.as_str());
        }
    }
}
