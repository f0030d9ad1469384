// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::{collections, CollectionSpec, OutputSubdir, StageKind};

/// Default CPU slots when the run configuration does not set `resources.cpu`
pub const DEFAULT_CPU_SLOTS: usize = 4;
/// Default accelerator slots (one device)
pub const DEFAULT_ACCELERATOR_SLOTS: usize = 1;
/// Default barrier watchdog: 24 hours without a stage finishing
pub const DEFAULT_WATCHDOG_SECONDS: u64 = 24 * 60 * 60;

pub const DEFAULT_SWEEP_PARAMETER: &str = "length";
pub const VARIANT_INDEX_PARAM: &str = "variant_index";
pub const KEY_PARAM: &str = "key";
pub const POCKET_PARAM: &str = "pocket";
pub const POCKET_INPUT: &str = "pocket";
pub const TARGET_INPUT: &str = "target";
pub const SUMMARY_INPUT: &str = "summary";
pub const CONSOLIDATION_TASK_ID: &str = "consolidation";

/// Suffixes stripped from artifact base names to form derived keys.
pub const DEFAULT_KEY_SUFFIXES: &[&str] = &[
    r"_model_\d+",
    "_output",
    "_input",
    "_confidence",
    "_summary_confidences",
    "_pae",
    "_scores",
    "_prodigy_summary",
    "_foldseek_summary",
];

/// How many missing keys a pairing gap lists by name
pub const GAP_SAMPLE_SIZE: usize = 5;

pub const MARKER_FILE: &str = ".task_complete.json";
pub const STDOUT_FILE: &str = ".command.out";
pub const STDERR_FILE: &str = ".command.err";
pub const REPORT_FILE: &str = "run_report.json";
pub const CONSOLIDATED_DIR: &str = "consolidated";
pub const SUMMARY_FILE: &str = "design_summary.tsv";

/// Collections a stage's tool is expected to produce when the run
/// configuration does not declare `outputs` for it.
pub fn default_outputs(stage: StageKind) -> Vec<CollectionSpec> {
    use OutputSubdir::*;

    match stage {
        StageKind::PocketDetection => vec![CollectionSpec::new(
            collections::POCKETS,
            Primary,
            &["*.pdb"],
            false,
        )],
        StageKind::Design | StageKind::Refolding => vec![
            CollectionSpec::new(collections::STRUCTURES, Primary, &["*.cif", "*.pdb"], true),
            CollectionSpec::new(collections::CONFIDENCE, Confidence, &["*.json", "*.npz"], false),
        ],
        StageKind::SequenceOptimization => vec![CollectionSpec::new(
            collections::SEQUENCES,
            Primary,
            &["*.fa", "*.fasta"],
            true,
        )],
        StageKind::InterfaceScoring | StageKind::AffinityPrediction => vec![CollectionSpec::new(
            collections::SCORES,
            Primary,
            &["*.csv", "*.json", "*.txt"],
            true,
        )],
        StageKind::StructuralSearch => vec![CollectionSpec::new(
            collections::HITS,
            Primary,
            &["*.m8", "*.tsv"],
            true,
        )],
        StageKind::Consolidation => vec![CollectionSpec::new(
            collections::REPORT,
            Primary,
            &["*"],
            false,
        )],
    }
}
