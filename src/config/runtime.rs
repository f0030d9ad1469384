// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::consts::{REPORT_FILE, TARGET_INPUT};
use crate::config::{validate_run_config, RunConfig};
use crate::engine::{
    resolve_mode, CompletionStore, DesignInput, DesignStage, DesignTableAggregator, InputShape,
    Mode, PairedStage, ResourcePool, RunOutcome, StageComposer, TaskDispatcher, TaskTemplate,
    VariantGenerator,
};
use crate::errors::{ConfigurationError, ExecutionError};
use crate::model::{KeyDeriver, Params, StageKind, TaskDescriptor};
use crate::observability::messages::engine::PipelineBuilt;
use crate::observability::messages::StructuredLog;
use crate::traits::{Stage, ToolFactory};

/// A run ready to execute: resolved mode, scheduled stages and barrier.
pub struct Pipeline {
    mode: Mode,
    composer: StageComposer,
    report_path: PathBuf,
}

impl Pipeline {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Stages that will be scheduled, including the primary design stage.
    pub fn stages(&self) -> Vec<StageKind> {
        self.composer.stage_kinds()
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    pub async fn run(&self) -> Result<RunOutcome, ExecutionError> {
        self.composer.run().await
    }
}

/// Turns a run configuration into a [`Pipeline`].
///
/// # Example
/// ```no_run
/// use the_bindery::backends::ProcessToolFactory;
/// use the_bindery::config::{load_and_validate_config, RuntimeBuilder};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> anyhow::Result<()> {
/// let cfg = load_and_validate_config("configs/binder-design.yaml")?;
/// let pipeline = RuntimeBuilder::from_config(&cfg, CancellationToken::new(), &ProcessToolFactory)?;
/// let outcome = pipeline.run().await?;
/// println!("{} rows in {}", outcome.consolidation.rows, outcome.consolidation.summary_path.display());
/// # Ok(())
/// # }
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Validate `cfg` and wire every component of the run.
    ///
    /// Tools are created through `tools`, so tests can substitute stubs for
    /// external processes. `cancel` is shared by the dispatcher, every tool
    /// invocation and the barrier.
    pub fn from_config(
        cfg: &RunConfig,
        cancel: CancellationToken,
        tools: &dyn ToolFactory,
    ) -> Result<Pipeline, ConfigurationError> {
        validate_run_config(cfg).map_err(|errors| ConfigurationError::Rejected { errors })?;
        let shape = InputShape::of(&cfg.input);
        let mode = resolve_mode(shape, cfg.input.mode)?;

        let patterns = cfg.derived_key.patterns();
        let keys = KeyDeriver::new(&patterns).map_err(|source| {
            ConfigurationError::InvalidKeyPattern {
                pattern: patterns.join(", "),
                source,
            }
        })?;

        let dispatcher = Arc::new(TaskDispatcher::new(
            ResourcePool::new(cfg.resources.cpu, cfg.resources.accelerator),
            CompletionStore::new(cfg.resume),
            Arc::new(keys),
            &cfg.output_dir,
            cancel,
        ));

        let design = TaskTemplate {
            stage: StageKind::Design,
            tool: tools.create(StageKind::Design, &cfg.design.tool)?,
            outputs: cfg.design.outputs(),
        };
        let input = Self::design_input(cfg, mode, tools)?;

        let mut stages: Vec<Arc<dyn Stage>> = vec![Arc::new(DesignStage::new(input, design))];
        let mut disabled = Vec::new();
        let mut consolidation = None;

        for kind in StageKind::OPTIONAL {
            let Some(stage) = cfg.stage(kind).filter(|s| s.enabled) else {
                disabled.push(kind);
                continue;
            };

            let template = match &stage.tool {
                Some(tool) => Some(TaskTemplate {
                    stage: kind,
                    tool: tools.create(kind, tool)?,
                    outputs: stage.outputs(kind),
                }),
                None => None,
            };

            if kind == StageKind::Consolidation {
                consolidation = template;
                continue;
            }
            let template = template.ok_or(ConfigurationError::MissingTool { stage: kind })?;
            stages.push(Arc::new(PairedStage::new(
                kind,
                template,
                stage.params.clone(),
                stage.required_resources.clone(),
            )));
        }

        let aggregator = Arc::new(DesignTableAggregator::new(
            Arc::clone(&dispatcher),
            consolidation,
        ));
        let composer = StageComposer::new(stages, disabled, aggregator, dispatcher, cfg.watchdog());

        PipelineBuilt {
            mode: mode.as_str(),
            stages: &composer.stage_kinds(),
            output_dir: &cfg.output_dir,
        }
        .log();

        Ok(Pipeline {
            mode,
            composer,
            report_path: cfg.output_dir.join(REPORT_FILE),
        })
    }

    fn design_input(
        cfg: &RunConfig,
        mode: Mode,
        tools: &dyn ToolFactory,
    ) -> Result<DesignInput, ConfigurationError> {
        let input = &cfg.input;
        let unmatched = || ConfigurationError::NoModeMatched {
            found: InputShape::of(input).to_string(),
        };

        match mode {
            Mode::PreSpecified => {
                let tasks = input.tasks.as_ref().ok_or_else(unmatched)?;
                let descriptors = tasks
                    .iter()
                    .map(|task| {
                        TaskDescriptor::new(task.id.as_str(), StageKind::Design)
                            .with_params(merged(&cfg.design.params, &task.params))
                            .with_inputs(task.inputs.clone())
                    })
                    .collect();
                Ok(DesignInput::PreSpecified(descriptors))
            }
            Mode::GenerateFromTarget | Mode::DetectThenGenerate => {
                let target = input.target.as_ref().ok_or_else(unmatched)?;
                let sweep = input.sweep.clone().ok_or_else(unmatched)?;
                let generator = VariantGenerator::new(sweep)?;

                let stage = match mode {
                    Mode::DetectThenGenerate => StageKind::PocketDetection,
                    _ => StageKind::Design,
                };
                let target = TaskDescriptor::new(target.id.as_str(), stage)
                    .with_params(merged(&cfg.design.params, &target.params))
                    .with_input(TARGET_INPUT, target.path.clone());

                match &input.pocket_detection {
                    Some(detection) if mode == Mode::DetectThenGenerate => {
                        let detector = TaskTemplate {
                            stage: StageKind::PocketDetection,
                            tool: tools.create(StageKind::PocketDetection, &detection.tool)?,
                            outputs: detection.outputs(),
                        };
                        Ok(DesignInput::PocketSweep {
                            target,
                            generator,
                            detector,
                        })
                    }
                    None if mode == Mode::GenerateFromTarget => {
                        Ok(DesignInput::Sweep { target, generator })
                    }
                    _ => Err(unmatched()),
                }
            }
        }
    }
}

/// Stage-wide parameters overlaid by per-task ones.
fn merged(defaults: &Params, overrides: &Params) -> Params {
    let mut params = defaults.clone();
    params.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    params
}
