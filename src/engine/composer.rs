// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Level-by-level executor for the stage graph.
//!
//! Stages are grouped into topological levels with Kahn's algorithm. All
//! stages in a level run concurrently, and a level only starts once every
//! stage of the previous level reached a terminal state, so a stage always
//! pairs against the complete output of its upstreams.
//!
//! Every finished stage signals the consolidation barrier, which runs in its
//! own task with a watchdog. A barrier timeout cancels the whole run.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::engine::{BarrierSignaller, ConsolidationBarrier, TaskDispatcher};
use crate::errors::{ConfigurationError, ExecutionError};
use crate::model::{Consolidation, LineageForest, StageKind, StageOutput};
use crate::observability::messages::engine::{
    ExecutionFailed, LevelComputationCompleted, RunCompleted, StageStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{Aggregator, Stage, StageContext};

/// Everything a successful run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub outputs: BTreeMap<StageKind, Arc<StageOutput>>,
    pub lineage: LineageForest,
    pub consolidation: Consolidation,
}

pub struct StageComposer {
    stages: Vec<Arc<dyn Stage>>,
    disabled: Vec<StageKind>,
    aggregator: Arc<dyn Aggregator>,
    dispatcher: Arc<TaskDispatcher>,
    watchdog: Duration,
    cancel: CancellationToken,
}

impl StageComposer {
    pub fn new(
        stages: Vec<Arc<dyn Stage>>,
        disabled: Vec<StageKind>,
        aggregator: Arc<dyn Aggregator>,
        dispatcher: Arc<TaskDispatcher>,
        watchdog: Duration,
    ) -> Self {
        let cancel = dispatcher.cancellation().clone();
        Self {
            stages,
            disabled,
            aggregator,
            dispatcher,
            watchdog,
            cancel,
        }
    }

    /// Stages the barrier waits on: every scheduled stage. Consolidation is
    /// never scheduled as a stage, it is the barrier's own aggregation.
    pub fn expected_signals(&self) -> BTreeSet<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    /// Group stages into levels; each level only depends on earlier ones.
    pub fn compute_levels(&self) -> Result<Vec<Vec<StageKind>>, ExecutionError> {
        let scheduled: BTreeSet<StageKind> = self.expected_signals();
        let mut in_degree: BTreeMap<StageKind, usize> = BTreeMap::new();
        let mut dependents: HashMap<StageKind, Vec<StageKind>> = HashMap::new();

        for stage in &self.stages {
            let kind = stage.kind();
            let deps = stage.dependencies();
            for dep in &deps {
                if !scheduled.contains(dep) {
                    return Err(ConfigurationError::MissingPrerequisite {
                        stage: kind,
                        prerequisite: *dep,
                    }
                    .into());
                }
                dependents.entry(*dep).or_default().push(kind);
            }
            in_degree.insert(kind, deps.len());
        }

        let mut queue: VecDeque<StageKind> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(kind, _)| *kind)
            .collect();
        let mut levels = Vec::new();
        let mut placed = 0;

        while !queue.is_empty() {
            let level: Vec<StageKind> = queue.drain(..).collect();
            placed += level.len();

            let mut next = Vec::new();
            for kind in &level {
                for dependent in dependents.get(kind).into_iter().flatten() {
                    let degree = in_degree.get_mut(dependent).ok_or_else(|| {
                        ExecutionError::Internal(format!(
                            "stage '{}' missing from in-degree map",
                            dependent
                        ))
                    })?;
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(*dependent);
                    }
                }
            }
            next.sort();
            queue.extend(next);
            levels.push(level);
        }

        if placed != self.stages.len() {
            return Err(ExecutionError::Internal(
                "stage graph contains a cycle".to_string(),
            ));
        }

        LevelComputationCompleted {
            level_count: levels.len(),
            stage_count: placed,
        }
        .log();
        Ok(levels)
    }

    pub async fn run(&self) -> Result<RunOutcome, ExecutionError> {
        let started = Instant::now();
        let levels = self.compute_levels()?;

        let (signaller, barrier) =
            ConsolidationBarrier::new(self.expected_signals(), self.cancel.clone());
        let mut barrier_task = tokio::spawn(barrier.fire(self.watchdog, Arc::clone(&self.aggregator)));

        let stage_loop = self.run_levels(levels, signaller);
        tokio::pin!(stage_loop);

        let finished = tokio::select! {
            stages = &mut stage_loop => {
                let consolidation = flatten((&mut barrier_task).await);
                stages.and_then(|stages| Ok((stages, consolidation?)))
            }
            consolidation = &mut barrier_task => {
                match flatten(consolidation) {
                    Ok(consolidation) => stage_loop.await.map(|stages| (stages, consolidation)),
                    Err(e) => {
                        self.cancel.cancel();
                        match stage_loop.await {
                            Err(stage_error) if !matches!(stage_error, ExecutionError::Cancelled) => {
                                Err(stage_error)
                            }
                            _ => Err(e),
                        }
                    }
                }
            }
        };

        let outcome = finished.and_then(|((outputs, mut lineage), consolidation)| {
            if let Some(descriptor) = &consolidation.descriptor {
                lineage.record(descriptor)?;
            }
            Ok(RunOutcome {
                outputs,
                lineage,
                consolidation,
            })
        });

        match &outcome {
            Ok(outcome) => RunCompleted {
                stages: outcome.outputs.len(),
                tasks: outcome.outputs.values().map(|o| o.results.len()).sum(),
                failed: outcome.outputs.values().map(|o| o.failed_count()).sum(),
                duration: started.elapsed(),
            }
            .log(),
            Err(e) => ExecutionFailed { error: e }.log(),
        }
        outcome
    }

    async fn run_levels(
        &self,
        levels: Vec<Vec<StageKind>>,
        signaller: BarrierSignaller,
    ) -> Result<(BTreeMap<StageKind, Arc<StageOutput>>, LineageForest), ExecutionError> {
        let by_kind: HashMap<StageKind, Arc<dyn Stage>> =
            self.stages.iter().map(|s| (s.kind(), Arc::clone(s))).collect();
        let mut outputs: BTreeMap<StageKind, Arc<StageOutput>> = BTreeMap::new();
        let mut lineage = LineageForest::new();

        for kind in &self.disabled {
            outputs.insert(*kind, Arc::new(StageOutput::disabled(*kind)));
        }

        for (index, level) in levels.into_iter().enumerate() {
            let ctx = StageContext {
                upstream: outputs.clone(),
                dispatcher: Arc::clone(&self.dispatcher),
            };

            let mut running = JoinSet::new();
            for kind in level {
                let stage = by_kind.get(&kind).cloned().ok_or_else(|| {
                    ExecutionError::Internal(format!("stage '{}' is not registered", kind))
                })?;
                let ctx = ctx.clone();
                StageStarted { stage: kind, level: index }.log();
                running.spawn(async move { stage.run(ctx).await });
            }

            // A failed stage cancels the run; its siblings are still drained so
            // no stage outlives this call.
            let mut failure = None;
            let mut finished = Vec::with_capacity(running.len());
            while let Some(joined) = running.join_next().await {
                let error = match joined {
                    Ok(Ok(output)) => {
                        let output = Arc::new(output);
                        if failure.is_none() {
                            signaller.signal(Arc::clone(&output));
                        }
                        finished.push(output);
                        continue;
                    }
                    Ok(Err(e)) => e,
                    Err(join_error) => {
                        ExecutionError::Internal(format!("stage task failed: {}", join_error))
                    }
                };
                self.cancel.cancel();
                failure.get_or_insert(error);
            }
            if let Some(error) = failure {
                return Err(error);
            }
            finished.sort_by_key(|output| output.stage);

            for output in finished {
                for descriptor in &output.descriptors {
                    lineage.record(descriptor)?;
                }
                outputs.insert(output.stage, output);
            }

            if self.cancel.is_cancelled() {
                return Err(ExecutionError::Cancelled);
            }
        }

        Ok((outputs, lineage))
    }
}

fn flatten(
    joined: Result<Result<Consolidation, ExecutionError>, tokio::task::JoinError>,
) -> Result<Consolidation, ExecutionError> {
    joined.map_err(|e| ExecutionError::Internal(format!("barrier task failed: {}", e)))?
}
