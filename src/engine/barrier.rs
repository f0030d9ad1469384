// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::ExecutionError;
use crate::model::{Consolidation, StageKind, StageOutput};
use crate::observability::messages::engine::{
    BarrierFired, BarrierSignalIgnored, BarrierSignalReceived, BarrierTimedOut,
};
use crate::observability::messages::StructuredLog;
use crate::traits::Aggregator;

/// Sending half handed to the stage executor. Dropping every signaller
/// closes the barrier.
#[derive(Clone)]
pub struct BarrierSignaller {
    tx: mpsc::UnboundedSender<Arc<StageOutput>>,
}

impl BarrierSignaller {
    /// Report that a stage reached a terminal state. Returns `false` once the
    /// barrier is gone.
    pub fn signal(&self, output: Arc<StageOutput>) -> bool {
        self.tx.send(output).is_ok()
    }
}

/// Waits for a set of stages fixed at construction, then aggregates once.
///
/// `fire` consumes the barrier, so aggregation can run at most one time.
pub struct ConsolidationBarrier {
    expected: BTreeSet<StageKind>,
    rx: mpsc::UnboundedReceiver<Arc<StageOutput>>,
    cancel: CancellationToken,
}

impl ConsolidationBarrier {
    pub fn new(
        expected: BTreeSet<StageKind>,
        cancel: CancellationToken,
    ) -> (BarrierSignaller, ConsolidationBarrier) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            BarrierSignaller { tx },
            ConsolidationBarrier {
                expected,
                rx,
                cancel,
            },
        )
    }

    pub fn expected(&self) -> &BTreeSet<StageKind> {
        &self.expected
    }

    /// Collect one signal from every expected stage.
    ///
    /// `watchdog` bounds the time between accepted signals, not the whole
    /// wait: every newly signalled stage restarts it.
    pub async fn wait(mut self, watchdog: Duration) -> Result<Vec<Arc<StageOutput>>, ExecutionError> {
        let mut last_progress = Instant::now();
        let mut deadline = last_progress + watchdog;
        let mut received: BTreeMap<StageKind, Arc<StageOutput>> = BTreeMap::new();

        while received.len() < self.expected.len() {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => return Err(ExecutionError::Cancelled),
                next = tokio::time::timeout_at(deadline, self.rx.recv()) => next,
            };

            let output = match next {
                Ok(Some(output)) => output,
                Ok(None) | Err(_) => {
                    let missing: Vec<StageKind> = self
                        .expected
                        .iter()
                        .filter(|k| !received.contains_key(*k))
                        .copied()
                        .collect();
                    let waited = last_progress.elapsed();
                    BarrierTimedOut {
                        waited,
                        missing: &missing,
                    }
                    .log();
                    return Err(ExecutionError::BarrierTimeout { waited, missing });
                }
            };

            let stage = output.stage;
            if !self.expected.contains(&stage) {
                BarrierSignalIgnored {
                    stage,
                    reason: "stage is not expected",
                }
                .log();
                continue;
            }
            if received.contains_key(&stage) {
                BarrierSignalIgnored {
                    stage,
                    reason: "stage already signalled",
                }
                .log();
                continue;
            }

            received.insert(stage, output);
            last_progress = Instant::now();
            deadline = last_progress + watchdog;
            BarrierSignalReceived {
                stage,
                remaining: self.expected.len() - received.len(),
            }
            .log();
        }

        Ok(received.into_values().collect())
    }

    /// Wait for every expected stage, then run the aggregator exactly once.
    pub async fn fire(
        self,
        watchdog: Duration,
        aggregator: Arc<dyn Aggregator>,
    ) -> Result<Consolidation, ExecutionError> {
        let cancel = self.cancel.clone();
        let started = Instant::now();
        let outputs = self.wait(watchdog).await?;
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }

        BarrierFired {
            stages: outputs.len(),
            waited: started.elapsed(),
        }
        .log();
        aggregator.aggregate(outputs).await
    }
}
