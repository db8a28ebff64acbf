//! The interruption sequence
//!
//! Drives `rebalance recommendation -> wait -> interruption notification`
//! against a [`SpotSimulation`] backend, then optionally removes the
//! simulations it created.
//!
//! The delay between the two signals is a hard floor, not a best-effort
//! sleep: the clock is anchored at the instant the rebalance call returned,
//! and the interruption call is never issued before the floor elapses.
//!
//! Per invocation the sequence is
//! `Idle -> RebalanceSent -> Waiting -> InterruptionSent -> (CleanedUp | Left)`,
//! terminal on completion or on the first API error.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::Result;
use crate::simulation::{SimulationHandle, SpotSimulation};

/// Outcome of the cleanup phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanupOutcome {
    /// Cleanup was not requested
    Skipped,
    /// Every simulation the run created was removed
    Completed,
    /// At least one simulation could not be removed; the run result stands
    Failed {
        /// Why the cleanup failed
        message: String,
    },
}

/// Result of one completed interruption run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptionReport {
    /// Instance IDs the signals were sent to, in the order supplied
    pub targets: Vec<String>,
    /// Handle of the rebalance recommendation simulation
    pub rebalance: SimulationHandle,
    /// Handle of the interruption notification simulation
    pub interruption: SimulationHandle,
    /// What happened to the simulations afterward
    pub cleanup: CleanupOutcome,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

/// Drives the interruption sequence against a simulation backend
pub struct Interrupter<S> {
    simulation: S,
}

impl<S: SpotSimulation> Interrupter<S> {
    /// Create an interrupter over the given backend
    pub fn new(simulation: S) -> Self {
        Self { simulation }
    }

    /// Send a rebalance recommendation, wait `delay`, send an interruption
    /// notification, and clean the simulations up if requested
    ///
    /// An empty target set is forwarded to the API as-is; no client-side
    /// validation is performed. Any API failure aborts the remaining
    /// sequence, and simulations created before the failure are still
    /// removed when `clean` is set. Cleanup failures are reported but never
    /// overwrite the primary result.
    pub async fn interrupt(
        &self,
        targets: &[String],
        delay: Duration,
        clean: bool,
    ) -> Result<InterruptionReport> {
        let started_at = Utc::now();
        let mut handles = Vec::with_capacity(2);

        let sent = self.send_sequence(targets, delay, &mut handles).await;

        let cleanup = if clean {
            self.remove_all(&handles).await
        } else {
            CleanupOutcome::Skipped
        };

        let (rebalance, interruption) = sent?;

        Ok(InterruptionReport {
            targets: targets.to_vec(),
            rebalance,
            interruption,
            cleanup,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn send_sequence(
        &self,
        targets: &[String],
        delay: Duration,
        handles: &mut Vec<SimulationHandle>,
    ) -> Result<(SimulationHandle, SimulationHandle)> {
        info!(
            targets = targets.len(),
            "sending spot rebalance recommendation"
        );
        let rebalance = self
            .simulation
            .send_rebalance_recommendations(targets)
            .await?;
        handles.push(rebalance.clone());

        // Floor anchored at the moment the rebalance call returned.
        let floor = Instant::now() + delay;
        info!(
            delay_secs = delay.as_secs_f64(),
            "waiting before sending the interruption notification"
        );
        tokio::time::sleep_until(floor).await;

        info!(
            targets = targets.len(),
            "sending spot interruption notification"
        );
        let interruption = self
            .simulation
            .send_interruption_notifications(targets)
            .await?;
        handles.push(interruption.clone());

        Ok((rebalance, interruption))
    }

    async fn remove_all(&self, handles: &[SimulationHandle]) -> CleanupOutcome {
        let mut failures = Vec::new();
        for handle in handles {
            if let Err(e) = self.simulation.remove_simulation(handle).await {
                warn!(
                    experiment_id = %handle.experiment_id,
                    error = %e,
                    "failed to remove simulation"
                );
                failures.push(e.to_string());
            }
        }

        if failures.is_empty() {
            CleanupOutcome::Completed
        } else {
            CleanupOutcome::Failed {
                message: failures.join("; "),
            }
        }
    }
}
