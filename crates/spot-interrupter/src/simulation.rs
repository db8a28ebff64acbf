//! Provider seam for spot fault simulations
//!
//! The interrupter drives three provider operations: send rebalance
//! recommendations, send interruption notifications, and remove a simulation
//! it created. [`SpotSimulation`] is that seam. The AWS implementation lives
//! in [`crate::fis`]; tests drive the sequence with an in-memory fake.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The two advisory signals a simulation can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Elevated-risk advisory: the instance may be interrupted soon
    Rebalance,
    /// The instance will be reclaimed imminently
    Interruption,
}

impl Signal {
    /// Human-readable name used in logs and simulation descriptions
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rebalance => "rebalance recommendation",
            Self::Interruption => "interruption notification",
        }
    }
}

/// Opaque identifiers for one provider-side simulation
///
/// Returned when a simulation is created, owned by the interrupter for the
/// duration of one invocation, used only to issue the matching cleanup call,
/// and discarded at process exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationHandle {
    /// Which signal this simulation emits
    pub signal: Signal,
    /// Provider template the simulation was created from
    pub template_id: String,
    /// Provider identifier of the running simulation
    pub experiment_id: String,
}

/// Provider operations for spot fault simulations
///
/// Every send covers all targets in one batched call and returns a handle for
/// the resources it created. An implementation that fails partway through a
/// send must not return a handle, so the caller only ever cleans up handles
/// it was actually given.
#[allow(async_fn_in_trait)]
pub trait SpotSimulation {
    /// Send a rebalance recommendation to every target
    async fn send_rebalance_recommendations(&self, targets: &[String]) -> Result<SimulationHandle>;

    /// Send an interruption notification to every target
    async fn send_interruption_notifications(
        &self,
        targets: &[String],
    ) -> Result<SimulationHandle>;

    /// Remove the provider-side resources behind a simulation handle
    async fn remove_simulation(&self, handle: &SimulationHandle) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names() {
        assert_eq!(Signal::Rebalance.as_str(), "rebalance recommendation");
        assert_eq!(Signal::Interruption.as_str(), "interruption notification");
    }

    #[test]
    fn test_handle_serialization() {
        let handle = SimulationHandle {
            signal: Signal::Interruption,
            template_id: "EXT123".to_string(),
            experiment_id: "EXP456".to_string(),
        };

        let json = serde_json::to_string(&handle).unwrap();
        assert!(json.contains("\"signal\":\"Interruption\""));
        assert!(json.contains("\"template_id\":\"EXT123\""));

        let back: SimulationHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }
}
