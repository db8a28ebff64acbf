//! # spot-interrupter
//!
//! Triggers Amazon EC2 Spot Instance interruption notifications and rebalance
//! recommendations against a set of instance IDs using the AWS Fault Injection
//! Simulator, then optionally cleans the simulations up afterward.
//!
//! ## Sequence
//!
//! ```text
//! rebalance recommendation ──▶ wait (hard floor) ──▶ interruption notification
//!                                                            │
//!                                        clean? ──▶ stop + delete simulations
//! ```
//!
//! The [`Interrupter`] drives the sequence against any [`SpotSimulation`]
//! backend. [`FisSimulation`] is the AWS implementation; each signal becomes
//! one FIS experiment covering all targets in a single batched call, and the
//! experiment template is the resource that cleanup removes.
//!
//! One process run is one invocation: no state survives it, and the only
//! shared resources are the AWS clients, released on exit.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fis;
pub mod interrupter;
pub mod simulation;

pub use error::{InterrupterError, Result};
pub use fis::{ConnectOptions, FisSimulation};
pub use interrupter::{CleanupOutcome, Interrupter, InterruptionReport};
pub use simulation::{Signal, SimulationHandle, SpotSimulation};
