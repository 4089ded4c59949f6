//! fleetwatch-engine — the discovery-and-convergence engine.
//!
//! Drives polling rounds over all watched services: resolve instances via
//! SRV, probe every instance's version concurrently, aggregate, then apply
//! the per-service convergence state machine. A service is rolled out once
//! the target version is seen on exactly the expected number of instances
//! for two consecutive rounds; the loop ends when every service is done.
//!
//! # Round ordering
//!
//! All of a round's resolution and probing is fanned out and fully joined
//! before any service state is touched, and states are only ever written by
//! the single control flow between rounds. Round N+1 never observes a
//! partially applied round N, so no locking is needed.

pub mod state;
pub mod watcher;

pub use state::{ServiceState, ServiceStatus};
pub use watcher::{StatusSink, Watcher};
