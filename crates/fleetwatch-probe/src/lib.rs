//! fleetwatch-probe — per-instance version probing and aggregation.
//!
//! One HTTP GET per instance per round, expecting a JSON body with a
//! `version` field. Every failure mode (connect error, timeout, non-2xx,
//! malformed body) yields "no observation" for that instance, never an
//! error: a missing observation just leaves the round's histogram lighter.

pub mod histogram;
pub mod prober;

pub use histogram::{VersionHistogram, aggregate};
pub use prober::{ProbeFuture, VersionProbe, VersionProber};
