//! Per-service convergence state machine.

use fleetwatch_config::ServiceSpec;
use fleetwatch_probe::VersionHistogram;
use fleetwatch_resolve::InstanceAddress;
use tracing::{debug, info};

/// Convergence status of one watched service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    /// Target not met in the most recent round.
    Pending,
    /// Target met once; awaiting the confirming round.
    Satisfied,
    /// Target met on two consecutive rounds. Terminal.
    Done,
}

/// Mutable per-service state, owned by the poll loop for one run.
#[derive(Debug, Clone)]
pub struct ServiceState {
    pub spec: ServiceSpec,
    /// Instances discovered in the most recent round.
    pub instances: Vec<InstanceAddress>,
    /// Version distribution observed in the most recent round.
    pub histogram: VersionHistogram,
    pub status: ServiceStatus,
    /// Epoch seconds of the Satisfied → Done transition. Set exactly once.
    pub finished_at: Option<u64>,
}

impl ServiceState {
    pub fn new(spec: ServiceSpec) -> Self {
        Self {
            spec,
            instances: Vec::new(),
            histogram: VersionHistogram::new(),
            status: ServiceStatus::Pending,
            finished_at: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == ServiceStatus::Done
    }

    /// Apply one round's observations.
    ///
    /// The target must be met on two consecutive rounds before the service
    /// is Done — a single round can catch a fleet transiently converged
    /// mid-restart — and a single miss resets any pending satisfaction.
    /// A Done state is never mutated again.
    pub fn observe_round(
        &mut self,
        instances: Vec<InstanceAddress>,
        histogram: VersionHistogram,
    ) {
        if self.is_done() {
            return;
        }

        let observed = histogram
            .get(&self.spec.target_version)
            .copied()
            .unwrap_or(0);
        // Exact fleet size, not "at least": a stale extra instance still
        // reporting the target version must not count as converged.
        let met = observed == self.spec.expected_nodes;

        self.instances = instances;
        self.histogram = histogram;

        self.status = match (self.status, met) {
            (prev, false) => {
                if prev == ServiceStatus::Satisfied {
                    debug!(service = %self.spec.name, "qualifying round not repeated, resetting");
                }
                ServiceStatus::Pending
            }
            (ServiceStatus::Pending, true) => {
                debug!(service = %self.spec.name, "target met, awaiting confirming round");
                ServiceStatus::Satisfied
            }
            (ServiceStatus::Satisfied, true) => {
                self.finished_at = Some(epoch_secs());
                info!(
                    service = %self.spec.name,
                    target = %self.spec.target_version,
                    nodes = self.spec.expected_nodes,
                    "rollout confirmed"
                );
                ServiceStatus::Done
            }
            (ServiceStatus::Done, true) => unreachable!("done states return early"),
        };
    }
}

pub(crate) fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
