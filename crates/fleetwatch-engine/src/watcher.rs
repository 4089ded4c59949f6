//! The poll loop: discover, probe, aggregate, evaluate, repeat.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info};

use fleetwatch_config::ServiceSpec;
use fleetwatch_probe::{VersionHistogram, VersionProbe, aggregate};
use fleetwatch_resolve::{InstanceAddress, SrvLookup, resolve_instances};

use crate::state::ServiceState;

/// Receives one status report per service per round. The sink owns all
/// formatting; the engine only supplies the state.
pub trait StatusSink: Send + Sync {
    fn report(&self, state: &ServiceState);
}

/// Drives polling rounds until every watched service is Done.
pub struct Watcher {
    lookup: Arc<dyn SrvLookup>,
    prober: Arc<dyn VersionProbe>,
    sink: Arc<dyn StatusSink>,
    interval: Duration,
}

impl Watcher {
    pub fn new(
        lookup: Arc<dyn SrvLookup>,
        prober: Arc<dyn VersionProbe>,
        sink: Arc<dyn StatusSink>,
        interval: Duration,
    ) -> Self {
        Self {
            lookup,
            prober,
            sink,
            interval,
        }
    }

    /// Run rounds until all services are Done or shutdown is signalled.
    ///
    /// Within a round, every non-Done service's resolve-and-probe work runs
    /// concurrently and is fully joined before any state is updated; Done
    /// services are excluded from the fan-out and never mutated. On
    /// shutdown the current round completes and the states so far are
    /// returned.
    pub async fn run(
        &self,
        specs: Vec<ServiceSpec>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Vec<ServiceState> {
        let mut states: Vec<ServiceState> = specs.into_iter().map(ServiceState::new).collect();
        let mut round: u64 = 0;

        loop {
            round += 1;
            let active: Vec<usize> = states
                .iter()
                .enumerate()
                .filter_map(|(i, s)| (!s.is_done()).then_some(i))
                .collect();
            debug!(round, active = active.len(), "starting round");

            let results = join_all(
                active
                    .iter()
                    .map(|&i| self.poll_service(&states[i].spec)),
            )
            .await;

            for (&i, (instances, histogram)) in active.iter().zip(results) {
                states[i].observe_round(instances, histogram);
            }

            for state in &states {
                self.sink.report(state);
            }

            if states.iter().all(ServiceState::is_done) {
                info!(rounds = round, services = states.len(), "all services converged");
                return states;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => {
                    let done = states.iter().filter(|s| s.is_done()).count();
                    info!(done, total = states.len(), "shutdown requested, stopping");
                    return states;
                }
            }
        }
    }

    /// One service's share of a round: resolve, fan probes out, aggregate.
    ///
    /// Probe failures drop out here as missing observations; they degrade
    /// the histogram but never the round.
    async fn poll_service(
        &self,
        spec: &ServiceSpec,
    ) -> (Vec<InstanceAddress>, VersionHistogram) {
        let instances = resolve_instances(self.lookup.as_ref(), &spec.url).await;
        let observations = join_all(
            instances
                .iter()
                .map(|addr| self.prober.probe_version(addr, &spec.version_endpoint)),
        )
        .await;
        let versions: Vec<String> = observations.into_iter().flatten().collect();
        (instances, aggregate(versions))
    }
}
