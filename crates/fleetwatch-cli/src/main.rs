//! fleetwatch — staged rollout convergence monitor.
//!
//! Watches a set of services during a rollout: discovers each service's
//! instances via DNS SRV, polls every instance's version endpoint, and
//! prints one status line per service per round until every service runs
//! the target version on the expected number of nodes for two consecutive
//! rounds.
//!
//! # Usage
//!
//! ```text
//! fleetwatch --config fleetwatch.toml --env prod
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use fleetwatch_config::Config;
use fleetwatch_engine::{ServiceState, StatusSink, Watcher};
use fleetwatch_probe::VersionProber;
use fleetwatch_resolve::DnsSrvLookup;

#[derive(Parser)]
#[command(
    name = "fleetwatch",
    about = "Staged rollout convergence monitor",
    version
)]
struct Cli {
    /// Path to the services config file.
    #[arg(short, long, default_value = "fleetwatch.toml")]
    config: PathBuf,

    /// Override the environment token used in address templates.
    #[arg(long)]
    env: Option<String>,

    /// Override the seconds between polling rounds.
    #[arg(long)]
    interval: Option<u64>,
}

/// Prints one status line per service per round.
struct StdoutSink;

impl StatusSink for StdoutSink {
    fn report(&self, state: &ServiceState) {
        println!("{}", format_status(state));
    }
}

/// `name -> [v1 x 2 nodes, v2 x 1 nodes]`, plus the finish time once the
/// rollout is confirmed. Histogram entries render sorted by version.
fn format_status(state: &ServiceState) -> String {
    let versions: Vec<String> = state
        .histogram
        .iter()
        .map(|(version, count)| format!("{version} x {count} nodes"))
        .collect();
    let mut line = format!("{} -> [{}]", state.spec.name, versions.join(", "));
    if let Some(finished_at) = state.finished_at {
        line.push_str(&format!(" done (at {finished_at})"));
    }
    line
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fleetwatch=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_file(&cli.config)?;
    if let Some(env) = cli.env {
        config.env = Some(env);
    }
    if let Some(interval) = cli.interval {
        config.poll_interval_secs = interval;
    }

    let specs = config.service_specs()?;
    if specs.is_empty() {
        warn!("no services configured, nothing to watch");
        return Ok(());
    }
    info!(
        services = specs.len(),
        interval_secs = config.poll_interval_secs,
        "fleetwatch starting"
    );

    let lookup = Arc::new(DnsSrvLookup::from_system_conf()?);
    let prober = Arc::new(VersionProber::new());
    let watcher = Watcher::new(
        lookup,
        prober,
        Arc::new(StdoutSink),
        Duration::from_secs(config.poll_interval_secs),
    );

    // Ctrl-C stops issuing new rounds; the current round completes first.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let states = watcher.run(specs, shutdown_rx).await;

    let done = states.iter().filter(|s| s.is_done()).count();
    info!(done, total = states.len(), "fleetwatch finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetwatch_config::ServiceSpec;
    use fleetwatch_engine::ServiceStatus;

    fn state_with(histogram: &[(&str, u32)]) -> ServiceState {
        let mut state = ServiceState::new(ServiceSpec {
            name: "web".to_string(),
            url: "web.example.com/".to_string(),
            version_endpoint: "version".to_string(),
            target_version: "v3".to_string(),
            expected_nodes: 2,
        });
        state.histogram = histogram
            .iter()
            .map(|(v, n)| (v.to_string(), *n))
            .collect();
        state
    }

    #[test]
    fn status_line_sorts_versions() {
        let state = state_with(&[("v3", 2), ("v2", 1)]);
        assert_eq!(format_status(&state), "web -> [v2 x 1 nodes, v3 x 2 nodes]");
    }

    #[test]
    fn status_line_marks_finished_services() {
        let mut state = state_with(&[("v3", 2)]);
        state.status = ServiceStatus::Done;
        state.finished_at = Some(1_700_000_000);
        assert_eq!(
            format_status(&state),
            "web -> [v3 x 2 nodes] done (at 1700000000)"
        );
    }

    #[test]
    fn status_line_with_no_observations() {
        let state = state_with(&[]);
        assert_eq!(format_status(&state), "web -> []");
    }
}
