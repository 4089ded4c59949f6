//! HTTP version probe.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tracing::debug;

/// Boxed future alias for probe results.
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;

/// Version probe seam — injected so the poll loop is testable without
/// live instances.
pub trait VersionProbe: Send + Sync {
    /// Fetch the version reported by the instance at `address`, already
    /// formatted with the `v` prefix, or `None` if the probe failed in any
    /// way this round.
    fn probe_version<'a>(&'a self, address: &'a str, path: &'a str) -> ProbeFuture<'a>;
}

/// HTTP prober sharing one pooled client across all concurrent probes.
///
/// The client is opened once and lives for the whole run; dropping the
/// prober tears the pool down however the loop exits.
pub struct VersionProber {
    client: Client<HttpConnector, Empty<Bytes>>,
    timeout: Duration,
}

impl VersionProber {
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Override the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_version(&self, address: &str, path: &str) -> Option<String> {
        // The scheme prefix on a resolved instance address is identity
        // only; probes always dial plain HTTP to host:port.
        let host_port = address
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(address);
        let uri = format!(
            "http://{}/{}",
            host_port.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let req = match http::Request::builder()
            .method("GET")
            .uri(&uri)
            .header("user-agent", "fleetwatch/0.1")
            .body(Empty::<Bytes>::new())
        {
            Ok(req) => req,
            Err(e) => {
                debug!(error = %e, %uri, "invalid probe request");
                return None;
            }
        };

        let result = tokio::time::timeout(self.timeout, async {
            let resp = match self.client.request(req).await {
                Ok(resp) => resp,
                Err(e) => {
                    debug!(error = %e, %uri, "version probe request failed");
                    return None;
                }
            };
            if !resp.status().is_success() {
                debug!(status = %resp.status(), %uri, "version probe non-2xx");
                return None;
            }
            match resp.into_body().collect().await {
                Ok(collected) => parse_version(&collected.to_bytes()),
                Err(e) => {
                    debug!(error = %e, %uri, "version probe body read failed");
                    None
                }
            }
        })
        .await;

        match result {
            Ok(version) => version,
            Err(_) => {
                debug!(%uri, "version probe timed out");
                None
            }
        }
    }
}

impl Default for VersionProber {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionProbe for VersionProber {
    fn probe_version<'a>(&'a self, address: &'a str, path: &'a str) -> ProbeFuture<'a> {
        Box::pin(self.fetch_version(address, path))
    }
}

/// Extract the `version` field and apply the `v` prefix convention.
///
/// A string field is used verbatim; a bare number renders as written.
/// Missing or null fields are malformed responses, not versions.
fn parse_version(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let version = match value.get("version")? {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => return None,
        other => other.to_string(),
    };
    Some(format!("v{version}"))
}
