//! SRV lookup and instance address construction.

use std::future::Future;
use std::pin::Pin;

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use thiserror::Error;
use tracing::{debug, warn};

use crate::address::split_address;

/// A resolved, directly dialable instance address: `prefix + host:port`.
pub type InstanceAddress = String;

/// The dialable half of one SRV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    pub host: String,
    pub port: u16,
}

/// Errors from an SRV query. `NotFound` (no such domain, or no records)
/// is distinguished from transport-level failures so callers can treat it
/// as "zero live instances" rather than an outage of the resolver itself.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("domain not found: {0}")]
    NotFound(String),

    #[error("dns lookup failed: {0}")]
    Dns(String),
}

/// Boxed future alias for SRV lookup results.
pub type SrvFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<SrvRecord>, LookupError>> + Send + 'a>>;

/// SRV lookup seam — injected so resolution logic is testable without a
/// live nameserver.
pub trait SrvLookup: Send + Sync {
    /// Query SRV records for `domain`. Record order is preserved.
    fn lookup_srv<'a>(&'a self, domain: &'a str) -> SrvFuture<'a>;
}

/// Production lookup backed by hickory's tokio resolver.
pub struct DnsSrvLookup {
    resolver: TokioAsyncResolver,
}

impl DnsSrvLookup {
    /// Build a resolver from the system's DNS configuration
    /// (`/etc/resolv.conf` on unix). Failure here is fatal at startup.
    pub fn from_system_conf() -> Result<Self, LookupError> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| LookupError::Dns(e.to_string()))?;
        Ok(Self { resolver })
    }
}

impl SrvLookup for DnsSrvLookup {
    fn lookup_srv<'a>(&'a self, domain: &'a str) -> SrvFuture<'a> {
        Box::pin(async move {
            match self.resolver.srv_lookup(domain).await {
                Ok(lookup) => Ok(lookup
                    .iter()
                    .map(|srv| SrvRecord {
                        // SRV targets come back fully qualified; trim the
                        // root dot so the address dials cleanly.
                        host: srv.target().to_utf8().trim_end_matches('.').to_string(),
                        port: srv.port(),
                    })
                    .collect()),
                Err(e) => Err(classify(domain, e)),
            }
        })
    }
}

fn classify(domain: &str, err: ResolveError) -> LookupError {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => LookupError::NotFound(domain.to_string()),
        _ => LookupError::Dns(err.to_string()),
    }
}

/// Discover the live instances behind `address`.
///
/// Splits the address into scheme prefix and lookup domain, queries SRV,
/// and produces one `prefix + host:port` address per record, preserving
/// record order. Never fails: NXDOMAIN and resolver errors both yield an
/// empty list for this round.
pub async fn resolve_instances(lookup: &dyn SrvLookup, address: &str) -> Vec<InstanceAddress> {
    let (prefix, domain) = split_address(address);
    match lookup.lookup_srv(&domain).await {
        Ok(records) => records
            .into_iter()
            .map(|r| format!("{prefix}{}:{}", r.host, r.port))
            .collect(),
        Err(LookupError::NotFound(d)) => {
            debug!(domain = %d, "no srv records, treating as zero instances");
            Vec::new()
        }
        Err(e) => {
            warn!(domain = %domain, error = %e, "srv lookup failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Fake lookup: known domains return their records, everything else
    /// is NXDOMAIN.
    struct FakeLookup {
        zones: HashMap<String, Vec<SrvRecord>>,
    }

    impl FakeLookup {
        fn with_zone(domain: &str, records: Vec<(&str, u16)>) -> Self {
            let records = records
                .into_iter()
                .map(|(host, port)| SrvRecord {
                    host: host.to_string(),
                    port,
                })
                .collect();
            Self {
                zones: HashMap::from([(domain.to_string(), records)]),
            }
        }
    }

    impl SrvLookup for FakeLookup {
        fn lookup_srv<'a>(&'a self, domain: &'a str) -> SrvFuture<'a> {
            let result = match self.zones.get(domain) {
                Some(records) => Ok(records.clone()),
                None => Err(LookupError::NotFound(domain.to_string())),
            };
            Box::pin(async move { result })
        }
    }

    /// Fake lookup that always fails with a transport-level error.
    struct BrokenLookup;

    impl SrvLookup for BrokenLookup {
        fn lookup_srv<'a>(&'a self, _domain: &'a str) -> SrvFuture<'a> {
            Box::pin(async { Err(LookupError::Dns("connection refused".to_string())) })
        }
    }

    #[tokio::test]
    async fn scheme_prefix_carries_into_instances() {
        let lookup = FakeLookup::with_zone("svc.example", vec![("a", 80), ("b", 81)]);
        let instances = resolve_instances(&lookup, "https://svc.example/").await;
        assert_eq!(instances, vec!["https://a:80", "https://b:81"]);
    }

    #[tokio::test]
    async fn schemeless_address_resolves_path_segment() {
        let lookup = FakeLookup::with_zone("svc.example", vec![("a", 80)]);
        let instances = resolve_instances(&lookup, "svc.example/path").await;
        assert_eq!(instances, vec!["a:80"]);
    }

    #[tokio::test]
    async fn record_order_is_preserved() {
        let lookup =
            FakeLookup::with_zone("svc.example", vec![("c", 3), ("a", 1), ("b", 2)]);
        let instances = resolve_instances(&lookup, "svc.example").await;
        assert_eq!(instances, vec!["c:3", "a:1", "b:2"]);
    }

    #[tokio::test]
    async fn unknown_domain_yields_empty() {
        let lookup = FakeLookup::with_zone("svc.example", vec![("a", 80)]);
        let instances = resolve_instances(&lookup, "https://other.example/").await;
        assert!(instances.is_empty());
    }

    #[tokio::test]
    async fn resolver_failure_yields_empty() {
        let instances = resolve_instances(&BrokenLookup, "https://svc.example/").await;
        assert!(instances.is_empty());
    }
}
