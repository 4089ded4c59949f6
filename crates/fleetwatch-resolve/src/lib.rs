//! fleetwatch-resolve — DNS SRV discovery of service instances.
//!
//! A service's configured address names a domain whose SRV records list the
//! live instances. Resolution never fails upward: a missing domain or a
//! resolver error just means zero instances this round, and the next round
//! retries naturally.

pub mod address;
pub mod srv;

pub use address::split_address;
pub use srv::{
    DnsSrvLookup, InstanceAddress, LookupError, SrvFuture, SrvLookup, SrvRecord,
    resolve_instances,
};
