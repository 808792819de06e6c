//! Device source trait — the mesh membership side of the reconciliation.
//!
//! Implementations:
//! - Tailscale (mesh-native API): `meshdns-source-tailscale` crate
//! - Headscale (self-hosted gateway): `meshdns-source-headscale` crate
//!
//! Both produce the same shape: one [`Device`] per address, hostnames already
//! normalized and affixed, tag filtering already applied.

use async_trait::async_trait;

/// One mesh member address, as produced by a device source.
///
/// A device with several addresses appears once per address, all entries
/// sharing the hostname. `address` keeps the raw string reported by the
/// backend; record matching is done on exact strings, never on re-serialized
/// IP values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Display name as reported by the backend
    pub raw_name: String,

    /// Normalized, affixed, lowercase hostname; empty means unusable
    pub hostname: String,

    /// Raw address string
    pub address: String,

    /// Mesh-assigned tags
    pub tags: Vec<String>,
}

/// Trait for mesh membership backends
///
/// Implementations fetch the complete roster in one call at the start of a
/// run; the engine never re-queries per record. Any transport or API error is
/// fatal for the run — sources never retry.
#[async_trait]
pub trait DeviceSource: Send + Sync {
    /// Fetch the current device roster, tag-filtered, one entry per address
    async fn fetch_devices(&self) -> Result<Vec<Device>, crate::Error>;

    /// Backend name for the console banner and logs
    fn source_name(&self) -> &'static str;
}
