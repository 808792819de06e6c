//! Record store trait — the DNS side of the reconciliation.
//!
//! Implementations:
//! - Cloudflare: `meshdns-provider-cloudflare` crate
//!
//! Only address records are in scope. The store never updates a record in
//! place; drift resolves as delete plus re-create across runs.

use std::fmt;
use std::net::IpAddr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// DNS address record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    #[serde(rename = "A")]
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Record type matching an address family
    pub fn for_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Self::A,
            IpAddr::V6(_) => Self::Aaaa,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One managed address record as the provider reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedRecord {
    /// Provider-assigned opaque record id
    pub id: String,

    /// Fully qualified record name
    pub fqdn: String,

    /// A or AAAA
    pub record_type: RecordType,

    /// Raw address string the record points at
    pub content: String,
}

impl ManagedRecord {
    /// Exact-entry identity: FQDN and content must both match as strings.
    pub fn matches(&self, fqdn: &str, content: &str) -> bool {
        self.fqdn == fqdn && self.content == content
    }
}

/// Trait for managed-zone record stores
///
/// Each create/delete is an independent, immediately committed external call;
/// there is no transaction across them. Errors are fatal for the run except
/// where a method documents otherwise.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch all managed address records for the zone
    async fn fetch_records(&self) -> Result<Vec<ManagedRecord>, crate::Error>;

    /// Create an address record pointing `fqdn` at `content`
    async fn create_record(
        &self,
        fqdn: &str,
        record_type: RecordType,
        content: &str,
    ) -> Result<(), crate::Error>;

    /// Delete a record by provider id.
    ///
    /// Best-effort: transport failures are errors, but the provider's
    /// response is logged rather than validated.
    async fn delete_record(&self, record_id: &str) -> Result<(), crate::Error>;

    /// Provider name for logs
    fn store_name(&self) -> &'static str;
}
