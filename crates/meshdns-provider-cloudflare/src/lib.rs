// # Cloudflare Record Store
//
// This crate implements the `RecordStore` side of the synchronizer against
// the Cloudflare API v4.
//
// - One HTTP request per store call; no retry, no backoff (errors are
//   terminal for the whole run)
// - Zone auto-discovery from the domain name, or an explicit zone ID
// - Address records only (A/AAAA); everything else is filtered out
// - Dry-run mode performs all reads but logs writes instead of issuing them
// - The API token never appears in logs or Debug output
//
// ## API Reference
//
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?per_page=150`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use meshdns_core::traits::{ManagedRecord, RecordStore, RecordType};
use meshdns_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// HTTP timeout for API requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed page size for record listing; zones with more address records than
/// this are out of scope
const RECORD_PAGE_SIZE: u32 = 150;

/// TTL for created records
const RECORD_TTL: u32 = 120;

/// Comment attached to created records so operators can recognize
/// tool-owned entries in the provider UI
const RECORD_COMMENT: &str = "@managed by meshdns";

/// Record store backed by the Cloudflare API.
///
/// The zone ID is taken from configuration when present, otherwise looked up
/// from the domain name on first use and cached for the rest of the run.
pub struct CloudflareStore {
    api_token: String,
    domain: String,
    zone_id: OnceCell<String>,
    base_url: String,
    client: reqwest::Client,
    dry_run: bool,
}

// The Debug implementation intentionally does not expose the API token.
impl fmt::Debug for CloudflareStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareStore")
            .field("api_token", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("zone_id", &self.zone_id.get())
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareStore {
    /// Create a store for a managed zone.
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `domain`: the managed zone's domain name
    /// - `zone_id`: optional pre-configured zone ID (skips discovery)
    /// - `dry_run`: when true, creates and deletes are logged, not issued
    pub fn new(
        api_token: impl Into<String>,
        domain: impl Into<String>,
        zone_id: Option<String>,
        dry_run: bool,
    ) -> Result<Self> {
        Self::with_base_url(CLOUDFLARE_API_BASE, api_token, domain, zone_id, dry_run)
    }

    /// Store talking to an alternate API endpoint (used by tests).
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        domain: impl Into<String>,
        zone_id: Option<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_token,
            domain: domain.into(),
            zone_id: OnceCell::new_with(zone_id),
            base_url: base_url.into(),
            client,
            dry_run,
        })
    }

    /// The zone ID, discovering and caching it on first use.
    async fn zone_id(&self) -> Result<&str> {
        self.zone_id
            .get_or_try_init(|| self.lookup_zone_id())
            .await
            .map(String::as_str)
    }

    /// Find the zone whose name equals the managed domain.
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn lookup_zone_id(&self) -> Result<String> {
        tracing::debug!(domain = %self.domain, "looking up zone ID");

        let url = format!("{}/zones?name={}", self.base_url, self.domain);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_token.trim())
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("zone lookup failed: {e}")))?;

        let zones: Vec<ZonePayload> = self.parse_response(response, "zone lookup").await?;
        let zone = zones
            .into_iter()
            .find(|z| z.name == self.domain)
            .ok_or_else(|| Error::not_found(format!("zone not found: {}", self.domain)))?;

        tracing::debug!(zone_id = %zone.id, "found zone ID");
        Ok(zone.id)
    }

    /// Check status and the Cloudflare `{success, errors, result}` envelope,
    /// returning the result payload.
    async fn parse_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        what: &str,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error response".to_string());

            return Err(match status.as_u16() {
                401 | 403 => Error::auth(format!(
                    "{what}: invalid API token or insufficient permissions (status {status})"
                )),
                404 => Error::not_found(format!("{what}: status {status}")),
                429 => Error::rate_limited(format!("{what}: status {status}")),
                _ => Error::provider("cloudflare", format!("{what} failed: {status} - {text}")),
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("{what}: invalid response: {e}")))?;

        if !envelope.success {
            return Err(Error::provider(
                "cloudflare",
                format!("{what} failed: {}", envelope.errors),
            ));
        }

        envelope
            .result
            .ok_or_else(|| Error::provider("cloudflare", format!("{what}: missing result")))
    }
}

#[async_trait]
impl RecordStore for CloudflareStore {
    /// Fetch all address records for the zone (single fixed-size page).
    async fn fetch_records(&self) -> Result<Vec<ManagedRecord>> {
        let zone_id = self.zone_id().await?;
        let url = format!(
            "{}/zones/{}/dns_records?per_page={}",
            self.base_url, zone_id, RECORD_PAGE_SIZE
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_token.trim())
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("record listing failed: {e}")))?;

        let records: Vec<RecordPayload> = self.parse_response(response, "record listing").await?;

        Ok(records
            .into_iter()
            .filter_map(|r| {
                let record_type = match r.record_type.as_str() {
                    "A" => RecordType::A,
                    "AAAA" => RecordType::Aaaa,
                    _ => return None,
                };
                Some(ManagedRecord {
                    id: r.id,
                    fqdn: r.name,
                    record_type,
                    content: r.content,
                })
            })
            .collect())
    }

    async fn create_record(
        &self,
        fqdn: &str,
        record_type: RecordType,
        content: &str,
    ) -> Result<()> {
        let payload = serde_json::json!({
            "type": record_type.as_str(),
            "name": fqdn,
            "content": content,
            "ttl": RECORD_TTL,
            "comment": RECORD_COMMENT,
        });

        if self.dry_run {
            tracing::info!(%fqdn, %content, "[dry-run] would create record: {payload}");
            return Ok(());
        }

        let zone_id = self.zone_id().await?;
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_token.trim())
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("record create failed: {e}")))?;

        let status = response.status();
        let _: serde_json::Value = self.parse_response(response, "record create").await?;
        tracing::info!(%fqdn, %content, %status, "record created");
        Ok(())
    }

    /// Delete by record id. Best-effort: the provider's response is logged,
    /// not validated.
    async fn delete_record(&self, record_id: &str) -> Result<()> {
        if self.dry_run {
            tracing::info!(record_id, "[dry-run] would delete record");
            return Ok(());
        }

        let zone_id = self.zone_id().await?;
        let url = format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(self.api_token.trim())
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("record delete failed: {e}")))?;

        tracing::info!(record_id, status = %response.status(), "record deleted");
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: serde_json::Value,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ZonePayload {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RecordPayload {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
}
