// # Tailscale Device Source
//
// Fetches the tailnet device roster via the Tailscale API v2 and turns it
// into the synchronizer's device shape: one entry per address, hostnames
// normalized and affixed, tag filter applied at device granularity.
//
// Authentication is either a static API key (HTTP basic auth, key as the
// username) or an OAuth2 client-credentials exchange whose short-lived access
// token is fetched per run and then used the same way.
//
// ## API Reference
//
// - Token exchange: POST `/api/v2/oauth/token`
// - List devices: GET `/api/v2/tailnet/:tailnet/devices`

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use meshdns_core::config::TagFilter;
use meshdns_core::hostname::{short_name, HostnamePolicy};
use meshdns_core::traits::{Device, DeviceSource};
use meshdns_core::{Error, Result};
use serde::Deserialize;

/// Tailscale API base URL
const TAILSCALE_API_BASE: &str = "https://api.tailscale.com/api/v2";

/// HTTP timeout for API requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials for the Tailscale API
#[derive(Clone)]
pub enum TailscaleAuth {
    /// Static API key, used directly
    ApiKey(String),
    /// OAuth2 client credentials, exchanged for an access token per run
    OAuth {
        client_id: String,
        client_secret: String,
    },
}

// Never expose key material in Debug output.
impl fmt::Debug for TailscaleAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("TailscaleAuth::ApiKey(<REDACTED>)"),
            Self::OAuth { client_id, .. } => f
                .debug_struct("TailscaleAuth::OAuth")
                .field("client_id", client_id)
                .field("client_secret", &"<REDACTED>")
                .finish(),
        }
    }
}

/// Device source backed by the Tailscale API
#[derive(Debug)]
pub struct TailscaleSource {
    auth: TailscaleAuth,
    tailnet: String,
    tag_filter: TagFilter,
    hostnames: HostnamePolicy,
    base_url: String,
    client: reqwest::Client,
}

impl TailscaleSource {
    pub fn new(
        auth: TailscaleAuth,
        tailnet: impl Into<String>,
        tag_filter: TagFilter,
        hostnames: HostnamePolicy,
    ) -> Result<Self> {
        Self::with_base_url(TAILSCALE_API_BASE, auth, tailnet, tag_filter, hostnames)
    }

    /// Source talking to an alternate API endpoint (used by tests).
    pub fn with_base_url(
        base_url: impl Into<String>,
        auth: TailscaleAuth,
        tailnet: impl Into<String>,
        tag_filter: TagFilter,
        hostnames: HostnamePolicy,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            auth,
            tailnet: tailnet.into(),
            tag_filter,
            hostnames,
            base_url: base_url.into(),
            client,
        })
    }

    /// The API key to authenticate the device listing with, performing the
    /// OAuth2 client-credentials exchange when configured.
    async fn access_token(&self) -> Result<String> {
        match &self.auth {
            TailscaleAuth::ApiKey(key) => Ok(key.trim().to_string()),
            TailscaleAuth::OAuth {
                client_id,
                client_secret,
            } => {
                let url = format!("{}/oauth/token", self.base_url);
                let response = self
                    .client
                    .post(&url)
                    .form(&[
                        ("grant_type", "client_credentials"),
                        ("client_id", client_id.trim()),
                        ("client_secret", client_secret.trim()),
                    ])
                    .send()
                    .await
                    .map_err(|e| Error::auth(format!("token exchange failed: {e}")))?;

                if !response.status().is_success() {
                    return Err(Error::auth(format!(
                        "token exchange failed: status {}",
                        response.status()
                    )));
                }

                let token: TokenPayload = response.json().await.map_err(|e| {
                    Error::auth(format!("token exchange returned invalid JSON: {e}"))
                })?;
                Ok(token.access_token)
            }
        }
    }
}

#[async_trait]
impl DeviceSource for TailscaleSource {
    async fn fetch_devices(&self) -> Result<Vec<Device>> {
        let token = self.access_token().await?;
        let url = format!("{}/tailnet/{}/devices", self.base_url, self.tailnet);

        let response = self
            .client
            .get(&url)
            .basic_auth(&token, Some(""))
            .send()
            .await
            .map_err(|e| Error::device_source(format!("device listing failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorPayload>()
                .await
                .map(|e| e.message)
                .unwrap_or_default();
            return Err(Error::device_source(format!(
                "device listing failed: status {status}, {message}"
            )));
        }

        let payload: DevicesPayload = response
            .json()
            .await
            .map_err(|e| Error::device_source(format!("invalid device listing: {e}")))?;

        let mut devices = Vec::new();
        for device in payload.devices {
            if !self.tag_filter.matches(&device.tags) {
                tracing::debug!(device = %device.name, "excluded by tag filter");
                continue;
            }

            let hostname = self.hostnames.apply(short_name(&device.name));
            for address in &device.addresses {
                devices.push(Device {
                    raw_name: device.name.clone(),
                    hostname: hostname.clone(),
                    address: address.clone(),
                    tags: device.tags.clone(),
                });
            }
        }

        tracing::debug!(count = devices.len(), tailnet = %self.tailnet, "assembled roster");
        Ok(devices)
    }

    fn source_name(&self) -> &'static str {
        "tailscale"
    }
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DevicesPayload {
    devices: Vec<DevicePayload>,
}

#[derive(Debug, Deserialize)]
struct DevicePayload {
    name: String,
    #[serde(default)]
    addresses: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: String,
}
