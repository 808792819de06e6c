// # Headscale Device Source
//
// Fetches the machine roster from a self-hosted Headscale gateway and turns
// it into the synchronizer's device shape: one entry per address, hostnames
// normalized and affixed, tag filter applied at device granularity.
//
// Machines whose given name starts with "localhost" are always excluded;
// they are ephemeral registration artifacts, not devices worth naming.
//
// ## API Reference
//
// - List machines: GET `{base_url}/api/v1/machine` (Bearer auth)

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use meshdns_core::config::TagFilter;
use meshdns_core::hostname::{short_name, HostnamePolicy};
use meshdns_core::traits::{Device, DeviceSource};
use meshdns_core::{Error, Result};
use serde::Deserialize;

/// HTTP timeout for API requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Device source backed by a self-hosted Headscale gateway
pub struct HeadscaleSource {
    api_key: String,
    base_url: String,
    tag_filter: TagFilter,
    hostnames: HostnamePolicy,
    client: reqwest::Client,
}

// Never expose the API key in Debug output.
impl fmt::Debug for HeadscaleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadscaleSource")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HeadscaleSource {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        tag_filter: TagFilter,
        hostnames: HostnamePolicy,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("Headscale API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tag_filter,
            hostnames,
            client,
        })
    }
}

#[async_trait]
impl DeviceSource for HeadscaleSource {
    async fn fetch_devices(&self) -> Result<Vec<Device>> {
        let url = format!("{}/api/v1/machine", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_key.trim())
            .send()
            .await
            .map_err(|e| Error::device_source(format!("machine listing failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorPayload>()
                .await
                .map(|e| e.message)
                .unwrap_or_default();
            return Err(Error::device_source(format!(
                "machine listing failed: status {status}, {message}"
            )));
        }

        let payload: MachinesPayload = response
            .json()
            .await
            .map_err(|e| Error::device_source(format!("invalid machine listing: {e}")))?;

        let mut devices = Vec::new();
        for machine in payload.machines {
            if machine.given_name.to_lowercase().starts_with("localhost") {
                tracing::debug!(machine = %machine.given_name, "excluded localhost machine");
                continue;
            }

            let tags: Vec<String> = machine
                .forced_tags
                .iter()
                .chain(machine.valid_tags.iter())
                .cloned()
                .collect();
            if !self.tag_filter.matches(&tags) {
                tracing::debug!(machine = %machine.given_name, "excluded by tag filter");
                continue;
            }

            let hostname = self.hostnames.apply(short_name(&machine.given_name));
            for address in &machine.ip_addresses {
                devices.push(Device {
                    raw_name: machine.given_name.clone(),
                    hostname: hostname.clone(),
                    address: address.clone(),
                    tags: tags.clone(),
                });
            }
        }

        tracing::debug!(count = devices.len(), "assembled roster");
        Ok(devices)
    }

    fn source_name(&self) -> &'static str {
        "headscale"
    }
}

#[derive(Debug, Deserialize)]
struct MachinesPayload {
    machines: Vec<MachinePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MachinePayload {
    given_name: String,
    #[serde(default)]
    ip_addresses: Vec<String>,
    #[serde(default)]
    forced_tags: Vec<String>,
    #[serde(default)]
    valid_tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: String,
}
