//! Configuration types for the synchronizer.
//!
//! The binary assembles a [`SyncConfig`] from its environment and hands it to
//! the components at construction time; nothing in the library reads ambient
//! configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration for one synchronization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// DNS provider credentials and managed zone
    pub dns: DnsConfig,

    /// Mesh membership backend
    pub source: SourceConfig,

    /// Record naming rules (subdomains, affixes)
    #[serde(default)]
    pub naming: NamingConfig,

    /// Tag allow-list restricting which devices participate
    #[serde(default)]
    pub tag_filter: TagFilter,

    /// When set, the record store logs intended writes without issuing them
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.dns.validate()?;
        self.source.validate()?;
        self.naming.validate()?;
        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// API token with record edit permissions
    pub api_token: String,

    /// Managed zone domain (e.g. "example.com")
    pub domain: String,

    /// Zone ID (optional, discovered from the domain when absent)
    pub zone_id: Option<String>,
}

impl DnsConfig {
    /// Validate the DNS provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_token.trim().is_empty() {
            return Err(crate::Error::config("DNS API token cannot be empty"));
        }
        validate_domain_name(&self.domain)?;
        Ok(())
    }
}

/// Mesh membership backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Mesh-native API (static key, or OAuth2 client credentials)
    Tailscale {
        /// Static API key (alternative to the OAuth client pair)
        api_key: Option<String>,
        /// OAuth2 client id
        client_id: Option<String>,
        /// OAuth2 client secret
        client_secret: Option<String>,
        /// Tailnet name the devices belong to
        tailnet: String,
    },

    /// Self-hosted gateway API (static key + base URL)
    Headscale {
        /// Static API key
        api_key: String,
        /// Base URL of the gateway (e.g. "https://headscale.example.com")
        base_url: String,
    },
}

impl SourceConfig {
    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SourceConfig::Tailscale {
                api_key,
                client_id,
                client_secret,
                tailnet,
            } => {
                if tailnet.trim().is_empty() {
                    return Err(crate::Error::config("tailnet cannot be empty"));
                }
                let has_key = api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
                let has_client = client_id.as_deref().is_some_and(|c| !c.trim().is_empty())
                    && client_secret.as_deref().is_some_and(|s| !s.trim().is_empty());
                if !has_key && !has_client {
                    return Err(crate::Error::config(
                        "tailscale source needs an API key or an OAuth client id/secret pair",
                    ));
                }
                Ok(())
            }
            SourceConfig::Headscale { api_key, base_url } => {
                if api_key.trim().is_empty() {
                    return Err(crate::Error::config("headscale API key cannot be empty"));
                }
                if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "headscale base URL must use http or https, got: {base_url}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Get the source type name (used for the console banner)
    pub fn type_name(&self) -> &'static str {
        match self {
            SourceConfig::Tailscale { .. } => "tailscale",
            SourceConfig::Headscale { .. } => "headscale",
        }
    }
}

/// Record naming rules
///
/// At most one of the subdomains classifies a given record during cleanup;
/// the match is checked in a fixed priority order (IPv4, IPv6, primary,
/// bare domain).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Primary subdomain for dual-stack names (optional)
    pub subdomain: Option<String>,

    /// Subdomain that only ever carries A records (optional)
    pub ipv4_subdomain: Option<String>,

    /// Subdomain that only ever carries AAAA records (optional)
    pub ipv6_subdomain: Option<String>,

    /// Prefix attached to every hostname
    #[serde(default)]
    pub prefix: String,

    /// Postfix attached to every hostname
    #[serde(default)]
    pub postfix: String,
}

impl NamingConfig {
    /// Validate the naming configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        for sub in [&self.subdomain, &self.ipv4_subdomain, &self.ipv6_subdomain]
            .into_iter()
            .flatten()
        {
            if sub.trim().is_empty() {
                return Err(crate::Error::config("subdomain cannot be empty when set"));
            }
            validate_domain_name(sub)?;
        }
        Ok(())
    }
}

/// Tag allow-list restricting which mesh devices are synchronized.
///
/// Tags are matched case-insensitively and bare names are implicitly
/// `tag:`-prefixed, so a filter of "prod" admits devices tagged "tag:prod".
/// An empty filter admits every device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter(Vec<String>);

impl TagFilter {
    /// Parse a comma-separated tag list
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .map(|t| {
                    if t.starts_with("tag:") {
                        t
                    } else {
                        format!("tag:{t}")
                    }
                })
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A device passes when the filter is empty or the device carries at
    /// least one allowed tag.
    pub fn matches(&self, device_tags: &[String]) -> bool {
        if self.0.is_empty() {
            return true;
        }
        device_tags
            .iter()
            .any(|t| self.0.iter().any(|allowed| allowed.eq_ignore_ascii_case(t)))
    }
}

/// Validate that a string is a plausible domain name (RFC 1035 label rules)
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "domain name too long: {} chars (max 253)",
            domain.len()
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "domain name has an empty label: {domain:?}"
            )));
        }
        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "domain label too long: {label:?} ({} chars, max 63)",
                label.len()
            )));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "domain label contains invalid characters: {label:?}"
            )));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "domain label cannot start or end with a hyphen: {label:?}"
            )));
        }
    }

    Ok(())
}
