// # meshdns - one-shot mesh-to-DNS synchronizer
//
// Thin integration layer: reads configuration from environment variables,
// initializes logging, wires the configured adapters into the engine, runs
// one reconciliation, and maps the outcome to an exit status. All
// reconciliation logic lives in meshdns-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### DNS provider
// - `MESHDNS_DNS_API_TOKEN`: Cloudflare API token (required)
// - `MESHDNS_DOMAIN`: managed zone domain (required)
// - `MESHDNS_ZONE_ID`: zone ID (optional, discovered from the domain)
//
// ### Device source
// - `MESHDNS_SOURCE`: source type (tailscale, headscale; default tailscale)
// - `MESHDNS_TAILSCALE_API_KEY`: static API key (tailscale)
// - `MESHDNS_TAILSCALE_CLIENT_ID` / `MESHDNS_TAILSCALE_CLIENT_SECRET`:
//   OAuth client pair, used instead of the static key when both are set
// - `MESHDNS_TAILNET`: tailnet name (tailscale, required)
// - `MESHDNS_HEADSCALE_API_KEY`: API key (headscale, required)
// - `MESHDNS_HEADSCALE_URL`: gateway base URL (headscale, required)
//
// ### Naming
// - `MESHDNS_SUBDOMAIN`: primary subdomain for dual-stack names
// - `MESHDNS_SUBDOMAIN_IPV4` / `MESHDNS_SUBDOMAIN_IPV6`: family subdomains
// - `MESHDNS_HOSTNAME_PREFIX` / `MESHDNS_HOSTNAME_POSTFIX`: hostname affixes
// - `MESHDNS_TAG_FILTER`: comma-separated tag allow-list
//
// ### Behavior
// - `MESHDNS_DRY_RUN`: log writes instead of issuing them (1/true/yes)
// - `MESHDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export MESHDNS_DNS_API_TOKEN=your_token
// export MESHDNS_DOMAIN=example.com
// export MESHDNS_SOURCE=tailscale
// export MESHDNS_TAILSCALE_API_KEY=tskey-...
// export MESHDNS_TAILNET=example.com
// export MESHDNS_SUBDOMAIN=mesh
//
// meshdns
// ```

mod console;

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use meshdns_core::hostname::HostnamePolicy;
use meshdns_core::traits::DeviceSource;
use meshdns_core::{DnsConfig, NamingConfig, SourceConfig, SyncConfig, SyncEngine, TagFilter};
use meshdns_provider_cloudflare::CloudflareStore;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the different termination scenarios
///
/// - 0: reconciliation completed
/// - 1: configuration error (nothing was touched)
/// - 2: runtime error (the zone may be partially reconciled; re-run to
///   converge)
#[derive(Debug, Clone, Copy)]
enum SyncExitCode {
    CleanRun = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Read an environment variable, treating unset and blank the same way
fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load configuration from environment variables
fn load_config() -> Result<SyncConfig> {
    let dns = DnsConfig {
        api_token: env_opt("MESHDNS_DNS_API_TOKEN")
            .context("MESHDNS_DNS_API_TOKEN is required")?,
        domain: env_opt("MESHDNS_DOMAIN").context("MESHDNS_DOMAIN is required")?,
        zone_id: env_opt("MESHDNS_ZONE_ID"),
    };

    let source_type = env_opt("MESHDNS_SOURCE").unwrap_or_else(|| "tailscale".to_string());
    let source = match source_type.as_str() {
        "tailscale" => SourceConfig::Tailscale {
            api_key: env_opt("MESHDNS_TAILSCALE_API_KEY"),
            client_id: env_opt("MESHDNS_TAILSCALE_CLIENT_ID"),
            client_secret: env_opt("MESHDNS_TAILSCALE_CLIENT_SECRET"),
            tailnet: env_opt("MESHDNS_TAILNET")
                .context("MESHDNS_TAILNET is required with MESHDNS_SOURCE=tailscale")?,
        },
        "headscale" => SourceConfig::Headscale {
            api_key: env_opt("MESHDNS_HEADSCALE_API_KEY")
                .context("MESHDNS_HEADSCALE_API_KEY is required with MESHDNS_SOURCE=headscale")?,
            base_url: env_opt("MESHDNS_HEADSCALE_URL")
                .context("MESHDNS_HEADSCALE_URL is required with MESHDNS_SOURCE=headscale")?,
        },
        other => anyhow::bail!(
            "MESHDNS_SOURCE '{other}' is not supported. Supported sources: tailscale, headscale"
        ),
    };

    let naming = NamingConfig {
        subdomain: env_opt("MESHDNS_SUBDOMAIN"),
        ipv4_subdomain: env_opt("MESHDNS_SUBDOMAIN_IPV4"),
        ipv6_subdomain: env_opt("MESHDNS_SUBDOMAIN_IPV6"),
        prefix: env_opt("MESHDNS_HOSTNAME_PREFIX").unwrap_or_default(),
        postfix: env_opt("MESHDNS_HOSTNAME_POSTFIX").unwrap_or_default(),
    };

    let tag_filter = TagFilter::parse(&env_opt("MESHDNS_TAG_FILTER").unwrap_or_default());
    let dry_run = matches!(
        env_opt("MESHDNS_DRY_RUN").map(|v| v.to_lowercase()).as_deref(),
        Some("1") | Some("true") | Some("yes")
    );

    Ok(SyncConfig {
        dns,
        source,
        naming,
        tag_filter,
        dry_run,
    })
}

fn main() -> ExitCode {
    let config = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return SyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e}");
        return SyncExitCode::ConfigError.into();
    }

    let log_level = match env_opt("MESHDNS_LOG_LEVEL")
        .unwrap_or_else(|| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => {
            eprintln!(
                "MESHDNS_LOG_LEVEL '{other}' is not valid. \
                Valid levels: trace, debug, info, warn, error"
            );
            return SyncExitCode::ConfigError.into();
        }
    };

    // logs go to stderr; stdout carries the decision protocol
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return SyncExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return SyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config).await {
            Ok(()) => SyncExitCode::CleanRun,
            Err(e) => {
                error!("synchronization failed: {e:#}");
                SyncExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run one reconciliation
async fn run(config: SyncConfig) -> Result<()> {
    let store = CloudflareStore::new(
        config.dns.api_token.clone(),
        config.dns.domain.clone(),
        config.dns.zone_id.clone(),
        config.dry_run,
    )?;
    let source = build_source(&config)?;

    console::banner(config.source.type_name());
    if config.dry_run {
        info!("dry-run mode: no records will be created or deleted");
    }

    let engine = SyncEngine::new(source, Box::new(store), &config);
    let mut reporter = console::ConsoleReporter;
    let summary = engine.run(&mut reporter).await?;

    println!("\n{summary}");
    Ok(())
}

/// Build the configured device source
fn build_source(config: &SyncConfig) -> Result<Box<dyn DeviceSource>> {
    let hostnames = HostnamePolicy::new(
        config.naming.prefix.clone(),
        config.naming.postfix.clone(),
    );

    match &config.source {
        SourceConfig::Tailscale {
            api_key,
            client_id,
            client_secret,
            tailnet,
        } => {
            #[cfg(feature = "tailscale")]
            {
                use meshdns_source_tailscale::{TailscaleAuth, TailscaleSource};

                // an OAuth client pair takes precedence over a static key
                let auth = match (api_key, client_id, client_secret) {
                    (_, Some(id), Some(secret)) => TailscaleAuth::OAuth {
                        client_id: id.clone(),
                        client_secret: secret.clone(),
                    },
                    (Some(key), _, _) => TailscaleAuth::ApiKey(key.clone()),
                    _ => anyhow::bail!(
                        "tailscale source needs an API key or an OAuth client id/secret pair"
                    ),
                };

                Ok(Box::new(TailscaleSource::new(
                    auth,
                    tailnet.clone(),
                    config.tag_filter.clone(),
                    hostnames,
                )?))
            }
            #[cfg(not(feature = "tailscale"))]
            {
                let _ = (api_key, client_id, client_secret, tailnet, hostnames);
                anyhow::bail!("this build does not include the tailscale source")
            }
        }
        SourceConfig::Headscale { api_key, base_url } => {
            #[cfg(feature = "headscale")]
            {
                use meshdns_source_headscale::HeadscaleSource;

                Ok(Box::new(HeadscaleSource::new(
                    api_key.clone(),
                    base_url.clone(),
                    config.tag_filter.clone(),
                    hostnames,
                )?))
            }
            #[cfg(not(feature = "headscale"))]
            {
                let _ = (api_key, base_url, hostnames);
                anyhow::bail!("this build does not include the headscale source")
            }
        }
    }
}
