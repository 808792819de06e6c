//! The reconciliation engine.
//!
//! One run has two strictly sequential phases. The creation phase walks the
//! device roster against a snapshot of the zone's records and issues creates;
//! the cleanup phase re-fetches the records (so just-created entries are seen
//! as in use) and issues deletes for records no device backs any more.
//!
//! Snapshots are taken once per phase and never re-queried per record. A
//! record created or deleted by another process between snapshot and action
//! is not detected; re-running the tool is the recovery mechanism, and the
//! FOUND/IN USE checks make repeated runs converge instead of duplicating.

use crate::config::SyncConfig;
use crate::hostname::{HostnamePolicy, is_valid_hostname};
use crate::mesh::{is_mesh_ip, parse_address};
use crate::naming::FqdnPolicy;
use crate::report::{SkipReason, SyncEvent, SyncReporter, SyncSummary};
use crate::traits::{Device, DeviceSource, ManagedRecord, RecordStore, RecordType};
use crate::Result;

/// Orchestrates one reconciliation run over a device source and a record
/// store.
pub struct SyncEngine {
    source: Box<dyn DeviceSource>,
    store: Box<dyn RecordStore>,
    policy: FqdnPolicy,
    affixes: HostnamePolicy,
}

impl SyncEngine {
    /// Create a new engine. All configuration is taken here; the engine does
    /// no ambient lookups while running.
    pub fn new(
        source: Box<dyn DeviceSource>,
        store: Box<dyn RecordStore>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            source,
            store,
            policy: FqdnPolicy::new(&config.dns.domain, &config.naming),
            affixes: HostnamePolicy::new(
                config.naming.prefix.clone(),
                config.naming.postfix.clone(),
            ),
        }
    }

    /// Run both phases once, reporting every decision as it is made.
    ///
    /// Creates and deletes are committed immediately; an error partway
    /// through leaves earlier writes in place and aborts the run.
    pub async fn run(&self, reporter: &mut dyn SyncReporter) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();

        let devices = self.source.fetch_devices().await?;
        tracing::info!(
            count = devices.len(),
            source = self.source.source_name(),
            "fetched device roster"
        );

        let records = self.store.fetch_records().await?;
        tracing::info!(count = records.len(), "fetched zone records");

        reporter.report(SyncEvent::AdditionPhase);
        for device in &devices {
            for decision in creation_decisions(device, &records, &self.policy)? {
                self.apply_creation(device, decision, reporter, &mut summary)
                    .await?;
            }
        }

        // Fresh snapshot so records created above show up as IN USE.
        let records = self.store.fetch_records().await?;

        reporter.report(SyncEvent::CleanupPhase);
        for record in &records {
            let Some(decision) =
                cleanup_decision(record, &devices, &self.policy, &self.affixes)?
            else {
                // not under management, not a candidate for anything
                continue;
            };
            self.apply_cleanup(record, decision, reporter, &mut summary)
                .await?;
        }

        Ok(summary)
    }

    async fn apply_creation(
        &self,
        device: &Device,
        decision: CreationDecision,
        reporter: &mut dyn SyncReporter,
        summary: &mut SyncSummary,
    ) -> Result<()> {
        match decision {
            CreationDecision::Found { fqdn } => {
                summary.found += 1;
                reporter.report(SyncEvent::Found {
                    fqdn,
                    address: device.address.clone(),
                });
            }
            CreationDecision::Add { fqdn, record_type } => {
                summary.added += 1;
                reporter.report(SyncEvent::Adding {
                    fqdn: fqdn.clone(),
                    address: device.address.clone(),
                });
                self.store
                    .create_record(&fqdn, record_type, &device.address)
                    .await?;
            }
            CreationDecision::Skip { name, reason } => {
                summary.skipped += 1;
                reporter.report(SyncEvent::Skipping {
                    name,
                    address: device.address.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }

    async fn apply_cleanup(
        &self,
        record: &ManagedRecord,
        decision: CleanupDecision,
        reporter: &mut dyn SyncReporter,
        summary: &mut SyncSummary,
    ) -> Result<()> {
        match decision {
            CleanupDecision::InUse => {
                summary.in_use += 1;
                reporter.report(SyncEvent::InUse {
                    fqdn: record.fqdn.clone(),
                    address: record.content.clone(),
                });
            }
            CleanupDecision::SkipDelete => {
                summary.skip_deleted += 1;
                tracing::warn!(
                    fqdn = %record.fqdn,
                    content = %record.content,
                    "record address is outside the mesh ranges, not deleting"
                );
                reporter.report(SyncEvent::SkipDelete {
                    fqdn: record.fqdn.clone(),
                    address: record.content.clone(),
                });
            }
            CleanupDecision::Delete => {
                summary.deleted += 1;
                reporter.report(SyncEvent::Deleting {
                    fqdn: record.fqdn.clone(),
                    address: record.content.clone(),
                });
                self.store.delete_record(&record.id).await?;
            }
        }
        Ok(())
    }
}

/// What to do for one (device, FQDN) pair during the creation phase
#[derive(Debug, Clone, PartialEq, Eq)]
enum CreationDecision {
    Found { fqdn: String },
    Add { fqdn: String, record_type: RecordType },
    Skip { name: String, reason: SkipReason },
}

/// Decisions for one device entry, in execution order.
///
/// The main dual-stack name is decided first; the family-specific name is an
/// independent, additive namespace decided afterwards (without repeating the
/// validity check, which only gates the main create).
fn creation_decisions(
    device: &Device,
    records: &[ManagedRecord],
    policy: &FqdnPolicy,
) -> Result<Vec<CreationDecision>> {
    if device.hostname.is_empty() {
        return Ok(vec![CreationDecision::Skip {
            name: device.raw_name.clone(),
            reason: SkipReason::EmptyHostname,
        }]);
    }

    let ip = parse_address(&device.address)?;
    let record_type = RecordType::for_ip(ip);
    let mut decisions = Vec::with_capacity(2);

    let main = policy.main_fqdn(&device.hostname);
    if records.iter().any(|r| r.matches(&main, &device.address)) {
        decisions.push(CreationDecision::Found { fqdn: main });
    } else if !is_valid_hostname(&device.hostname) {
        decisions.push(CreationDecision::Skip {
            name: main,
            reason: SkipReason::InvalidHostname,
        });
    } else {
        decisions.push(CreationDecision::Add {
            fqdn: main,
            record_type,
        });
    }

    if let Some(fqdn) = policy.family_fqdn(&device.hostname, record_type) {
        if records.iter().any(|r| r.matches(&fqdn, &device.address)) {
            decisions.push(CreationDecision::Found { fqdn });
        } else {
            decisions.push(CreationDecision::Add { fqdn, record_type });
        }
    }

    Ok(decisions)
}

/// What to do with one existing record during the cleanup phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CleanupDecision {
    InUse,
    SkipDelete,
    Delete,
}

/// Decision for one existing record; `None` means the record is not under
/// management (unrecognized suffix, or affixes don't match) and is ignored
/// silently.
fn cleanup_decision(
    record: &ManagedRecord,
    devices: &[Device],
    policy: &FqdnPolicy,
    affixes: &HostnamePolicy,
) -> Result<Option<CleanupDecision>> {
    let Some(hostname) = policy.classify(&record.fqdn) else {
        return Ok(None);
    };

    // affix guard: protects unrelated records sharing the managed subdomain
    if !hostname.starts_with(&affixes.prefix) || !hostname.ends_with(&affixes.postfix) {
        return Ok(None);
    }

    if devices
        .iter()
        .any(|d| d.hostname == hostname && d.address == record.content)
    {
        return Ok(Some(CleanupDecision::InUse));
    }

    let ip = parse_address(&record.content)?;
    if !is_mesh_ip(ip) {
        return Ok(Some(CleanupDecision::SkipDelete));
    }

    Ok(Some(CleanupDecision::Delete))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingConfig;

    fn device(hostname: &str, address: &str) -> Device {
        Device {
            raw_name: hostname.to_string(),
            hostname: hostname.to_string(),
            address: address.to_string(),
            tags: Vec::new(),
        }
    }

    fn record(id: &str, fqdn: &str, record_type: RecordType, content: &str) -> ManagedRecord {
        ManagedRecord {
            id: id.to_string(),
            fqdn: fqdn.to_string(),
            record_type,
            content: content.to_string(),
        }
    }

    fn policy(naming: &NamingConfig) -> FqdnPolicy {
        FqdnPolicy::new("example.com", naming)
    }

    #[test]
    fn empty_hostname_is_skipped_without_parsing() {
        let naming = NamingConfig::default();
        let mut dev = device("", "not-an-ip");
        dev.raw_name = "___".to_string();
        let decisions = creation_decisions(&dev, &[], &policy(&naming)).unwrap();
        assert_eq!(
            decisions,
            vec![CreationDecision::Skip {
                name: "___".to_string(),
                reason: SkipReason::EmptyHostname,
            }]
        );
    }

    #[test]
    fn missing_record_is_added() {
        let naming = NamingConfig::default();
        let decisions =
            creation_decisions(&device("web1", "100.100.1.1"), &[], &policy(&naming)).unwrap();
        assert_eq!(
            decisions,
            vec![CreationDecision::Add {
                fqdn: "web1.example.com".to_string(),
                record_type: RecordType::A,
            }]
        );
    }

    #[test]
    fn existing_record_is_found_not_added() {
        let naming = NamingConfig::default();
        let records = [record("1", "web1.example.com", RecordType::A, "100.100.1.1")];
        let decisions =
            creation_decisions(&device("web1", "100.100.1.1"), &records, &policy(&naming))
                .unwrap();
        assert_eq!(
            decisions,
            vec![CreationDecision::Found {
                fqdn: "web1.example.com".to_string(),
            }]
        );
    }

    #[test]
    fn same_name_different_address_is_added_again() {
        let naming = NamingConfig::default();
        let records = [record("1", "web1.example.com", RecordType::A, "100.100.1.1")];
        let decisions =
            creation_decisions(&device("web1", "100.100.1.2"), &records, &policy(&naming))
                .unwrap();
        assert!(matches!(decisions[0], CreationDecision::Add { .. }));
    }

    #[test]
    fn family_subdomain_is_additive() {
        let naming = NamingConfig {
            ipv4_subdomain: Some("v4".to_string()),
            ..NamingConfig::default()
        };
        let decisions =
            creation_decisions(&device("web1", "100.100.1.1"), &[], &policy(&naming)).unwrap();
        assert_eq!(decisions.len(), 2);
        assert_eq!(
            decisions[1],
            CreationDecision::Add {
                fqdn: "web1.v4.example.com".to_string(),
                record_type: RecordType::A,
            }
        );
    }

    #[test]
    fn ipv6_device_ignores_ipv4_subdomain() {
        let naming = NamingConfig {
            ipv4_subdomain: Some("v4".to_string()),
            ..NamingConfig::default()
        };
        let decisions = creation_decisions(
            &device("web1", "fd7a:115c:a1e0::1"),
            &[],
            &policy(&naming),
        )
        .unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(
            decisions[0],
            CreationDecision::Add {
                fqdn: "web1.example.com".to_string(),
                record_type: RecordType::Aaaa,
            }
        );
    }

    #[test]
    fn malformed_device_address_is_fatal() {
        let naming = NamingConfig::default();
        assert!(creation_decisions(&device("web1", "garbage"), &[], &policy(&naming)).is_err());
    }

    #[test]
    fn record_in_use_is_kept() {
        let naming = NamingConfig::default();
        let devices = [device("web1", "100.100.1.1")];
        let rec = record("1", "web1.example.com", RecordType::A, "100.100.1.1");
        let decision =
            cleanup_decision(&rec, &devices, &policy(&naming), &HostnamePolicy::default())
                .unwrap();
        assert_eq!(decision, Some(CleanupDecision::InUse));
    }

    #[test]
    fn stale_mesh_record_is_deleted() {
        let naming = NamingConfig::default();
        let rec = record("1", "gone.example.com", RecordType::A, "100.100.9.9");
        let decision =
            cleanup_decision(&rec, &[], &policy(&naming), &HostnamePolicy::default()).unwrap();
        assert_eq!(decision, Some(CleanupDecision::Delete));
    }

    #[test]
    fn stale_non_mesh_record_is_kept_for_manual_removal() {
        let naming = NamingConfig::default();
        let rec = record("1", "gone.example.com", RecordType::A, "8.8.8.8");
        let decision =
            cleanup_decision(&rec, &[], &policy(&naming), &HostnamePolicy::default()).unwrap();
        assert_eq!(decision, Some(CleanupDecision::SkipDelete));
    }

    #[test]
    fn unclassifiable_record_is_ignored() {
        let naming = NamingConfig {
            subdomain: Some("int".to_string()),
            ..NamingConfig::default()
        };
        // bare-domain record while a primary subdomain is configured
        let rec = record("1", "mail.example.com", RecordType::A, "100.100.1.1");
        let decision =
            cleanup_decision(&rec, &[], &policy(&naming), &HostnamePolicy::default()).unwrap();
        assert_eq!(decision, None);
    }

    #[test]
    fn affix_guard_protects_foreign_records() {
        let naming = NamingConfig::default();
        let affixes = HostnamePolicy::new("ts-", "");
        let rec = record("1", "mail.example.com", RecordType::A, "100.100.1.1");
        let decision = cleanup_decision(&rec, &[], &policy(&naming), &affixes).unwrap();
        assert_eq!(decision, None);

        let rec = record("2", "ts-gone.example.com", RecordType::A, "100.100.1.1");
        let decision = cleanup_decision(&rec, &[], &policy(&naming), &affixes).unwrap();
        assert_eq!(decision, Some(CleanupDecision::Delete));
    }

    #[test]
    fn malformed_record_content_is_fatal() {
        let naming = NamingConfig::default();
        let rec = record("1", "gone.example.com", RecordType::A, "not-an-ip");
        assert!(
            cleanup_decision(&rec, &[], &policy(&naming), &HostnamePolicy::default()).is_err()
        );
    }

    #[test]
    fn address_match_is_textual_not_semantic() {
        let naming = NamingConfig::default();
        let devices = [device("web1", "fd7a:115c:a1e0::1")];
        // same address, alternative spelling: counts as stale, not in use
        let rec = record(
            "1",
            "web1.example.com",
            RecordType::Aaaa,
            "fd7a:115c:a1e0:0:0:0:0:1",
        );
        let decision =
            cleanup_decision(&rec, &devices, &policy(&naming), &HostnamePolicy::default())
                .unwrap();
        assert_eq!(decision, Some(CleanupDecision::Delete));
    }
}
