//! Test doubles and common utilities for engine-level tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use meshdns_core::error::Result;
use meshdns_core::report::{SyncEvent, SyncReporter};
use meshdns_core::traits::{Device, DeviceSource, ManagedRecord, RecordStore, RecordType};
use meshdns_core::{DnsConfig, NamingConfig, SourceConfig, SyncConfig, TagFilter};

/// A device source with a fixed roster
pub struct StaticDeviceSource {
    devices: Vec<Device>,
}

impl StaticDeviceSource {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }
}

#[async_trait::async_trait]
impl DeviceSource for StaticDeviceSource {
    async fn fetch_devices(&self) -> Result<Vec<Device>> {
        Ok(self.devices.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An in-memory record store that applies creates and deletes to its own
/// snapshot and tracks every call.
///
/// Clone the `Arc` fields before handing the store to an engine; the handles
/// stay valid for assertions afterwards.
pub struct InMemoryRecordStore {
    pub records: Arc<Mutex<Vec<ManagedRecord>>>,
    next_id: AtomicUsize,
    pub created: Arc<Mutex<Vec<(String, RecordType, String)>>>,
    pub deleted: Arc<Mutex<Vec<String>>>,
    pub fetch_count: Arc<AtomicUsize>,
}

impl InMemoryRecordStore {
    pub fn new(records: Vec<ManagedRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            next_id: AtomicUsize::new(1000),
            created: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A second handle onto the same underlying zone, for back-to-back runs
    pub fn sharing_zone_with(other: &Self) -> Self {
        Self {
            records: Arc::clone(&other.records),
            next_id: AtomicUsize::new(2000),
            created: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_records(&self) -> Result<Vec<ManagedRecord>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create_record(
        &self,
        fqdn: &str,
        record_type: RecordType,
        content: &str,
    ) -> Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.created
            .lock()
            .unwrap()
            .push((fqdn.to_string(), record_type, content.to_string()));
        self.records.lock().unwrap().push(ManagedRecord {
            id: id.to_string(),
            fqdn: fqdn.to_string(),
            record_type,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn delete_record(&self, record_id: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(record_id.to_string());
        self.records.lock().unwrap().retain(|r| r.id != record_id);
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "in-memory"
    }
}

/// A reporter that keeps every event for assertions
#[derive(Default)]
pub struct CollectingReporter {
    pub events: Vec<SyncEvent>,
}

impl SyncReporter for CollectingReporter {
    fn report(&mut self, event: SyncEvent) {
        self.events.push(event);
    }
}

pub fn device(hostname: &str, address: &str) -> Device {
    Device {
        raw_name: hostname.to_string(),
        hostname: hostname.to_string(),
        address: address.to_string(),
        tags: Vec::new(),
    }
}

pub fn record(id: &str, fqdn: &str, record_type: RecordType, content: &str) -> ManagedRecord {
    ManagedRecord {
        id: id.to_string(),
        fqdn: fqdn.to_string(),
        record_type,
        content: content.to_string(),
    }
}

/// Helper to create a minimal SyncConfig for testing
pub fn minimal_config(domain: &str, naming: NamingConfig) -> SyncConfig {
    SyncConfig {
        dns: DnsConfig {
            api_token: "test-token".to_string(),
            domain: domain.to_string(),
            zone_id: None,
        },
        source: SourceConfig::Headscale {
            api_key: "test-key".to_string(),
            base_url: "http://localhost".to_string(),
        },
        naming,
        tag_filter: TagFilter::default(),
        dry_run: false,
    }
}
