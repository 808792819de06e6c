//! Trait definitions for the synchronizer's adapter seams

pub mod device_source;
pub mod record_store;

pub use device_source::{Device, DeviceSource};
pub use record_store::{ManagedRecord, RecordStore, RecordType};
