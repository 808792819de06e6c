// # meshdns-core
//
// Core library for the mesh-to-DNS zone synchronizer.
//
// ## Architecture Overview
//
// - **DeviceSource**: Trait for fetching the mesh device roster
// - **RecordStore**: Trait for reading and mutating managed zone records
// - **SyncEngine**: One-shot reconciliation of roster against records
// - **FqdnPolicy**: Naming rules (subdomains, forward and reverse)
// - **hostname / mesh**: Pure helpers for label sanitation and mesh ranges
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from the HTTP
//    adapters; the engine only sees the two traits
// 2. **Explicit Configuration**: Components receive their configuration at
//    construction time, never through ambient lookups
// 3. **Fail-Fast**: Adapter errors are terminal and propagate as values; the
//    library never exits the process
// 4. **Idempotency**: FOUND/IN USE checks make repeated runs converge

pub mod config;
pub mod engine;
pub mod error;
pub mod hostname;
pub mod mesh;
pub mod naming;
pub mod report;
pub mod traits;

// Re-export core types for convenience
pub use config::{DnsConfig, NamingConfig, SourceConfig, SyncConfig, TagFilter};
pub use engine::SyncEngine;
pub use error::{Error, Result};
pub use hostname::HostnamePolicy;
pub use naming::FqdnPolicy;
pub use report::{SkipReason, SyncEvent, SyncReporter, SyncSummary};
pub use traits::{Device, DeviceSource, ManagedRecord, RecordStore, RecordType};
