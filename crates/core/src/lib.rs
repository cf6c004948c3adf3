//! # Tickbridge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the transport, notices and settings storage
//! - The rate-limited request gateway
//! - The timer synchronizer with its availability state machine
//! - Reference lookup and report assembly
//!
//! ## Architecture Principles
//! - Only depends on `tickbridge-common` and `tickbridge-domain`
//! - No HTTP, filesystem or platform code
//! - All external dependencies via traits

pub mod gateway;
pub mod reference;
pub mod reports;
pub mod sync;

// Infrastructure ports
pub mod notification_ports;
pub mod settings_ports;

// Re-export specific items to avoid ambiguity
pub use gateway::{
    ConnectivityProbe, DetailLayout, FailureKind, RequestGateway, SharedClock, TrackingTransport,
    TransportFactory, VerifiedConnection,
};
pub use notification_ports::NotificationSink;
pub use reference::{ReferenceLookup, ReferenceStore};
pub use reports::ReportService;
pub use settings_ports::SettingsStore;
pub use sync::{PeriodicTask, TimerSynchronizer};
