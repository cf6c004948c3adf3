//! Rate-limited access to the tracking provider

pub mod cooldown;
pub mod ports;
pub mod service;

pub use cooldown::{cooldown_hint, FailureKind};
pub use ports::{ConnectivityProbe, DetailLayout, TrackingTransport, TransportFactory};
pub use service::{
    quota_exceeded_message, RequestGateway, RequestGatewayBuilder, SharedClock, VerifiedConnection,
};
