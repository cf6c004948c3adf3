//! Mapping of reqwest, serde and I/O failures onto [`TickbridgeError`]
//!
//! Orphan rules keep these `From` impls out of the domain crate, so they go
//! through the [`InfraError`] newtype and `?` converts twice.

use std::io::{Error as IoError, ErrorKind};

use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use tickbridge_domain::TickbridgeError;

#[derive(Debug)]
pub struct InfraError(pub TickbridgeError);

impl From<InfraError> for TickbridgeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TickbridgeError> for InfraError {
    fn from(value: TickbridgeError) -> Self {
        InfraError(value)
    }
}

fn from_http(err: &HttpError) -> TickbridgeError {
    if err.is_timeout() {
        return TickbridgeError::Network("request to Toggl timed out".into());
    }
    if err.is_connect() {
        return TickbridgeError::Network(format!("could not connect to Toggl: {err}"));
    }
    if err.is_decode() {
        return TickbridgeError::Internal(format!("unexpected response body: {err}"));
    }

    match err.status() {
        Some(status) => {
            let code = status.as_u16();
            let message = format!("HTTP {code} {}", status.canonical_reason().unwrap_or(""))
                .trim_end()
                .to_string();
            match code {
                401 | 403 => TickbridgeError::Auth(message),
                404 => TickbridgeError::NotFound(message),
                _ => TickbridgeError::Provider { status: code, message },
            }
        }
        None => TickbridgeError::Network(err.to_string()),
    }
}

fn from_json(err: &JsonError) -> TickbridgeError {
    if err.is_io() {
        TickbridgeError::Internal(format!("JSON I/O failure: {err}"))
    } else {
        TickbridgeError::InvalidInput(format!("invalid JSON: {err}"))
    }
}

fn from_io(err: &IoError) -> TickbridgeError {
    match err.kind() {
        ErrorKind::NotFound => TickbridgeError::NotFound(format!("file not found: {err}")),
        ErrorKind::PermissionDenied => TickbridgeError::Config(format!("permission denied: {err}")),
        _ => TickbridgeError::Internal(format!("I/O failure: {err}")),
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(from_http(&value))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(from_json(&value))
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(from_io(&value))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(TickbridgeError::Config(format!("Invalid TOML format: {value}")))
    }
}

impl From<toml::ser::Error> for InfraError {
    fn from(value: toml::ser::Error) -> Self {
        InfraError(TickbridgeError::Internal(format!("failed to serialize TOML: {value}")))
    }
}
