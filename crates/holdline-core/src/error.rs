//! Errors and the fatal-fault reporting entry point

use thiserror::Error;

use crate::time::Duration;

/// Recoverable stream errors.
#[derive(Error, Debug)]
pub enum StreamError {
    /// A commit asked for more timeline than is buffered and no empty
    /// policy is available to fill the shortfall.
    #[error("buffer underrun: requested {requested}, buffered {available}")]
    Underrun {
        requested: Duration,
        available: Duration,
    },
}

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Fatal fault kinds routed through [`report_fatal`].
#[derive(Error, Debug)]
pub enum Fault {
    /// Caller bug: an API contract was broken at the call site.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// Static wiring mistake: role or configuration mismatch at attach.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An abstract hook was invoked without a concrete override.
    #[error("not implemented: {object} does not override {hook}")]
    NotImplemented {
        object: String,
        hook: &'static str,
    },
}

impl Fault {
    pub fn contract(msg: impl Into<String>) -> Self {
        Fault::ContractViolation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Fault::Configuration(msg.into())
    }

    pub fn not_implemented(object: &str, hook: &'static str) -> Self {
        Fault::NotImplemented {
            object: object.to_string(),
            hook,
        }
    }
}

/// Fault collaborator entry point: log and abort the offending control
/// flow. Never returns normally; never used for recoverable conditions.
pub fn report_fatal(fault: Fault) -> ! {
    tracing::error!(%fault, "fatal stream fault");
    panic!("{fault}");
}
