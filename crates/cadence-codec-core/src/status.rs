use thiserror::Error;

/// Client-visible status codes carried by error events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Status {
    #[error("bad value")]
    BadValue,
    #[error("invalid operation")]
    InvalidOperation,
    #[error("operation unsupported")]
    Unsupported,
    #[error("unknown error")]
    Unknown,
}

/// Severity hint attached to error events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCode {
    Fatal,
}

/// Errors returned by component backends and stores.
///
/// These are not mapped onto [`Status`] yet; the control plane collapses
/// every backend failure to [`Status::Unknown`] when surfacing it.
#[derive(Debug, Clone, Error)]
pub enum ComponentError {
    #[error("component is in the wrong state")]
    BadState,
    #[error("component refused the operation")]
    Refused,
    #[error("component operation timed out")]
    TimedOut,
    #[error("component is corrupted")]
    Corrupted,
    #[error("component ran out of memory")]
    NoMemory,
    #[error("no such component: {name}")]
    NotFound { name: String },
}
