//! The user-facing, pluggable diagnostic sink passed in through
//! [`crate::EndpointConfig`].
//!
//! This is distinct from the crate's own ambient `log::*!` calls: those are
//! for whoever configures a `log` subscriber in the host process, while
//! `Logger` is a first-class constructor option so an embedder can route
//! specific lifecycle events (forwarder misses, send failures) to their own
//! structured sink without requiring a global logger to be installed at all.

/// Optional diagnostic hooks an `Endpoint` reports through.
///
/// Both methods have a do-nothing default, so either hook may be omitted.
pub trait Logger {
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}

/// The logger used when an `Endpoint` is constructed without one.
pub struct NoopLogger;

impl Logger for NoopLogger {}
