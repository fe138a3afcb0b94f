use thiserror::Error;

/// A local programming error, raised synchronously at the call site that
/// misused the API, as opposed to an [`rpc_mux_types::RpcError`] which
/// travels over the wire.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("an implementation is already registered under interface {0:?}")]
    DuplicateImpl(String),
    #[error("a forwarder is already registered under name {0:?}")]
    DuplicateForwarder(String),
    #[error("interface name must not be empty")]
    EmptyInterfaceName,
}
