use serde::{Deserialize, Serialize};

/// Stable, wire-stringified error codes a `RespErr` envelope may carry.
///
/// These are the only codes the core itself produces. An implementation's
/// own thrown error code is propagated verbatim and is not restricted to
/// this list.
pub mod codes {
    pub const UNKNOWN_INTERFACE: &str = "RPC_UNKNOWN_INTERFACE";
    pub const UNKNOWN_METHOD: &str = "RPC_UNKNOWN_METHOD";
    pub const INVALID_ARGS: &str = "RPC_INVALID_ARGS";
    pub const INVALID_RESULT: &str = "RPC_INVALID_RESULT";
    pub const UNKNOWN_FORWARD_DEST: &str = "RPC_UNKNOWN_FORWARD_DEST";
    pub const SEND_FAILED: &str = "RPC_SEND_FAILED";
    pub const UNKNOWN_REQID: &str = "RPC_UNKNOWN_REQID";
    pub const MISSING_REQID: &str = "RPC_MISSING_REQID";
    pub const SHUTDOWN: &str = "RPC_SHUTDOWN";
}

/// An error carried over the wire in a `RespErr` envelope, and the type
/// pending calls are rejected with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RpcError {
    pub code: String,
    pub message: String,
}

impl RpcError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unknown_interface(iface: &str) -> Self {
        Self::new(codes::UNKNOWN_INTERFACE, format!("no such interface: {iface}"))
    }

    pub fn unknown_method(iface: &str, meth: &str) -> Self {
        Self::new(
            codes::UNKNOWN_METHOD,
            format!("interface {iface} has no method {meth}"),
        )
    }

    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_ARGS, message)
    }

    pub fn invalid_result(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_RESULT, message)
    }

    pub fn unknown_forward_dest(fwd_dest: &str) -> Self {
        Self::new(
            codes::UNKNOWN_FORWARD_DEST,
            format!("no forwarder for {fwd_dest}"),
        )
    }

    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::new(codes::SEND_FAILED, message)
    }

    pub fn unknown_reqid(req_id: u64) -> Self {
        Self::new(codes::UNKNOWN_REQID, format!("unknown reqId {req_id}"))
    }

    pub fn missing_reqid() -> Self {
        Self::new(codes::MISSING_REQID, "Call envelope is missing reqId")
    }

    pub fn shutdown() -> Self {
        Self::new(codes::SHUTDOWN, "endpoint was shut down")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_message() {
        let err = RpcError::unknown_interface("math");
        assert_eq!(
            err.to_string(),
            "RPC_UNKNOWN_INTERFACE: no such interface: math"
        );
    }
}
