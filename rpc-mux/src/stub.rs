//! Stub factory.
//!
//! Rust has no runtime reflection or dynamic property access, so the
//! dynamic handle a caller invokes methods on is an explicit per-interface
//! client factory: `Stub::call` takes the method name at the call site
//! instead of materializing one callable per method. A checked stub
//! additionally enumerates its interface's methods and rejects calls to
//! non-members locally, without going over the wire; non-method members
//! are never exposed through a stub at all.
//!
//! The `then`-is-not-a-method invariant has no Rust analogue: `Stub` simply
//! has no method named `then`, and is an ordinary value with no special
//! interaction with `Future`/`IntoFuture`, so returning one from an `async
//! fn` and awaiting that function yields the `Stub` itself, never a
//! recursive unwrap. This is a vacuous satisfaction of the invariant rather
//! than a dropped feature.

use std::rc::Rc;

use rpc_mux_types::RpcError;
use serde_json::Value;

use crate::checker::InterfaceChecker;
use crate::endpoint::Endpoint;

/// A local handle whose method invocations become remote calls.
///
/// Obtained from [`Endpoint::get_stub`] or [`Endpoint::get_stub_via`].
#[derive(Clone)]
pub struct Stub {
    pub(crate) endpoint: Endpoint,
    pub(crate) iface: String,
    pub(crate) forwarder: Option<String>,
    pub(crate) checker: Option<Rc<dyn InterfaceChecker>>,
}

impl Stub {
    /// Invokes `method` with `args` (expected to be a JSON array, the
    /// positional argument tuple) on the interface this stub is bound to.
    ///
    /// For a checked stub, calling a name outside the interface's declared
    /// methods fails locally with `RPC_UNKNOWN_METHOD` rather than being
    /// sent ("non-method members are not exposed"). An unchecked stub
    /// accepts any method name and lets the responder decide.
    pub async fn call(&self, method: &str, args: Value) -> Result<Value, RpcError> {
        let result_checker = match &self.checker {
            Some(checker) => {
                if !checker.methods().iter().any(|m| m == method) {
                    return Err(RpcError::unknown_method(&self.iface, method));
                }
                checker.result_checker(method)
            }
            None => None,
        };
        self.endpoint
            .issue_call(
                self.iface.clone(),
                self.forwarder.clone(),
                method.to_string(),
                args,
                result_checker,
            )
            .await
    }

    /// The interface name this stub targets.
    pub fn iface(&self) -> &str {
        &self.iface
    }

    /// The forwarder name this stub routes through, if any.
    pub fn forwarder(&self) -> Option<&str> {
        self.forwarder.as_deref()
    }
}
