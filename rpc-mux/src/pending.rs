//! Pending-call table: correlates request ids to unresolved futures, with
//! result-checkers.
//!
//! A pending entry's resolution is one of two kinds: [`Resolution::Local`]
//! wakes a caller's own future through a `oneshot` channel (the
//! hyper-`dispatch`-style `Promise` pattern); [`Resolution::Forward`] means
//! this entry exists only because a forwarder re-issued the call under a
//! fresh request id on this endpoint's behalf, and the eventual response
//! must be relayed back to the endpoint that owns the original request id:
//! each hop allocates its own `reqId` for its outgoing call and correlates
//! it on return.

use std::collections::HashMap;
use std::rc::Rc;

use futures::channel::oneshot;
use rpc_mux_types::RpcError;
use serde_json::Value;

use crate::checker::ResultChecker;
use crate::endpoint::Endpoint;

pub(crate) enum Resolution {
    Local {
        resolve: oneshot::Sender<Result<Value, RpcError>>,
        result_checker: Option<Rc<dyn ResultChecker>>,
    },
    Forward {
        origin: Endpoint,
        origin_req_id: u64,
    },
}

pub(crate) struct PendingCall {
    #[allow(dead_code)] // kept for diagnostics/logging at the call site
    pub iface: String,
    #[allow(dead_code)]
    pub meth: String,
    pub resolution: Resolution,
}

#[derive(Default)]
pub(crate) struct PendingTable {
    next_req_id: u64,
    pending: HashMap<u64, PendingCall>,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self {
            next_req_id: 1,
            pending: HashMap::new(),
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_req_id;
        self.next_req_id += 1;
        id
    }

    /// Allocates a request id for a local caller, returning it along with
    /// the receiving half of the oneshot the caller awaits.
    pub(crate) fn allocate_local(
        &mut self,
        iface: String,
        meth: String,
        result_checker: Option<Rc<dyn ResultChecker>>,
    ) -> (u64, oneshot::Receiver<Result<Value, RpcError>>) {
        let req_id = self.next_id();
        log::debug!("rpc-mux: issuing reqId {req_id} for {iface}.{meth}");
        let (tx, rx) = oneshot::channel();
        self.pending.insert(
            req_id,
            PendingCall {
                iface,
                meth,
                resolution: Resolution::Local {
                    resolve: tx,
                    result_checker,
                },
            },
        );
        (req_id, rx)
    }

    /// Allocates a request id for a call this endpoint is re-issuing on
    /// behalf of a forwarder, to be correlated back to `origin`'s own
    /// request id once a response arrives.
    pub(crate) fn allocate_forward(
        &mut self,
        iface: String,
        meth: String,
        origin: Endpoint,
        origin_req_id: u64,
    ) -> u64 {
        let req_id = self.next_id();
        log::debug!(
            "rpc-mux: re-issuing reqId {origin_req_id} as {req_id} for forwarded {iface}.{meth}"
        );
        self.pending.insert(
            req_id,
            PendingCall {
                iface,
                meth,
                resolution: Resolution::Forward {
                    origin,
                    origin_req_id,
                },
            },
        );
        req_id
    }

    pub(crate) fn remove(&mut self, req_id: u64) -> Option<PendingCall> {
        self.pending.remove(&req_id)
    }

    pub(crate) fn take_all(&mut self) -> Vec<PendingCall> {
        self.pending.drain().map(|(_, call)| call).collect()
    }
}
