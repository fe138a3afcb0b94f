//! Dispatcher and call handlers: routes an inbound envelope to the call
//! handler, the response handler, the custom-message emitter, the
//! forwarder, or the ready handler.
//!
//! The call-handling algorithm runs its checks in a fixed order (forward,
//! then interface, then method/args, then `reqId`, then invoke), with one
//! resolved ambiguity: a `RespErr`/`RespData` envelope requires a `reqId` to
//! be addressable at all, so any check that would "respond" while `reqId`
//! is absent instead surfaces the error through the local `"error"` event
//! and drops the envelope, since there is no wire-legal way to answer a call
//! that never supplied a return address.

use rpc_mux_types::{Envelope, RpcError};
use serde_json::Value;

use crate::endpoint::Endpoint;

impl Endpoint {
    pub(crate) async fn dispatch(&self, envelope: Envelope) {
        match envelope {
            Envelope::Call {
                req_id,
                iface,
                meth,
                args,
                fwd_dest,
            } => self.handle_call(req_id, iface, meth, args, fwd_dest).await,
            Envelope::RespData { req_id, data } => {
                self.handle_response(req_id, Ok(data.unwrap_or(Value::Null)))
                    .await
            }
            Envelope::RespErr { req_id, mesg, code } => {
                self.handle_response(req_id, Err(RpcError::new(code.unwrap_or_default(), mesg)))
                    .await
            }
            Envelope::Custom { data, fwd_dest } => self.handle_custom(data, fwd_dest).await,
            Envelope::Ready => self.handle_ready().await,
        }
    }

    /// Replies to a call. If `req_id` is present the reply travels back over
    /// the wire as a `RespData`/`RespErr`; otherwise there is nothing to
    /// address it to, so a failure is surfaced through the local `"error"`
    /// event instead and a success is silently dropped.
    async fn respond(&self, req_id: Option<u64>, result: Result<Value, RpcError>) {
        match req_id {
            Some(req_id) => self.deliver_response(req_id, result).await,
            None => {
                if let Err(err) = result {
                    self.emit_error(&err);
                }
            }
        }
    }

    async fn handle_call(
        &self,
        req_id: Option<u64>,
        iface: String,
        meth: String,
        args: Value,
        fwd_dest: Option<String>,
    ) {
        // Step 1: a forwarder-tagged call never touches the implementation
        // registry at all; checking args is the terminal endpoint's job.
        if let Some(dest) = fwd_dest.as_deref() {
            let forwarder = {
                let inner = self.inner.borrow();
                inner.forwarders.resolve(dest).cloned()
            };
            match forwarder {
                Some(record) => {
                    log::debug!("rpc-mux: forwarding call to {iface}.{meth} via {dest}");
                    self.forward_call(&record, Some(dest), req_id, iface, meth, args)
                        .await;
                }
                // A fire-and-forget call whose forwarder can't be resolved
                // is dropped silently, unlike the other response sites
                // below, which surface a local `"error"` event instead.
                None => {
                    if let Some(req_id) = req_id {
                        self.deliver_response(req_id, Err(RpcError::unknown_forward_dest(dest)))
                            .await;
                    } else {
                        log::debug!(
                            "rpc-mux: dropping fire-and-forget call with unresolvable forward dest {dest}"
                        );
                    }
                }
            }
            return;
        }

        // Step 2: implementation lookup.
        let invoke = {
            let inner = self.inner.borrow();
            match inner.impls.get(&iface) {
                Some(record) => {
                    // Step 3: arg validation, only for checked interfaces.
                    if let Some(arg_checkers) = &record.arg_checkers {
                        match arg_checkers.get(&meth) {
                            None => {
                                drop(inner);
                                self.respond(req_id, Err(RpcError::unknown_method(&iface, &meth)))
                                    .await;
                                return;
                            }
                            Some(checker) => {
                                if let Err(message) = checker.check(&args) {
                                    drop(inner);
                                    self.respond(req_id, Err(RpcError::invalid_args(message)))
                                        .await;
                                    return;
                                }
                            }
                        }
                    }
                    record.invoke.clone()
                }
                None => {
                    drop(inner);
                    self.respond(req_id, Err(RpcError::unknown_interface(&iface)))
                        .await;
                    return;
                }
            }
        };

        // Step 4: a call that is otherwise well-formed but carries no
        // `reqId` is treated as a protocol error rather than silently
        // accepted as fire-and-forget.
        let Some(req_id) = req_id else {
            self.emit_error(&RpcError::missing_reqid());
            return;
        };

        // Step 5: invoke and reply.
        let result = invoke(&meth, args).await;
        self.respond(Some(req_id), result).await;
    }

    async fn handle_response(&self, req_id: u64, result: Result<Value, RpcError>) {
        let call = self.inner.borrow_mut().pending.remove(req_id);
        match call {
            Some(call) => {
                log::debug!("rpc-mux: matched response for reqId {req_id}");
                self.settle(call, result).await
            }
            None => {
                let err = RpcError::unknown_reqid(req_id);
                self.inner.borrow().logger.warn(&err.message);
                log::warn!("rpc-mux: {err}");
            }
        }
    }

    async fn handle_custom(&self, data: Value, fwd_dest: Option<String>) {
        match fwd_dest.as_deref() {
            Some(dest) => {
                let forwarder = {
                    let inner = self.inner.borrow();
                    inner.forwarders.resolve(dest).cloned()
                };
                match forwarder {
                    Some(record) => self.forward_custom(&record, Some(dest), data).await,
                    // A custom message carries no reqId at all, so a miss
                    // here can only ever be a local diagnostic, never a
                    // wire reply.
                    None => self.emit_error(&RpcError::unknown_forward_dest(dest)),
                }
            }
            None => self.emit_message(data),
        }
    }

    async fn handle_ready(&self) {
        self.inner.borrow_mut().awaiting_ready = false;
        // Draining errors are already surfaced through the `"error"` event
        // by `dispatch_send`; nothing further to do with them here.
        let _ = self.drain_outbound().await;
    }
}
