//! Endpoint façade: binds every other component and exposes the
//! user-facing API surface.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use rpc_mux_types::{Envelope, RpcError};
use serde_json::Value;

use crate::checker::{InterfaceChecker, ResultChecker};
use crate::error::EndpointError;
use crate::forwarder::{ForwardPolicy, ForwarderRecord, ForwarderRegistry};
use crate::logger::{Logger, NoopLogger};
use crate::names::split_forward_name;
use crate::pending::{PendingCall, PendingTable, Resolution};
use crate::registry::{ImplRecord, ImplRegistry, InvokeFn};
use crate::stub::Stub;

/// The result of calling the user's send function: `Ok(())` once the
/// envelope has been handed to the transport, `Err` with whatever the send
/// function failed with.
pub type SendResult = Result<(), Box<dyn std::error::Error>>;

/// The user-supplied function that actually transmits an envelope.
///
/// Always returns a future: a synchronous sender simply wraps its result in
/// `Box::pin(std::future::ready(result))`. A failure is handled uniformly
/// whether it happened synchronously or the returned future resolved to an
/// error, since a Rust `Future` already unifies both cases and there is
/// nothing further to special-case.
pub type SendFn = Rc<dyn Fn(Envelope) -> LocalBoxFuture<'static, SendResult>>;

/// A thunk that performs one outgoing call: send the envelope, then await
/// the correlated response.
pub type CallThunk = Box<dyn FnOnce() -> LocalBoxFuture<'static, Result<Value, RpcError>>>;

/// Around-advice applied to every outgoing call.
pub type CallWrapperFn = Rc<dyn Fn(CallThunk) -> LocalBoxFuture<'static, Result<Value, RpcError>>>;

/// Construction options for [`Endpoint::new`].
#[derive(Default)]
pub struct EndpointConfig {
    pub logger: Option<Rc<dyn Logger>>,
    pub send: Option<SendFn>,
    pub call_wrapper: Option<CallWrapperFn>,
}

pub(crate) struct Inner {
    pub(crate) logger: Rc<dyn Logger>,
    pub(crate) send: Option<SendFn>,
    pub(crate) call_wrapper: Option<CallWrapperFn>,
    pub(crate) awaiting_ready: bool,
    pub(crate) inbound_queue: Option<VecDeque<Envelope>>,
    pub(crate) outbound_queue: VecDeque<Envelope>,
    pub(crate) impls: ImplRegistry,
    pub(crate) forwarders: ForwarderRegistry,
    pub(crate) pending: PendingTable,
    pub(crate) message_listeners: Vec<Rc<dyn Fn(Value)>>,
    pub(crate) error_listeners: Vec<Rc<dyn Fn(&RpcError)>>,
}

/// One instance of the RPC multiplexer, owning one channel.
///
/// Cloning an `Endpoint` is cheap (an `Rc` bump) and shares the same
/// underlying state; it is how a [`Stub`](crate::Stub) and a
/// [`crate::ForwarderRecord`] hold a reference back to the endpoint they
/// belong to. `Endpoint` is deliberately `!Send`/`!Sync`: a single logical
/// task owns all mutation of its maps and queues, needing no internal
/// locking, and this encodes that invariant in the type system instead of
/// merely documenting it.
#[derive(Clone)]
pub struct Endpoint {
    pub(crate) inner: Rc<RefCell<Inner>>,
}

impl Endpoint {
    pub fn new(config: EndpointConfig) -> Self {
        let inner = Inner {
            logger: config.logger.unwrap_or_else(|| Rc::new(NoopLogger)),
            send: config.send,
            call_wrapper: config.call_wrapper,
            awaiting_ready: false,
            inbound_queue: None,
            outbound_queue: VecDeque::new(),
            impls: ImplRegistry::default(),
            forwarders: ForwarderRegistry::default(),
            pending: PendingTable::new(),
            message_listeners: Vec::new(),
            error_listeners: Vec::new(),
        };
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    // ---- receive / queueing -------------------------------------------

    /// Feeds an inbound envelope into the endpoint. Either enqueues it (if
    /// [`Endpoint::queue_incoming`] is in effect) or dispatches it
    /// immediately.
    pub async fn receive(&self, envelope: Envelope) {
        let undispatched = {
            let mut inner = self.inner.borrow_mut();
            match inner.inbound_queue.as_mut() {
                Some(queue) => {
                    queue.push_back(envelope);
                    None
                }
                None => Some(envelope),
            }
        };
        if let Some(envelope) = undispatched {
            self.dispatch(envelope).await;
        }
    }

    /// Suspends inbound dispatch so implementations can be registered after
    /// `receive` has already begun.
    pub fn queue_incoming(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.inbound_queue.is_none() {
            inner.inbound_queue = Some(VecDeque::new());
        }
    }

    /// Resumes inbound dispatch, draining the queue in arrival order.
    pub async fn process_incoming(&self) {
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                inner.inbound_queue.as_mut().and_then(VecDeque::pop_front)
            };
            let Some(envelope) = next else { break };
            self.dispatch(envelope).await;
        }
        self.inner.borrow_mut().inbound_queue = None;
    }

    // ---- send / queueing ------------------------------------------------

    /// Installs (or clears, with `None`) the send callback. Installing
    /// resumes draining the outbound queue unless gated by
    /// [`Endpoint::queue_outgoing_until_ready`].
    pub async fn set_send(&self, send: SendFn) -> Result<(), RpcError> {
        self.inner.borrow_mut().send = Some(send);
        self.drain_outbound().await
    }

    /// Clears the send callback; outbound envelopes queue silently again.
    pub fn clear_send(&self) {
        self.inner.borrow_mut().send = None;
    }

    /// Legacy alias: installs `send`, then drains both the outbound and
    /// inbound queues.
    pub async fn start(&self, send: SendFn) -> Result<(), RpcError> {
        self.set_send(send).await?;
        self.process_incoming().await;
        Ok(())
    }

    /// Declares that this endpoint will not send until the peer sends
    /// `Ready`. At most one side of a channel may gate this way.
    pub fn queue_outgoing_until_ready(&self) {
        self.inner.borrow_mut().awaiting_ready = true;
    }

    /// Signals to the peer that this endpoint is ready to receive further
    /// envelopes.
    pub async fn send_ready(&self) -> Result<(), RpcError> {
        self.send_path(Envelope::Ready).await
    }

    // ---- implementation registry ---------------------------------------

    pub fn register_impl(
        &self,
        name: impl Into<String>,
        invoke: InvokeFn,
        checker: Option<Rc<dyn InterfaceChecker>>,
    ) -> Result<(), EndpointError> {
        let name = name.into();
        if name.is_empty() {
            return Err(EndpointError::EmptyInterfaceName);
        }
        let mut inner = self.inner.borrow_mut();
        if inner.impls.contains(&name) {
            return Err(EndpointError::DuplicateImpl(name));
        }
        let record = match &checker {
            Some(checker) => ImplRecord::checked(invoke, checker.as_ref()),
            None => ImplRecord::unchecked(invoke),
        };
        inner.impls.insert(name, record);
        Ok(())
    }

    pub fn unregister_impl(&self, name: &str) {
        self.inner.borrow_mut().impls.remove(name);
    }

    /// Registers a bare function under `name` as a synthetic interface with
    /// the single method `"invoke"`.
    pub fn register_func(
        &self,
        name: impl Into<String>,
        f: Rc<dyn Fn(Value) -> LocalBoxFuture<'static, Result<Value, RpcError>>>,
    ) -> Result<(), EndpointError> {
        let invoke: InvokeFn = Rc::new(move |meth: &str, args: Value| {
            if meth != "invoke" {
                let meth = meth.to_string();
                return Box::pin(async move { Err(RpcError::unknown_method("", &meth)) });
            }
            f(args)
        });
        self.register_impl(name, invoke, None)
    }

    pub fn unregister_func(&self, name: &str) {
        self.unregister_impl(name);
    }

    /// Calls the single `"invoke"` method of the synthetic interface
    /// registered by [`Endpoint::register_func`] on the peer.
    pub async fn call_remote(&self, name: &str, args: Value) -> Result<Value, RpcError> {
        let (iface, forwarder) = split_forward_name(name);
        self.issue_call(iface, forwarder, "invoke".to_string(), args, None)
            .await
    }

    // ---- forwarder registry ---------------------------------------------

    pub fn register_forwarder(
        &self,
        name: impl Into<String>,
        peer: Endpoint,
        fwd_dest: Option<String>,
    ) -> Result<(), EndpointError> {
        let name = name.into();
        let mut inner = self.inner.borrow_mut();
        if inner.forwarders.contains(&name) {
            return Err(EndpointError::DuplicateForwarder(name));
        }
        let policy = ForwardPolicy::from_registration(&name, fwd_dest);
        inner.forwarders.insert(name, ForwarderRecord { peer, policy });
        Ok(())
    }

    pub fn unregister_forwarder(&self, name: &str) {
        self.inner.borrow_mut().forwarders.remove(name);
    }

    // ---- stubs ------------------------------------------------------------

    pub fn get_stub(&self, name: &str, checker: Option<Rc<dyn InterfaceChecker>>) -> Stub {
        let (iface, forwarder) = split_forward_name(name);
        Stub {
            endpoint: self.clone(),
            iface,
            forwarder,
            checker,
        }
    }

    pub fn get_stub_via(
        &self,
        forwarder: &str,
        name: &str,
        checker: Option<Rc<dyn InterfaceChecker>>,
    ) -> Stub {
        let (iface, inline_forwarder) = split_forward_name(name);
        Stub {
            endpoint: self.clone(),
            iface,
            forwarder: Some(inline_forwarder.unwrap_or_else(|| forwarder.to_string())),
            checker,
        }
    }

    pub async fn call_remote_via(
        &self,
        forwarder: &str,
        name: &str,
        args: Value,
    ) -> Result<Value, RpcError> {
        let (iface, inline_forwarder) = split_forward_name(name);
        let forwarder = inline_forwarder.unwrap_or_else(|| forwarder.to_string());
        self.issue_call(iface, Some(forwarder), "invoke".to_string(), args, None)
            .await
    }

    // ---- custom messages --------------------------------------------------

    pub async fn post(&self, data: Value) -> Result<(), RpcError> {
        self.send_path(Envelope::Custom {
            data,
            fwd_dest: None,
        })
        .await
    }

    pub async fn post_via(&self, forwarder: &str, data: Value) -> Result<(), RpcError> {
        self.send_path(Envelope::Custom {
            data,
            fwd_dest: Some(forwarder.to_string()),
        })
        .await
    }

    // ---- events -------------------------------------------------------------

    pub fn on_message(&self, f: impl Fn(Value) + 'static) {
        self.inner.borrow_mut().message_listeners.push(Rc::new(f));
    }

    pub fn on_error(&self, f: impl Fn(&RpcError) + 'static) {
        self.inner.borrow_mut().error_listeners.push(Rc::new(f));
    }

    pub(crate) fn emit_message(&self, data: Value) {
        let listeners = self.inner.borrow().message_listeners.clone();
        for listener in listeners {
            listener(data.clone());
        }
    }

    pub(crate) fn emit_error(&self, err: &RpcError) {
        {
            let inner = self.inner.borrow();
            inner.logger.warn(&err.to_string());
        }
        log::warn!("rpc-mux endpoint error: {err}");
        let listeners = self.inner.borrow().error_listeners.clone();
        for listener in listeners {
            listener(err);
        }
    }

    // ---- teardown -------------------------------------------------------------

    /// Tears the endpoint down: rejects every call still awaiting a
    /// response, since a pending call would otherwise stay pending forever
    /// once nothing can ever reply to it.
    pub async fn shutdown(&self) {
        let pending = self.inner.borrow_mut().pending.take_all();
        for call in pending {
            self.settle(call, Err(RpcError::shutdown())).await;
        }
    }

    // ---- internal: send path ---------------------------------------------

    pub(crate) async fn send_path(&self, envelope: Envelope) -> Result<(), RpcError> {
        let queueing = {
            let inner = self.inner.borrow();
            inner.send.is_none() || inner.awaiting_ready
        };
        if queueing {
            self.inner.borrow_mut().outbound_queue.push_back(envelope);
            return Ok(());
        }
        self.dispatch_send(envelope).await
    }

    async fn dispatch_send(&self, envelope: Envelope) -> Result<(), RpcError> {
        let send_fn = self
            .inner
            .borrow()
            .send
            .clone()
            .expect("send_path only calls dispatch_send once a sender is installed");
        let result = send_fn(envelope.clone()).await;
        if let Err(err) = result {
            let rpc_err = RpcError::send_failed(err.to_string());
            if let Envelope::Call {
                req_id: Some(req_id),
                ..
            } = &envelope
            {
                if let Some(call) = self.inner.borrow_mut().pending.remove(*req_id) {
                    self.settle(call, Err(rpc_err.clone())).await;
                }
            }
            self.emit_error(&rpc_err);
            return Err(rpc_err);
        }
        Ok(())
    }

    /// Drains the outbound queue in order. The index advances (via
    /// `pop_front`) before each dispatch, so an envelope that fails is
    /// treated as consumed and is not retried on the next drain.
    pub(crate) async fn drain_outbound(&self) -> Result<(), RpcError> {
        let pending_at_start = self.inner.borrow().outbound_queue.len();
        if pending_at_start > 0 {
            log::debug!("rpc-mux: draining {pending_at_start} queued outbound envelope(s)");
        }
        loop {
            if self.inner.borrow().awaiting_ready {
                break;
            }
            let next = self.inner.borrow_mut().outbound_queue.pop_front();
            let Some(envelope) = next else { break };
            self.dispatch_send(envelope).await?;
        }
        Ok(())
    }

    /// Resolves a pending-table entry, however it was meant to be resolved:
    /// a local caller's future, or (mid-forward) relaying the result back to
    /// the endpoint that owns the original request id.
    pub(crate) async fn settle(&self, call: PendingCall, result: Result<Value, RpcError>) {
        match call.resolution {
            Resolution::Local {
                resolve,
                result_checker,
            } => {
                let result = match (&result, result_checker) {
                    (Ok(data), Some(checker)) => match checker.check(data) {
                        Ok(()) => result,
                        Err(message) => Err(RpcError::invalid_result(message)),
                    },
                    _ => result,
                };
                let _ = resolve.send(result);
            }
            Resolution::Forward {
                origin,
                origin_req_id,
            } => {
                origin.deliver_response(origin_req_id, result).await;
            }
        }
    }

    /// Builds and sends a response envelope for `req_id`, used both for
    /// locally-handled calls and to relay a forwarded call's result back to
    /// the endpoint that owns the original request id.
    pub(crate) async fn deliver_response(&self, req_id: u64, result: Result<Value, RpcError>) {
        let envelope = match result {
            Ok(data) => Envelope::RespData {
                req_id,
                data: Some(data),
            },
            Err(err) => Envelope::RespErr {
                req_id,
                mesg: err.message,
                code: Some(err.code),
            },
        };
        let _ = self.send_path(envelope).await;
    }

    // ---- internal: outgoing calls -----------------------------------------

    pub(crate) async fn issue_call(
        &self,
        iface: String,
        fwd_dest: Option<String>,
        meth: String,
        args: Value,
        result_checker: Option<Rc<dyn ResultChecker>>,
    ) -> Result<Value, RpcError> {
        if iface.is_empty() {
            return Err(RpcError::unknown_interface(&iface));
        }
        let wrapper = self.inner.borrow().call_wrapper.clone();
        match wrapper {
            Some(wrapper) => {
                let this = self.clone();
                let thunk: CallThunk = Box::new(move || {
                    Box::pin(async move {
                        this.run_call(iface, fwd_dest, meth, args, result_checker)
                            .await
                    }) as LocalBoxFuture<'static, Result<Value, RpcError>>
                });
                wrapper(thunk).await
            }
            None => self.run_call(iface, fwd_dest, meth, args, result_checker).await,
        }
    }

    async fn run_call(
        &self,
        iface: String,
        fwd_dest: Option<String>,
        meth: String,
        args: Value,
        result_checker: Option<Rc<dyn ResultChecker>>,
    ) -> Result<Value, RpcError> {
        let (req_id, rx) = self.inner.borrow_mut().pending.allocate_local(
            iface.clone(),
            meth.clone(),
            result_checker,
        );
        let envelope = Envelope::Call {
            req_id: Some(req_id),
            iface,
            meth,
            args,
            fwd_dest,
        };
        // A send failure already rejects this pending entry through
        // `dispatch_send`, which resolves `rx` with the same error.
        let _ = self.send_path(envelope).await;
        match rx.await {
            Ok(result) => result,
            Err(_canceled) => Err(RpcError::shutdown()),
        }
    }

    // ---- internal: forwarding ----------------------------------------------

    pub(crate) async fn forward_call(
        &self,
        forwarder: &ForwarderRecord,
        original_fwd_dest: Option<&str>,
        origin_req_id: Option<u64>,
        iface: String,
        meth: String,
        args: Value,
    ) {
        // A fire-and-forget call that reaches a forwarder is dropped: there
        // is no reqId to correlate a response back to.
        let Some(origin_req_id) = origin_req_id else {
            return;
        };
        let new_fwd_dest = forwarder.policy.rewrite(original_fwd_dest);
        let peer = forwarder.peer.clone();
        let req_id = peer.inner.borrow_mut().pending.allocate_forward(
            iface.clone(),
            meth.clone(),
            self.clone(),
            origin_req_id,
        );
        let envelope = Envelope::Call {
            req_id: Some(req_id),
            iface,
            meth,
            args,
            fwd_dest: new_fwd_dest,
        };
        let _ = peer.send_path(envelope).await;
    }

    pub(crate) async fn forward_custom(
        &self,
        forwarder: &ForwarderRecord,
        original_fwd_dest: Option<&str>,
        data: Value,
    ) {
        let new_fwd_dest = forwarder.policy.rewrite(original_fwd_dest);
        let peer = forwarder.peer.clone();
        let _ = peer
            .send_path(Envelope::Custom {
                data,
                fwd_dest: new_fwd_dest,
            })
            .await;
    }
}
