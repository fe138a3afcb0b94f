//! Shared wiring helpers for the black-box integration tests: two or more
//! in-process [`Endpoint`]s connected back to back, the way a transport
//! would connect them, except the "wire" here is just one endpoint handing
//! the envelope straight to the other's `receive`.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Once;

use futures::future::LocalBoxFuture;
use rpc_mux::{Endpoint, SendFn};
use rpc_mux_types::Envelope;

static LOG_INIT: Once = Once::new();

/// Initializes `env_logger` once per test binary, so `log::warn!` output
/// from the crate (forwarder misses, send failures, unknown reqIds) shows
/// up under `cargo test -- --nocapture` without every test managing its own
/// subscriber.
pub fn init_logging() {
    LOG_INIT.call_once(env_logger::init);
}

/// Wires `a` to send directly into `b.receive`, one direction only.
pub fn wire_one_way(from: &Endpoint, to: &Endpoint) -> LocalBoxFuture<'static, ()> {
    let to = to.clone();
    let from = from.clone();
    Box::pin(async move {
        let to = to.clone();
        from.set_send(Rc::new(move |env: Envelope| {
            let to = to.clone();
            Box::pin(async move {
                to.receive(env).await;
                Ok(())
            })
        }))
        .await
        .expect("wiring a fresh endpoint's send never fails");
    })
}

/// Wires two endpoints to deliver directly into each other's `receive`,
/// simulating a live, already-connected channel between them.
pub async fn connect(a: &Endpoint, b: &Endpoint) {
    init_logging();
    wire_one_way(a, b).await;
    wire_one_way(b, a).await;
}

/// A [`SendFn`] that counts its own invocations (1-based) and fails with
/// `fail_message` on the `fail_at`-th call, recording every envelope it was
/// asked to send (including the one it fails on) into `log`.
pub fn counting_send(
    fail_at: usize,
    fail_message: &'static str,
    log: Rc<std::cell::RefCell<Vec<Envelope>>>,
) -> SendFn {
    let count = Rc::new(Cell::new(0usize));
    Rc::new(move |env: Envelope| {
        let count = count.clone();
        let log = log.clone();
        Box::pin(async move {
            let n = count.get() + 1;
            count.set(n);
            log.borrow_mut().push(env);
            if n == fail_at {
                Err(Box::<dyn std::error::Error>::from(fail_message))
            } else {
                Ok(())
            }
        })
    })
}
