//! Multi-hop forwarding chains and the wildcard forwarder.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::block_on;
use rpc_mux::{Endpoint, EndpointConfig};
use rpc_mux_types::Envelope;
use serde_json::json;

fn register_greeting(endpoint: &Endpoint, suffix: &'static str) {
    endpoint
        .register_func(
            "my-greeting",
            Rc::new(move |args| {
                Box::pin(async move {
                    let name = args
                        .as_array()
                        .and_then(|a| a.first())
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    Ok(json!(format!("Hello, {name}!{suffix}")))
                })
            }),
        )
        .unwrap();
}

/// D↔B, B↔A, A↔C, with forwarders chaining a call from either end of the
/// line to the other's `my-greeting` implementation.
#[test]
fn forwarding_chain_reaches_either_terminal_greeting() {
    block_on(async {
        let a_to_b = Endpoint::new(EndpointConfig::default());
        let b_to_a = Endpoint::new(EndpointConfig::default());
        let b_to_d = Endpoint::new(EndpointConfig::default());
        let d_to_b = Endpoint::new(EndpointConfig::default());
        let a_to_c = Endpoint::new(EndpointConfig::default());
        let c_to_a = Endpoint::new(EndpointConfig::default());

        common::connect(&a_to_b, &b_to_a).await;
        common::connect(&b_to_d, &d_to_b).await;
        common::connect(&a_to_c, &c_to_a).await;

        register_greeting(&b_to_a, " [from B]");
        register_greeting(&c_to_a, " [from C]");

        a_to_c.register_forwarder("foo", a_to_b.clone(), None).unwrap();
        b_to_d
            .register_forwarder("bar", b_to_a.clone(), Some("bar".to_string()))
            .unwrap();
        a_to_b.register_forwarder("bar", a_to_c.clone(), None).unwrap();

        let via_foo = c_to_a.get_stub_via("foo", "my-greeting", None);
        let result = via_foo.call("invoke", json!(["World"])).await.unwrap();
        assert_eq!(result, json!("Hello, World! [from B]"));

        let via_bar = d_to_b.get_stub_via("bar", "my-greeting", None);
        let result = via_bar.call("invoke", json!(["World"])).await.unwrap();
        assert_eq!(result, json!("Hello, World! [from C]"));
    });
}

/// An unmapped `fwdDest` falls back to the forwarder registered under the
/// wildcard name `"*"`, which passes `fwdDest` through unchanged so the next
/// hop can dispatch it.
#[test]
fn wildcard_forwarder_passes_unmapped_destinations_through_unchanged() {
    block_on(async {
        let b_to_a = Endpoint::new(EndpointConfig::default());
        let b_to_all = Endpoint::new(EndpointConfig::default());
        let seen: Rc<RefCell<Vec<Envelope>>> = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        b_to_all
            .set_send(Rc::new(move |env: Envelope| {
                let seen = seen_clone.clone();
                Box::pin(async move {
                    seen.borrow_mut().push(env);
                    Ok(())
                })
            }))
            .await
            .unwrap();

        b_to_a
            .register_forwarder("*", b_to_all.clone(), None)
            .unwrap();

        b_to_a
            .receive(Envelope::Call {
                req_id: Some(1),
                iface: "my-greeting".to_string(),
                meth: "invoke".to_string(),
                args: json!(["World"]),
                fwd_dest: Some("my_e".to_string()),
            })
            .await;

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].fwd_dest(), Some("my_e"));
    });
}
