//! Echo call with no checker.

mod common;

use std::rc::Rc;

use futures::executor::block_on;
use rpc_mux::{Endpoint, EndpointConfig};
use serde_json::json;

#[test]
fn add_without_a_checker_round_trips() {
    block_on(async {
        let a = Endpoint::new(EndpointConfig::default());
        let b = Endpoint::new(EndpointConfig::default());
        common::connect(&a, &b).await;

        a.register_func(
            "add",
            Rc::new(|args| {
                Box::pin(async move {
                    let args = args.as_array().cloned().unwrap_or_default();
                    let x = args[0].as_f64().unwrap_or(0.0);
                    let y = args[1].as_f64().unwrap_or(0.0);
                    Ok(json!(x + y))
                })
            }),
        )
        .unwrap();

        let result = b.call_remote("add", json!([4, 5])).await.unwrap();
        assert_eq!(result, json!(9.0));
    });
}

#[test]
fn call_remote_propagates_an_implementation_error_with_its_code() {
    block_on(async {
        let a = Endpoint::new(EndpointConfig::default());
        let b = Endpoint::new(EndpointConfig::default());
        common::connect(&a, &b).await;

        a.register_func(
            "boom",
            Rc::new(|_args| {
                Box::pin(async move {
                    Err(rpc_mux::RpcError::new("APP_BOOM", "it went boom"))
                })
            }),
        )
        .unwrap();

        let err = b.call_remote("boom", json!([])).await.unwrap_err();
        assert_eq!(err.code, "APP_BOOM");
        assert_eq!(err.message, "it went boom");
    });
}
