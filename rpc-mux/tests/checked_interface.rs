//! A checked implementation (`ICalc`) called through an unchecked stub.

mod common;

use std::rc::Rc;

use futures::executor::block_on;
use rpc_mux::{ArgsChecker, Endpoint, EndpointConfig, InterfaceChecker, ResultChecker};
use serde_json::{Value, json};

struct AddArgsChecker;

impl ArgsChecker for AddArgsChecker {
    fn check(&self, args: &Value) -> Result<(), String> {
        let arr = args.as_array().cloned().unwrap_or_default();
        match arr.first() {
            None => return Err("value.x is missing".into()),
            Some(v) if !v.is_number() => return Err(format!("value.x is not a number: {v}")),
            Some(_) => {}
        }
        match arr.get(1) {
            None => return Err("value.y is missing".into()),
            Some(v) if !v.is_number() => return Err(format!("value.y is not a number: {v}")),
            Some(_) => {}
        }
        Ok(())
    }
}

struct ICalc;

impl InterfaceChecker for ICalc {
    fn methods(&self) -> Vec<String> {
        vec!["add".to_string()]
    }

    fn arg_checker(&self, method: &str) -> Option<Rc<dyn ArgsChecker>> {
        (method == "add").then(|| Rc::new(AddArgsChecker) as Rc<dyn ArgsChecker>)
    }

    fn result_checker(&self, _method: &str) -> Option<Rc<dyn ResultChecker>> {
        None
    }
}

fn register_icalc(endpoint: &Endpoint) {
    let invoke: rpc_mux::InvokeFn = Rc::new(|meth, args| {
        let meth = meth.to_string();
        Box::pin(async move {
            let arr = args.as_array().cloned().unwrap_or_default();
            let x = arr[0].as_f64().unwrap();
            let y = arr[1].as_f64().unwrap();
            debug_assert_eq!(meth, "add");
            Ok(json!(x + y))
        })
    });
    endpoint
        .register_impl("ICalc", invoke, Some(Rc::new(ICalc)))
        .unwrap();
}

#[test]
fn unknown_method_on_a_checked_impl_rejects_with_unknown_method() {
    block_on(async {
        let a = Endpoint::new(EndpointConfig::default());
        let b = Endpoint::new(EndpointConfig::default());
        common::connect(&a, &b).await;
        register_icalc(&a);

        let stub = b.get_stub("ICalc", None);
        let err = stub.call("additionify", json!([4, 5])).await.unwrap_err();
        assert_eq!(err.code, rpc_mux::codes::UNKNOWN_METHOD);
    });
}

#[test]
fn invalid_args_report_the_validator_message() {
    block_on(async {
        let a = Endpoint::new(EndpointConfig::default());
        let b = Endpoint::new(EndpointConfig::default());
        common::connect(&a, &b).await;
        register_icalc(&a);

        let stub = b.get_stub("ICalc", None);

        let err = stub
            .call("add", json!(["hello", 5]))
            .await
            .unwrap_err();
        assert_eq!(err.code, rpc_mux::codes::INVALID_ARGS);
        assert!(err.message.contains("not a number"), "{}", err.message);

        let err = stub.call("add", json!([])).await.unwrap_err();
        assert!(err.message.contains("value.x is missing"), "{}", err.message);
    });
}

#[test]
fn extra_trailing_arguments_are_allowed() {
    block_on(async {
        let a = Endpoint::new(EndpointConfig::default());
        let b = Endpoint::new(EndpointConfig::default());
        common::connect(&a, &b).await;
        register_icalc(&a);

        let stub = b.get_stub("ICalc", None);
        let result = stub.call("add", json!([10, 9, 8])).await.unwrap();
        assert_eq!(result, json!(19.0));
    });
}

#[test]
fn a_duplicate_registration_is_a_local_programming_error() {
    let endpoint = Endpoint::new(EndpointConfig::default());
    register_icalc(&endpoint);
    let invoke: rpc_mux::InvokeFn =
        Rc::new(|_meth, _args| Box::pin(async move { Ok(Value::Null) }));
    let err = endpoint
        .register_impl("ICalc", invoke, None)
        .unwrap_err();
    assert!(matches!(err, rpc_mux::EndpointError::DuplicateImpl(name) if name == "ICalc"));
}

#[test]
fn response_error_wrapped_as_rpc_error_preserves_shutdown_code() {
    // Tearing an endpoint down rejects pending calls in place, without a
    // wire round-trip at all: a pending call would otherwise stay pending
    // forever once nothing can ever reply to it.
    block_on(async {
        let a = Endpoint::new(EndpointConfig::default());
        let b = Endpoint::new(EndpointConfig::default());
        common::connect(&a, &b).await;
        register_icalc(&a);

        // Suspend A's inbound dispatch so the call never actually reaches
        // the implementation before B tears down.
        a.queue_incoming();
        let stub = b.get_stub("ICalc", None);
        let (result, _) = futures::join!(stub.call("add", json!([1, 2])), b.shutdown());
        let err = result.unwrap_err();
        assert_eq!(err.code, rpc_mux::codes::SHUTDOWN);
    });
}
