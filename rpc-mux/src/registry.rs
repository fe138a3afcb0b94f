//! Implementation registry: maps interface names to an invoker plus
//! optional per-method argument checkers.

use std::collections::HashMap;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use rpc_mux_types::RpcError;
use serde_json::Value;

use crate::checker::{AnyChecker, ArgsChecker, InterfaceChecker};

/// Invokes a single method of a registered interface with its positional
/// argument tuple, returning the result value or the error to report back
/// to the caller as a `RespErr`.
pub type InvokeFn = Rc<dyn Fn(&str, Value) -> LocalBoxFuture<'static, Result<Value, RpcError>>>;

/// One interface's invoker plus, if the interface was registered with a
/// checker, its per-method argument checkers.
///
/// The presence of `arg_checkers` (as opposed to its absence) is itself
/// meaningful: an interface registered with a checker rejects unknown
/// method names with `RPC_UNKNOWN_METHOD` before ever calling `invoke`; an
/// unchecked interface lets `invoke` itself decide, surfacing a missing
/// method as a remote `RPC_UNKNOWN_METHOD` error only if `invoke` itself
/// reports one.
pub(crate) struct ImplRecord {
    pub invoke: InvokeFn,
    pub arg_checkers: Option<HashMap<String, Rc<dyn ArgsChecker>>>,
}

impl ImplRecord {
    pub(crate) fn unchecked(invoke: InvokeFn) -> Self {
        Self {
            invoke,
            arg_checkers: None,
        }
    }

    pub(crate) fn checked(invoke: InvokeFn, checker: &dyn InterfaceChecker) -> Self {
        let mut arg_checkers = HashMap::new();
        for method in checker.methods() {
            let checker = checker
                .arg_checker(&method)
                .unwrap_or_else(|| Rc::new(AnyChecker));
            arg_checkers.insert(method, checker);
        }
        Self {
            invoke,
            arg_checkers: Some(arg_checkers),
        }
    }
}

#[derive(Default)]
pub(crate) struct ImplRegistry {
    impls: HashMap<String, ImplRecord>,
}

impl ImplRegistry {
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.impls.contains_key(name)
    }

    pub(crate) fn insert(&mut self, name: String, record: ImplRecord) {
        self.impls.insert(name, record);
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.impls.remove(name);
    }

    pub(crate) fn get(&self, name: &str) -> Option<&ImplRecord> {
        self.impls.get(name)
    }
}
