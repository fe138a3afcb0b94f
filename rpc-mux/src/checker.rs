//! Validator adapter: a minimal capability set the core consumes
//! checkers through, decoupled from any concrete schema library.

use std::rc::Rc;

use serde_json::Value;

/// Validates the positional-argument tuple of a single method.
pub trait ArgsChecker {
    /// Returns `Err(message)` on validation failure. The message is reported
    /// verbatim in the RPC error's `mesg` field.
    fn check(&self, args: &Value) -> Result<(), String>;
}

/// Validates the result value of a single method.
pub trait ResultChecker {
    /// Returns `Err(message)` on validation failure. The message is reported
    /// verbatim in the RPC error's `mesg` field.
    fn check(&self, result: &Value) -> Result<(), String>;
}

/// Describes an interface: its method-typed members, and per-method arg and
/// result checkers. Implemented by a concrete schema adapter (see
/// [`schema`] behind the `schema-validate` feature) or by hand for a
/// bespoke validation scheme.
pub trait InterfaceChecker {
    /// The interface's method-typed members. Non-method members (constants,
    /// nested descriptors) are never exposed through a stub.
    fn methods(&self) -> Vec<String>;

    /// The argument checker for `method`, if the descriptor constrains it.
    /// `None` means "accept any argument tuple" for a method that is still a
    /// recognized member of the interface.
    fn arg_checker(&self, method: &str) -> Option<Rc<dyn ArgsChecker>>;

    /// The result checker for `method`, if the descriptor constrains it.
    fn result_checker(&self, method: &str) -> Option<Rc<dyn ResultChecker>>;
}

/// A checker that accepts anything; used to fill in a method's slot in the
/// arg-checker map when a checked interface declares the method but does
/// not constrain its arguments. Also useful to hand-written
/// [`InterfaceChecker`] impls that only want to constrain a subset of their
/// methods.
pub struct AnyChecker;

impl ArgsChecker for AnyChecker {
    fn check(&self, _args: &Value) -> Result<(), String> {
        Ok(())
    }
}

impl ResultChecker for AnyChecker {
    fn check(&self, _result: &Value) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(feature = "schema-validate")]
pub mod schema {
    //! A concrete [`InterfaceChecker`] built from [`schemars`]-generated
    //! JSON Schema documents, validated at call time with [`jsonschema`].
    //!
    //! This is an out-of-the-box adapter, not the only one the core
    //! supports: the core only ever talks to the three traits above.

    use super::*;
    use std::collections::HashMap;

    use jsonschema::Validator;
    use schemars::Schema;

    /// A single method's argument-tuple and result schemas.
    pub struct MethodSchema {
        pub args: Option<Schema>,
        pub result: Option<Schema>,
    }

    struct CompiledMethod {
        args: Option<Rc<Validator>>,
        result: Option<Rc<Validator>>,
    }

    /// An [`InterfaceChecker`] backed by per-method JSON Schema documents.
    pub struct SchemaInterface {
        methods: HashMap<String, CompiledMethod>,
    }

    impl SchemaInterface {
        /// Compiles `methods` into validators eagerly, so a malformed
        /// schema is reported at registration time rather than on first
        /// call.
        pub fn compile(
            methods: HashMap<String, MethodSchema>,
        ) -> Result<Self, jsonschema::ValidationError<'static>> {
            let mut compiled = HashMap::with_capacity(methods.len());
            for (name, schema) in methods {
                let args = schema
                    .args
                    .map(|s| jsonschema::validator_for(&serde_json::to_value(s).unwrap()))
                    .transpose()?
                    .map(Rc::new);
                let result = schema
                    .result
                    .map(|s| jsonschema::validator_for(&serde_json::to_value(s).unwrap()))
                    .transpose()?
                    .map(Rc::new);
                compiled.insert(name, CompiledMethod { args, result });
            }
            Ok(Self { methods: compiled })
        }
    }

    impl InterfaceChecker for SchemaInterface {
        fn methods(&self) -> Vec<String> {
            self.methods.keys().cloned().collect()
        }

        fn arg_checker(&self, method: &str) -> Option<Rc<dyn ArgsChecker>> {
            let validator = self.methods.get(method)?.args.clone()?;
            Some(Rc::new(JsonSchemaChecker { validator }))
        }

        fn result_checker(&self, method: &str) -> Option<Rc<dyn ResultChecker>> {
            let validator = self.methods.get(method)?.result.clone()?;
            Some(Rc::new(JsonSchemaChecker { validator }))
        }
    }

    struct JsonSchemaChecker {
        validator: Rc<Validator>,
    }

    impl ArgsChecker for JsonSchemaChecker {
        fn check(&self, args: &Value) -> Result<(), String> {
            self.validator
                .validate(args)
                .map_err(|err| err.to_string())
        }
    }

    impl ResultChecker for JsonSchemaChecker {
        fn check(&self, result: &Value) -> Result<(), String> {
            self.validator
                .validate(result)
                .map_err(|err| err.to_string())
        }
    }
}
