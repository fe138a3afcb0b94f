//! A transport-agnostic, bidirectional, promise-based RPC multiplexer.
//!
//! `rpc-mux` does not open sockets, frame bytes, or retry anything. You give
//! it a function to call when it wants to send a message (see
//! [`EndpointConfig::send`]) and feed it whatever messages arrive from your
//! transport (see [`Endpoint::receive`]). In exchange it lets either side of
//! a connection register named interfaces (optionally schema-checked
//! against a [`checker::InterfaceChecker`] you supply) or bare functions,
//! call the other side's registered methods as ordinary `async fn`s,
//! exchange free-form out-of-band messages on the same channel, and forward
//! calls across multi-hop topologies without either hop needing to know the
//! whole path.
//!
//! [`Endpoint`] is the single entry point; see its docs for the full
//! operation list.

mod checker;
mod dispatch;
mod endpoint;
mod error;
mod forwarder;
mod logger;
mod names;
mod pending;
mod registry;
mod stub;

pub use checker::{AnyChecker, ArgsChecker, InterfaceChecker, ResultChecker};
#[cfg(feature = "schema-validate")]
pub use checker::schema;
pub use endpoint::{CallThunk, CallWrapperFn, Endpoint, EndpointConfig, SendFn, SendResult};
pub use error::EndpointError;
pub use logger::{Logger, NoopLogger};
pub use registry::InvokeFn;
pub use stub::Stub;

pub use rpc_mux_types::{Envelope, RpcError, codes};
