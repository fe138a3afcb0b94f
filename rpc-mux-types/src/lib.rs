//! Wire envelope and error types shared between the `rpc-mux` core and any
//! crate that needs to speak its wire format without depending on the full
//! endpoint implementation (e.g. a transport adapter crate).

mod envelope;
mod error;

pub use envelope::Envelope;
pub use error::{RpcError, codes};
