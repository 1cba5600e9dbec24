//! Client layer: ambient context, tx connection flags and the transaction
//! pipeline the generated commands submit to.

pub mod context;
pub mod flags;
pub mod tx;

pub use context::{ClientConfig, ClientContext, ContextError, Output, get_client_tx_context};
pub use flags::{TxFlags, add_tx_flags};
pub use tx::{GeneratePipeline, TxOutcome, TxPayload, TxPipeline};
