//! Message models.
//!
//! Two representations of the same schema-described message:
//!   - `DynamicMessage`: name-keyed values, populated field by field from flags.
//!   - `TxMsg`: field-number keyed wire values, the shape the transaction
//!     pipeline consumes.
//!
//! They share no in-memory structure; the only contract between them is the
//! protobuf wire encoding implemented in `wire`.

use std::sync::Arc;
use thiserror::Error;

use crate::schema::MessageDescriptor;

pub mod dynamic;
pub mod tx_msg;
pub mod wire;

pub use dynamic::{DynamicMessage, Value};
pub use tx_msg::{TxMsg, TxValue};
pub use wire::DecodeError;

/// Anything that can be written with the canonical wire encoding.
pub trait ProtoMessage {
    fn descriptor(&self) -> &Arc<MessageDescriptor>;

    fn encode_raw(&self, buf: &mut Vec<u8>);

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_raw(&mut buf);
        buf
    }

    /// `/package.Message` form used inside `Any`.
    fn type_url(&self) -> String {
        format!("/{}", self.descriptor().name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("message {message} has no field {field}")]
    UnknownField { message: String, field: String },
    #[error("field {message}.{field} expects {expected}")]
    TypeMismatch {
        message: String,
        field: String,
        expected: String,
    },
    #[error("value {value} out of range for {message}.{field}")]
    OutOfRange {
        message: String,
        field: String,
        value: String,
    },
    #[error("unknown enum value {value:?} for {message}.{field}")]
    UnknownEnum {
        message: String,
        field: String,
        value: String,
    },
    #[error("message {0} not found")]
    MessageNotFound(String),
    #[error("expected a JSON object for message {0}")]
    NotAnObject(String),
}
