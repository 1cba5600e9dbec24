use thiserror::Error;

use super::bridge::BridgeError;
use super::signer::SignerError;
use crate::address::AddressError;
use crate::client::ContextError;
use crate::flag::FlagError;
use crate::gov::GovError;
use crate::message::MessageError;
use crate::schema::version::VersionError;

/// Configuration errors raised while building the command tree.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("can't find service {service}")]
    ServiceNotFound { service: String },
    #[error("rpc method {method:?} not found for service {service:?}")]
    MethodNotFound { method: String, service: String },
    #[error("input message {message} of {service}.{method} not found")]
    MessageNotFound {
        service: String,
        method: String,
        message: String,
    },
    #[error("cannot build {method}: {source}")]
    MissingSigner {
        method: String,
        #[source]
        source: SignerError,
    },
    #[error("invalid version annotation on {method}: {source}")]
    InvalidVersion {
        method: String,
        #[source]
        source: VersionError,
    },
    #[error("invalid positional arguments for {method}: {source}")]
    UnknownPositional {
        method: String,
        #[source]
        source: FlagError,
    },
    #[error("invalid flag options for {method}: {source}")]
    InvalidFlagOptions {
        method: String,
        #[source]
        source: FlagError,
    },
    #[error("flag {flag:?} of {method} is used by more than one argument")]
    FlagConflict { method: String, flag: String },
}

/// Failures of one command invocation. Nothing is submitted when one is
/// returned before `Submission`.
#[derive(Debug, Error)]
pub enum TxError {
    #[error("failed to resolve client context: {0}")]
    Context(#[from] ContextError),
    #[error(transparent)]
    Flags(#[from] FlagError),
    #[error("failed to set signer on message, got {raw:?}: {source}")]
    Signer {
        raw: String,
        #[source]
        source: AddressError,
    },
    #[error("failed to convert gov authority: {0}")]
    Authority(#[source] AddressError),
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error(transparent)]
    Proposal(#[from] GovError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("transaction failed: {0:#}")]
    Submission(anyhow::Error),
}
