//! Reflective command synthesis.
//!
//! A `Builder` turns service descriptors plus per-module command options into
//! a `CommandNode` tree whose leaves decode flags into a message, address it,
//! optionally wrap it in a governance proposal, and submit it to the
//! transaction pipeline.
//!
//! Layout:
//!   options.rs  manifest-facing command options
//!   tree.rs     CommandNode, merge, add_msg_service_commands, build_msg_command
//!   msg.rs      build_msg_method_command, run_msg, handle_gov_proposal
//!   signer.rs   resolve_signer
//!   bridge.rs   clone_message
//!   error.rs    BuildError / TxError

use std::sync::Arc;

use crate::address::AddressCodecs;
use crate::client::{ClientConfig, ClientContext, Output, TxFlags, TxOutcome, TxPayload, TxPipeline};
use crate::schema::{SchemaRegistry, VersionPolicy};

pub mod bridge;
pub mod error;
pub mod msg;
pub mod options;
pub mod signer;
pub mod tree;

pub use error::{BuildError, TxError};
pub use options::{CommandDescriptor, FlagOptions, ModuleOptions, RpcCommandOptions};
pub use tree::{CommandNode, ExecFn, Merge, merge};

/// Shared, read-only collaborators captured by every generated command.
#[derive(Clone)]
pub struct Builder {
    registry: Arc<SchemaRegistry>,
    codecs: Arc<AddressCodecs>,
    pipeline: Arc<dyn TxPipeline>,
    client: Arc<ClientConfig>,
    versions: Arc<VersionPolicy>,
    output: Output,
}

impl Builder {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        codecs: AddressCodecs,
        pipeline: Arc<dyn TxPipeline>,
    ) -> Self {
        Self {
            registry,
            codecs: Arc::new(codecs),
            pipeline,
            client: Arc::new(ClientConfig::default()),
            versions: Arc::new(VersionPolicy::default()),
            output: Output::Stdout,
        }
    }

    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = Arc::new(client);
        self
    }

    pub fn with_versions(mut self, versions: VersionPolicy) -> Self {
        self.versions = Arc::new(versions);
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn codecs(&self) -> &AddressCodecs {
        &self.codecs
    }

    pub fn client_config(&self) -> &ClientConfig {
        &self.client
    }

    pub fn versions(&self) -> &VersionPolicy {
        &self.versions
    }

    pub fn output(&self) -> Output {
        self.output.clone()
    }

    pub fn broadcast(
        &self,
        ctx: &ClientContext,
        flags: &TxFlags,
        payload: TxPayload,
    ) -> Result<TxOutcome, TxError> {
        self.pipeline
            .generate_or_broadcast(ctx, flags, payload)
            .map_err(TxError::Submission)
    }
}
