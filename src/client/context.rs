//! Ambient submission context: who signs, for which chain, and where output
//! goes.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use url::Url;

use super::flags::TxFlags;
use crate::address::{AddressCodecs, AddressError};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("account {name:?} has an invalid address: {source}")]
    BadAccount {
        name: String,
        #[source]
        source: AddressError,
    },
    #[error("{0:?} is neither a configured account nor a valid address")]
    UnknownFrom(String),
}

/// Where command output is written.
#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Stdout,
    Memory(Arc<Mutex<Vec<u8>>>),
}

impl Output {
    /// In-memory sink plus a handle to read it back.
    pub fn memory() -> (Self, Arc<Mutex<Vec<u8>>>) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        (Output::Memory(buf.clone()), buf)
    }

    pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Output::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(bytes)?;
                out.flush()
            }
            Output::Memory(buf) => {
                let mut guard = buf
                    .lock()
                    .map_err(|_| io::Error::other("output buffer poisoned"))?;
                guard.extend_from_slice(bytes);
                Ok(())
            }
        }
    }
}

/// Chain-level client settings from the manifest.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub chain_id: String,
    pub node: Option<Url>,
    pub default_from: Option<String>,
    /// Named accounts: name to bech32 account address.
    pub accounts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    from_address: Vec<u8>,
    pub from_name: String,
    pub chain_id: String,
    pub node: Option<Url>,
    pub output: Output,
}

impl ClientContext {
    /// Raw bytes of the sending account; empty when no sender was given.
    pub fn from_address(&self) -> &[u8] {
        &self.from_address
    }
}

/// Build the context for one invocation. `--from` is looked up as an
/// account name first, then parsed as a bech32 or hex address.
pub fn get_client_tx_context(
    config: &ClientConfig,
    codecs: &AddressCodecs,
    flags: &TxFlags,
    output: Output,
) -> Result<ClientContext, ContextError> {
    let from = flags.from.clone().or_else(|| config.default_from.clone());
    let (from_name, from_address) = match from {
        None => (String::new(), Vec::new()),
        Some(from) => match config.accounts.get(&from) {
            Some(addr) => {
                let bz = codecs
                    .account()
                    .string_to_bytes(addr)
                    .map_err(|source| ContextError::BadAccount {
                        name: from.clone(),
                        source,
                    })?;
                (from, bz)
            }
            None => (String::new(), parse_address(codecs, &from)?),
        },
    };

    Ok(ClientContext {
        from_address,
        from_name,
        chain_id: flags
            .chain_id
            .clone()
            .unwrap_or_else(|| config.chain_id.clone()),
        node: flags.node.clone().or_else(|| config.node.clone()),
        output,
    })
}

fn parse_address(codecs: &AddressCodecs, raw: &str) -> Result<Vec<u8>, ContextError> {
    if let Ok(bz) = codecs.account().string_to_bytes(raw) {
        return Ok(bz);
    }
    let hex_str = raw.strip_prefix("0x").unwrap_or(raw);
    match hex::decode(hex_str) {
        Ok(bz) if bz.len() == 20 || bz.len() == 32 => Ok(bz),
        _ => Err(ContextError::UnknownFrom(raw.to_string())),
    }
}
