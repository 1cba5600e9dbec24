//! Bech32 address codecs and module address derivation.
//!
//! Three codec instances exist per chain: account (`<prefix>`), validator
//! operator (`<prefix>valoper`) and consensus (`<prefix>valcons`). Which one
//! applies to a field is decided by its `ScalarType` annotation.

use bech32::{Bech32, Hrp};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::schema::ScalarType;

/// Longest raw address accepted.
pub const MAX_ADDR_LEN: usize = 255;

/// Well-known name of the governance module.
pub const GOV_MODULE_NAME: &str = "gov";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty address")]
    Empty,
    #[error("address length {0} exceeds {MAX_ADDR_LEN} bytes")]
    TooLong(usize),
    #[error("invalid bech32 prefix {0:?}")]
    InvalidPrefix(String),
    #[error("invalid bech32 address {address:?}: {reason}")]
    Decode { address: String, reason: String },
    #[error("address {address:?} has prefix {found:?}, expected {expected:?}")]
    WrongPrefix {
        address: String,
        found: String,
        expected: String,
    },
    #[error("bech32 encoding failed: {0}")]
    Encode(String),
}

/// Converts between raw address bytes and their string form.
pub trait AddressCodec: Send + Sync {
    fn bytes_to_string(&self, bz: &[u8]) -> Result<String, AddressError>;
    fn string_to_bytes(&self, text: &str) -> Result<Vec<u8>, AddressError>;
}

#[derive(Debug, Clone)]
pub struct Bech32Codec {
    hrp: Hrp,
}

impl Bech32Codec {
    pub fn new(prefix: &str) -> Result<Self, AddressError> {
        let hrp = Hrp::parse(prefix).map_err(|_| AddressError::InvalidPrefix(prefix.to_string()))?;
        Ok(Self { hrp })
    }

    pub fn prefix(&self) -> &str {
        self.hrp.as_str()
    }
}

impl AddressCodec for Bech32Codec {
    fn bytes_to_string(&self, bz: &[u8]) -> Result<String, AddressError> {
        if bz.is_empty() {
            return Err(AddressError::Empty);
        }
        if bz.len() > MAX_ADDR_LEN {
            return Err(AddressError::TooLong(bz.len()));
        }
        bech32::encode::<Bech32>(self.hrp, bz).map_err(|e| AddressError::Encode(e.to_string()))
    }

    fn string_to_bytes(&self, text: &str) -> Result<Vec<u8>, AddressError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AddressError::Empty);
        }
        let (hrp, data) = bech32::decode(text).map_err(|e| AddressError::Decode {
            address: text.to_string(),
            reason: e.to_string(),
        })?;
        if !hrp.as_str().eq_ignore_ascii_case(self.hrp.as_str()) {
            return Err(AddressError::WrongPrefix {
                address: text.to_string(),
                found: hrp.to_string(),
                expected: self.hrp.to_string(),
            });
        }
        if data.is_empty() {
            return Err(AddressError::Empty);
        }
        if data.len() > MAX_ADDR_LEN {
            return Err(AddressError::TooLong(data.len()));
        }
        Ok(data)
    }
}

/// Which of the three codecs a field needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Account,
    Validator,
    Consensus,
}

impl CodecKind {
    pub fn for_scalar(scalar: Option<ScalarType>) -> Self {
        match scalar {
            Some(ScalarType::ValidatorAddress) => CodecKind::Validator,
            Some(ScalarType::ConsensusAddress) => CodecKind::Consensus,
            _ => CodecKind::Account,
        }
    }
}

/// The account / validator / consensus codec triple of one chain.
#[derive(Debug, Clone)]
pub struct AddressCodecs {
    account: Bech32Codec,
    validator: Bech32Codec,
    consensus: Bech32Codec,
}

impl AddressCodecs {
    pub fn from_prefix(prefix: &str) -> Result<Self, AddressError> {
        Ok(Self {
            account: Bech32Codec::new(prefix)?,
            validator: Bech32Codec::new(&format!("{prefix}valoper"))?,
            consensus: Bech32Codec::new(&format!("{prefix}valcons"))?,
        })
    }

    pub fn account(&self) -> &dyn AddressCodec {
        &self.account
    }

    pub fn select(&self, kind: CodecKind) -> &dyn AddressCodec {
        match kind {
            CodecKind::Account => &self.account,
            CodecKind::Validator => &self.validator,
            CodecKind::Consensus => &self.consensus,
        }
    }
}

/// Deterministic address of a module account: first 20 bytes of
/// `sha256(name)`.
pub fn module_address(name: &str) -> Vec<u8> {
    Sha256::digest(name.as_bytes())[..20].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_account() {
        let codecs = AddressCodecs::from_prefix("cosmos").unwrap();
        let raw = vec![7u8; 20];
        let text = codecs.account().bytes_to_string(&raw).unwrap();
        assert!(text.starts_with("cosmos1"));
        assert_eq!(codecs.account().string_to_bytes(&text).unwrap(), raw);
    }

    #[test]
    fn validator_and_consensus_prefixes() {
        let codecs = AddressCodecs::from_prefix("cosmos").unwrap();
        let raw = [1u8; 20];
        let val = codecs.select(CodecKind::Validator).bytes_to_string(&raw).unwrap();
        let cons = codecs.select(CodecKind::Consensus).bytes_to_string(&raw).unwrap();
        assert!(val.starts_with("cosmosvaloper1"));
        assert!(cons.starts_with("cosmosvalcons1"));
        assert!(matches!(
            codecs.account().string_to_bytes(&val),
            Err(AddressError::WrongPrefix { .. })
        ));
    }

    #[test]
    fn empty_bytes_rejected() {
        let codecs = AddressCodecs::from_prefix("cosmos").unwrap();
        assert_eq!(codecs.account().bytes_to_string(&[]), Err(AddressError::Empty));
    }

    #[test]
    fn gov_module_address_is_stable() {
        let a = module_address(GOV_MODULE_NAME);
        assert_eq!(a.len(), 20);
        assert_eq!(a, module_address("gov"));
        assert_ne!(a, module_address("distribution"));
        let codecs = AddressCodecs::from_prefix("cosmos").unwrap();
        let text = codecs.account().bytes_to_string(&a).unwrap();
        assert_eq!(codecs.account().string_to_bytes(&text).unwrap(), a);
    }

    #[test]
    fn codec_kind_from_scalar() {
        assert_eq!(CodecKind::for_scalar(None), CodecKind::Account);
        assert_eq!(
            CodecKind::for_scalar(Some(ScalarType::ValidatorAddress)),
            CodecKind::Validator
        );
        assert_eq!(
            CodecKind::for_scalar(Some(ScalarType::ConsensusAddress)),
            CodecKind::Consensus
        );
    }
}
