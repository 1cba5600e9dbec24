//! Signer field resolution.

use thiserror::Error;

use crate::address::CodecKind;
use crate::schema::{FieldKind, MessageDescriptor};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("message {0} declares no signer field")]
    NoSigner(String),
    #[error("signer {field} is not a field of message {message}")]
    UnknownField { message: String, field: String },
    #[error("signer field {message}.{field} must be a singular string")]
    NotAString { message: String, field: String },
}

/// The field that carries the authorizing address and the codec that
/// renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerField {
    pub name: String,
    pub codec: CodecKind,
}

pub fn resolve_signer(desc: &MessageDescriptor) -> Result<SignerField, SignerError> {
    let name = desc
        .signer_field_name()
        .ok_or_else(|| SignerError::NoSigner(desc.name.clone()))?;
    let field = desc.field(name).ok_or_else(|| SignerError::UnknownField {
        message: desc.name.clone(),
        field: name.to_string(),
    })?;
    if field.kind != FieldKind::String || field.repeated {
        return Err(SignerError::NotAString {
            message: desc.name.clone(),
            field: name.to_string(),
        });
    }
    Ok(SignerField {
        name: field.name.clone(),
        codec: CodecKind::for_scalar(field.scalar),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(yaml: &str) -> MessageDescriptor {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn account_signer() {
        let d = desc(
            "{ name: a.MsgSend, signer: [from_address], fields: [{ name: from_address, number: 1, kind: string, scalar: cosmos.AddressString }] }",
        );
        assert_eq!(
            resolve_signer(&d).unwrap(),
            SignerField {
                name: "from_address".into(),
                codec: CodecKind::Account
            }
        );
    }

    #[test]
    fn validator_signer() {
        let d = desc(
            "{ name: a.MsgEdit, signer: [validator_address], fields: [{ name: validator_address, number: 1, kind: string, scalar: cosmos.ValidatorAddressString }] }",
        );
        assert_eq!(resolve_signer(&d).unwrap().codec, CodecKind::Validator);
    }

    #[test]
    fn unannotated_signer_uses_account_codec() {
        let d = desc("{ name: a.Msg, signer: [creator], fields: [{ name: creator, number: 1, kind: string }] }");
        assert_eq!(resolve_signer(&d).unwrap().codec, CodecKind::Account);
    }

    #[test]
    fn missing_signer() {
        let d = desc("{ name: a.Msg, fields: [{ name: creator, number: 1, kind: string }] }");
        assert_eq!(resolve_signer(&d), Err(SignerError::NoSigner("a.Msg".into())));
    }

    #[test]
    fn non_string_signer() {
        let d = desc("{ name: a.Msg, signer: [id], fields: [{ name: id, number: 1, kind: uint64 }] }");
        assert!(matches!(resolve_signer(&d), Err(SignerError::NotAString { .. })));
    }
}
