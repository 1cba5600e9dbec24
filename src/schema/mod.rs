//! Schema registry: closed, tagged descriptions of services, methods, messages
//! and fields.
//!
//! Descriptors are loaded once (from the manifest) and never mutated. Message
//! descriptors are shared behind `Arc` so message instances can carry their
//! own shape.
//!
//! Key items:
//!   SchemaRegistry::new / find_service / find_message
//!   FieldKind / ScalarType (explicit semantic annotations)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub mod version;

pub use version::VersionPolicy;

/// Largest field number allowed by the protobuf wire format.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("service {0} not found")]
    ServiceNotFound(String),
    #[error("message {0} not found")]
    MessageNotFound(String),
    #[error("duplicate message definition: {0}")]
    DuplicateMessage(String),
    #[error("duplicate service definition: {0}")]
    DuplicateService(String),
    #[error("duplicate method {method} in service {service}")]
    DuplicateMethod { service: String, method: String },
    #[error("duplicate field {field} in message {message}")]
    DuplicateField { message: String, field: String },
    #[error("invalid field number {number} for {message}.{field}")]
    InvalidFieldNumber {
        message: String,
        field: String,
        number: u32,
    },
    #[error("field {message}.{field} references unknown message {target:?}")]
    UnknownFieldMessage {
        message: String,
        field: String,
        target: Option<String>,
    },
    #[error("field {message}.{field} of kind {kind} cannot reference message {target}")]
    UnexpectedFieldMessage {
        message: String,
        field: String,
        kind: FieldKind,
        target: String,
    },
    #[error("enum field {message}.{field} declares no values")]
    EmptyEnum { message: String, field: String },
    #[error("signer {field} is not a field of message {message}")]
    UnknownSigner { message: String, field: String },
}

/* ---- Field level ---- */

/// Wire-level type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Bytes,
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Enum,
    Message,
}

impl FieldKind {
    /// Kinds encoded as a single varint on the wire.
    pub fn is_varint(self) -> bool {
        matches!(
            self,
            FieldKind::Bool
                | FieldKind::Int32
                | FieldKind::Int64
                | FieldKind::Uint32
                | FieldKind::Uint64
                | FieldKind::Enum
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::String => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Bool => "bool",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::Uint32 => "uint32",
            FieldKind::Uint64 => "uint64",
            FieldKind::Enum => "enum",
            FieldKind::Message => "message",
        };
        f.write_str(s)
    }
}

/// Semantic annotation carried on a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    #[serde(alias = "cosmos.AddressString")]
    Address,
    #[serde(alias = "cosmos.ValidatorAddressString")]
    ValidatorAddress,
    #[serde(alias = "cosmos.ConsensusAddressString")]
    ConsensusAddress,
    #[serde(alias = "cosmos.Dec")]
    Dec,
    #[serde(alias = "cosmos.Int")]
    Int,
}

impl ScalarType {
    pub fn is_address(self) -> bool {
        matches!(
            self,
            ScalarType::Address | ScalarType::ValidatorAddress | ScalarType::ConsensusAddress
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScalarType::Address => "cosmos.AddressString",
            ScalarType::ValidatorAddress => "cosmos.ValidatorAddressString",
            ScalarType::ConsensusAddress => "cosmos.ConsensusAddressString",
            ScalarType::Dec => "cosmos.Dec",
            ScalarType::Int => "cosmos.Int",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: u32,
    pub kind: FieldKind,
    #[serde(default)]
    pub repeated: bool,
    /// Fully-qualified message name, only for `kind: message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Enum value names to numbers, only for `kind: enum`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enum_values: BTreeMap<String, i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar: Option<ScalarType>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl FieldDescriptor {
    /// Human readable type, e.g. `repeated cosmos.base.v1beta1.Coin`.
    pub fn type_label(&self) -> String {
        let base = match (&self.kind, &self.message, &self.scalar) {
            (FieldKind::Message, Some(m), _) => m.clone(),
            (_, _, Some(s)) => s.to_string(),
            (k, _, _) => k.to_string(),
        };
        if self.repeated {
            format!("repeated {base}")
        } else {
            base
        }
    }

    pub fn enum_name(&self, number: i32) -> Option<&str> {
        self.enum_values
            .iter()
            .find(|(_, v)| **v == number)
            .map(|(k, _)| k.as_str())
    }

    /// Resolve an enum value from a number, its full name, or the unique
    /// name suffix after the shared prefix (`yes` for `VOTE_OPTION_YES`).
    pub fn enum_number(&self, raw: &str) -> Option<i32> {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<i32>() {
            return self.enum_values.values().any(|v| *v == n).then_some(n);
        }
        if let Some((_, v)) = self
            .enum_values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(raw))
        {
            return Some(*v);
        }
        let suffix = format!("_{}", raw.to_ascii_lowercase());
        let mut hits = self
            .enum_values
            .iter()
            .filter(|(k, _)| k.to_ascii_lowercase().ends_with(&suffix));
        match (hits.next(), hits.next()) {
            (Some((_, v)), None) => Some(*v),
            _ => None,
        }
    }
}

/* ---- Message / service level ---- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// Fields carrying the authorizing address; the first one is the signer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signer: Vec<String>,
}

impl MessageDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }

    pub fn signer_field_name(&self) -> Option<&str> {
        self.signer.first().map(String::as_str)
    }

    /// Fields sorted by number (canonical encoding order).
    pub fn fields_by_number(&self) -> Vec<&FieldDescriptor> {
        let mut out: Vec<&FieldDescriptor> = self.fields.iter().collect();
        out.sort_by_key(|f| f.number);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub input: String,
    pub output: String,
    /// `"<module> <version>"` the method was introduced in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

impl ServiceDescriptor {
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/* ---- Registry ---- */

/// Process-wide schema registry. Read-only after construction.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    services: BTreeMap<String, ServiceDescriptor>,
    messages: BTreeMap<String, Arc<MessageDescriptor>>,
}

impl SchemaRegistry {
    /// Validate and index the given descriptors.
    pub fn new(
        messages: Vec<MessageDescriptor>,
        services: Vec<ServiceDescriptor>,
    ) -> Result<Self, SchemaError> {
        let mut reg = SchemaRegistry::default();

        for m in messages {
            if reg.messages.contains_key(&m.name) {
                return Err(SchemaError::DuplicateMessage(m.name));
            }
            reg.messages.insert(m.name.clone(), Arc::new(m));
        }
        for m in reg.messages.values() {
            reg.validate_message(m)?;
        }

        for s in services {
            if reg.services.contains_key(&s.name) {
                return Err(SchemaError::DuplicateService(s.name));
            }
            let mut seen = HashSet::new();
            for method in &s.methods {
                if !seen.insert(method.name.as_str()) {
                    return Err(SchemaError::DuplicateMethod {
                        service: s.name.clone(),
                        method: method.name.clone(),
                    });
                }
            }
            reg.services.insert(s.name.clone(), s);
        }
        Ok(reg)
    }

    fn validate_message(&self, m: &MessageDescriptor) -> Result<(), SchemaError> {
        let mut names = HashSet::new();
        let mut numbers = HashSet::new();
        for f in &m.fields {
            if !names.insert(f.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    message: m.name.clone(),
                    field: f.name.clone(),
                });
            }
            if f.number == 0 || f.number > MAX_FIELD_NUMBER || !numbers.insert(f.number) {
                return Err(SchemaError::InvalidFieldNumber {
                    message: m.name.clone(),
                    field: f.name.clone(),
                    number: f.number,
                });
            }
            match (f.kind, &f.message) {
                (FieldKind::Message, Some(target)) if self.messages.contains_key(target) => {}
                (FieldKind::Message, target) => {
                    return Err(SchemaError::UnknownFieldMessage {
                        message: m.name.clone(),
                        field: f.name.clone(),
                        target: target.clone(),
                    });
                }
                (kind, Some(target)) => {
                    return Err(SchemaError::UnexpectedFieldMessage {
                        message: m.name.clone(),
                        field: f.name.clone(),
                        kind,
                        target: target.clone(),
                    });
                }
                _ => {}
            }
            if f.kind == FieldKind::Enum && f.enum_values.is_empty() {
                return Err(SchemaError::EmptyEnum {
                    message: m.name.clone(),
                    field: f.name.clone(),
                });
            }
        }
        for s in &m.signer {
            if m.field(s).is_none() {
                return Err(SchemaError::UnknownSigner {
                    message: m.name.clone(),
                    field: s.clone(),
                });
            }
        }
        Ok(())
    }

    /// Look up a service by fully-qualified name.
    pub fn find_service(&self, name: &str) -> Result<&ServiceDescriptor, SchemaError> {
        self.services
            .get(name)
            .ok_or_else(|| SchemaError::ServiceNotFound(name.to_string()))
    }

    pub fn find_message(&self, name: &str) -> Result<Arc<MessageDescriptor>, SchemaError> {
        self.messages
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::MessageNotFound(name.to_string()))
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.values()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Arc<MessageDescriptor>> {
        self.messages.values()
    }
}
