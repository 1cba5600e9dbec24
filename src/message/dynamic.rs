//! Descriptor-driven, name-keyed message instance.

use base64::Engine as _;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::wire::{put_len, put_varint};
use super::{MessageError, ProtoMessage};
use crate::schema::{FieldDescriptor, FieldKind, MessageDescriptor, SchemaRegistry};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I64(i64),
    U64(u64),
    Enum(i32),
    String(String),
    Bytes(Vec<u8>),
    Message(DynamicMessage),
    List(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    descriptor: Arc<MessageDescriptor>,
    values: BTreeMap<String, Value>,
}

impl DynamicMessage {
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        Self {
            descriptor,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String value of a field, empty when unset or not a string.
    pub fn get_str(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(Value::String(s)) => s,
            _ => "",
        }
    }

    /// Set a field after checking it exists and the value matches its kind.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), MessageError> {
        let field = self.field(name)?;
        check_value(&self.descriptor.name, field, &value)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn field(&self, name: &str) -> Result<&FieldDescriptor, MessageError> {
        self.descriptor
            .field(name)
            .ok_or_else(|| MessageError::UnknownField {
                message: self.descriptor.name.clone(),
                field: name.to_string(),
            })
    }

    /// Build a message from a JSON object keyed by field name.
    pub fn from_json(
        descriptor: Arc<MessageDescriptor>,
        json: &serde_json::Value,
        registry: &SchemaRegistry,
    ) -> Result<Self, MessageError> {
        let obj = json
            .as_object()
            .ok_or_else(|| MessageError::NotAnObject(descriptor.name.clone()))?;
        let mut msg = DynamicMessage::new(descriptor);
        for (key, raw) in obj {
            let field = msg.field(key)?.clone();
            let value = if field.repeated {
                let items = raw.as_array().ok_or_else(|| mismatch(&msg.descriptor.name, &field, "a JSON array"))?;
                Value::List(
                    items
                        .iter()
                        .map(|item| json_to_value(&msg.descriptor.name, &field, item, registry))
                        .collect::<Result<_, _>>()?,
                )
            } else {
                json_to_value(&msg.descriptor.name, &field, raw, registry)?
            };
            msg.set(key, value)?;
        }
        Ok(msg)
    }
}

impl ProtoMessage for DynamicMessage {
    fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        for field in self.descriptor.fields_by_number() {
            match self.values.get(&field.name) {
                Some(Value::List(items)) => {
                    for item in items {
                        encode_value(field.number, item, true, buf);
                    }
                }
                Some(value) => encode_value(field.number, value, false, buf),
                None => {}
            }
        }
    }
}

fn encode_value(tag: u32, value: &Value, always: bool, buf: &mut Vec<u8>) {
    match value {
        Value::Bool(b) if *b || always => put_varint(tag, u64::from(*b), buf),
        Value::I64(n) if *n != 0 || always => put_varint(tag, *n as u64, buf),
        Value::U64(n) if *n != 0 || always => put_varint(tag, *n, buf),
        Value::Enum(n) if *n != 0 || always => put_varint(tag, i64::from(*n) as u64, buf),
        Value::String(s) if !s.is_empty() || always => put_len(tag, s.as_bytes(), buf),
        Value::Bytes(b) if !b.is_empty() || always => put_len(tag, b, buf),
        Value::Message(m) => put_len(tag, &m.encode_to_vec(), buf),
        _ => {}
    }
}

fn mismatch(message: &str, field: &FieldDescriptor, expected: &str) -> MessageError {
    MessageError::TypeMismatch {
        message: message.to_string(),
        field: field.name.clone(),
        expected: expected.to_string(),
    }
}

fn check_value(message: &str, field: &FieldDescriptor, value: &Value) -> Result<(), MessageError> {
    match value {
        Value::List(items) if field.repeated => items
            .iter()
            .try_for_each(|item| check_element(message, field, item)),
        Value::List(_) => Err(mismatch(message, field, &field.type_label())),
        _ if field.repeated => Err(mismatch(message, field, &field.type_label())),
        v => check_element(message, field, v),
    }
}

fn check_element(message: &str, field: &FieldDescriptor, value: &Value) -> Result<(), MessageError> {
    let ok = match (field.kind, value) {
        (FieldKind::String, Value::String(_))
        | (FieldKind::Bytes, Value::Bytes(_))
        | (FieldKind::Bool, Value::Bool(_))
        | (FieldKind::Int64, Value::I64(_))
        | (FieldKind::Uint64, Value::U64(_)) => true,
        (FieldKind::Int32, Value::I64(n)) => {
            if i32::try_from(*n).is_err() {
                return Err(out_of_range(message, field, n));
            }
            true
        }
        (FieldKind::Uint32, Value::U64(n)) => {
            if u32::try_from(*n).is_err() {
                return Err(out_of_range(message, field, n));
            }
            true
        }
        (FieldKind::Enum, Value::Enum(n)) => {
            if field.enum_name(*n).is_none() {
                return Err(MessageError::UnknownEnum {
                    message: message.to_string(),
                    field: field.name.clone(),
                    value: n.to_string(),
                });
            }
            true
        }
        (FieldKind::Message, Value::Message(m)) => field.message.as_deref() == Some(m.descriptor.name.as_str()),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(mismatch(message, field, &field.kind.to_string()))
    }
}

fn out_of_range(message: &str, field: &FieldDescriptor, value: impl ToString) -> MessageError {
    MessageError::OutOfRange {
        message: message.to_string(),
        field: field.name.clone(),
        value: value.to_string(),
    }
}

fn json_to_value(
    message: &str,
    field: &FieldDescriptor,
    raw: &serde_json::Value,
    registry: &SchemaRegistry,
) -> Result<Value, MessageError> {
    use serde_json::Value as J;
    let value = match (field.kind, raw) {
        (FieldKind::String, J::String(s)) => Value::String(s.clone()),
        (FieldKind::String, J::Number(n)) => Value::String(n.to_string()),
        (FieldKind::Bytes, J::String(s)) => Value::Bytes(
            base64::engine::general_purpose::STANDARD
                .decode(s)
                .map_err(|_| mismatch(message, field, "base64 bytes"))?,
        ),
        (FieldKind::Bool, J::Bool(b)) => Value::Bool(*b),
        (FieldKind::Int32 | FieldKind::Int64, J::Number(n)) => {
            Value::I64(n.as_i64().ok_or_else(|| out_of_range(message, field, n))?)
        }
        (FieldKind::Int32 | FieldKind::Int64, J::String(s)) => Value::I64(
            s.parse()
                .map_err(|_| mismatch(message, field, "an integer"))?,
        ),
        (FieldKind::Uint32 | FieldKind::Uint64, J::Number(n)) => {
            Value::U64(n.as_u64().ok_or_else(|| out_of_range(message, field, n))?)
        }
        (FieldKind::Uint32 | FieldKind::Uint64, J::String(s)) => Value::U64(
            s.parse()
                .map_err(|_| mismatch(message, field, "an unsigned integer"))?,
        ),
        (FieldKind::Enum, J::String(s)) => {
            Value::Enum(field.enum_number(s).ok_or_else(|| MessageError::UnknownEnum {
                message: message.to_string(),
                field: field.name.clone(),
                value: s.clone(),
            })?)
        }
        (FieldKind::Enum, J::Number(n)) => Value::Enum(
            n.as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| out_of_range(message, field, n))?,
        ),
        (FieldKind::Message, obj @ J::Object(_)) => {
            let target = field.message.as_deref().unwrap_or_default();
            let desc = registry
                .find_message(target)
                .map_err(|_| MessageError::MessageNotFound(target.to_string()))?;
            Value::Message(DynamicMessage::from_json(desc, obj, registry)?)
        }
        _ => return Err(mismatch(message, field, &field.kind.to_string())),
    };
    Ok(value)
}
