//! Field-number keyed message, the representation handed to the transaction
//! pipeline. Instances are only produced by decoding wire bytes.

use base64::Engine as _;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::ProtoMessage;
use super::wire::{self, DecodeError, put_len, put_varint};
use crate::proto::Any;
use crate::schema::{FieldDescriptor, FieldKind, MessageDescriptor, SchemaRegistry};
use prost::encoding::WireType;

#[derive(Debug, Clone, PartialEq)]
pub enum TxValue {
    Varint(u64),
    Text(String),
    Bytes(Vec<u8>),
    Message(TxMsg),
    Repeated(Vec<TxValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TxMsg {
    descriptor: Arc<MessageDescriptor>,
    fields: BTreeMap<u32, TxValue>,
}

impl TxMsg {
    /// Parse `bytes` as an instance of `descriptor`.
    pub fn decode(
        descriptor: Arc<MessageDescriptor>,
        registry: &SchemaRegistry,
        bytes: &[u8],
    ) -> Result<Self, DecodeError> {
        let mut fields: BTreeMap<u32, TxValue> = BTreeMap::new();
        let mut buf = bytes;
        while !buf.is_empty() {
            let (number, wire_type) = wire::read_key(&mut buf)?;
            let field = descriptor
                .field_by_number(number)
                .ok_or_else(|| DecodeError::UnknownField {
                    message: descriptor.name.clone(),
                    number,
                })?;

            let values = match wire_type {
                WireType::Varint if field.kind.is_varint() => {
                    vec![TxValue::Varint(wire::read_varint(&mut buf)?)]
                }
                WireType::LengthDelimited if field.kind.is_varint() && field.repeated => {
                    let chunk = wire::read_len(&mut buf)?;
                    wire::read_packed(chunk)?
                        .into_iter()
                        .map(TxValue::Varint)
                        .collect()
                }
                WireType::LengthDelimited if !field.kind.is_varint() => {
                    let chunk = wire::read_len(&mut buf)?;
                    vec![decode_len_value(&descriptor, field, chunk, registry)?]
                }
                other => {
                    return Err(DecodeError::WireTypeMismatch {
                        message: descriptor.name.clone(),
                        field: field.name.clone(),
                        wire_type: other,
                    });
                }
            };

            if field.repeated {
                let slot = fields
                    .entry(number)
                    .or_insert_with(|| TxValue::Repeated(Vec::new()));
                if let TxValue::Repeated(items) = slot {
                    items.extend(values);
                }
            } else if let Some(last) = values.into_iter().last() {
                fields.insert(number, last);
            }
        }
        Ok(Self { descriptor, fields })
    }

    pub fn get(&self, name: &str) -> Option<&TxValue> {
        let field = self.descriptor.field(name)?;
        self.fields.get(&field.number)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            TxValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_any(&self) -> Any {
        Any {
            type_url: self.type_url(),
            value: self.encode_to_vec(),
        }
    }

    /// Proto3 JSON rendering (64-bit integers as strings, bytes as base64).
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        for field in &self.descriptor.fields {
            if let Some(v) = self.fields.get(&field.number) {
                obj.insert(field.name.clone(), value_to_json(field, v));
            }
        }
        serde_json::Value::Object(obj)
    }

    /// JSON rendering as a packed `Any` (`@type` plus fields).
    pub fn to_any_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        obj.insert("@type".into(), serde_json::Value::String(self.type_url()));
        if let serde_json::Value::Object(fields) = self.to_json() {
            obj.extend(fields);
        }
        serde_json::Value::Object(obj)
    }
}

impl ProtoMessage for TxMsg {
    fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        for (number, value) in &self.fields {
            match value {
                TxValue::Repeated(items) => {
                    for item in items {
                        encode_value(*number, item, true, buf);
                    }
                }
                v => encode_value(*number, v, false, buf),
            }
        }
    }
}

fn encode_value(tag: u32, value: &TxValue, always: bool, buf: &mut Vec<u8>) {
    match value {
        TxValue::Varint(v) if *v != 0 || always => put_varint(tag, *v, buf),
        TxValue::Text(s) if !s.is_empty() || always => put_len(tag, s.as_bytes(), buf),
        TxValue::Bytes(b) if !b.is_empty() || always => put_len(tag, b, buf),
        TxValue::Message(m) => put_len(tag, &m.encode_to_vec(), buf),
        _ => {}
    }
}

fn decode_len_value(
    parent: &MessageDescriptor,
    field: &FieldDescriptor,
    chunk: &[u8],
    registry: &SchemaRegistry,
) -> Result<TxValue, DecodeError> {
    match field.kind {
        FieldKind::String => String::from_utf8(chunk.to_vec())
            .map(TxValue::Text)
            .map_err(|_| DecodeError::InvalidUtf8 {
                message: parent.name.clone(),
                field: field.name.clone(),
            }),
        FieldKind::Message => {
            let target = field.message.as_deref().unwrap_or_default();
            let desc = registry
                .find_message(target)
                .map_err(|_| DecodeError::MessageNotFound(target.to_string()))?;
            Ok(TxValue::Message(TxMsg::decode(desc, registry, chunk)?))
        }
        _ => Ok(TxValue::Bytes(chunk.to_vec())),
    }
}

fn value_to_json(field: &FieldDescriptor, value: &TxValue) -> serde_json::Value {
    use serde_json::Value as J;
    match value {
        TxValue::Repeated(items) => J::Array(items.iter().map(|i| value_to_json(field, i)).collect()),
        TxValue::Varint(v) => match field.kind {
            FieldKind::Bool => J::Bool(*v != 0),
            FieldKind::Int32 => J::from(*v as i64 as i32),
            FieldKind::Uint32 => J::from(*v as u32),
            FieldKind::Int64 => J::String((*v as i64).to_string()),
            FieldKind::Enum => {
                let n = *v as i64 as i32;
                field
                    .enum_name(n)
                    .map(|name| J::String(name.to_string()))
                    .unwrap_or_else(|| J::from(n))
            }
            _ => J::String(v.to_string()),
        },
        TxValue::Text(s) => J::String(s.clone()),
        TxValue::Bytes(b) => J::String(base64::engine::general_purpose::STANDARD.encode(b)),
        TxValue::Message(m) => m.to_json(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{DynamicMessage, Value};

    fn registry() -> SchemaRegistry {
        let yaml = r#"
- name: test.Inner
  fields:
    - { name: label, number: 1, kind: string }
- name: test.Outer
  fields:
    - { name: id, number: 1, kind: int64 }
    - { name: flags, number: 2, kind: uint32, repeated: true }
    - { name: inner, number: 3, kind: message, message: test.Inner }
    - { name: blob, number: 4, kind: bytes }
"#;
        let messages: Vec<MessageDescriptor> = serde_yaml::from_str(yaml).unwrap();
        SchemaRegistry::new(messages, vec![]).unwrap()
    }

    #[test]
    fn decode_accepts_packed_repeated() {
        let reg = registry();
        // field 2, length-delimited, packed [1, 2]
        let bytes = [0x12, 0x02, 0x01, 0x02];
        let msg = TxMsg::decode(reg.find_message("test.Outer").unwrap(), &reg, &bytes).unwrap();
        assert_eq!(
            msg.get("flags"),
            Some(&TxValue::Repeated(vec![TxValue::Varint(1), TxValue::Varint(2)]))
        );
        // re-encoded unpacked
        assert_eq!(msg.encode_to_vec(), vec![0x10, 0x01, 0x10, 0x02]);
    }

    #[test]
    fn unknown_field_is_an_error() {
        let reg = registry();
        let bytes = [0x48, 0x01]; // field 9, varint
        let err = TxMsg::decode(reg.find_message("test.Outer").unwrap(), &reg, &bytes).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownField { number: 9, .. }));
    }

    #[test]
    fn wire_type_mismatch_is_an_error() {
        let reg = registry();
        let bytes = [0x18, 0x01]; // field 3 (message) as varint
        let err = TxMsg::decode(reg.find_message("test.Outer").unwrap(), &reg, &bytes).unwrap_err();
        assert!(matches!(err, DecodeError::WireTypeMismatch { .. }));
    }

    #[test]
    fn json_rendering() {
        let reg = registry();
        let outer = reg.find_message("test.Outer").unwrap();
        let mut inner = DynamicMessage::new(reg.find_message("test.Inner").unwrap());
        inner.set("label", Value::String("x".into())).unwrap();
        let mut src = DynamicMessage::new(outer.clone());
        src.set("id", Value::I64(-5)).unwrap();
        src.set("inner", Value::Message(inner)).unwrap();
        src.set("blob", Value::Bytes(vec![1, 2, 3])).unwrap();

        let msg = TxMsg::decode(outer, &reg, &src.encode_to_vec()).unwrap();
        let json = msg.to_any_json();
        assert_eq!(json["@type"], "/test.Outer");
        assert_eq!(json["id"], "-5");
        assert_eq!(json["inner"]["label"], "x");
        assert_eq!(json["blob"], "AQID");
    }
}
