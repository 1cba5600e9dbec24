//! Moves a message between the dynamic and the transaction representation by
//! round-tripping it through the wire encoding.

use thiserror::Error;

use crate::message::{DecodeError, ProtoMessage, TxMsg};
use crate::schema::SchemaRegistry;

#[derive(Debug, Error)]
#[error("failed to clone message {message}: {source}")]
pub struct BridgeError {
    pub message: String,
    #[source]
    pub source: DecodeError,
}

/// Encode `src` and decode the bytes as a fresh `TxMsg` of the same shape.
/// The source is left untouched.
pub fn clone_message<M: ProtoMessage>(src: &M, registry: &SchemaRegistry) -> Result<TxMsg, BridgeError> {
    let desc = src.descriptor().clone();
    let bytes = src.encode_to_vec();
    TxMsg::decode(desc.clone(), registry, &bytes).map_err(|source| BridgeError {
        message: desc.name.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{DynamicMessage, Value};
    use crate::schema::MessageDescriptor;
    use std::sync::Arc;

    fn registry() -> SchemaRegistry {
        let yaml = r#"
- name: cosmos.base.v1beta1.Coin
  fields:
    - { name: denom, number: 1, kind: string }
    - { name: amount, number: 2, kind: string }
- name: test.MsgSend
  signer: [from_address]
  fields:
    - { name: from_address, number: 1, kind: string }
    - { name: to_address, number: 2, kind: string }
    - { name: amount, number: 3, kind: message, repeated: true, message: cosmos.base.v1beta1.Coin }
    - { name: ids, number: 4, kind: uint64, repeated: true }
"#;
        let messages: Vec<MessageDescriptor> = serde_yaml::from_str(yaml).unwrap();
        SchemaRegistry::new(messages, vec![]).unwrap()
    }

    fn send(reg: &SchemaRegistry) -> DynamicMessage {
        let mut coin = DynamicMessage::new(reg.find_message("cosmos.base.v1beta1.Coin").unwrap());
        coin.set("denom", Value::String("stake".into())).unwrap();
        coin.set("amount", Value::String("10".into())).unwrap();
        let mut m = DynamicMessage::new(reg.find_message("test.MsgSend").unwrap());
        m.set("from_address", Value::String("cosmos1a".into())).unwrap();
        m.set("to_address", Value::String("cosmos1b".into())).unwrap();
        m.set("amount", Value::List(vec![Value::Message(coin)])).unwrap();
        m.set("ids", Value::List(vec![Value::U64(0), Value::U64(7)])).unwrap();
        m
    }

    #[test]
    fn preserves_wire_bytes() {
        let reg = registry();
        let src = send(&reg);
        let tx = clone_message(&src, &reg).unwrap();
        assert_eq!(tx.encode_to_vec(), src.encode_to_vec());
        assert_eq!(tx.get_str("to_address"), Some("cosmos1b"));
        assert_eq!(tx.to_json()["ids"], serde_json::json!(["0", "7"]));
    }

    #[test]
    fn idempotent() {
        let reg = registry();
        let once = clone_message(&send(&reg), &reg).unwrap();
        let twice = clone_message(&once, &reg).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_message() {
        let reg = registry();
        let src = DynamicMessage::new(reg.find_message("test.MsgSend").unwrap());
        let tx = clone_message(&src, &reg).unwrap();
        assert!(tx.encode_to_vec().is_empty());
        assert_eq!(tx.to_json(), serde_json::json!({}));
    }

    /// Writes a field the descriptor does not know.
    struct Rogue(Arc<MessageDescriptor>);

    impl ProtoMessage for Rogue {
        fn descriptor(&self) -> &Arc<MessageDescriptor> {
            &self.0
        }

        fn encode_raw(&self, buf: &mut Vec<u8>) {
            buf.extend_from_slice(&[0x78, 0x01]); // field 15, varint
        }
    }

    #[test]
    fn decode_failure_is_reported() {
        let reg = registry();
        let rogue = Rogue(reg.find_message("test.MsgSend").unwrap());
        let err = clone_message(&rogue, &reg).unwrap_err();
        assert_eq!(err.message, "test.MsgSend");
        assert!(matches!(err.source, DecodeError::UnknownField { number: 15, .. }));
    }

    #[test]
    fn source_untouched() {
        let reg = registry();
        let src = send(&reg);
        let before = src.clone();
        let _ = clone_message(&src, &reg).unwrap();
        assert_eq!(src, before);
    }
}
