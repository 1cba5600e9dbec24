//! Transaction pipeline seam and the built-in offline generator.

use base64::Engine as _;
use prost::Message;
use serde_json::json;
use tracing::debug;

use super::context::ClientContext;
use super::flags::TxFlags;
use crate::gov::Proposal;
use crate::message::TxMsg;
use crate::proto::{Any, Coin, TxBody};

/// What a method command hands to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum TxPayload {
    Msg(TxMsg),
    Proposal(Proposal),
}

impl TxPayload {
    pub fn to_any(&self) -> Any {
        match self {
            TxPayload::Msg(m) => m.to_any(),
            TxPayload::Proposal(p) => p.to_any(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            TxPayload::Msg(m) => m.to_any_json(),
            TxPayload::Proposal(p) => p.to_json(),
        }
    }

    pub fn type_url(&self) -> String {
        self.to_any().type_url
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TxOutcome {
    pub document: serde_json::Value,
}

/// Signs / broadcasts or just renders a transaction.
pub trait TxPipeline: Send + Sync {
    fn generate_or_broadcast(
        &self,
        ctx: &ClientContext,
        flags: &TxFlags,
        payload: TxPayload,
    ) -> anyhow::Result<TxOutcome>;
}

/// Writes the unsigned transaction as JSON to the context output.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratePipeline;

impl GeneratePipeline {
    pub fn render(flags: &TxFlags, payload: &TxPayload) -> serde_json::Value {
        let body = TxBody {
            messages: vec![payload.to_any()],
            memo: flags.memo.clone(),
            timeout_height: flags.timeout_height,
        };
        json!({
            "body": {
                "messages": [payload.to_json()],
                "memo": flags.memo,
                "timeout_height": flags.timeout_height.to_string(),
                "extension_options": [],
                "non_critical_extension_options": [],
            },
            "auth_info": {
                "signer_infos": [],
                "fee": {
                    "amount": flags.fees.iter().map(Coin::to_json).collect::<Vec<_>>(),
                    "gas_limit": flags.gas_limit().to_string(),
                    "payer": "",
                    "granter": "",
                },
            },
            "signatures": [],
            "body_bytes": base64::engine::general_purpose::STANDARD.encode(body.encode_to_vec()),
        })
    }
}

impl TxPipeline for GeneratePipeline {
    fn generate_or_broadcast(
        &self,
        ctx: &ClientContext,
        flags: &TxFlags,
        payload: TxPayload,
    ) -> anyhow::Result<TxOutcome> {
        if !flags.generate_only {
            debug!(
                chain_id = %ctx.chain_id,
                node = ctx.node.as_ref().map(|u| u.as_str()),
                "broadcast not available, generating unsigned transaction"
            );
        }
        let document = Self::render(flags, &payload);
        let mut text = serde_json::to_string_pretty(&document)?;
        text.push('\n');
        ctx.output.write_all(text.as_bytes())?;
        debug!(type_url = %payload.type_url(), "generated transaction");
        Ok(TxOutcome { document })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::context::Output;

    #[test]
    fn renders_proposal_document() {
        let payload = TxPayload::Proposal(Proposal {
            proposer: "cosmos1p".into(),
            title: "t".into(),
            ..Default::default()
        });
        let flags = TxFlags {
            memo: "note".into(),
            fees: vec![Coin::new("5", "stake")],
            timeout_height: 9,
            ..Default::default()
        };
        let (output, buf) = Output::memory();
        let mut ctx = ClientContext::default();
        ctx.output = output;
        let outcome = GeneratePipeline
            .generate_or_broadcast(&ctx, &flags, payload)
            .unwrap();
        let doc = &outcome.document;
        assert_eq!(doc["body"]["messages"][0]["@type"], "/cosmos.gov.v1.MsgSubmitProposal");
        assert_eq!(doc["body"]["memo"], "note");
        assert_eq!(doc["body"]["timeout_height"], "9");
        assert_eq!(doc["auth_info"]["fee"]["amount"][0]["denom"], "stake");
        assert_eq!(doc["auth_info"]["fee"]["gas_limit"], "200000");

        let written: serde_json::Value =
            serde_json::from_slice(&buf.lock().unwrap()).unwrap();
        assert_eq!(&written, doc);

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(doc["body_bytes"].as_str().unwrap())
            .unwrap();
        let body = TxBody::decode(bytes.as_slice()).unwrap();
        assert_eq!(body.memo, "note");
        assert_eq!(body.messages[0].type_url, "/cosmos.gov.v1.MsgSubmitProposal");
    }
}
