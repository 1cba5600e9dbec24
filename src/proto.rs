//! Concrete wire types owned by the client side of the pipeline.
//!
//! Field numbers follow `google.protobuf.Any`, `cosmos.base.v1beta1.Coin`,
//! `cosmos.gov.v1.MsgSubmitProposal` and `cosmos.tx.v1beta1.TxBody`.

use std::fmt;
use thiserror::Error;

pub const MSG_SUBMIT_PROPOSAL_TYPE_URL: &str = "/cosmos.gov.v1.MsgSubmitProposal";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Coin {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(string, tag = "2")]
    pub amount: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgSubmitProposal {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
    #[prost(message, repeated, tag = "2")]
    pub initial_deposit: Vec<Coin>,
    #[prost(string, tag = "3")]
    pub proposer: String,
    #[prost(string, tag = "4")]
    pub metadata: String,
    #[prost(string, tag = "5")]
    pub title: String,
    #[prost(string, tag = "6")]
    pub summary: String,
    #[prost(bool, tag = "7")]
    pub expedited: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxBody {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
    #[prost(string, tag = "2")]
    pub memo: String,
    #[prost(uint64, tag = "3")]
    pub timeout_height: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid coin expression {0:?} (expected <amount><denom>, e.g. 10stake)")]
pub struct CoinError(pub String);

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl Coin {
    pub fn new(amount: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    /// Parse a single `10stake` style coin.
    pub fn parse(raw: &str) -> Result<Self, CoinError> {
        let s = raw.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| CoinError(raw.to_string()))?;
        let (amount, denom) = s.split_at(split);
        let denom = denom.trim();
        if amount.is_empty() || !valid_denom(denom) {
            return Err(CoinError(raw.to_string()));
        }
        let amount = amount.trim_start_matches('0');
        Ok(Coin::new(if amount.is_empty() { "0" } else { amount }, denom))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "denom": self.denom, "amount": self.amount })
    }
}

/// Parse a comma separated coin list, dropping zero amounts and sorting by
/// denom. An empty string is an empty list.
pub fn parse_coins(raw: &str) -> Result<Vec<Coin>, CoinError> {
    let mut coins = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let coin = Coin::parse(part)?;
        if coin.amount != "0" {
            coins.push(coin);
        }
    }
    coins.sort_by(|a, b| a.denom.cmp(&b.denom));
    if coins.windows(2).any(|w| w[0].denom == w[1].denom) {
        return Err(CoinError(raw.to_string()));
    }
    Ok(coins)
}

/// Denoms: a letter followed by 2..=127 of `[a-zA-Z0-9/:._-]`.
fn valid_denom(denom: &str) -> bool {
    let mut chars = denom.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let len = denom.chars().count();
    first.is_ascii_alphabetic()
        && (3..=128).contains(&len)
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn parse_single_coin() {
        assert_eq!(Coin::parse("10stake").unwrap(), Coin::new("10", "stake"));
        assert_eq!(
            Coin::parse("007ibc/ABCDEF").unwrap(),
            Coin::new("7", "ibc/ABCDEF")
        );
        assert!(Coin::parse("stake").is_err());
        assert!(Coin::parse("10").is_err());
        assert!(Coin::parse("10s").is_err(), "denom too short");
    }

    #[test]
    fn parse_coin_list() {
        let coins = parse_coins("5uatom, 10stake,0zero").unwrap();
        assert_eq!(coins, vec![Coin::new("10", "stake"), Coin::new("5", "uatom")]);
        assert!(parse_coins("").unwrap().is_empty());
        assert!(parse_coins("1stake,2stake").is_err(), "duplicate denom");
    }

    #[test]
    fn submit_proposal_wire_layout() {
        let msg = MsgSubmitProposal {
            proposer: "p".into(),
            expedited: true,
            ..Default::default()
        };
        // proposer (3, len) then expedited (7, varint)
        assert_eq!(msg.encode_to_vec(), vec![0x1A, 0x01, b'p', 0x38, 0x01]);
    }
}
