//! Governance proposal flag group and the proposal envelope.

use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::json;
use thiserror::Error;

use crate::message::TxMsg;
use crate::proto::{Any, Coin, CoinError, MSG_SUBMIT_PROPOSAL_TYPE_URL, MsgSubmitProposal, parse_coins};

pub const FLAG_NO_PROPOSAL: &str = "no-proposal";
pub const FLAG_METADATA: &str = "metadata";
pub const FLAG_TITLE: &str = "title";
pub const FLAG_SUMMARY: &str = "summary";
pub const FLAG_DEPOSIT: &str = "deposit";
pub const FLAG_EXPEDITED: &str = "expedited";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GovError {
    #[error("proposer address is required to submit a proposal (set --from)")]
    EmptyProposer,
    #[error("invalid --deposit: {0}")]
    Deposit(#[from] CoinError),
}

/// Register the proposal flags (not `--no-proposal`, which is owned by the
/// method command).
pub fn add_gov_prop_flags(cmd: Command) -> Command {
    cmd.next_help_heading("Proposal flags")
        .arg(
            Arg::new(FLAG_METADATA)
                .long(FLAG_METADATA)
                .value_name("TEXT")
                .help("Proposal metadata"),
        )
        .arg(
            Arg::new(FLAG_TITLE)
                .long(FLAG_TITLE)
                .value_name("TEXT")
                .help("Proposal title"),
        )
        .arg(
            Arg::new(FLAG_SUMMARY)
                .long(FLAG_SUMMARY)
                .value_name("TEXT")
                .help("Proposal summary"),
        )
        .arg(
            Arg::new(FLAG_DEPOSIT)
                .long(FLAG_DEPOSIT)
                .value_name("COINS")
                .help("Initial deposit, e.g. 10000000stake"),
        )
        .arg(
            Arg::new(FLAG_EXPEDITED)
                .long(FLAG_EXPEDITED)
                .action(ArgAction::SetTrue)
                .help("Submit as an expedited proposal"),
        )
        .next_help_heading(None::<&str>)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Proposal {
    pub msgs: Vec<TxMsg>,
    pub initial_deposit: Vec<Coin>,
    pub proposer: String,
    pub metadata: String,
    pub title: String,
    pub summary: String,
    pub expedited: bool,
}

impl Proposal {
    pub fn set_msgs(&mut self, msgs: Vec<TxMsg>) {
        self.msgs = msgs;
    }

    pub fn to_proto(&self) -> MsgSubmitProposal {
        MsgSubmitProposal {
            messages: self.msgs.iter().map(TxMsg::to_any).collect(),
            initial_deposit: self.initial_deposit.clone(),
            proposer: self.proposer.clone(),
            metadata: self.metadata.clone(),
            title: self.title.clone(),
            summary: self.summary.clone(),
            expedited: self.expedited,
        }
    }

    pub fn to_any(&self) -> Any {
        Any {
            type_url: MSG_SUBMIT_PROPOSAL_TYPE_URL.to_string(),
            value: prost::Message::encode_to_vec(&self.to_proto()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "@type": MSG_SUBMIT_PROPOSAL_TYPE_URL,
            "messages": self.msgs.iter().map(TxMsg::to_any_json).collect::<Vec<_>>(),
            "initial_deposit": self.initial_deposit.iter().map(Coin::to_json).collect::<Vec<_>>(),
            "proposer": self.proposer,
            "metadata": self.metadata,
            "title": self.title,
            "summary": self.summary,
            "expedited": self.expedited,
        })
    }
}

/// Read the proposal flags into a proposal with no messages yet.
pub fn read_gov_prop_flags(proposer: &str, matches: &ArgMatches) -> Result<Proposal, GovError> {
    if proposer.trim().is_empty() {
        return Err(GovError::EmptyProposer);
    }
    let string = |id: &str| -> String {
        matches
            .try_get_one::<String>(id)
            .ok()
            .flatten()
            .cloned()
            .unwrap_or_default()
    };
    let initial_deposit = parse_coins(&string(FLAG_DEPOSIT))?;
    Ok(Proposal {
        msgs: Vec::new(),
        initial_deposit,
        proposer: proposer.to_string(),
        metadata: string(FLAG_METADATA),
        title: string(FLAG_TITLE),
        summary: string(FLAG_SUMMARY),
        expedited: matches
            .try_get_one::<bool>(FLAG_EXPEDITED)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    fn matches(argv: &[&str]) -> ArgMatches {
        add_gov_prop_flags(Command::new("p"))
            .try_get_matches_from(argv)
            .unwrap()
    }

    #[test]
    fn reads_all_flags() {
        let m = matches(&[
            "p",
            "--title",
            "Raise limits",
            "--summary",
            "why",
            "--metadata",
            "ipfs://x",
            "--deposit",
            "10stake",
            "--expedited",
        ]);
        let p = read_gov_prop_flags("cosmos1proposer", &m).unwrap();
        assert_eq!(p.title, "Raise limits");
        assert_eq!(p.summary, "why");
        assert_eq!(p.metadata, "ipfs://x");
        assert_eq!(p.initial_deposit, vec![Coin::new("10", "stake")]);
        assert!(p.expedited);
        assert_eq!(p.proposer, "cosmos1proposer");
        assert!(p.msgs.is_empty());
    }

    #[test]
    fn empty_proposer_rejected() {
        let m = matches(&["p"]);
        assert_eq!(read_gov_prop_flags("", &m), Err(GovError::EmptyProposer));
    }

    #[test]
    fn bad_deposit_rejected() {
        let m = matches(&["p", "--deposit", "ten"]);
        assert!(matches!(read_gov_prop_flags("x", &m), Err(GovError::Deposit(_))));
    }

    #[test]
    fn proto_round_trip() {
        let p = Proposal {
            proposer: "cosmos1x".into(),
            title: "t".into(),
            ..Default::default()
        };
        let any = p.to_any();
        assert_eq!(any.type_url, MSG_SUBMIT_PROPOSAL_TYPE_URL);
        let decoded = MsgSubmitProposal::decode(any.value.as_slice()).unwrap();
        assert_eq!(decoded, p.to_proto());
        assert_eq!(p.to_json()["title"], "t");
    }
}
