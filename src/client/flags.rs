//! Transaction connection flags attached to every method command.

use clap::{Arg, ArgAction, ArgMatches, Command};
use url::Url;

use crate::flag::FlagError;
use crate::proto::{Coin, parse_coins};

pub const FLAG_FROM: &str = "from";
pub const FLAG_CHAIN_ID: &str = "chain-id";
pub const FLAG_NODE: &str = "node";
pub const FLAG_FEES: &str = "fees";
pub const FLAG_GAS: &str = "gas";
pub const FLAG_MEMO: &str = "memo";
pub const FLAG_TIMEOUT_HEIGHT: &str = "timeout-height";
pub const FLAG_GENERATE_ONLY: &str = "generate-only";

pub const DEFAULT_GAS: u64 = 200_000;

pub fn add_tx_flags(cmd: Command) -> Command {
    cmd.next_help_heading("Transaction flags")
        .arg(
            Arg::new(FLAG_FROM)
                .long(FLAG_FROM)
                .value_name("NAME|ADDRESS")
                .help("Name of a configured account, or an address, to sign with"),
        )
        .arg(
            Arg::new(FLAG_CHAIN_ID)
                .long(FLAG_CHAIN_ID)
                .value_name("ID")
                .help("Chain ID of the target network"),
        )
        .arg(
            Arg::new(FLAG_NODE)
                .long(FLAG_NODE)
                .value_name("URL")
                .value_parser(clap::value_parser!(Url))
                .help("RPC endpoint of the target node"),
        )
        .arg(
            Arg::new(FLAG_FEES)
                .long(FLAG_FEES)
                .value_name("COINS")
                .help("Fees to pay, e.g. 10stake,5uatom"),
        )
        .arg(
            Arg::new(FLAG_GAS)
                .long(FLAG_GAS)
                .value_name("LIMIT")
                .value_parser(clap::value_parser!(u64))
                .help(format!("Gas limit (default {DEFAULT_GAS})")),
        )
        .arg(
            Arg::new(FLAG_MEMO)
                .long(FLAG_MEMO)
                .value_name("TEXT")
                .help("Memo attached to the transaction"),
        )
        .arg(
            Arg::new(FLAG_TIMEOUT_HEIGHT)
                .long(FLAG_TIMEOUT_HEIGHT)
                .value_name("HEIGHT")
                .value_parser(clap::value_parser!(u64))
                .help("Block height after which the transaction is invalid"),
        )
        .arg(
            Arg::new(FLAG_GENERATE_ONLY)
                .long(FLAG_GENERATE_ONLY)
                .action(ArgAction::SetTrue)
                .help("Only print the unsigned transaction"),
        )
        .next_help_heading(None::<&str>)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxFlags {
    pub from: Option<String>,
    pub chain_id: Option<String>,
    pub node: Option<Url>,
    pub fees: Vec<Coin>,
    pub gas: Option<u64>,
    pub memo: String,
    pub timeout_height: u64,
    pub generate_only: bool,
}

impl TxFlags {
    /// Read the tx flag group. Commands built without it yield defaults.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, FlagError> {
        let string = |id: &str| -> Option<String> {
            matches
                .try_get_one::<String>(id)
                .ok()
                .flatten()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let number = |id: &str| matches.try_get_one::<u64>(id).ok().flatten().copied();

        let fees = match string(FLAG_FEES) {
            Some(raw) => parse_coins(&raw).map_err(|e| FlagError::InvalidValue {
                flag: format!("--{FLAG_FEES}"),
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => Vec::new(),
        };

        Ok(Self {
            from: string(FLAG_FROM),
            chain_id: string(FLAG_CHAIN_ID),
            node: matches.try_get_one::<Url>(FLAG_NODE).ok().flatten().cloned(),
            fees,
            gas: number(FLAG_GAS),
            memo: string(FLAG_MEMO).unwrap_or_default(),
            timeout_height: number(FLAG_TIMEOUT_HEIGHT).unwrap_or(0),
            generate_only: matches
                .try_get_one::<bool>(FLAG_GENERATE_ONLY)
                .ok()
                .flatten()
                .copied()
                .unwrap_or(false),
        })
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas.unwrap_or(DEFAULT_GAS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<TxFlags, FlagError> {
        let cmd = add_tx_flags(Command::new("t"));
        let matches = cmd.try_get_matches_from(argv).unwrap();
        TxFlags::from_matches(&matches)
    }

    #[test]
    fn defaults() {
        let f = parse(&["t"]).unwrap();
        assert_eq!(f, TxFlags::default());
        assert_eq!(f.gas_limit(), DEFAULT_GAS);
    }

    #[test]
    fn all_flags() {
        let f = parse(&[
            "t",
            "--from",
            "alice",
            "--chain-id",
            "testnet-1",
            "--node",
            "http://localhost:26657",
            "--fees",
            "5uatom,10stake",
            "--gas",
            "300000",
            "--memo",
            "hi",
            "--timeout-height",
            "42",
            "--generate-only",
        ])
        .unwrap();
        assert_eq!(f.from.as_deref(), Some("alice"));
        assert_eq!(f.chain_id.as_deref(), Some("testnet-1"));
        assert_eq!(f.node.as_ref().map(Url::as_str), Some("http://localhost:26657/"));
        assert_eq!(f.fees, vec![Coin::new("10", "stake"), Coin::new("5", "uatom")]);
        assert_eq!(f.gas_limit(), 300_000);
        assert_eq!(f.memo, "hi");
        assert_eq!(f.timeout_height, 42);
        assert!(f.generate_only);
    }

    #[test]
    fn bad_fees() {
        assert!(matches!(
            parse(&["t", "--fees", "lots"]),
            Err(FlagError::InvalidValue { .. })
        ));
    }

    #[test]
    fn missing_group_reads_defaults() {
        let matches = Command::new("bare").try_get_matches_from(["bare"]).unwrap();
        assert_eq!(TxFlags::from_matches(&matches).unwrap(), TxFlags::default());
    }
}
