/*!
`custom.rs`

Hand-written tx commands that the generated tree builds on.

`tx bank send [from_key_or_address] [to_address] [amount]` takes a key
name as well as an address for the sender, which the generated command
cannot. The bank module is marked `enhance_custom_command`, so the rest
of its methods are added next to this command and `send` keeps this
implementation.
*/

use clap::{Arg, ArgMatches};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::autocli::bridge::clone_message;
use crate::autocli::msg::flag_group;
use crate::autocli::{Builder, CommandNode, TxError};
use crate::client::{TxFlags, TxOutcome, TxPayload, add_tx_flags, get_client_tx_context};
use crate::flag::{COIN_TYPE, FlagError};
use crate::message::{DynamicMessage, Value};
use crate::proto::parse_coins;
use crate::schema::MessageDescriptor;

pub const MSG_SEND: &str = "cosmos.bank.v1beta1.MsgSend";

const ARG_FROM: &str = "from_key_or_address";
const ARG_TO: &str = "to_address";
const ARG_AMOUNT: &str = "amount";

/// Hand-written module command nodes keyed by module name. Modules whose
/// messages the manifest does not describe are left out.
pub fn custom_commands(builder: &Builder) -> BTreeMap<String, CommandNode> {
    let mut out = BTreeMap::new();
    let registry = builder.registry();
    match (registry.find_message(MSG_SEND), registry.find_message(COIN_TYPE)) {
        (Ok(send), Ok(coin)) => {
            let mut bank = CommandNode::group("bank", "Bank transaction subcommands");
            bank.children.push(send_command(builder, send, coin));
            out.insert("bank".to_string(), bank);
        }
        _ => debug!(message = MSG_SEND, "bank messages not in manifest, no custom send"),
    }
    out
}

fn send_command(
    builder: &Builder,
    send: Arc<MessageDescriptor>,
    coin: Arc<MessageDescriptor>,
) -> CommandNode {
    let mut args = vec![
        Arg::new(ARG_FROM)
            .index(1)
            .required(true)
            .value_name("FROM_KEY_OR_ADDRESS")
            .help("Account name or address of the sender"),
        Arg::new(ARG_TO)
            .index(2)
            .required(true)
            .value_name("TO_ADDRESS")
            .help("Recipient address"),
        Arg::new(ARG_AMOUNT)
            .index(3)
            .required(true)
            .value_name("AMOUNT")
            .help("Coins to send, e.g. 10stake,5uatom"),
    ];
    args.extend(flag_group(add_tx_flags));

    let b = builder.clone();
    let mut node = CommandNode::new("send").with_exec(move |matches| {
        run_send(&b, &send, &coin, matches)?;
        Ok(())
    });
    node.short = "Send funds from one account to another".into();
    node.long = "Send funds from one account to another.\n\
                 The sender may be given as a configured account name or an address; \
                 it overrides --from."
        .into();
    node.example = "autotx tx bank send alice cosmos1... 10stake --fees 500uatom".into();
    node.args = args;
    node.silence_usage = true;
    node
}

fn run_send(
    b: &Builder,
    send: &Arc<MessageDescriptor>,
    coin: &Arc<MessageDescriptor>,
    matches: &ArgMatches,
) -> Result<TxOutcome, TxError> {
    let positional = |id: &str| {
        matches
            .get_one::<String>(id)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let mut flags = TxFlags::from_matches(matches)?;
    flags.from = Some(positional(ARG_FROM));
    let ctx = get_client_tx_context(b.client_config(), b.codecs(), &flags, b.output())?;

    let codec = b.codecs().account();
    let raw = ctx.from_address();
    let from = codec.bytes_to_string(raw).map_err(|source| TxError::Signer {
        raw: hex::encode(raw),
        source,
    })?;

    let to = positional(ARG_TO);
    codec
        .string_to_bytes(&to)
        .map_err(|source| FlagError::InvalidAddress {
            flag: ARG_TO.into(),
            value: to.clone(),
            source,
        })?;

    let amount = positional(ARG_AMOUNT);
    let invalid = |reason: String| FlagError::InvalidValue {
        flag: ARG_AMOUNT.into(),
        value: amount.clone(),
        reason,
    };
    let coins = parse_coins(&amount).map_err(|e| invalid(e.to_string()))?;
    if coins.is_empty() {
        return Err(invalid("must not be empty".into()).into());
    }

    let mut amounts = Vec::with_capacity(coins.len());
    for c in coins {
        let mut m = DynamicMessage::new(coin.clone());
        m.set("denom", Value::String(c.denom))?;
        m.set("amount", Value::String(c.amount))?;
        amounts.push(Value::Message(m));
    }

    let mut msg = DynamicMessage::new(send.clone());
    msg.set("from_address", Value::String(from))?;
    msg.set("to_address", Value::String(to))?;
    msg.set("amount", Value::List(amounts))?;

    let tx = clone_message(&msg, b.registry())?;
    b.broadcast(&ctx, &flags, TxPayload::Msg(tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autocli::testutil::{ALICE, BOB, RecordingPipeline};
    use crate::manifest::{Manifest, ManifestSource};

    const CHARLIE: &str = "cosmos1qvpsxqcrqvpsxqcrqvpsxqcrqvpsxqcrz8x6vt";

    fn setup() -> (Builder, BTreeMap<String, crate::autocli::ModuleOptions>, Arc<RecordingPipeline>) {
        let mut m = Manifest::load(&ManifestSource::Embedded).unwrap();
        m.accounts.insert("alice".into(), ALICE.into());
        let rec = Arc::new(RecordingPipeline::default());
        let b = m.builder(rec.clone()).unwrap();
        (b, m.modules, rec)
    }

    fn run(argv: &[&str]) -> (anyhow::Result<()>, Arc<RecordingPipeline>) {
        let (b, modules, rec) = setup();
        let root = b.build_msg_command(&modules, custom_commands(&b)).unwrap();
        let matches = root.to_clap().try_get_matches_from(argv).unwrap();
        (root.dispatch(&matches), rec)
    }

    #[test]
    fn custom_send_wins_and_bank_is_enhanced() {
        let (b, modules, _) = setup();
        let root = b.build_msg_command(&modules, custom_commands(&b)).unwrap();
        let bank = root.find_child("bank").unwrap();
        assert_eq!(bank.short, "Bank transaction subcommands");
        let send = bank.find_child("send").unwrap();
        assert_eq!(send.args[0].get_id().as_str(), ARG_FROM);
        assert!(bank.find_child("update-params").is_some());
        assert!(bank.find_child("set-send-enabled").is_some());
        assert_eq!(bank.children.iter().filter(|c| c.name == "send").count(), 1);
    }

    #[test]
    fn send_accepts_key_name() {
        let (res, rec) = run(&["tx", "bank", "send", "alice", BOB, "10stake,5uatom"]);
        res.unwrap();
        let doc = rec.last().to_json();
        assert_eq!(doc["@type"], "/cosmos.bank.v1beta1.MsgSend");
        assert_eq!(doc["from_address"], ALICE);
        assert_eq!(doc["to_address"], BOB);
        assert_eq!(doc["amount"][0]["denom"], "stake");
        assert_eq!(doc["amount"][1]["amount"], "5");
    }

    #[test]
    fn positional_sender_overrides_from_flag() {
        let (res, rec) = run(&["tx", "bank", "send", CHARLIE, BOB, "1stake", "--from", "alice"]);
        res.unwrap();
        assert_eq!(rec.last().to_json()["from_address"], CHARLIE);
    }

    #[test]
    fn bad_inputs_are_rejected_before_submission() {
        let (res, rec) = run(&["tx", "bank", "send", "alice", "cosmosvaloper1xyz", "1stake"]);
        assert!(res.is_err());
        let (res2, _) = run(&["tx", "bank", "send", "alice", BOB, "ten"]);
        let err = res2.unwrap_err().to_string();
        assert!(err.contains("amount"), "{err}");
        let (res3, _) = run(&["tx", "bank", "send", "bob", BOB, "1stake"]);
        assert!(res3.is_err());
        assert_eq!(rec.count(), 0);
    }

    #[test]
    fn missing_bank_schema_means_no_custom_commands() {
        let m = Manifest::parse("messages: []", crate::manifest::Format::Yaml).unwrap();
        let b = m.builder(Arc::new(RecordingPipeline::default())).unwrap();
        assert!(custom_commands(&b).is_empty());
    }
}
