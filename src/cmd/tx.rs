/*!
`tx.rs`

Implements `autotx tx <module> <command> [args] [flags]`.

The command tree below `tx` is not known until the manifest is loaded, so
everything after `tx` is collected raw and parsed a second time against the
synthesized tree:

  1. load the manifest (`--manifest` > AUTOTX_MANIFEST > embedded)
  2. build generated commands over the hand-written ones (`custom.rs`)
  3. parse the remaining arguments with clap and dispatch

Transactions are generated offline and printed as JSON.
*/

use anyhow::Result;
use clap::Args;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::autocli::{Builder, CommandNode};
use crate::client::GeneratePipeline;
use crate::cmd::custom::custom_commands;
use crate::cmd::shared::load_manifest;
use crate::manifest::Manifest;

/// CLI arguments for `autotx tx ...`
#[derive(Args, Debug)]
pub struct TxArgs {
    /// Module, command, positional arguments and flags
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..
    )]
    pub args: Vec<OsString>,
}

pub fn execute_tx(args: TxArgs, manifest: Option<PathBuf>) -> Result<()> {
    let loaded = load_manifest(manifest)?;
    let builder = loaded.manifest.builder(Arc::new(GeneratePipeline))?;
    let root = tx_tree(&builder, &loaded.manifest)?;
    debug!(commands = root.paths().len(), "tx tree built");

    let argv = std::iter::once(OsString::from("tx")).chain(args.args);
    let matches = match root.to_clap().bin_name("autotx tx").try_get_matches_from(argv) {
        Ok(m) => m,
        Err(e) => e.exit(),
    };
    root.dispatch(&matches)
}

/// The full `tx` tree for a manifest.
pub fn tx_tree(builder: &Builder, manifest: &Manifest) -> Result<CommandNode> {
    Ok(builder.build_msg_command(&manifest.modules, custom_commands(builder))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autocli::testutil::{ALICE, BOB, GOV_AUTHORITY, VALIDATOR};
    use crate::client::Output;
    use crate::manifest::ManifestSource;
    use clap::Parser;

    #[derive(Parser, Debug)]
    #[command(disable_help_flag = true)]
    struct TestCli {
        #[command(flatten)]
        args: TxArgs,
    }

    /// Run `argv` through the embedded tree with the real offline pipeline
    /// and return the generated document.
    fn generate(argv: &[&str]) -> Result<serde_json::Value> {
        let mut m = Manifest::load(&ManifestSource::Embedded)?;
        m.accounts.insert("alice".into(), ALICE.into());
        let (output, buf) = Output::memory();
        let builder = m.builder(Arc::new(GeneratePipeline))?.with_output(output);
        let root = tx_tree(&builder, &m)?;
        let matches = root.to_clap().try_get_matches_from(argv)?;
        root.dispatch(&matches)?;
        let bytes = buf.lock().unwrap().clone();
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[test]
    fn trailing_args_are_collected_raw() {
        let cli = TestCli::parse_from(["tx", "bank", "send", "alice", "--fees", "5stake", "--help"]);
        let raw: Vec<String> = cli
            .args
            .args
            .iter()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        assert_eq!(raw, ["bank", "send", "alice", "--fees", "5stake", "--help"]);
    }

    #[test]
    fn delegate_generates_tx() {
        let doc = generate(&["tx", "staking", "delegate", VALIDATOR, "100stake", "--from", "alice", "--memo", "hi"])
            .unwrap();
        let msg = &doc["body"]["messages"][0];
        assert_eq!(msg["@type"], "/cosmos.staking.v1beta1.MsgDelegate");
        assert_eq!(msg["delegator_address"], ALICE);
        assert_eq!(msg["validator_address"], VALIDATOR);
        assert_eq!(msg["amount"]["amount"], "100");
        assert_eq!(doc["body"]["memo"], "hi");
    }

    #[test]
    fn bank_send_uses_custom_command() {
        let doc = generate(&["tx", "bank", "send", "alice", BOB, "7stake"]).unwrap();
        let msg = &doc["body"]["messages"][0];
        assert_eq!(msg["from_address"], ALICE);
        assert_eq!(msg["amount"][0]["amount"], "7");
    }

    #[test]
    fn gov_gated_command_wraps_in_proposal() {
        let doc = generate(&[
            "tx",
            "bank",
            "set-send-enabled",
            "--from",
            "alice",
            "--title",
            "disable",
            "--summary",
            "stop stake transfers",
            "--deposit",
            "10stake",
        ])
        .unwrap();
        let prop = &doc["body"]["messages"][0];
        assert_eq!(prop["@type"], "/cosmos.gov.v1.MsgSubmitProposal");
        assert_eq!(prop["proposer"], ALICE);
        assert_eq!(prop["messages"][0]["authority"], GOV_AUTHORITY);
    }

    #[test]
    fn unknown_command_is_a_parse_error() {
        let err = generate(&["tx", "bank", "burn-everything"]).unwrap_err();
        assert!(err.downcast_ref::<clap::Error>().is_some());
    }
}
