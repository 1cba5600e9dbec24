use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod address;
mod autocli;
mod client;
mod cmd;
mod flag;
mod gov;
mod manifest;
mod message;
mod proto;
mod schema;
mod utils;

use cmd::{GetArgs, ListArgs, TxArgs};

/// autotx - transaction commands synthesized from message schemas
///
/// Command layout:
///   autotx list <services|messages|modules> [--json]
///   autotx get  <service|message|modules> [NAME] [--json]
///   autotx tx   <module> <command> [args] [--from KEY] [tx flags]
///
/// Global flags / env:
///   -v / -vv / -vvv   Increase verbosity (info, debug, trace)
///   -q / --quiet      Errors only
///   -m / --manifest   Manifest file (YAML or JSON); falls back to AUTOTX_MANIFEST,
///                     then to the built-in Cosmos SDK manifest
///   RUST_LOG          Overrides the verbosity flags
///
/// Examples:
///   autotx list services
///   autotx get message MsgSend --json
///   autotx tx bank send alice cosmos1... 10stake --fees 500stake
///   autotx tx staking delegate cosmosvaloper1... 100stake --from alice
///   autotx tx bank update-params --params '{"default_send_enabled":true}' \
///       --from alice --title "enable sends" --deposit 10stake
#[derive(Parser, Debug)]
#[command(
    name = "autotx",
    version,
    author,
    about = "autotx - transaction commands synthesized from message schemas",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Manifest with schemas and command options (or AUTOTX_MANIFEST env)
    #[arg(short = 'm', long = "manifest", global = true, value_name = "PATH")]
    manifest: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List services, messages or modules in the manifest
    List(ListArgs),

    /// Show a service, message or module in detail
    Get(GetArgs),

    /// Generate a transaction from a synthesized command
    #[command(disable_help_flag = true)]
    Tx(TxArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    match cli.command {
        Commands::List(args) => cmd::execute_list(args, cli.manifest),
        Commands::Get(args) => cmd::execute_get(args, cli.manifest),
        Commands::Tx(args) => cmd::execute_tx(args, cli.manifest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_before_tx() {
        let cli = Cli::parse_from(["autotx", "-vv", "--manifest", "chain.yaml", "tx", "bank", "--help"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.manifest, Some(PathBuf::from("chain.yaml")));
        let Commands::Tx(args) = cli.command else {
            panic!("expected tx");
        };
        assert_eq!(args.args, ["bank", "--help"]);
    }
}
