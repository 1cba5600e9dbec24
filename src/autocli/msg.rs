//! One invocable command per RPC method, and the governance proposal branch.

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::bridge::clone_message;
use super::options::RpcCommandOptions;
use super::signer::{SignerField, resolve_signer};
use super::tree::CommandNode;
use super::{BuildError, Builder, TxError};
use crate::address::{GOV_MODULE_NAME, module_address};
use crate::client::{ClientContext, TxFlags, TxOutcome, TxPayload, add_tx_flags, get_client_tx_context};
use crate::flag::{self, FlagError};
use crate::gov::{self, FLAG_NO_PROPOSAL};
use crate::message::{DynamicMessage, Value};
use crate::schema::{MessageDescriptor, MethodDescriptor, ServiceDescriptor};

/// `MultiSend` -> `multi-send`, `CreateIBCClient` -> `create-ibc-client`.
pub fn kebab_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next_lower,
                _ => false,
            };
            if boundary {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(*c);
        }
    }
    out
}

pub(crate) fn command_name(options: &RpcCommandOptions, method: &str) -> String {
    options
        .use_
        .split_whitespace()
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| kebab_case(method))
}

pub(crate) fn flag_group(add: fn(Command) -> Command) -> Vec<Arg> {
    add(Command::new("group")).get_arguments().cloned().collect()
}

/// First id, long name or short that two args share, or that shadows
/// clap's own `--help` / `-h`.
fn duplicate_flag(args: &[Arg]) -> Option<String> {
    let mut ids = HashSet::new();
    let mut longs = HashSet::from(["help"]);
    let mut shorts = HashSet::from(['h']);
    for arg in args {
        let id = arg.get_id().as_str();
        if !ids.insert(id) {
            return Some(id.to_string());
        }
        if let Some(long) = arg.get_long()
            && !longs.insert(long)
        {
            return Some(long.to_string());
        }
        if let Some(short) = arg.get_short()
            && !shorts.insert(short)
        {
            return Some(short.to_string());
        }
    }
    None
}

impl Builder {
    pub fn build_msg_method_command(
        &self,
        service: &ServiceDescriptor,
        method: &MethodDescriptor,
        options: &RpcCommandOptions,
    ) -> Result<CommandNode, BuildError> {
        let qualified = format!("{}.{}", service.name, method.name);
        let input = self
            .registry()
            .find_message(&method.input)
            .map_err(|_| BuildError::MessageNotFound {
                service: service.name.clone(),
                method: method.name.clone(),
                message: method.input.clone(),
            })?;
        let signer = resolve_signer(&input).map_err(|source| BuildError::MissingSigner {
            method: qualified.clone(),
            source,
        })?;

        let mut args = flag::message_args(&input, options).map_err(|source| match source {
            FlagError::UnknownPositional { .. } => BuildError::UnknownPositional {
                method: qualified.clone(),
                source,
            },
            _ => BuildError::InvalidFlagOptions {
                method: qualified.clone(),
                source,
            },
        })?;

        args.extend(flag_group(add_tx_flags));
        if options.gov_proposal {
            args.extend(flag_group(gov::add_gov_prop_flags));
            args.push(
                Arg::new(FLAG_NO_PROPOSAL)
                    .long(FLAG_NO_PROPOSAL)
                    .action(ArgAction::SetTrue)
                    .help("Skip gov proposal and submit a normal transaction"),
            );
        }
        if let Some(flag) = duplicate_flag(&args) {
            return Err(BuildError::FlagConflict {
                method: qualified,
                flag,
            });
        }

        let builder = self.clone();
        let opts = options.clone();
        let exec = move |matches: &ArgMatches| -> anyhow::Result<()> {
            builder.run_msg(&input, &signer, &opts, matches)?;
            Ok(())
        };

        let short = if options.short.is_empty() {
            format!("Execute the {} RPC method", method.name)
        } else {
            options.short.clone()
        };
        let mut node = CommandNode::new(command_name(options, &method.name)).with_exec(exec);
        node.short = short;
        node.long = options.long.clone();
        node.example = options.example.clone();
        node.aliases = options.alias.clone();
        node.deprecated = options.deprecated.clone();
        node.args = args;
        node.silence_usage = true;
        debug!(method = %qualified, command = %node.name, gov = options.gov_proposal, "built method command");
        Ok(node)
    }

    /// Body of a generated method command.
    pub fn run_msg(
        &self,
        input: &Arc<MessageDescriptor>,
        signer: &SignerField,
        options: &RpcCommandOptions,
        matches: &ArgMatches,
    ) -> Result<TxOutcome, TxError> {
        let mut msg = flag::decode_message(input, matches, options, self.registry(), self.codecs())?;
        let flags = TxFlags::from_matches(matches)?;
        let ctx = get_client_tx_context(self.client_config(), self.codecs(), &flags, self.output())?;

        let skip_proposal = matches
            .try_get_one::<bool>(FLAG_NO_PROPOSAL)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false);
        if options.gov_proposal && !skip_proposal {
            return self.handle_gov_proposal(msg, &ctx, &flags, signer, matches);
        }

        if msg.get_str(&signer.name).is_empty() {
            let raw = ctx.from_address();
            let address = self
                .codecs()
                .select(signer.codec)
                .bytes_to_string(raw)
                .map_err(|source| TxError::Signer {
                    raw: hex::encode(raw),
                    source,
                })?;
            msg.set(&signer.name, Value::String(address))?;
        }

        let tx = clone_message(&msg, self.registry())?;
        self.broadcast(&ctx, &flags, TxPayload::Msg(tx))
    }

    /// Wrap the message in a governance proposal: the signer becomes the gov
    /// module account and the sender becomes the proposer.
    pub fn handle_gov_proposal(
        &self,
        mut msg: DynamicMessage,
        ctx: &ClientContext,
        flags: &TxFlags,
        signer: &SignerField,
        matches: &ArgMatches,
    ) -> Result<TxOutcome, TxError> {
        let codec = self.codecs().account();
        let authority = codec
            .bytes_to_string(&module_address(GOV_MODULE_NAME))
            .map_err(TxError::Authority)?;

        let previous = msg.get_str(&signer.name).to_string();
        if !previous.is_empty() && previous != authority {
            warn!(
                field = %signer.name,
                discarded = %previous,
                "signer replaced by the governance authority"
            );
        }
        msg.set(&signer.name, Value::String(authority))?;

        let raw = ctx.from_address();
        let proposer = codec.bytes_to_string(raw).map_err(|source| TxError::Signer {
            raw: hex::encode(raw),
            source,
        })?;
        let mut proposal = gov::read_gov_prop_flags(&proposer, matches)?;

        let tx = clone_message(&msg, self.registry())?;
        proposal.set_msgs(vec![tx]);
        self.broadcast(ctx, flags, TxPayload::Proposal(proposal))
    }
}
