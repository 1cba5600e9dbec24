//! Command tree: nodes, the merge rule, and recursive construction from
//! command descriptors.

use anyhow::{Result, bail};
use clap::{Arg, ArgMatches, Command};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::options::{CommandDescriptor, ModuleOptions, RpcCommandOptions};
use super::{BuildError, Builder};

/// Execution closure of an invocable command.
pub type ExecFn = Arc<dyn Fn(&ArgMatches) -> Result<()> + Send + Sync>;

#[derive(Clone, Default)]
pub struct CommandNode {
    pub name: String,
    pub short: String,
    pub long: String,
    pub example: String,
    pub aliases: Vec<String>,
    pub deprecated: String,
    pub args: Vec<Arg>,
    pub children: Vec<CommandNode>,
    pub exec: Option<ExecFn>,
    /// Do not print usage when execution (not parsing) fails.
    pub silence_usage: bool,
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("args", &self.args.iter().map(|a| a.get_id().as_str()).collect::<Vec<_>>())
            .field("children", &self.children)
            .field("exec", &self.exec.is_some())
            .field("silence_usage", &self.silence_usage)
            .finish()
    }
}

/// Outcome of attaching a generated node under a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Inserted,
    KeptExisting,
}

/// Attach `generated` under `parent` unless a child with the same name is
/// already there. Existing nodes always win and are never modified.
pub fn merge(parent: &mut CommandNode, generated: CommandNode) -> Merge {
    if parent.find_child(&generated.name).is_some() {
        trace!(parent = %parent.name, name = %generated.name, "keeping existing command");
        return Merge::KeptExisting;
    }
    parent.children.push(generated);
    Merge::Inserted
}

impl CommandNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Non-invocable grouping node.
    pub fn group(name: impl Into<String>, short: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short: short.into(),
            ..Default::default()
        }
    }

    pub fn with_exec<F>(mut self, f: F) -> Self
    where
        F: Fn(&ArgMatches) -> Result<()> + Send + Sync + 'static,
    {
        self.exec = Some(Arc::new(f));
        self
    }

    pub fn find_child(&self, name: &str) -> Option<&CommandNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Walk a space separated path (`bank send`) below this node.
    pub fn find_path(&self, path: &str) -> Option<&CommandNode> {
        path.split_whitespace()
            .try_fold(self, |node, seg| node.find_child(seg))
    }

    /// Every reachable path below this node, depth first in child order.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push(child.name.clone());
            for sub in child.paths() {
                out.push(format!("{} {sub}", child.name));
            }
        }
        out
    }

    /// Render as a clap command.
    pub fn to_clap(&self) -> Command {
        let mut cmd = Command::new(self.name.clone())
            .visible_aliases(self.aliases.clone())
            .args(self.args.clone());
        if !self.short.is_empty() {
            cmd = cmd.about(self.short.clone());
        }
        if !self.long.is_empty() {
            cmd = cmd.long_about(self.long.clone());
        }
        if !self.example.is_empty() {
            cmd = cmd.after_help(format!("Examples:\n{}", self.example));
        }
        if !self.deprecated.is_empty() {
            cmd = cmd.before_help(format!("Deprecated: {}", self.deprecated));
        }
        if self.exec.is_none() {
            cmd = cmd.subcommand_required(true).arg_required_else_help(true);
        }
        cmd.subcommands(self.children.iter().map(CommandNode::to_clap))
    }

    /// Run the command selected by `matches`, which must come from
    /// `self.to_clap()`.
    pub fn dispatch(&self, matches: &ArgMatches) -> Result<()> {
        if let Some((name, sub)) = matches.subcommand() {
            let Some(child) = self.find_child(name) else {
                bail!("unknown command {name:?} under {}", self.name);
            };
            return child.dispatch(sub);
        }
        let Some(exec) = &self.exec else {
            bail!("{} requires a subcommand", self.name);
        };
        if !self.deprecated.is_empty() {
            warn!("command {:?} is deprecated, {}", self.name, self.deprecated);
        }
        let result = exec(matches);
        if result.is_err() && !self.silence_usage {
            eprintln!("{}", self.to_clap().render_usage());
        }
        result
    }
}

impl Builder {
    /// Populate `node` from `desc`: nested sub-commands first, then one
    /// command per method of the described service.
    pub fn add_msg_service_commands(
        &self,
        mut node: CommandNode,
        desc: &CommandDescriptor,
    ) -> Result<CommandNode, BuildError> {
        for (name, sub_desc) in &desc.sub_commands {
            if let Some(idx) = node.children.iter().position(|c| c.name == *name) {
                let existing = std::mem::take(&mut node.children[idx]);
                node.children[idx] = self.add_msg_service_commands(existing, sub_desc)?;
                continue;
            }
            let short = if sub_desc.short.is_empty() {
                format!("Tx commands for the {} service", sub_desc.service)
            } else {
                sub_desc.short.clone()
            };
            let child = self.add_msg_service_commands(CommandNode::group(name.clone(), short), sub_desc)?;
            if !sub_desc.enhance_custom_command {
                node.children.push(child);
            }
        }

        if desc.service.is_empty() {
            return Ok(node);
        }

        let service = self
            .registry()
            .find_service(&desc.service)
            .map_err(|_| BuildError::ServiceNotFound {
                service: desc.service.clone(),
            })?;

        for opt in &desc.rpc_command_options {
            if service.method(&opt.rpc_method).is_none() {
                return Err(BuildError::MethodNotFound {
                    method: opt.rpc_method.clone(),
                    service: service.name.clone(),
                });
            }
        }

        let no_options = RpcCommandOptions::default();
        for method in &service.methods {
            let options = desc.options_for(&method.name).unwrap_or(&no_options);
            if options.skip {
                debug!(service = %service.name, method = %method.name, "skipping method");
                continue;
            }
            let supported = self
                .versions()
                .is_supported(method.since.as_deref())
                .map_err(|source| BuildError::InvalidVersion {
                    method: format!("{}.{}", service.name, method.name),
                    source,
                })?;
            if !supported {
                debug!(
                    service = %service.name,
                    method = %method.name,
                    since = method.since.as_deref().unwrap_or_default(),
                    "method not supported by chain version"
                );
                continue;
            }

            let cmd = self.build_msg_method_command(service, method, options)?;
            if merge(&mut node, cmd) == Merge::Inserted {
                trace!(service = %service.name, method = %method.name, "added command");
            }
        }
        Ok(node)
    }

    /// Assemble the `tx` root from module options and hand-written commands.
    pub fn build_msg_command(
        &self,
        modules: &BTreeMap<String, ModuleOptions>,
        mut custom: BTreeMap<String, CommandNode>,
    ) -> Result<CommandNode, BuildError> {
        let mut root = CommandNode::group("tx", "Transaction subcommands");

        for (module, opts) in modules {
            let Some(desc) = &opts.tx else {
                continue;
            };
            let node = match custom.remove(module) {
                Some(existing) if desc.enhance_custom_command => {
                    self.add_msg_service_commands(existing, desc)?
                }
                Some(existing) => existing,
                None => {
                    let short = if desc.short.is_empty() {
                        format!("Transactions commands for the {module} module")
                    } else {
                        desc.short.clone()
                    };
                    self.add_msg_service_commands(CommandNode::group(module.clone(), short), desc)?
                }
            };
            merge(&mut root, node);
        }

        for (_, node) in custom {
            merge(&mut root, node);
        }
        Ok(root)
    }
}
