//! Per-module and per-method command options as they appear in the manifest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Options of one module; only the transaction side is synthesized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx: Option<CommandDescriptor>,
}

/// Describes how one service maps onto a command node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Fully-qualified service name; empty for a pure grouping node.
    #[serde(default)]
    pub service: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub short: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rpc_command_options: Vec<RpcCommandOptions>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_commands: BTreeMap<String, CommandDescriptor>,
    /// Add generated commands to an existing hand-written command.
    #[serde(default)]
    pub enhance_custom_command: bool,
}

impl CommandDescriptor {
    pub fn options_for(&self, method: &str) -> Option<&RpcCommandOptions> {
        self.rpc_command_options
            .iter()
            .find(|o| o.rpc_method == method)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcCommandOptions {
    pub rpc_method: String,
    /// Usage line; its first word becomes the command name.
    #[serde(default, rename = "use", skip_serializing_if = "String::is_empty")]
    pub use_: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub short: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub long: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub example: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deprecated: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positional_args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flag_options: BTreeMap<String, FlagOptions>,
    #[serde(default)]
    pub skip: bool,
    /// Submit the message wrapped in a governance proposal by default.
    #[serde(default)]
    pub gov_proposal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shorthand: Option<char>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_descriptor_yaml() {
        let yaml = r#"
service: cosmos.gov.v1.Msg
rpc_command_options:
  - rpc_method: Vote
    use: "vote [proposal-id] [option]"
    positional_args: [proposal_id, option]
    flag_options:
      metadata: { usage: "vote metadata", shorthand: m }
sub_commands:
  legacy:
    service: cosmos.gov.v1beta1.Msg
"#;
        let d: CommandDescriptor = serde_yaml::from_str(yaml).unwrap();
        let vote = d.options_for("Vote").unwrap();
        assert_eq!(vote.use_, "vote [proposal-id] [option]");
        assert_eq!(vote.flag_options["metadata"].shorthand, Some('m'));
        assert!(d.options_for("Deposit").is_none());
        assert_eq!(d.sub_commands["legacy"].service, "cosmos.gov.v1beta1.Msg");
        assert!(!d.enhance_custom_command);
    }
}
