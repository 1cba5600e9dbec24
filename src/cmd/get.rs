/*!
`get.rs`

Implements `autotx get <subject> [NAME] [--json]`.

  - service NAME : methods of one Msg service and the command each maps to
  - services     : the same for every service
  - message NAME : fields of one message schema (number, type, signer)
  - messages     : the same for every message
  - modules [NAME] : per-method command options of one or all modules

NAME is matched exactly, then case-insensitively, then on its last dotted
segment (`MsgSend`) when that is unambiguous.

JSON Output Shape (get message MsgSend):
{
  "status": "ok",
  "subject": "message",
  "manifest": "<embedded>",
  "message": {
    "name": "cosmos.bank.v1beta1.MsgSend",
    "signer": ["from_address"],
    "fields": [ { "name": "from_address", "number": 1, "kind": "string", ... } ]
  }
}
*/

use anyhow::{Result, bail};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

use crate::autocli::CommandDescriptor;
use crate::autocli::msg::command_name;
use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji, table};
use crate::cmd::shared::{Loaded, load_manifest, lookup, method_command, service_bindings};
use crate::cmd::subject::Subject;
use crate::schema::{FieldKind, MessageDescriptor, ServiceDescriptor};

/// CLI arguments for `autotx get <subject> [NAME]`
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Subject (service|services|message|messages|modules)
    pub subject: Subject,

    /// Service, message or module name (required for singular subjects)
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

pub fn execute_get(args: GetArgs, manifest: Option<PathBuf>) -> Result<()> {
    let loaded = load_manifest(manifest)?;
    let out = render(&args, &loaded, &StyleOptions::detect())?;
    println!("{out}");
    Ok(())
}

fn render(args: &GetArgs, loaded: &Loaded, style: &StyleOptions) -> Result<String> {
    let m = &loaded.manifest;
    if args.subject.is_singular() && args.name.is_none() {
        bail!("NAME is required for `get {}`", args.subject);
    }
    let name = args.name.as_deref();

    match args.subject.plural() {
        Subject::Services => {
            let picked: Vec<&ServiceDescriptor> = match name {
                Some(n) => vec![lookup("service", n, &m.services, |s: &ServiceDescriptor| s.name.as_str())?],
                None => m.services.iter().collect(),
            };
            if args.json {
                let items: Vec<_> = picked.iter().map(|s| service_json(s, loaded)).collect();
                return Ok(envelope(args.subject, loaded, items));
            }
            Ok(picked
                .iter()
                .map(|s| service_human(s, loaded, style))
                .collect::<Vec<_>>()
                .join("\n\n"))
        }
        Subject::Messages => {
            let picked: Vec<&MessageDescriptor> = match name {
                Some(n) => vec![lookup("message", n, &m.messages, |d: &MessageDescriptor| d.name.as_str())?],
                None => m.messages.iter().collect(),
            };
            if args.json {
                let items: Vec<_> = picked.iter().map(|d| message_json(d)).collect();
                return Ok(envelope(args.subject, loaded, items));
            }
            Ok(picked
                .iter()
                .map(|d| message_human(d, loaded, style))
                .collect::<Vec<_>>()
                .join("\n\n"))
        }
        _ => {
            let modules: Vec<(&String, &CommandDescriptor)> = m
                .modules
                .iter()
                .filter_map(|(n, o)| o.tx.as_ref().map(|tx| (n, tx)))
                .filter(|(n, _)| name.is_none_or(|want| n.eq_ignore_ascii_case(want.trim())))
                .collect();
            if let (Some(want), true) = (name, modules.is_empty()) {
                bail!("module '{want}' not found or has no tx commands");
            }
            if args.json {
                let items: Vec<_> = modules
                    .iter()
                    .map(|(n, tx)| module_json(n, tx))
                    .collect();
                return Ok(envelope(Subject::Modules, loaded, items));
            }
            Ok(modules
                .iter()
                .map(|(n, tx)| module_human(n, tx, loaded, style))
                .collect::<Vec<_>>()
                .join("\n\n"))
        }
    }
}

/// Singular subjects carry one object, plural ones an array.
fn envelope(subject: Subject, loaded: &Loaded, mut items: Vec<serde_json::Value>) -> String {
    let mut out = json!({
        "status": "ok",
        "subject": subject.to_string(),
        "manifest": loaded.source.to_string(),
    });
    let payload = if subject.is_singular() && items.len() == 1 {
        items.remove(0)
    } else {
        out["count"] = json!(items.len());
        serde_json::Value::Array(items)
    };
    if let Some(obj) = out.as_object_mut() {
        obj.insert(subject.to_string(), payload);
    }
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| out.to_string())
}

/* -------------------------------------------------------------------------- */
/* Services                                                                    */
/* -------------------------------------------------------------------------- */

fn command_label(loaded: &Loaded, service: &str, method: &str) -> Option<String> {
    match method_command(&loaded.manifest.modules, service, method) {
        Some(Some(path)) => Some(format!("tx {path}")),
        Some(None) => Some("(skipped)".into()),
        None => None,
    }
}

fn service_json(svc: &ServiceDescriptor, loaded: &Loaded) -> serde_json::Value {
    json!({
        "name": svc.name,
        "methods": svc.methods.iter().map(|mth| json!({
            "name": mth.name,
            "input": mth.input,
            "output": mth.output,
            "since": mth.since,
            "command": command_label(loaded, &svc.name, &mth.name),
        })).collect::<Vec<_>>(),
    })
}

fn service_human(svc: &ServiceDescriptor, loaded: &Loaded, style: &StyleOptions) -> String {
    let title = format!("{} {} ({} methods)", emoji("service", style), svc.name, svc.methods.len());
    let header = box_header(title.trim_start(), Some(format!("manifest={}", loaded.source)), style);
    let rows: Vec<Vec<String>> = svc
        .methods
        .iter()
        .map(|mth| {
            vec![
                mth.name.clone(),
                mth.input.clone(),
                mth.since.clone().unwrap_or_else(|| "-".into()),
                command_label(loaded, &svc.name, &mth.name).unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    if rows.is_empty() {
        return format!("{header}\n{}", color(Role::Dim, "(no methods)", style));
    }
    let body = table(&["METHOD", "INPUT", "SINCE", "COMMAND"], &rows, style);
    format!("{header}\n{body}")
}

/* -------------------------------------------------------------------------- */
/* Messages                                                                    */
/* -------------------------------------------------------------------------- */

fn message_json(desc: &MessageDescriptor) -> serde_json::Value {
    serde_json::to_value(desc).unwrap_or_else(|_| json!({ "name": desc.name }))
}

fn message_human(desc: &MessageDescriptor, loaded: &Loaded, style: &StyleOptions) -> String {
    let title = format!("{} {} ({} fields)", emoji("message", style), desc.name, desc.fields.len());
    let header = box_header(title.trim_start(), Some(format!("manifest={}", loaded.source)), style);
    let signer = desc.signer_field_name();
    let rows: Vec<Vec<String>> = desc
        .fields_by_number()
        .into_iter()
        .map(|f| {
            let mut notes = Vec::new();
            if signer == Some(f.name.as_str()) {
                notes.push(format!("{}signer", emoji("signer", style)));
            }
            if f.kind == FieldKind::Enum && !f.enum_values.is_empty() {
                notes.push(f.enum_values.keys().cloned().collect::<Vec<_>>().join("|"));
            }
            if !f.description.is_empty() {
                notes.push(f.description.clone());
            }
            vec![f.number.to_string(), f.name.clone(), f.type_label(), notes.join("; ")]
        })
        .collect();
    if rows.is_empty() {
        return format!("{header}\n{}", color(Role::Dim, "(no fields)", style));
    }
    let body = table(&["#", "FIELD", "TYPE", "NOTES"], &rows, style);
    format!("{header}\n{body}")
}

/* -------------------------------------------------------------------------- */
/* Modules                                                                     */
/* -------------------------------------------------------------------------- */

fn module_json(name: &str, tx: &CommandDescriptor) -> serde_json::Value {
    json!({
        "name": name,
        "tx": serde_json::to_value(tx).unwrap_or(serde_json::Value::Null),
    })
}

fn module_human(name: &str, tx: &CommandDescriptor, loaded: &Loaded, style: &StyleOptions) -> String {
    let title = format!("tx {name}");
    let subtitle = if tx.enhance_custom_command {
        format!("manifest={} • enhances custom command", loaded.source)
    } else {
        format!("manifest={}", loaded.source)
    };
    let header = box_header(title, Some(subtitle), style);

    let single = std::collections::BTreeMap::from([(
        name.to_string(),
        crate::autocli::ModuleOptions { tx: Some(tx.clone()) },
    )]);
    let mut rows = Vec::new();
    for (path, desc) in service_bindings(&single) {
        for opt in &desc.rpc_command_options {
            let mut notes = Vec::new();
            if opt.skip {
                notes.push("skip".to_string());
            }
            if opt.gov_proposal {
                notes.push(format!("{}gov proposal", emoji("gov", style)));
            }
            if !opt.alias.is_empty() {
                notes.push(format!("alias {}", opt.alias.join(",")));
            }
            if !opt.deprecated.is_empty() {
                notes.push("deprecated".to_string());
            }
            rows.push(vec![
                format!("{path} {}", command_name(opt, &opt.rpc_method)),
                format!("{}.{}", desc.service, opt.rpc_method),
                if opt.positional_args.is_empty() {
                    "-".to_string()
                } else {
                    opt.positional_args.join(" ")
                },
                notes.join("; "),
            ]);
        }
    }
    if rows.is_empty() {
        return format!(
            "{header}\n{}",
            color(Role::Dim, "(all methods use generated defaults)", style)
        );
    }
    let body = table(&["COMMAND", "RPC", "POSITIONAL", "NOTES"], &rows, style);
    format!("{header}\n{body}")
}
