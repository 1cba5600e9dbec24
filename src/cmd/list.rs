/*!
`list.rs`

Implements `autotx list <services|messages|modules> [--json]`.

Singular subjects (`service`, `message`) are accepted as aliases of their
plural form.

JSON Output Shape (services):
{
  "status": "ok",
  "subject": "services",
  "manifest": "<embedded>",
  "elapsed_ms": 3,
  "count": 2,
  "services": [
    { "name": "cosmos.bank.v1beta1.Msg", "methods": 4, "command": "tx bank" }
  ]
}
*/

use anyhow::Result;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji, table};
use crate::cmd::shared::{Loaded, load_manifest, service_bindings};
use crate::cmd::subject::Subject;

/// CLI arguments for `autotx list <subject>`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Subject to list (services|messages|modules)
    pub subject: Subject,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

pub fn execute_list(args: ListArgs, manifest: Option<PathBuf>) -> Result<()> {
    let loaded = load_manifest(manifest)?;
    let out = if args.json {
        serde_json::to_string_pretty(&list_json(args.subject, &loaded))?
    } else {
        list_human(args.subject, &loaded, &StyleOptions::detect())
    };
    println!("{out}");
    Ok(())
}

struct Listing {
    headers: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

fn listing(subject: Subject, loaded: &Loaded) -> Listing {
    let m = &loaded.manifest;
    match subject.plural() {
        Subject::Messages => Listing {
            headers: &["#", "NAME", "FIELDS", "SIGNER"],
            rows: m
                .messages
                .iter()
                .enumerate()
                .map(|(i, msg)| {
                    vec![
                        (i + 1).to_string(),
                        msg.name.clone(),
                        msg.fields.len().to_string(),
                        msg.signer_field_name().unwrap_or("-").to_string(),
                    ]
                })
                .collect(),
        },
        Subject::Modules => Listing {
            headers: &["MODULE", "SERVICE", "SUB-COMMANDS", "ENHANCE"],
            rows: m
                .modules
                .iter()
                .filter_map(|(name, opts)| opts.tx.as_ref().map(|tx| (name, tx)))
                .map(|(name, tx)| {
                    let subs = if tx.sub_commands.is_empty() {
                        "-".to_string()
                    } else {
                        tx.sub_commands.keys().cloned().collect::<Vec<_>>().join(",")
                    };
                    vec![
                        name.clone(),
                        if tx.service.is_empty() { "-".into() } else { tx.service.clone() },
                        subs,
                        if tx.enhance_custom_command { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect(),
        },
        _ => {
            let bindings = service_bindings(&m.modules);
            Listing {
                headers: &["#", "NAME", "METHODS", "COMMAND"],
                rows: m
                    .services
                    .iter()
                    .enumerate()
                    .map(|(i, svc)| {
                        let command = bindings
                            .iter()
                            .find(|(_, d)| d.service == svc.name)
                            .map(|(p, _)| format!("tx {p}"))
                            .unwrap_or_else(|| "-".into());
                        vec![
                            (i + 1).to_string(),
                            svc.name.clone(),
                            svc.methods.len().to_string(),
                            command,
                        ]
                    })
                    .collect(),
            }
        }
    }
}

fn list_json(subject: Subject, loaded: &Loaded) -> serde_json::Value {
    let m = &loaded.manifest;
    let plural = subject.plural();
    let bindings = service_bindings(&m.modules);
    let items: Vec<serde_json::Value> = match plural {
        Subject::Messages => m
            .messages
            .iter()
            .map(|msg| {
                json!({
                    "name": msg.name,
                    "fields": msg.fields.len(),
                    "signer": msg.signer_field_name(),
                })
            })
            .collect(),
        Subject::Modules => m
            .modules
            .iter()
            .filter_map(|(name, opts)| opts.tx.as_ref().map(|tx| (name, tx)))
            .map(|(name, tx)| {
                json!({
                    "name": name,
                    "service": tx.service,
                    "sub_commands": tx.sub_commands.keys().collect::<Vec<_>>(),
                    "enhance_custom_command": tx.enhance_custom_command,
                })
            })
            .collect(),
        _ => m
            .services
            .iter()
            .map(|svc| {
                let command = bindings
                    .iter()
                    .find(|(_, d)| d.service == svc.name)
                    .map(|(p, _)| format!("tx {p}"));
                json!({
                    "name": svc.name,
                    "methods": svc.methods.len(),
                    "command": command,
                })
            })
            .collect(),
    };
    let mut out = json!({
        "status": "ok",
        "subject": plural.to_string(),
        "manifest": loaded.source.to_string(),
        "elapsed_ms": loaded.elapsed_ms,
        "count": items.len(),
    });
    if let Some(obj) = out.as_object_mut() {
        obj.insert(plural.to_string(), serde_json::Value::Array(items));
    }
    out
}

fn list_human(subject: Subject, loaded: &Loaded, style: &StyleOptions) -> String {
    let plural = subject.plural();
    let Listing { headers, rows } = listing(plural, loaded);
    let title = format!(
        "{} {} ({})",
        emoji("list", style),
        capitalize(&plural.to_string()),
        rows.len()
    );
    let header = box_header(
        title.trim_start(),
        Some(format!("manifest={} • {} ms", loaded.source, loaded.elapsed_ms)),
        style,
    );
    if rows.is_empty() {
        return format!(
            "{header}\n{}",
            color(Role::Warning, format!("No {plural} in manifest"), style)
        );
    }
    let body = table(headers, &rows, style);
    format!("{header}\n{body}")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
