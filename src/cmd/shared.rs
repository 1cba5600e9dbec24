/*!
`shared.rs`

Helpers shared by the `list`, `get` and `tx` subcommands: manifest
loading, service-to-command mapping and forgiving name lookup.
*/

use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

use crate::autocli::msg::command_name;
use crate::autocli::{CommandDescriptor, ModuleOptions};
use crate::manifest::{Manifest, ManifestSource};

/// A manifest together with where it came from.
#[derive(Debug)]
pub struct Loaded {
    pub source: ManifestSource,
    pub manifest: Manifest,
    pub elapsed_ms: u128,
}

pub fn load_manifest(flag: Option<PathBuf>) -> Result<Loaded> {
    let start = Instant::now();
    let source = ManifestSource::resolve(flag);
    let manifest = Manifest::load(&source)?;
    let elapsed_ms = start.elapsed().as_millis();
    debug!(
        source = %source,
        services = manifest.services.len(),
        messages = manifest.messages.len(),
        elapsed_ms,
        "manifest loaded"
    );
    Ok(Loaded {
        source,
        manifest,
        elapsed_ms,
    })
}

/// Every command descriptor bound to a service, keyed by its command path
/// below `tx` (`gov legacy`).
pub fn service_bindings(modules: &BTreeMap<String, ModuleOptions>) -> Vec<(String, &CommandDescriptor)> {
    fn walk<'a>(path: String, desc: &'a CommandDescriptor, out: &mut Vec<(String, &'a CommandDescriptor)>) {
        for (name, sub) in &desc.sub_commands {
            walk(format!("{path} {name}"), sub, out);
        }
        if !desc.service.is_empty() {
            out.push((path, desc));
        }
    }

    let mut out = Vec::new();
    for (module, opts) in modules {
        if let Some(desc) = &opts.tx {
            walk(module.clone(), desc, &mut out);
        }
    }
    out
}

/// Where a method surfaces under `tx`, or `None` if no module maps its
/// service. Skipped methods report `Some(None)`.
pub fn method_command(
    modules: &BTreeMap<String, ModuleOptions>,
    service: &str,
    method: &str,
) -> Option<Option<String>> {
    let (path, desc) = service_bindings(modules)
        .into_iter()
        .find(|(_, d)| d.service == service)?;
    let options = desc.options_for(method).cloned().unwrap_or_default();
    if options.skip {
        return Some(None);
    }
    Some(Some(format!("{path} {}", command_name(&options, method))))
}

/// Resolve `name` against `candidates`: exact match, then case-insensitive,
/// then a unique match on the last dotted segment (`MsgSend`).
pub fn lookup<'a, T>(
    what: &str,
    name: &str,
    candidates: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&T) -> &str,
) -> Result<&'a T>
where
    T: 'a,
{
    let items: Vec<&T> = candidates.into_iter().collect();
    let name = name.trim();

    if let Some(hit) = items.iter().copied().find(|t| key(t) == name) {
        return Ok(hit);
    }
    if let Some(hit) = items.iter().copied().find(|t| key(t).eq_ignore_ascii_case(name)) {
        return Ok(hit);
    }
    let by_suffix: Vec<&T> = items
        .iter()
        .copied()
        .filter(|t| {
            key(t)
                .rsplit('.')
                .next()
                .is_some_and(|last| last.eq_ignore_ascii_case(name))
        })
        .collect();
    match by_suffix.as_slice() {
        [one] => Ok(*one),
        [] => bail!("{what} '{name}' not found"),
        many => {
            let names: Vec<&str> = many.iter().map(|t| key(t)).collect();
            bail!("{what} '{name}' is ambiguous: {}", names.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autocli::testutil::fixture_modules;

    #[test]
    fn bindings_include_nested_services() {
        let modules = fixture_modules();
        let paths: Vec<(String, String)> = service_bindings(&modules)
            .into_iter()
            .map(|(p, d)| (p, d.service.clone()))
            .collect();
        assert!(paths.contains(&("bank".into(), "test.bank.v1beta1.Msg".into())));
        assert!(paths.contains(&("gov legacy".into(), "test.gov.v1beta1.Msg".into())));
    }

    #[test]
    fn method_paths() {
        let modules = fixture_modules();
        assert_eq!(
            method_command(&modules, "test.bank.v1beta1.Msg", "Send"),
            Some(Some("bank send".into()))
        );
        assert_eq!(
            method_command(&modules, "test.bank.v1beta1.Msg", "MultiSend"),
            Some(Some("bank multi-send".into()))
        );
        assert_eq!(method_command(&modules, "test.bank.v1beta1.Msg", "Burn"), Some(None));
        assert_eq!(
            method_command(&modules, "test.gov.v1beta1.Msg", "Vote"),
            Some(Some("gov legacy vote".into()))
        );
        assert_eq!(method_command(&modules, "nope.Msg", "Send"), None);
    }

    #[test]
    fn lookup_is_forgiving() {
        let names = vec![
            "cosmos.bank.v1beta1.MsgSend".to_string(),
            "cosmos.gov.v1.MsgVote".to_string(),
            "cosmos.gov.v1beta1.MsgVote".to_string(),
        ];
        let key = String::as_str;
        assert_eq!(lookup("message", "cosmos.gov.v1.MsgVote", &names, key).unwrap(), &names[1]);
        assert_eq!(lookup("message", "COSMOS.BANK.V1BETA1.MSGSEND", &names, key).unwrap(), &names[0]);
        assert_eq!(lookup("message", "msgsend", &names, key).unwrap(), &names[0]);
        let err = lookup("message", "MsgVote", &names, key).unwrap_err().to_string();
        assert!(err.contains("ambiguous"), "{err}");
        assert!(lookup("message", "MsgBurn", &names, key).is_err());
    }
}
