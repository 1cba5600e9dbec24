//! Method version gating.
//!
//! A method may carry `since: "<module> <version>"`. The policy knows the
//! version of each module the target chain runs; methods introduced after
//! that version are not exposed. Methods without an annotation, or whose
//! module is unknown to the policy, are always supported.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed version annotation {0:?} (expected \"<module> <major.minor[.patch]>\")")]
pub struct VersionError(pub String);

#[derive(Debug, Clone, Default)]
pub struct VersionPolicy {
    modules: BTreeMap<String, String>,
}

impl VersionPolicy {
    pub fn new(modules: BTreeMap<String, String>) -> Self {
        Self { modules }
    }

    pub fn is_supported(&self, since: Option<&str>) -> Result<bool, VersionError> {
        let Some(since) = since.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(true);
        };
        let (module, wanted) = since
            .split_once(char::is_whitespace)
            .ok_or_else(|| VersionError(since.to_string()))?;
        let wanted = parse_version(wanted.trim()).ok_or_else(|| VersionError(since.to_string()))?;

        let Some(running) = self.modules.get(module) else {
            return Ok(true);
        };
        let running =
            parse_version(running).ok_or_else(|| VersionError(format!("{module} {running}")))?;
        Ok(compare(&running, &wanted) != Ordering::Less)
    }
}

/// Parse `v0.50.1-rc.1` style versions into numeric components.
fn parse_version(raw: &str) -> Option<Vec<u64>> {
    let core = raw.trim().trim_start_matches('v');
    let core = core.split(['-', '+']).next()?;
    if core.is_empty() {
        return None;
    }
    core.split('.').map(|p| p.parse::<u64>().ok()).collect()
}

fn compare(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> VersionPolicy {
        VersionPolicy::new(BTreeMap::from([(
            "cosmos-sdk".to_string(),
            "v0.50.6".to_string(),
        )]))
    }

    #[test]
    fn unannotated_is_supported() {
        assert_eq!(policy().is_supported(None), Ok(true));
        assert_eq!(policy().is_supported(Some("  ")), Ok(true));
    }

    #[test]
    fn older_and_newer_methods() {
        let p = policy();
        assert_eq!(p.is_supported(Some("cosmos-sdk 0.47")), Ok(true));
        assert_eq!(p.is_supported(Some("cosmos-sdk 0.50.6")), Ok(true));
        assert_eq!(p.is_supported(Some("cosmos-sdk 0.53")), Ok(false));
    }

    #[test]
    fn unknown_module_is_supported() {
        assert_eq!(policy().is_supported(Some("x/circuit 9.0")), Ok(true));
    }

    #[test]
    fn malformed_annotation() {
        assert!(policy().is_supported(Some("cosmos-sdk")).is_err());
        assert!(policy().is_supported(Some("cosmos-sdk zero")).is_err());
    }
}
