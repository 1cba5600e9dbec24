//! Manifest: schemas, module command options and chain settings in one YAML
//! or JSON document.
//!
//! Source precedence: `--manifest PATH` > `AUTOTX_MANIFEST` env > the
//! embedded `manifests/cosmos.yaml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::address::{AddressCodecs, AddressError};
use crate::autocli::{Builder, ModuleOptions};
use crate::client::{ClientConfig, TxPipeline};
use crate::schema::{MessageDescriptor, SchemaError, SchemaRegistry, ServiceDescriptor, VersionPolicy};

pub const MANIFEST_ENV: &str = "AUTOTX_MANIFEST";

const EMBEDDED: &str = include_str!("../../manifests/cosmos.yaml");

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON manifest: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error("invalid node URL {node:?}: {source}")]
    InvalidNode {
        node: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.yaml` / `.yml` are YAML, anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    Embedded,
    File(PathBuf),
}

impl ManifestSource {
    pub fn resolve(flag: Option<PathBuf>) -> Self {
        let env = std::env::var(MANIFEST_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        Self::pick(flag, env)
    }

    fn pick(flag: Option<PathBuf>, env: Option<PathBuf>) -> Self {
        match flag.or(env) {
            Some(path) => ManifestSource::File(path),
            None => ManifestSource::Embedded,
        }
    }
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestSource::Embedded => f.write_str("<embedded>"),
            ManifestSource::File(p) => write!(f, "{}", p.display()),
        }
    }
}

fn default_prefix() -> String {
    "cosmos".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_prefix")]
    pub bech32_prefix: String,
    #[serde(default)]
    pub chain_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    /// Module name to running version, for `since` gating.
    #[serde(default)]
    pub versions: BTreeMap<String, String>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            bech32_prefix: default_prefix(),
            chain_id: String::new(),
            default_from: None,
            node: None,
            versions: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub accounts: BTreeMap<String, String>,
    #[serde(default)]
    pub messages: Vec<MessageDescriptor>,
    #[serde(default)]
    pub services: Vec<ServiceDescriptor>,
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleOptions>,
}

impl Manifest {
    pub fn parse(text: &str, format: Format) -> Result<Self, ManifestError> {
        Ok(match format {
            Format::Yaml => serde_yaml::from_str(text)?,
            Format::Json => serde_json::from_str(text)?,
        })
    }

    pub fn load(source: &ManifestSource) -> Result<Self, ManifestError> {
        debug!(source = %source, "loading manifest");
        match source {
            ManifestSource::Embedded => Self::parse(EMBEDDED, Format::Yaml),
            ManifestSource::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
                    path: path.clone(),
                    source,
                })?;
                Self::parse(&text, Format::from_path(path))
            }
        }
    }

    pub fn registry(&self) -> Result<SchemaRegistry, ManifestError> {
        Ok(SchemaRegistry::new(self.messages.clone(), self.services.clone())?)
    }

    pub fn client_config(&self) -> Result<ClientConfig, ManifestError> {
        let node = match &self.chain.node {
            Some(raw) => Some(Url::parse(raw).map_err(|source| ManifestError::InvalidNode {
                node: raw.clone(),
                source,
            })?),
            None => None,
        };
        Ok(ClientConfig {
            chain_id: self.chain.chain_id.clone(),
            node,
            default_from: self.chain.default_from.clone(),
            accounts: self.accounts.clone(),
        })
    }

    /// Wire everything the command builder needs from this manifest.
    pub fn builder(&self, pipeline: Arc<dyn TxPipeline>) -> Result<Builder, ManifestError> {
        let registry = Arc::new(self.registry()?);
        let codecs = AddressCodecs::from_prefix(&self.chain.bech32_prefix)?;
        Ok(Builder::new(registry, codecs, pipeline)
            .with_client(self.client_config()?)
            .with_versions(VersionPolicy::new(self.chain.versions.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GeneratePipeline;

    #[test]
    fn source_precedence() {
        let flag = Some(PathBuf::from("a.yaml"));
        let env = Some(PathBuf::from("b.json"));
        assert_eq!(
            ManifestSource::pick(flag.clone(), env.clone()),
            ManifestSource::File("a.yaml".into())
        );
        assert_eq!(
            ManifestSource::pick(None, env),
            ManifestSource::File("b.json".into())
        );
        assert_eq!(ManifestSource::pick(None, None), ManifestSource::Embedded);
    }

    #[test]
    fn format_by_extension() {
        assert_eq!(Format::from_path(Path::new("m.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("m.YML")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("m.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("m")), Format::Json);
    }

    #[test]
    fn json_manifest() {
        let text = r#"{"chain": {"chain_id": "x-1"}, "messages": [{"name": "a.Empty"}]}"#;
        let m = Manifest::parse(text, Format::Json).unwrap();
        assert_eq!(m.chain.bech32_prefix, "cosmos");
        assert_eq!(m.chain.chain_id, "x-1");
        assert!(m.registry().unwrap().find_message("a.Empty").is_ok());
    }

    #[test]
    fn invalid_node_rejected() {
        let m = Manifest::parse("chain: { node: 'not a url' }", Format::Yaml).unwrap();
        assert!(matches!(m.client_config(), Err(ManifestError::InvalidNode { .. })));
    }

    #[test]
    fn embedded_manifest_builds_full_tree() {
        let m = Manifest::load(&ManifestSource::Embedded).unwrap();
        let b = m.builder(Arc::new(GeneratePipeline)).unwrap();
        let root = b.build_msg_command(&m.modules, BTreeMap::new()).unwrap();
        let paths = root.paths();
        for expected in [
            "bank send",
            "bank set-send-enabled",
            "bank update-params",
            "staking delegate",
            "staking edit-validator",
            "staking cancel-unbonding-delegation",
            "slashing unjail",
            "gov vote",
            "gov deposit",
            "gov legacy vote",
        ] {
            assert!(paths.iter().any(|p| p == expected), "missing {expected}: {paths:?}");
        }
    }

    #[test]
    fn missing_file() {
        let err = Manifest::load(&ManifestSource::File("/nonexistent/autotx.yaml".into()))
            .unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
