//! Configuration: transport endpoint, index family, working directory and backend

use crate::enrich::EnrichConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors. All of them are fatal at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown engine '{0}' (expected solr or elasticsearch)")]
    UnknownEngine(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which indexing backend serves queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Solr,
    Elastic,
}

impl FromStr for EngineKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "solr" => Ok(Self::Solr),
            "elastic" | "elasticsearch" | "es" => Ok(Self::Elastic),
            _ => Err(ConfigError::UnknownEngine(s.to_string())),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Solr => f.write_str("solr"),
            Self::Elastic => f.write_str("elastic"),
        }
    }
}

/// Configuration file layout before validation
#[derive(Debug, Deserialize)]
struct RawConfig {
    host: Option<String>,
    name: Option<String>,
    path: Option<PathBuf>,
    engine_name: Option<String>,
    timeout_ms: Option<u64>,
    #[serde(default)]
    enrich: EnrichConfig,
}

/// Validated configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Base URL of the backend, e.g. `http://localhost:8983/solr/`
    pub host: String,
    /// Logical name of the index family
    pub name: String,
    /// Local working directory
    pub path: PathBuf,
    pub engine: EngineKind,
    /// Per-request backend timeout
    pub timeout_ms: u64,
    pub enrich: EnrichConfig,
}

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default working directory (~/.local/share/spangraph)
pub fn default_data_dir() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("spangraph")
}

impl Config {
    pub fn new(host: impl Into<String>, name: impl Into<String>, engine: EngineKind) -> Self {
        Self {
            host: host.into(),
            name: name.into(),
            path: default_data_dir(),
            engine,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            enrich: EnrichConfig::default(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_enrich(mut self, enrich: EnrichConfig) -> Self {
        self.enrich = enrich;
        self
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;

        let host = raw.host.filter(|h| !h.is_empty()).ok_or(ConfigError::MissingField("host"))?;
        let name = raw.name.filter(|n| !n.is_empty()).ok_or(ConfigError::MissingField("name"))?;
        let engine = raw
            .engine_name
            .ok_or(ConfigError::MissingField("engine_name"))?
            .parse()?;

        Ok(Self {
            host,
            name,
            path: raw.path.unwrap_or_else(default_data_dir),
            engine,
            timeout_ms: raw.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            enrich: raw.enrich,
        })
    }

    /// Load a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Index holding concept and predicate documents
    pub fn graph_index_name(&self) -> String {
        format!("{}-graph", self.name)
    }

    /// Index holding enriched source documents
    pub fn content_index_name(&self) -> String {
        self.name.clone()
    }

    /// Working directory for this index family
    pub fn root_dir(&self) -> PathBuf {
        self.path.join(&self.name)
    }

    pub fn preflabel_db_path(&self) -> PathBuf {
        self.root_dir().join("sqlite").join("preflabels.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_name_spellings() {
        assert_eq!("solr".parse::<EngineKind>().unwrap(), EngineKind::Solr);
        assert_eq!("Elasticsearch".parse::<EngineKind>().unwrap(), EngineKind::Elastic);
        assert_eq!("es".parse::<EngineKind>().unwrap(), EngineKind::Elastic);
        assert!(matches!(
            "lucene".parse::<EngineKind>(),
            Err(ConfigError::UnknownEngine(name)) if name == "lucene"
        ));
    }

    #[test]
    fn loads_minimal_yaml() {
        let config = Config::from_yaml_str(
            "host: http://localhost:8983/solr/\nname: blog\npath: /tmp/sg\nengine_name: solr\n",
        )
        .unwrap();
        assert_eq!(config.engine, EngineKind::Solr);
        assert_eq!(config.graph_index_name(), "blog-graph");
        assert_eq!(config.content_index_name(), "blog");
        assert_eq!(config.preflabel_db_path(), PathBuf::from("/tmp/sg/blog/sqlite/preflabels.db"));
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
        assert_eq!(config.enrich.min_labels, 2);
    }

    #[test]
    fn enrich_section_overrides_defaults() {
        let config = Config::from_yaml_str(
            "host: h\nname: n\nengine_name: es\ntimeout_ms: 500\nenrich:\n  max_slop: 1\n  id_field: slug\n",
        )
        .unwrap();
        assert_eq!(config.enrich.max_slop, 1);
        assert_eq!(config.enrich.id_field, "slug");
        assert_eq!(config.enrich.max_concept_length, 4);
        assert_eq!(config.timeout_ms, 500);
    }

    #[test]
    fn unknown_engine_is_fatal() {
        let err = Config::from_yaml_str("host: h\nname: n\nengine_name: sphinx\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEngine(_)));
    }

    #[test]
    fn missing_fields_are_reported() {
        let err = Config::from_yaml_str("host: h\nengine_name: solr\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("name")));

        let err = Config::from_yaml_str("host: h\nname: n\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("engine_name")));
    }
}
