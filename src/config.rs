use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
}

/// Where pages come from and how their JSON is shaped.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub endpoint: String,
    #[serde(default = "default_items_field")]
    pub items_field: String,
    #[serde(default = "default_next_field")]
    pub next_field: String,
    /// Dotted path to the item's display key.
    #[serde(default = "default_key_field")]
    pub key_field: String,
    /// Dotted path to the item's artifact URL.
    #[serde(default = "default_artifact_field")]
    pub artifact_field: String,
    #[serde(default = "default_cursor_param")]
    pub cursor_param: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_items_field() -> String {
    "items".to_string()
}
fn default_next_field() -> String {
    "next".to_string()
}
fn default_key_field() -> String {
    "name".to_string()
}
fn default_artifact_field() -> String {
    "artifact_url".to_string()
}
fn default_cursor_param() -> String {
    "cursor".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArtifactsConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Share one download between concurrent resolves of the same key.
    #[serde(default)]
    pub coalesce: bool,
    #[serde(default)]
    pub max_bytes: Option<u64>,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            coalesce: false,
            max_bytes: None,
        }
    }
}

impl SourceConfig {
    /// A config pointing at `endpoint` with every other field defaulted.
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            items_field: default_items_field(),
            next_field: default_next_field(),
            key_field: default_key_field(),
            artifact_field: default_artifact_field(),
            cursor_param: default_cursor_param(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;
    Ok(config)
}

/// Parse and validate a TOML config string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate source
    let endpoint = reqwest::Url::parse(&config.source.endpoint)
        .with_context(|| format!("source.endpoint is not a URL: '{}'", config.source.endpoint))?;
    match endpoint.scheme() {
        "http" | "https" => {}
        other => anyhow::bail!(
            "source.endpoint must use http or https, got '{}'",
            other
        ),
    }

    for (name, value) in [
        ("source.items_field", &config.source.items_field),
        ("source.next_field", &config.source.next_field),
        ("source.key_field", &config.source.key_field),
        ("source.artifact_field", &config.source.artifact_field),
        ("source.cursor_param", &config.source.cursor_param),
    ] {
        if value.trim().is_empty() {
            anyhow::bail!("{} must not be empty", name);
        }
    }

    if config.source.timeout_secs == 0 {
        anyhow::bail!("source.timeout_secs must be > 0");
    }

    // Validate artifacts
    if config.artifacts.timeout_secs == 0 {
        anyhow::bail!("artifacts.timeout_secs must be > 0");
    }
    if config.artifacts.max_bytes == Some(0) {
        anyhow::bail!("artifacts.max_bytes must be > 0 when set");
    }

    Ok(config)
}
