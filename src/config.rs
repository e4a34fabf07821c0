use crate::error::ConfigError;
use crate::report::ToolKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub fix: FixConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra HTTP headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Extra fields merged into the request body (e.g. temperature, max_tokens)
    #[serde(default)]
    pub body: toml::Table,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_llm_timeout_secs(),
            headers: BTreeMap::new(),
            body: toml::Table::new(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub pmd: ToolConfig,
}

impl AnalyzerConfig {
    pub fn tool(&self, kind: ToolKind) -> &ToolConfig {
        match kind {
            ToolKind::Pmd => &self.pmd,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ToolConfig {
    /// Command template; `{input_file}` and `{report_file}` are substituted
    #[serde(default = "default_pmd_command")]
    pub command: String,
    /// Where the command writes its report
    #[serde(default = "default_report_file")]
    pub report_file: String,
    #[serde(default = "default_analyzer_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            command: default_pmd_command(),
            report_file: default_report_file(),
            timeout_secs: default_analyzer_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FixConfig {
    /// Language of the files being fixed, used in instructions and fence stripping
    #[serde(default = "default_language")]
    pub language: String,
    /// Re-run the analyzer on the fixed file
    #[serde(default = "default_verify")]
    pub verify: bool,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            verify: default_verify(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-4o".into()
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_pmd_command() -> String {
    "pmd check --no-progress -d {input_file} -R rulesets/java/quickstart.xml -f json -r {report_file}"
        .into()
}

fn default_report_file() -> String {
    "violations.json".into()
}

fn default_analyzer_timeout_secs() -> u64 {
    300
}

fn default_language() -> String {
    "Java".into()
}

fn default_verify() -> bool {
    true
}

impl Config {
    /// Load config from a TOML file, falling back to defaults if it does not exist,
    /// then apply `key.path=value` overrides
    pub fn load(path: &str, overrides: &[String]) -> Result<Self, ConfigError> {
        let path_ref = Path::new(path);
        let mut table = if path_ref.exists() {
            debug!("Loading config from {}", path);
            let content = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
                path: path_ref.to_path_buf(),
                source,
            })?;
            content
                .parse::<toml::Table>()
                .map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            info!("Config file {} not found, using defaults", path);
            toml::Table::new()
        };

        for entry in overrides {
            apply_override(&mut table, entry)?;
        }

        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))
    }

    /// Render the config as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Apply one `a.b.c=value` override. The value is parsed as a TOML value when
/// possible (numbers, booleans, arrays) and treated as a plain string otherwise.
fn apply_override(table: &mut toml::Table, entry: &str) -> Result<(), ConfigError> {
    let (key, raw) = entry
        .split_once('=')
        .ok_or_else(|| ConfigError::Override(entry.to_string()))?;
    let parts: Vec<&str> = key.trim().split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::Override(entry.to_string()));
    }

    let value = parse_override_value(raw.trim());
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| ConfigError::Override(entry.to_string()))?;

    let mut current = table;
    for part in parents {
        let next = current
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        current = match next {
            toml::Value::Table(t) => t,
            _ => return Err(ConfigError::Override(entry.to_string())),
        };
    }
    debug!("Config override: {} = {}", key, value);
    current.insert(last.to_string(), value);
    Ok(())
}

fn parse_override_value(raw: &str) -> toml::Value {
    format!("value = {}", raw)
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut t| t.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
