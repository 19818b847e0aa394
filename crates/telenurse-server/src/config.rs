//! Server configuration.
//!
//! A versioned JSON file, located through `TELENURSE_CONFIG` or the
//! platform config directory. A missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 2;

pub const CONFIG_ENV: &str = "TELENURSE_CONFIG";

/// Fields missing from the file take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    pub config_version: u32,
    pub bind_addr: String,
    pub region: String,
    pub model_id: String,
    pub storage: StorageBackend,
    pub policy_path: PathBuf,
    /// Per-call language model timeout. Added in v2; absent means none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_timeout_secs: Option<u64>,
    /// Added in v2.
    pub llm_max_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageBackend {
    Local {
        dir: PathBuf,
    },
    S3 {
        bucket: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        prefix: Option<String>,
    },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            bind_addr: "127.0.0.1:8000".to_string(),
            region: "us-east-1".to_string(),
            model_id: "us.anthropic.claude-sonnet-4-20250514-v1:0".to_string(),
            storage: StorageBackend::Local {
                dir: PathBuf::from("assessment_records"),
            },
            policy_path: PathBuf::from("system_prompt.txt"),
            llm_timeout_secs: None,
            llm_max_attempts: 1,
        }
    }
}

impl ServerConfig {
    pub fn llm_timeout(&self) -> Option<Duration> {
        self.llm_timeout_secs.map(Duration::from_secs)
    }
}

fn config_path() -> eyre::Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("telenurse").join("config.json"))
}

/// Load the config from its usual location.
pub fn load_config() -> eyre::Result<ServerConfig> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> eyre::Result<ServerConfig> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(ServerConfig::default());
        }
        Err(e) => return Err(eyre::eyre!("failed to read config at {}: {e}", path.display())),
    };
    parse_config(&contents)
}

/// Parse config JSON of any known version.
pub fn parse_config(contents: &str) -> eyre::Result<ServerConfig> {
    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(contents)?;
    let on_disk_version = match json.get("config_version") {
        None | Some(serde_json::Value::Null) => 0,
        Some(value) => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| eyre::eyre!("config_version must be a small non-negative integer, got {value}"))?,
    };

    let migrated = migrate(json, on_disk_version)?;
    let config: ServerConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        eyre::bail!(
            "config version {from_version} is newer than this build supports ({CURRENT_VERSION})"
        );
    }

    let obj = json
        .as_object_mut()
        .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;

    // v0 → v1: the assessment directory was a bare `records_dir` string.
    if from_version < 1 {
        if let Some(dir) = obj.remove("records_dir") {
            obj.insert(
                "storage".to_string(),
                serde_json::json!({ "type": "local", "dir": dir }),
            );
        }
    }

    // v1 → v2: gateway guard settings; defaults are filled in by serde.

    obj.insert(
        "config_version".to_string(),
        serde_json::Value::from(CURRENT_VERSION),
    );
    Ok(json)
}
