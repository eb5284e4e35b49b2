use std::path::{Path, PathBuf};
use std::time::Duration;

use praxis_analysis::worker::RetryPolicy;
use praxis_literature::client::{DEFAULT_BASE_URL, PubMedSettings};
use praxis_literature::source::DEFAULT_MAX_RESULTS;
use serde::{Deserialize, Serialize};

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-20250514-v1:0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PraxisConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    pub region: String,
    pub storage: StorageBackend,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Secret for keyed hashing of patient and practice ids.
    pub subject_key: String,
    #[serde(default)]
    pub literature: LiteratureConfig,
    /// Added in v1.
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageBackend {
    S3 { bucket: String },
    /// Process-local store. Nothing survives a restart.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiteratureConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub max_results: u32,
    pub timeout_secs: u64,
    pub retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for LiteratureConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            max_results: DEFAULT_MAX_RESULTS,
            timeout_secs: 30,
            retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_attempts: u32,
    pub attempt_timeout_secs: u64,
    pub backoff_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            attempt_timeout_secs: policy.attempt_timeout.as_secs(),
            backoff_secs: policy.backoff.as_secs(),
        }
    }
}

impl PraxisConfig {
    /// A fresh config with defaults everywhere except the given fields.
    pub fn starter(region: impl Into<String>, storage: StorageBackend, subject_key: String) -> Self {
        Self {
            config_version: CURRENT_VERSION,
            region: region.into(),
            storage,
            model_id: default_model_id(),
            subject_key,
            literature: LiteratureConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.pipeline.max_attempts,
            attempt_timeout: Duration::from_secs(self.pipeline.attempt_timeout_secs),
            backoff: Duration::from_secs(self.pipeline.backoff_secs),
        }
    }

    pub fn pubmed_settings(&self) -> PubMedSettings {
        PubMedSettings {
            base_url: self.literature.base_url.clone(),
            api_key: self.literature.api_key.clone(),
            timeout: Duration::from_secs(self.literature.timeout_secs),
            retries: self.literature.retries,
            retry_backoff: Duration::from_millis(self.literature.retry_backoff_ms),
        }
    }
}

/// Redacted config info safe to print.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigInfo {
    pub config_version: u32,
    pub region: String,
    pub storage: String,
    pub model_id: String,
    pub subject_key_hint: String,
    pub literature_base_url: String,
    pub literature_api_key_hint: Option<String>,
    pub max_results: u32,
    pub max_attempts: u32,
    pub attempt_timeout_secs: u64,
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("praxis"))
}

/// `PRAXIS_CONFIG` if set, otherwise `<config_dir>/praxis/config.json`.
pub fn config_path() -> eyre::Result<PathBuf> {
    if let Ok(path) = std::env::var("PRAXIS_CONFIG")
        && !path.is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    Ok(config_dir()?.join("config.json"))
}

/// Load from [`config_path`] and apply environment overrides.
pub fn load_config() -> eyre::Result<PraxisConfig> {
    let mut config = load_config_from(&config_path()?)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

pub fn load_config_from(path: &Path) -> eyre::Result<PraxisConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;
    parse_config(&contents)
}

/// Parse config text, migrating older versions first.
pub fn parse_config(contents: &str) -> eyre::Result<PraxisConfig> {
    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: PraxisConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update Praxis."
        ));
    }

    // v0 -> v1: pipeline retry settings became configurable.
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        obj.entry("pipeline")
            .or_insert(serde_json::to_value(PipelineConfig::default())?);
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 -> v1 (added pipeline)");
    }

    Ok(json)
}

/// Environment overrides: `PRAXIS_BUCKET`, `AWS_REGION`, `PRAXIS_MODEL_ID`,
/// `NCBI_API_KEY`, `PRAXIS_SUBJECT_KEY`. Empty values are ignored.
pub fn apply_env_overrides(config: &mut PraxisConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(bucket) = var("PRAXIS_BUCKET") {
        config.storage = StorageBackend::S3 { bucket };
    }
    if let Some(region) = var("AWS_REGION") {
        config.region = region;
    }
    if let Some(model_id) = var("PRAXIS_MODEL_ID") {
        config.model_id = model_id;
    }
    if let Some(api_key) = var("NCBI_API_KEY") {
        config.literature.api_key = Some(api_key);
    }
    if let Some(key) = var("PRAXIS_SUBJECT_KEY") {
        config.subject_key = key;
    }
}

pub fn save_config_to(config: &PraxisConfig, path: &Path) -> eyre::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| eyre::eyre!("config path {} has no parent", path.display()))?;
    std::fs::create_dir_all(dir)?;

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;
    let json = serde_json::to_string_pretty(&stamped)?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    // The file holds the subject hashing secret.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

pub fn config_info(config: &PraxisConfig) -> ConfigInfo {
    let storage = match &config.storage {
        StorageBackend::S3 { bucket } => format!("s3://{bucket}"),
        StorageBackend::Memory => "memory".to_string(),
    };

    ConfigInfo {
        config_version: config.config_version,
        region: config.region.clone(),
        storage,
        model_id: config.model_id.clone(),
        subject_key_hint: redact_secret(&config.subject_key),
        literature_base_url: config.literature.base_url.clone(),
        literature_api_key_hint: config.literature.api_key.as_deref().map(redact_secret),
        max_results: config.literature.max_results,
        max_attempts: config.pipeline.max_attempts,
        attempt_timeout_secs: config.pipeline.attempt_timeout_secs,
    }
}

fn redact_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}
