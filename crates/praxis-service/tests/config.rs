use std::collections::HashMap;

use praxis_service::config::{
    PipelineConfig, PraxisConfig, StorageBackend, apply_env_overrides, config_info, load_config_from,
    parse_config, save_config_to,
};

const V0_CONFIG: &str = r#"{
    "region": "eu-west-1",
    "storage": { "type": "s3", "bucket": "praxis-data" },
    "model_id": "anthropic.claude-3-haiku",
    "subject_key": "0123456789abcdef",
    "literature": { "api_key": "ncbi-secret-key" }
}"#;

#[test]
fn unversioned_config_is_migrated() {
    let config = parse_config(V0_CONFIG).unwrap();
    assert_eq!(config.config_version, 1);
    assert_eq!(config.pipeline, PipelineConfig::default());
    assert_eq!(config.pipeline.max_attempts, 3);
    assert_eq!(
        config.storage,
        StorageBackend::S3 {
            bucket: "praxis-data".to_string()
        }
    );
    // Unset literature fields fall back to defaults.
    assert_eq!(config.literature.max_results, 20);
    assert_eq!(config.literature.retries, 2);
}

#[test]
fn migration_keeps_existing_pipeline_section() {
    let config = parse_config(
        r#"{
            "region": "us-east-1",
            "storage": { "type": "memory" },
            "subject_key": "k",
            "pipeline": { "max_attempts": 5 }
        }"#,
    )
    .unwrap();
    assert_eq!(config.pipeline.max_attempts, 5);
    assert_eq!(config.pipeline.attempt_timeout_secs, 120);
    assert_eq!(config.retry_policy().max_attempts, 5);
}

#[test]
fn newer_versions_are_refused() {
    let err = parse_config(r#"{ "config_version": 9, "region": "x" }"#).unwrap_err();
    assert!(err.to_string().contains("newer than this build supports"));
}

#[test]
fn environment_overrides_win() {
    let mut config = parse_config(V0_CONFIG).unwrap();
    let env: HashMap<&str, &str> = [
        ("PRAXIS_BUCKET", "other-bucket"),
        ("AWS_REGION", "us-east-2"),
        ("PRAXIS_MODEL_ID", ""),
        ("NCBI_API_KEY", "from-env"),
    ]
    .into_iter()
    .collect();

    apply_env_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));

    assert_eq!(
        config.storage,
        StorageBackend::S3 {
            bucket: "other-bucket".to_string()
        }
    );
    assert_eq!(config.region, "us-east-2");
    // Empty values are ignored.
    assert_eq!(config.model_id, "anthropic.claude-3-haiku");
    assert_eq!(config.literature.api_key.as_deref(), Some("from-env"));
    assert_eq!(config.subject_key, "0123456789abcdef");
}

#[test]
fn saved_config_round_trips_with_current_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");
    let config = parse_config(V0_CONFIG).unwrap();

    save_config_to(&config, &path).unwrap();
    let loaded = load_config_from(&path).unwrap();

    assert_eq!(loaded.config_version, 1);
    assert_eq!(loaded.region, config.region);
    assert_eq!(loaded.pipeline, config.pipeline);
    assert!(!path.with_extension("json.tmp").exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn missing_file_is_reported_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = load_config_from(&path).unwrap_err();
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn info_redacts_secrets() {
    let config = parse_config(V0_CONFIG).unwrap();
    let info = config_info(&config);
    assert_eq!(info.storage, "s3://praxis-data");
    assert_eq!(info.subject_key_hint, "0123...cdef");
    assert_eq!(info.literature_api_key_hint.as_deref(), Some("ncbi...-key"));

    let rendered = serde_json::to_string(&info).unwrap();
    assert!(!rendered.contains("0123456789abcdef"));
    assert!(!rendered.contains("ncbi-secret-key"));
}

#[test]
fn starter_config_uses_defaults() {
    let config = PraxisConfig::starter("eu-central-1", StorageBackend::Memory, "k".repeat(32));
    assert_eq!(config.config_version, 1);
    assert_eq!(config.model_id, "us.anthropic.claude-sonnet-4-20250514-v1:0");
    assert_eq!(config.pipeline, PipelineConfig::default());
    assert_eq!(config.literature.base_url, "https://eutils.ncbi.nlm.nih.gov/entrez/eutils");
}
