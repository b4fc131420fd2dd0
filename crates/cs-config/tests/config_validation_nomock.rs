//! No-mock policy validation + resolution tests.
//!
//! Covers:
//! - Policy validation against real JSON files
//! - Resolution order (CLI > CROWDSENSE_POLICY > CROWDSENSE_CONFIG_DIR)
//! - Snapshot provenance

use cs_config::resolve::{resolve_config, ConfigSource, ENV_CONFIG_DIR, ENV_POLICY_PATH};
use cs_config::snapshot::hash_content;
use cs_config::{load_policy, EstimatorModel, FraudBaseline, Policy, ValidationError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.keys.iter().zip(self.saved.iter()) {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

fn write_policy(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write policy fixture");
    path
}

const LEGACY_FLAT: &str = r#"{
  "schema_version": "1.0.0",
  "policy_id": "legacy-flat",
  "estimator": { "model": "flat_v1" },
  "fraud": { "baseline": "including_new" }
}"#;

// ============================================================================
// Validation
// ============================================================================

#[test]
fn legacy_flat_policy_is_valid() {
    let policy = Policy::from_json_str(LEGACY_FLAT).unwrap();
    policy.validate().unwrap();
    assert_eq!(policy.policy_id.as_deref(), Some("legacy-flat"));
    assert_eq!(policy.estimator.model, EstimatorModel::FlatV1);
    assert_eq!(policy.fraud.baseline, FraudBaseline::IncludingNew);
}

#[test]
fn malformed_json_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_policy(dir.path(), "policy.json", "{ not json");
    match Policy::from_file(&path) {
        Err(ValidationError::ParseError(_)) => {}
        other => panic!("expected ParseError, got {:?}", other),
    }
}

#[test]
fn wrong_field_type_is_a_parse_error() {
    let err = Policy::from_json_str(
        r#"{"schema_version": "1.0.0", "cooldown": {"minutes": "ten"}}"#,
    )
    .unwrap_err();
    assert_eq!(err.code(), 61);
}

#[test]
fn future_schema_version_rejected() {
    let policy = Policy::from_json_str(r#"{"schema_version": "2.0.0"}"#).unwrap();
    assert!(matches!(
        policy.validate(),
        Err(ValidationError::VersionMismatch { .. })
    ));
}

// ============================================================================
// Resolution order
// ============================================================================

#[test]
fn cli_beats_environment() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&[ENV_POLICY_PATH, ENV_CONFIG_DIR]);
    let dir = TempDir::new().unwrap();
    let cli = write_policy(dir.path(), "cli.json", r#"{"schema_version": "1.0.0"}"#);
    let from_env = write_policy(dir.path(), "env.json", LEGACY_FLAT);
    env::set_var(ENV_POLICY_PATH, &from_env);

    let paths = resolve_config(Some(&cli)).unwrap();
    assert_eq!(paths.policy_source, ConfigSource::CliArgument);
    assert_eq!(paths.policy.as_deref(), Some(cli.as_path()));
}

#[test]
fn policy_env_var_beats_config_dir() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&[ENV_POLICY_PATH, ENV_CONFIG_DIR]);
    let dir = TempDir::new().unwrap();
    let direct = write_policy(dir.path(), "direct.json", LEGACY_FLAT);
    let config_dir = dir.path().join("conf");
    fs::create_dir_all(&config_dir).unwrap();
    write_policy(&config_dir, "policy.json", r#"{"schema_version": "1.0.0"}"#);

    env::set_var(ENV_POLICY_PATH, &direct);
    env::set_var(ENV_CONFIG_DIR, &config_dir);

    let paths = resolve_config(None).unwrap();
    assert_eq!(paths.policy_source, ConfigSource::Environment);
    assert_eq!(paths.policy.as_deref(), Some(direct.as_path()));
}

#[test]
fn config_dir_env_var_used_when_direct_path_missing() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&[ENV_POLICY_PATH, ENV_CONFIG_DIR]);
    let dir = TempDir::new().unwrap();
    write_policy(dir.path(), "policy.json", LEGACY_FLAT);

    env::set_var(ENV_POLICY_PATH, dir.path().join("missing.json"));
    env::set_var(ENV_CONFIG_DIR, dir.path());

    let loaded = load_policy(None).unwrap();
    assert_eq!(loaded.paths.policy_source, ConfigSource::Environment);
    assert_eq!(loaded.policy.estimator.model, EstimatorModel::FlatV1);
    assert_eq!(
        loaded.snapshot.policy_hash.as_deref(),
        Some(hash_content(LEGACY_FLAT).as_str())
    );
    assert_eq!(loaded.snapshot.summary.lookback_minutes, 15);
}
