//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG paths → system → defaults.

use std::path::{Path, PathBuf};

use crate::policy::Policy;
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_policy, ValidationError, ValidationResult};

/// Discovered configuration file paths.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to policy.json (or None if not found).
    pub policy: Option<PathBuf>,

    /// Source of the policy config (for diagnostics).
    pub policy_source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/crowdsense/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_POLICY_PATH: &str = "CROWDSENSE_POLICY";
pub const ENV_CONFIG_DIR: &str = "CROWDSENSE_CONFIG_DIR";

/// Standard config file name.
const POLICY_FILENAME: &str = "policy.json";

/// Application name for XDG directories.
const APP_NAME: &str = "crowdsense";

/// Resolve the policy path using the standard resolution order.
///
/// 1. Explicit CLI path. Must exist; a typo should not silently fall back.
/// 2. `CROWDSENSE_POLICY`
/// 3. `CROWDSENSE_CONFIG_DIR` + policy.json
/// 4. XDG config directory (~/.config/crowdsense/)
/// 5. System config (/etc/crowdsense/)
/// 6. Built-in defaults (None)
pub fn resolve_config(cli_policy: Option<&Path>) -> ValidationResult<ConfigPaths> {
    let mut paths = ConfigPaths::default();

    if let Some(path) = cli_policy {
        if !path.exists() {
            return Err(ValidationError::IoError(format!(
                "policy file not found: {}",
                path.display()
            )));
        }
        paths.policy = Some(path.to_path_buf());
        paths.policy_source = ConfigSource::CliArgument;
        return Ok(paths);
    }

    paths.policy = resolve_discovered(POLICY_FILENAME, &mut paths.policy_source);
    Ok(paths)
}

/// Walk the non-CLI sources for a config file.
fn resolve_discovered(filename: &str, source: &mut ConfigSource) -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var(ENV_POLICY_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            *source = ConfigSource::Environment;
            return Some(path);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(filename);
        if path.exists() {
            *source = ConfigSource::Environment;
            return Some(path);
        }
    }

    if let Some(xdg_config) = dirs::config_dir() {
        let path = xdg_config.join(APP_NAME).join(filename);
        if path.exists() {
            *source = ConfigSource::XdgConfig;
            return Some(path);
        }
    }

    let system_path = system_config_dir().join(filename);
    if system_path.exists() {
        *source = ConfigSource::SystemConfig;
        return Some(system_path);
    }

    *source = ConfigSource::BuiltinDefault;
    None
}

/// Get the XDG config directory for crowdsense.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

/// A resolved, parsed and validated policy with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedPolicy {
    pub policy: Policy,
    pub paths: ConfigPaths,
    pub snapshot: ConfigSnapshot,
}

/// Resolve, read, parse and validate the policy.
pub fn load_policy(cli_policy: Option<&Path>) -> ValidationResult<LoadedPolicy> {
    let paths = resolve_config(cli_policy)?;

    let (policy, content) = match &paths.policy {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;
            (Policy::from_json_str(&content)?, Some(content))
        }
        None => (Policy::default(), None),
    };

    validate_policy(&policy)?;
    let snapshot = ConfigSnapshot::new(&policy, &paths, content.as_deref());

    Ok(LoadedPolicy {
        policy,
        paths,
        snapshot,
    })
}
