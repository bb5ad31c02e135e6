//! Broker configuration
//!
//! Loaded from an optional TOML file, then overridden by `TOOLGATE_*`
//! environment variables so deployments can tune limits without
//! editing files.

use crate::tools::registry::RegistryFilter;
use crate::tools::validate::TargetPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_timeout_secs() -> u64 {
    300
}

fn default_stdout_limit() -> usize {
    1024 * 1024
}

fn default_stderr_limit() -> usize {
    256 * 1024
}

fn default_concurrency() -> usize {
    2
}

fn default_max_arguments_len() -> usize {
    1024
}

fn default_lab_suffix() -> String {
    "lab.internal".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Deadline for tools whose descriptor and request carry none
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// stdout byte ceiling (scanners are stdout-verbose, so larger)
    #[serde(default = "default_stdout_limit")]
    pub stdout_limit_bytes: usize,

    /// stderr byte ceiling
    #[serde(default = "default_stderr_limit")]
    pub stderr_limit_bytes: usize,

    /// Concurrency for tool classes without an explicit limit
    #[serde(default = "default_concurrency")]
    pub default_concurrency: usize,

    /// Upper bound on the raw extra-arguments string
    #[serde(default = "default_max_arguments_len")]
    pub max_arguments_len: usize,

    /// Domain suffix that authorizes hostname/URL targets
    #[serde(default = "default_lab_suffix")]
    pub lab_suffix: String,

    /// When non-empty, only these tools are registered
    #[serde(default)]
    pub include_tools: Vec<String>,

    /// Tools never registered in this deployment
    #[serde(default)]
    pub exclude_tools: Vec<String>,

    /// Audit log path; stderr when unset
    #[serde(default)]
    pub audit_log: Option<PathBuf>,

    /// How long shutdown waits for in-flight executions
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty config must deserialize via defaults")
    }
}

impl BrokerConfig {
    /// Load from an explicit path, else `TOOLGATE_CONFIG`, else
    /// defaults; environment overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("TOOLGATE_CONFIG").ok().map(PathBuf::from);
        let path = path.map(Path::to_path_buf).or(env_path);

        let mut config = match path {
            Some(path) => {
                let contents = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                toml::from_str(&contents)
                    .with_context(|| format!("failed to parse config {}", path.display()))?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse("TOOLGATE_DEFAULT_TIMEOUT_SECS") {
            self.default_timeout_secs = v;
        }
        if let Some(v) = env_parse("TOOLGATE_STDOUT_LIMIT_BYTES") {
            self.stdout_limit_bytes = v;
        }
        if let Some(v) = env_parse("TOOLGATE_STDERR_LIMIT_BYTES") {
            self.stderr_limit_bytes = v;
        }
        if let Some(v) = env_parse("TOOLGATE_DEFAULT_CONCURRENCY") {
            self.default_concurrency = v;
        }
        if let Some(v) = env_parse("TOOLGATE_MAX_ARGUMENTS_LEN") {
            self.max_arguments_len = v;
        }
        if let Ok(v) = std::env::var("TOOLGATE_LAB_SUFFIX") {
            self.lab_suffix = v;
        }
        if let Some(v) = env_list("TOOLGATE_INCLUDE_TOOLS") {
            self.include_tools = v;
        }
        if let Some(v) = env_list("TOOLGATE_EXCLUDE_TOOLS") {
            self.exclude_tools = v;
        }
        if let Ok(v) = std::env::var("TOOLGATE_AUDIT_LOG") {
            self.audit_log = Some(PathBuf::from(v));
        }
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn target_policy(&self) -> TargetPolicy {
        TargetPolicy {
            lab_suffix: self.lab_suffix.clone(),
            max_arguments_len: self.max_arguments_len,
        }
    }

    pub fn registry_filter(&self) -> RegistryFilter {
        RegistryFilter {
            include: self.include_tools.clone(),
            exclude: self.exclude_tools.clone(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.parse().ok()
}

fn env_list(name: &str) -> Option<Vec<String>> {
    let raw = std::env::var(name).ok()?;
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BrokerConfig::default();
        assert_eq!(config.default_timeout_secs, 300);
        assert_eq!(config.stdout_limit_bytes, 1024 * 1024);
        assert_eq!(config.stderr_limit_bytes, 256 * 1024);
        assert!(config.stdout_limit_bytes > config.stderr_limit_bytes);
        assert_eq!(config.default_concurrency, 2);
        assert_eq!(config.lab_suffix, "lab.internal");
        assert!(config.include_tools.is_empty());
    }

    #[test]
    fn test_parse_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolgate.toml");
        fs::write(
            &path,
            "default_timeout_secs = 60\nexclude_tools = [\"hydra\"]\n",
        )
        .unwrap();

        let config = BrokerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.default_timeout_secs, 60);
        assert_eq!(config.exclude_tools, vec!["hydra"]);
        // Unspecified fields keep their defaults
        assert_eq!(config.default_concurrency, 2);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(BrokerConfig::load(Some(Path::new("/nonexistent/toolgate.toml"))).is_err());
    }

    #[test]
    fn test_policy_projection() {
        let mut config = BrokerConfig::default();
        config.lab_suffix = "corp.test".to_string();
        config.max_arguments_len = 512;

        let policy = config.target_policy();
        assert_eq!(policy.lab_suffix, "corp.test");
        assert_eq!(policy.max_arguments_len, 512);
    }
}
