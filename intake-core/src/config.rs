//! Intake configuration.
//!
//! Loaded from YAML (path in `INTAKE_CONFIG`), then overridden per key from
//! the environment:
//!
//! | Variable                   | Field               |
//! |----------------------------|---------------------|
//! | `INTAKE_LOOKUP_CEILING_MS` | `lookup_ceiling_ms` |
//! | `INTAKE_SUBMIT_DELAY_MS`   | `submit_delay_ms`   |
//! | `INTAKE_BIND_ADDR`         | `bind_addr`         |
//! | `INTAKE_SESSION_TTL_SECS`  | `session_ttl_secs`  |
//! | `INTAKE_LOOKUP_URL`        | `directory` → http  |

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::directory::DirectoryEntry;
use crate::error::ConfigError;

pub const CONFIG_PATH_ENV: &str = "INTAKE_CONFIG";

fn default_ceiling_ms() -> u64 {
    300
}

fn default_submit_delay_ms() -> u64 {
    1500
}

fn default_session_ttl_secs() -> u64 {
    1800
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_url_env() -> String {
    "DATABASE_URL".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntakeConfig {
    #[serde(default = "default_ceiling_ms")]
    pub lookup_ceiling_ms: u64,
    #[serde(default = "default_submit_delay_ms")]
    pub submit_delay_ms: u64,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub directory: DirectorySource,
}

/// Where company lookups are answered from.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectorySource {
    /// In-process table seeded from the config file.
    Memory {
        #[serde(default)]
        entries: Vec<DirectoryEntry>,
    },
    /// Remote lookup endpoint.
    Http {
        url: String,
        #[serde(default = "default_request_timeout_ms")]
        request_timeout_ms: u64,
    },
    /// `company_lookup` table; connection string read from `url_env`.
    Postgres {
        #[serde(default = "default_url_env")]
        url_env: String,
    },
}

impl Default for DirectorySource {
    fn default() -> Self {
        DirectorySource::Memory {
            entries: Vec::new(),
        }
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            lookup_ceiling_ms: default_ceiling_ms(),
            submit_delay_ms: default_submit_delay_ms(),
            session_ttl_secs: default_session_ttl_secs(),
            bind_addr: default_bind_addr(),
            directory: DirectorySource::default(),
        }
    }
}

impl IntakeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// File named by `INTAKE_CONFIG` (defaults when unset), then env overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = var("INTAKE_LOOKUP_CEILING_MS") {
            self.lookup_ceiling_ms = parse_u64("INTAKE_LOOKUP_CEILING_MS", v)?;
        }
        if let Some(v) = var("INTAKE_SUBMIT_DELAY_MS") {
            self.submit_delay_ms = parse_u64("INTAKE_SUBMIT_DELAY_MS", v)?;
        }
        if let Some(v) = var("INTAKE_SESSION_TTL_SECS") {
            self.session_ttl_secs = parse_u64("INTAKE_SESSION_TTL_SECS", v)?;
        }
        if let Some(v) = var("INTAKE_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(url) = var("INTAKE_LOOKUP_URL") {
            self.directory = DirectorySource::Http {
                url,
                request_timeout_ms: default_request_timeout_ms(),
            };
        }
        Ok(())
    }

    pub fn ceiling(&self) -> Duration {
        Duration::from_millis(self.lookup_ceiling_ms)
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    /// How long an untouched session is kept before the sweeper drops it.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

fn parse_u64(key: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_reference_policy() {
        let c = IntakeConfig::default();
        assert_eq!(c.ceiling(), Duration::from_millis(300));
        assert_eq!(c.submit_delay(), Duration::from_millis(1500));
        assert_eq!(c.session_ttl(), Duration::from_secs(1800));
        assert_eq!(c.directory, DirectorySource::default());
    }

    #[test]
    fn parses_memory_directory_seed() {
        let c = IntakeConfig::from_yaml(
            r#"
lookup_ceiling_ms: 250
directory:
  kind: memory
  entries:
    - domain: acme.io
      name: Acme
      min_size: 11
      max_size: 50
"#,
        )
        .unwrap();
        assert_eq!(c.lookup_ceiling_ms, 250);
        assert_eq!(c.submit_delay_ms, 1500);
        match c.directory {
            DirectorySource::Memory { entries } => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].name, "Acme");
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn postgres_source_defaults_url_env() {
        let c = IntakeConfig::from_yaml("directory:\n  kind: postgres\n").unwrap();
        assert_eq!(
            c.directory,
            DirectorySource::Postgres {
                url_env: "DATABASE_URL".into()
            }
        );
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("INTAKE_LOOKUP_CEILING_MS", "120"),
            ("INTAKE_SESSION_TTL_SECS", "90"),
            ("INTAKE_LOOKUP_URL", "http://directory.internal/api/lookup"),
        ]
        .into_iter()
        .collect();
        let mut c = IntakeConfig::default();
        c.apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(c.ceiling(), Duration::from_millis(120));
        assert_eq!(c.session_ttl(), Duration::from_secs(90));
        assert_eq!(
            c.directory,
            DirectorySource::Http {
                url: "http://directory.internal/api/lookup".into(),
                request_timeout_ms: 5000,
            }
        );
    }

    #[test]
    fn http_source_takes_request_timeout() {
        let c = IntakeConfig::from_yaml(
            "directory:\n  kind: http\n  url: http://dir/api/lookup\n  request_timeout_ms: 750\n",
        )
        .unwrap();
        assert_eq!(
            c.directory,
            DirectorySource::Http {
                url: "http://dir/api/lookup".into(),
                request_timeout_ms: 750,
            }
        );
    }

    #[test]
    fn bad_env_value_is_an_error() {
        let mut c = IntakeConfig::default();
        let err = c
            .apply_overrides(|k| (k == "INTAKE_SUBMIT_DELAY_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                key: "INTAKE_SUBMIT_DELAY_MS",
                ..
            }
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = IntakeConfig::from_file("/nonexistent/intake.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/intake.yaml"));
    }
}
