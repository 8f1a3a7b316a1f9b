use coverage_notifications::{DEFAULT_SUBJECT, NatsSettings};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Event bus receiving eligibility responses
    #[serde(default)]
    pub event_bus: EventBusConfig,
    /// Eligibility response wording
    #[serde(default)]
    pub eligibility: EligibilityConfig,
    #[serde(default)]
    pub references: ReferencesConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Event bus validation
        let bus = &self.event_bus;
        if bus.subject.trim().is_empty() {
            return Err("event_bus.subject must not be empty".into());
        }
        if bus.backend == BusBackend::Nats {
            if bus.server_address.trim().is_empty() {
                return Err("event_bus.backend=nats requires event_bus.server_address".into());
            }
            if bus.connect_timeout_ms == 0 {
                return Err("event_bus.connect_timeout_ms must be > 0".into());
            }
        }
        if bus.nkey_seed.is_some() && bus.nkey_seed_file.is_some() {
            return Err("event_bus.nkey_seed and event_bus.nkey_seed_file are mutually exclusive".into());
        }
        // Eligibility validation
        if self.eligibility.in_force_disposition.trim().is_empty()
            || self.eligibility.not_in_force_disposition.trim().is_empty()
        {
            return Err("eligibility dispositions must not be empty".into());
        }
        if self.eligibility.identifier_system.trim().is_empty() {
            return Err("eligibility.identifier_system must not be empty".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusBackend {
    /// NATS JetStream
    #[default]
    Nats,
    /// In-process bus, for local runs and tests
    Memory,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EventBusConfig {
    #[serde(default)]
    pub backend: BusBackend,
    #[serde(default = "default_server_address")]
    pub server_address: String,
    /// NKey seed; prefer COVERAGE__EVENT_BUS__NKEY_SEED or a seed file
    #[serde(default)]
    pub nkey_seed: Option<String>,
    #[serde(default)]
    pub nkey_seed_file: Option<PathBuf>,
    /// CA certificate the server's TLS certificate must chain to
    #[serde(default)]
    pub ca_file: Option<PathBuf>,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_server_address() -> String {
    "tls://nats-server:4222".into()
}
fn default_client_name() -> String {
    "coverage-contract".into()
}
fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_subject() -> String {
    DEFAULT_SUBJECT.into()
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            backend: BusBackend::default(),
            server_address: default_server_address(),
            nkey_seed: None,
            nkey_seed_file: None,
            ca_file: None,
            client_name: default_client_name(),
            connect_timeout_ms: default_connect_timeout_ms(),
            subject: default_subject(),
        }
    }
}

impl EventBusConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Connection settings for the NATS adapter, reading the seed file if one
    /// is configured.
    pub fn nats_settings(&self) -> Result<NatsSettings, String> {
        let nkey_seed = match (&self.nkey_seed, &self.nkey_seed_file) {
            (Some(seed), _) => Some(seed.trim().to_string()),
            (None, Some(path)) => {
                let seed = std::fs::read_to_string(path).map_err(|e| {
                    format!("failed to read nkey seed file {}: {e}", path.display())
                })?;
                Some(seed.trim().to_string())
            }
            (None, None) => None,
        };

        Ok(NatsSettings {
            server_address: self.server_address.clone(),
            nkey_seed,
            ca_file: self.ca_file.clone(),
            client_name: self.client_name.clone(),
            connect_timeout: self.connect_timeout(),
        })
    }
}

impl std::fmt::Debug for EventBusConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBusConfig")
            .field("backend", &self.backend)
            .field("server_address", &self.server_address)
            .field("nkey_seed", &self.nkey_seed.as_ref().map(|_| "***"))
            .field("nkey_seed_file", &self.nkey_seed_file)
            .field("ca_file", &self.ca_file)
            .field("client_name", &self.client_name)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("subject", &self.subject)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityConfig {
    /// Prefix of the response identifier system; the response id is appended
    #[serde(default = "default_identifier_system")]
    pub identifier_system: String,
    #[serde(default = "default_in_force_disposition")]
    pub in_force_disposition: String,
    #[serde(default = "default_not_in_force_disposition")]
    pub not_in_force_disposition: String,
}

fn default_identifier_system() -> String {
    "http://localhost:5000/fhir/coverageeligibilityresponse/".into()
}
fn default_in_force_disposition() -> String {
    "Policy is currently in effect.".into()
}
fn default_not_in_force_disposition() -> String {
    "Policy is not in effect.".into()
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            identifier_system: default_identifier_system(),
            in_force_disposition: default_in_force_disposition(),
            not_in_force_disposition: default_not_in_force_disposition(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReferencesConfig {
    /// Absolute references under this base resolve as local `Type/id`
    #[serde(default)]
    pub base_url: Option<String>,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    /// Default configuration file, looked up in the working directory
    pub const DEFAULT_CONFIG_FILE: &str = "coverage.toml";

    /// Load configuration from `path` (or [`DEFAULT_CONFIG_FILE`] when it
    /// exists), layered under `COVERAGE__*` environment variables.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if !pathbuf.exists() {
                    return Err(format!("configuration file {p} does not exist"));
                }
                builder = builder.add_source(File::from(pathbuf));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., COVERAGE__EVENT_BUS__BACKEND=memory
        builder = builder.add_source(
            Environment::with_prefix("COVERAGE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_with_default_path<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<AppConfig, String> {
        let p = path
            .as_ref()
            .map(|p| p.as_ref().to_string_lossy().to_string());
        load_config(p.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.event_bus.backend, BusBackend::Nats);
        assert_eq!(cfg.event_bus.server_address, "tls://nats-server:4222");
        assert_eq!(cfg.event_bus.subject, "EVENTS.coverageeligibilityresponse");
        assert_eq!(cfg.event_bus.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_validation_rules() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.event_bus.subject = "  ".into();
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.event_bus.server_address = String::new();
        assert!(cfg.validate().is_err());
        cfg.event_bus.backend = BusBackend::Memory;
        assert!(cfg.validate().is_ok());

        let mut cfg = AppConfig::default();
        cfg.event_bus.nkey_seed = Some("SUAEXAMPLE".into());
        cfg.event_bus.nkey_seed_file = Some(PathBuf::from("/run/secrets/nkey"));
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.eligibility.not_in_force_disposition = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_seed_is_redacted_in_debug() {
        let mut cfg = EventBusConfig::default();
        cfg.nkey_seed = Some("SUASECRETSEED".into());
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("SUASECRETSEED"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_nats_settings_from_inline_seed() {
        let mut cfg = EventBusConfig::default();
        cfg.nkey_seed = Some(" SUASEED \n".into());
        cfg.ca_file = Some(PathBuf::from("/etc/nats/ca.pem"));
        let settings = cfg.nats_settings().unwrap();
        assert_eq!(settings.nkey_seed.as_deref(), Some("SUASEED"));
        assert_eq!(settings.ca_file, Some(PathBuf::from("/etc/nats/ca.pem")));
        assert_eq!(settings.client_name, "coverage-contract");
    }

    #[test]
    fn test_missing_seed_file_is_reported() {
        let mut cfg = EventBusConfig::default();
        cfg.nkey_seed_file = Some(PathBuf::from("/nonexistent/coverage/nkey"));
        let err = cfg.nats_settings().unwrap_err();
        assert!(err.contains("nkey seed file"));
    }
}
