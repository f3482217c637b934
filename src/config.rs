// ABOUTME: TOML configuration for both hosts, the wake signal, and run timing
// ABOUTME: API keys and the notify token can be injected through environment variables

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::backup::Timing;

/// One NAS host: API base URL plus its bearer key.
#[derive(Debug, Clone, Deserialize)]
pub struct HostEndpoint {
    /// e.g. `http://192.168.1.3/api/v2.0`
    pub base_url: String,
    /// Empty here means the key arrives via the environment.
    #[serde(default)]
    pub api_key: String,
}

/// Where the wake-on-LAN packet goes.
#[derive(Debug, Clone, Deserialize)]
pub struct WakeConfig {
    pub mac_address: String,
    #[serde(default = "default_broadcast")]
    pub broadcast_address: String,
    #[serde(default = "default_wake_port")]
    pub port: u16,
}

/// Which tasks to run and how long each phase may take.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    pub task_names: Vec<String>,
    #[serde(default = "default_warmup_delay_secs")]
    pub warmup_delay_secs: u64,
    #[serde(default = "default_ready_poll_interval_secs")]
    pub ready_poll_interval_secs: u64,
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,
    #[serde(default = "default_monitor_timeout_secs")]
    pub monitor_timeout_secs: u64,
}

impl BackupConfig {
    pub fn timing(&self) -> Timing {
        Timing {
            warmup_delay: Duration::from_secs(self.warmup_delay_secs),
            ready_poll_interval: Duration::from_secs(self.ready_poll_interval_secs),
            ready_timeout: Duration::from_secs(self.ready_timeout_secs),
            monitor_interval: Duration::from_secs(self.monitor_interval_secs),
            monitor_timeout: Duration::from_secs(self.monitor_timeout_secs),
        }
    }
}

/// Optional push notification endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: HostEndpoint,
    pub destination: HostEndpoint,
    pub wake: WakeConfig,
    pub backup: BackupConfig,
    #[serde(default)]
    pub notify: Option<NotifyConfig>,
}

impl Config {
    /// Reads the file, overlays environment secrets, and validates.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Environment secrets win over file values so the file can stay
    /// key-free in version control.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("SOURCE_NAS_API_KEY") {
            self.source.api_key = key;
        }
        if let Some(key) = lookup("DEST_NAS_API_KEY") {
            self.destination.api_key = key;
        }
        if let Some(notify) = self.notify.as_mut() {
            if let Some(token) = lookup("NOTIFY_TOKEN") {
                notify.token = Some(token);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.source.api_key.is_empty() {
            bail!("source api key missing: set [source].api_key or SOURCE_NAS_API_KEY");
        }
        if self.destination.api_key.is_empty() {
            bail!("destination api key missing: set [destination].api_key or DEST_NAS_API_KEY");
        }
        Ok(())
    }
}

fn default_broadcast() -> String {
    "255.255.255.255".to_string()
}

fn default_wake_port() -> u16 {
    9
}

fn default_warmup_delay_secs() -> u64 {
    30
}

fn default_ready_poll_interval_secs() -> u64 {
    5
}

fn default_ready_timeout_secs() -> u64 {
    600
}

fn default_monitor_interval_secs() -> u64 {
    30
}

fn default_monitor_timeout_secs() -> u64 {
    21_600
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    const FULL_CONFIG: &str = r#"
[source]
base_url = "http://192.168.1.3/api/v2.0"
api_key = "src-key"

[destination]
base_url = "http://192.168.1.17/api/v2.0"
api_key = "dst-key"

[wake]
mac_address = "2A:14:6C:11:0F:C8"
broadcast_address = "192.168.1.255"
port = 7

[backup]
task_names = ["tank_nightly", "media_nightly"]
warmup_delay_secs = 45
ready_poll_interval_secs = 2
ready_timeout_secs = 300
monitor_interval_secs = 10
monitor_timeout_secs = 7200

[notify]
url = "https://ntfy.example/backups"
token = "file-token"
"#;

    const MINIMAL_CONFIG: &str = r#"
[source]
base_url = "http://192.168.1.3/api/v2.0"
api_key = "src-key"

[destination]
base_url = "http://192.168.1.17/api/v2.0"
api_key = "dst-key"

[wake]
mac_address = "2A:14:6C:11:0F:C8"

[backup]
task_names = ["tank_nightly"]
"#;

    #[test]
    fn parses_a_full_config() {
        let config: Config = toml::from_str(FULL_CONFIG).unwrap();
        assert_eq!(config.source.api_key, "src-key");
        assert_eq!(config.wake.broadcast_address, "192.168.1.255");
        assert_eq!(config.wake.port, 7);
        assert_eq!(
            config.backup.task_names,
            vec!["tank_nightly", "media_nightly"]
        );
        assert_eq!(config.backup.monitor_timeout_secs, 7200);
        assert_eq!(config.notify.unwrap().url, "https://ntfy.example/backups");
    }

    #[test]
    fn minimal_config_gets_the_documented_defaults() {
        let config: Config = toml::from_str(MINIMAL_CONFIG).unwrap();
        assert_eq!(config.wake.broadcast_address, "255.255.255.255");
        assert_eq!(config.wake.port, 9);
        assert_eq!(config.backup.warmup_delay_secs, 30);
        assert_eq!(config.backup.ready_poll_interval_secs, 5);
        assert_eq!(config.backup.ready_timeout_secs, 600);
        assert_eq!(config.backup.monitor_interval_secs, 30);
        assert_eq!(config.backup.monitor_timeout_secs, 21_600);
        assert!(config.notify.is_none());
    }

    #[test]
    fn timing_converts_seconds_to_durations() {
        let config: Config = toml::from_str(FULL_CONFIG).unwrap();
        let timing = config.backup.timing();
        assert_eq!(timing.warmup_delay, Duration::from_secs(45));
        assert_eq!(timing.monitor_timeout, Duration::from_secs(7200));
    }

    #[test]
    fn environment_overrides_file_secrets() {
        let mut config: Config = toml::from_str(FULL_CONFIG).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            ("SOURCE_NAS_API_KEY", "env-src"),
            ("DEST_NAS_API_KEY", "env-dst"),
            ("NOTIFY_TOKEN", "env-token"),
        ]);
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.source.api_key, "env-src");
        assert_eq!(config.destination.api_key, "env-dst");
        assert_eq!(config.notify.unwrap().token.as_deref(), Some("env-token"));
    }

    #[test]
    fn notify_token_is_ignored_without_a_notify_section() {
        let mut config: Config = toml::from_str(MINIMAL_CONFIG).unwrap();
        config.apply_env(|name| (name == "NOTIFY_TOKEN").then(|| "env-token".to_string()));
        assert!(config.notify.is_none());
    }

    #[test]
    fn missing_api_key_fails_validation() {
        let mut config: Config = toml::from_str(MINIMAL_CONFIG).unwrap();
        config.source.api_key.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SOURCE_NAS_API_KEY"));
    }

    #[test]
    fn empty_task_list_is_allowed() {
        let mut config: Config = toml::from_str(MINIMAL_CONFIG).unwrap();
        config.backup.task_names.clear();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_from_a_file_on_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL_CONFIG.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.destination.base_url, "http://192.168.1.17/api/v2.0");
    }

    #[test]
    fn unreadable_path_is_reported_with_the_path() {
        let err = Config::load(Path::new("/nonexistent/backup.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/backup.toml"));
    }
}
