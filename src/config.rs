use std::{
    collections::HashMap,
    fs::{self, File},
    io::prelude::*,
    path::Path,
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{logging::SessionLogger, proto::Key};

/// Front-end settings, loaded from `settings.toml`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    /// Unique instance name or identifier.
    #[serde(default = "default_inst")]
    pub inst: String,

    /// Socket address to bind to, e.g. "0.0.0.0:25565".
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Maximum concurrent client connections.
    #[serde(default = "default_max_conn")]
    pub max_conn: u32,

    /// New connections allowed per second from one address.
    #[serde(default = "default_conn_per_sec")]
    pub conn_per_sec: u32,

    /// Cooldown (seconds) applied once an address is rate-limited.
    #[serde(default = "default_cooldown")]
    pub cooldown: u64,

    /// Status message shown in the server list.
    #[serde(default = "default_motd")]
    pub motd: String,

    #[serde(default = "default_max_players")]
    pub max_players: u32,

    /// Seconds sessions get to finish on shutdown before cleanup is forced.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,

    /// Plugin channels probed during login.
    #[serde(default = "default_probe_channels")]
    pub login_probe_channels: Vec<String>,

    /// Disconnect reason sent once login has nowhere to go.
    #[serde(default = "default_no_backend_reason")]
    pub no_backend_reason: String,

    #[serde(flatten)]
    pub other_fields: HashMap<String, toml::Value>,
}

fn default_inst() -> String {
    "main".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:25577".to_string()
}

fn default_max_conn() -> u32 {
    65535
}

fn default_conn_per_sec() -> u32 {
    8
}

fn default_cooldown() -> u64 {
    3
}

fn default_motd() -> String {
    "A Lure session front".to_string()
}

fn default_max_players() -> u32 {
    100
}

fn default_shutdown_grace() -> u64 {
    10
}

fn default_probe_channels() -> Vec<String> {
    vec!["lure:probe".to_string()]
}

fn default_no_backend_reason() -> String {
    "No backend server is available right now.".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inst: default_inst(),
            bind: default_bind(),
            max_conn: default_max_conn(),
            conn_per_sec: default_conn_per_sec(),
            cooldown: default_cooldown(),
            motd: default_motd(),
            max_players: default_max_players(),
            shutdown_grace_secs: default_shutdown_grace(),
            login_probe_channels: default_probe_channels(),
            no_backend_reason: default_no_backend_reason(),
            other_fields: HashMap::new(),
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self, SessionConfigLoadError> {
        let raw = fs::read_to_string(path).map_err(SessionConfigLoadError::Io)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, SessionConfigLoadError> {
        let config: Self = toml::from_str(raw).map_err(SessionConfigLoadError::Parse)?;
        for key in config.other_fields.keys() {
            SessionLogger::config_unknown_field(key);
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SessionConfigLoadError> {
        if let Some(bad) = self
            .login_probe_channels
            .iter()
            .find(|channel| Key::parse(channel).is_err())
        {
            return Err(SessionConfigLoadError::Invalid(format!(
                "login_probe_channels entry '{bad}' is not a namespaced key"
            )));
        }
        if self.conn_per_sec == 0 {
            return Err(SessionConfigLoadError::Invalid(
                "conn_per_sec must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let config_str = toml::to_string(&self)?;
        let mut file = File::create(path)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionConfigLoadError {
    #[error("Could not open config")]
    Io(#[from] std::io::Error),
    #[error("Could not parse")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = SessionConfig::parse("motd = \"hello\"\n").unwrap();
        assert_eq!(config.motd, "hello");
        assert_eq!(config.shutdown_grace(), Duration::from_secs(10));
        assert_eq!(config.login_probe_channels, vec!["lure:probe".to_string()]);
    }

    #[test]
    fn unknown_fields_are_kept() {
        let config = SessionConfig::parse("shiny = true\n").unwrap();
        assert!(config.other_fields.contains_key("shiny"));
    }

    #[test]
    fn bad_probe_channel_is_rejected() {
        let err = SessionConfig::parse("login_probe_channels = [\"Bad Channel\"]\n").unwrap_err();
        assert!(matches!(err, SessionConfigLoadError::Invalid(_)));
    }

    #[test]
    fn saved_config_parses_back() {
        let raw = toml::to_string(&SessionConfig::default()).unwrap();
        let config = SessionConfig::parse(&raw).unwrap();
        assert_eq!(config.bind, default_bind());
        assert!(config.other_fields.is_empty());
    }
}
