//! Client configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/hubchat/client.toml`
//! - Windows: `%APPDATA%/hubchat/client.toml`
//!
//! `HUBCHAT_HUB_URL`, `HUBCHAT_USER_ID` and `HUBCHAT_CHAT_ID` override the
//! file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Local development hub.
pub const DEFAULT_HUB_URL: &str = "http://localhost:5000/chathub";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Hub endpoint (`ws`, `wss`, `http` or `https`).
    #[serde(default = "default_hub_url")]
    pub hub_url: String,

    /// Identity used as sender. Empty means "not signed in".
    #[serde(default)]
    pub user_id: String,

    /// Conversation selected at startup. Empty means none.
    #[serde(default)]
    pub chat_id: String,

    /// Name announced to the hub (hostname by default).
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// `EnvFilter` directive used when neither `RUST_LOG` nor
    /// `HUBCHAT_LOG` is set.
    #[serde(default)]
    pub log_filter: String,
}

fn default_hub_url() -> String {
    DEFAULT_HUB_URL.into()
}

fn default_client_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "hubchat".into())
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hub_url: default_hub_url(),
            user_id: String::new(),
            chat_id: String::new(),
            client_name: default_client_name(),
            log_filter: String::new(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from disk, creating a default file if none exists.
    ///
    /// An unreadable or malformed file falls back to defaults; the error is
    /// handed back for logging. Environment overrides apply either way.
    pub fn load_or_default() -> (Self, Option<anyhow::Error>) {
        let loaded = config_path().and_then(|path| Self::load_from(&path));
        Self::resolve(loaded, |key| std::env::var(key).ok())
    }

    fn resolve(
        loaded: anyhow::Result<Self>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> (Self, Option<anyhow::Error>) {
        let (mut config, error) = match loaded {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        };
        config.apply_overrides(lookup);
        (config, error)
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: ClientConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = ClientConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Applies `HUBCHAT_*` overrides. Blank values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("HUBCHAT_HUB_URL") {
            self.hub_url = url;
        }
        if let Some(user) = get("HUBCHAT_USER_ID") {
            self.user_id = user;
        }
        if let Some(chat) = get("HUBCHAT_CHAT_ID") {
            self.chat_id = chat;
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        non_empty(&self.user_id)
    }

    pub fn chat_id(&self) -> Option<&str> {
        non_empty(&self.chat_id)
    }

    pub fn log_filter(&self) -> Option<&str> {
        non_empty(&self.log_filter)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("hubchat").join("client.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("hubchat")
            .join("client.toml"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.hub_url, DEFAULT_HUB_URL);
        assert!(!config.client_name.is_empty());
        assert!(config.user_id().is_none());
        assert!(config.chat_id().is_none());
        assert!(config.log_filter().is_none());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = ClientConfig {
            hub_url: "wss://chat.example.com/hub".into(),
            user_id: "alice".into(),
            chat_id: "general".into(),
            client_name: "laptop".into(),
            log_filter: "debug".into(),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ClientConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn config_partial_toml() {
        let config: ClientConfig = toml::from_str(r#"user_id = "bob""#).unwrap();
        assert_eq!(config.user_id(), Some("bob"));
        assert_eq!(config.hub_url, DEFAULT_HUB_URL);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("client.toml");

        let config = ClientConfig::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.hub_url, DEFAULT_HUB_URL);
        let reloaded = ClientConfig::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("client.toml");
        std::fs::write(&path, "hub_url = [not toml").unwrap();

        assert!(ClientConfig::load_from(&path).is_err());
    }

    #[test]
    fn env_overrides_win_over_file() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("HUBCHAT_HUB_URL", "ws://10.0.0.5:5000/chathub"),
            ("HUBCHAT_USER_ID", "carol"),
            ("HUBCHAT_CHAT_ID", "  "),
        ]);
        let mut config = ClientConfig {
            chat_id: "general".into(),
            ..ClientConfig::default()
        };

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.hub_url, "ws://10.0.0.5:5000/chathub");
        assert_eq!(config.user_id(), Some("carol"));
        assert_eq!(config.chat_id(), Some("general"));
    }

    #[test]
    fn env_overrides_survive_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("client.toml");
        std::fs::write(&path, "hub_url = [not toml").unwrap();
        let env: HashMap<&str, &str> =
            HashMap::from([("HUBCHAT_HUB_URL", "ws://10.0.0.5:5000/chathub")]);

        let (config, error) = ClientConfig::resolve(ClientConfig::load_from(&path), |key| {
            env.get(key).map(|v| v.to_string())
        });

        assert!(error.is_some());
        assert_eq!(config.hub_url, "ws://10.0.0.5:5000/chathub");
        assert!(config.user_id().is_none());
    }

    #[test]
    fn resolve_keeps_loaded_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("client.toml");
        std::fs::write(&path, "user_id = \"bob\"\nchat_id = \"general\"\n").unwrap();

        let (config, error) = ClientConfig::resolve(ClientConfig::load_from(&path), |_| None);

        assert!(error.is_none());
        assert_eq!(config.user_id(), Some("bob"));
        assert_eq!(config.chat_id(), Some("general"));
    }

    #[test]
    fn config_path_not_empty() {
        let path = config_path().unwrap();
        assert!(path.to_string_lossy().contains("hubchat"));
    }
}
