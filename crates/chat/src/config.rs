use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{ConfigResult, ExtractSnafu};

pub const DEFAULT_PROVIDER_ID: &str = "openai";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const CONFIG_DIRECTORY_NAME: &str = "confab";
pub const CONFIG_FILE_NAME: &str = "settings.json";
pub const ENV_PREFIX: &str = "CONFAB_";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_provider_id")]
    pub provider_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub max_tokens: Option<u64>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    #[serde(default)]
    pub theme_mode: ThemeChoice,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider_id: default_provider_id(),
            api_key: String::new(),
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: None,
            system_prompt: None,
            export_dir: None,
            theme_mode: ThemeChoice::default(),
        }
    }
}

impl ChatConfig {
    /// Builds the layered source: defaults, then the settings file, then
    /// `CONFAB_*` environment variables.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(ChatConfig::default()))
            .merge(Json::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn extract(figment: &Figment) -> ConfigResult<Self> {
        let config = figment.extract::<ChatConfig>().context(ExtractSnafu {
            stage: "extract-chat-config",
        })?;
        Ok(config.normalized())
    }

    pub fn normalized(mut self) -> Self {
        self.provider_id = non_blank(self.provider_id).unwrap_or_else(default_provider_id);
        self.endpoint = non_blank(self.endpoint).unwrap_or_else(default_endpoint);
        self.model = non_blank(self.model).unwrap_or_else(default_model);
        self.api_key = non_blank(self.api_key)
            .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok().and_then(non_blank))
            .unwrap_or_default();
        self.system_prompt = self.system_prompt.and_then(non_blank);
        self
    }

    /// Where exported transcripts land: the configured directory, else the
    /// platform download directory.
    pub fn export_directory(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Process-wide, read-mostly view of the loaded configuration.
pub struct ConfigStore {
    config: Arc<ArcSwap<ChatConfig>>,
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(CONFIG_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".confab"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(CONFIG_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let config = Self::load_from_disk(&config_path);
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config(&self) -> Arc<ChatConfig> {
        self.config.load_full()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Re-reads the file and environment, swapping in the result.
    pub fn reload(&self) -> Arc<ChatConfig> {
        let config = Arc::new(Self::load_from_disk(&self.config_path));
        self.config.store(config.clone());
        config
    }

    fn load_from_disk(path: &Path) -> ChatConfig {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
        }

        match ChatConfig::extract(&ChatConfig::figment(path)) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!("{error}. using defaults");
                ChatConfig::default().normalized()
            }
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn default_provider_id() -> String {
    DEFAULT_PROVIDER_ID.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env(OPENAI_API_KEY_ENV, "");
            let store = ConfigStore::new(jail.directory().join(CONFIG_FILE_NAME));
            assert_eq!(*store.config(), ChatConfig::default());
            Ok(())
        });
    }

    #[test]
    fn file_and_environment_are_layered() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE_NAME,
                r#"{
                    "provider_id": "echo",
                    "api_key": " from-file ",
                    "model": "gpt-4o",
                    "theme_mode": "dark",
                    "system_prompt": "   "
                }"#,
            )?;
            jail.set_env("CONFAB_MODEL", "from-env");
            jail.set_env("CONFAB_MAX_TOKENS", "512");

            let config = ConfigStore::new(jail.directory().join(CONFIG_FILE_NAME)).config();
            assert_eq!(config.provider_id, "echo");
            assert_eq!(config.api_key, "from-file");
            assert_eq!(config.model, "from-env");
            assert_eq!(config.max_tokens, Some(512));
            assert_eq!(config.theme_mode, ThemeChoice::Dark);
            assert_eq!(config.system_prompt, None);
            assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
            Ok(())
        });
    }

    #[test]
    fn api_key_falls_back_to_openai_variable() {
        Jail::expect_with(|jail| {
            jail.set_env(OPENAI_API_KEY_ENV, "sk-env");
            let config = ConfigStore::new(jail.directory().join(CONFIG_FILE_NAME)).config();
            assert_eq!(config.api_key, "sk-env");
            Ok(())
        });
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env(OPENAI_API_KEY_ENV, "");
            jail.create_file(CONFIG_FILE_NAME, r#"{ "theme_mode": "sepia" }"#)?;
            let path = jail.directory().join(CONFIG_FILE_NAME);

            assert!(ChatConfig::extract(&ChatConfig::figment(&path)).is_err());
            assert_eq!(*ConfigStore::new(path).config(), ChatConfig::default());
            Ok(())
        });
    }

    #[test]
    fn reload_picks_up_file_changes() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join(CONFIG_FILE_NAME);
            jail.create_file(CONFIG_FILE_NAME, r#"{ "model": "first" }"#)?;
            let store = ConfigStore::new(path);
            assert_eq!(store.config().model, "first");

            jail.create_file(CONFIG_FILE_NAME, r#"{ "model": "second" }"#)?;
            assert_eq!(store.reload().model, "second");
            assert_eq!(store.config().model, "second");
            Ok(())
        });
    }

    #[test]
    fn export_directory_prefers_configured_path() {
        let config = ChatConfig {
            export_dir: Some(PathBuf::from("/tmp/exports")),
            ..ChatConfig::default()
        };
        assert_eq!(config.export_directory(), PathBuf::from("/tmp/exports"));
    }
}
