//! Layered configuration loading.
//!
//! Sources, each overriding the one before it:
//!
//! 1. [`KarmaConfig::default`]
//! 2. `karma.{profile}.toml` in the first search path that has a config file
//! 3. `karma.toml` from that same path, or the file passed to
//!    [`ConfigLoader::file`]
//! 4. `KARMA_*` environment variables, `__` separating nested keys
//!    (`KARMA_PLUGINS__PLUSPLUS__THROTTLE_SECS=30`)
//! 5. configs handed to [`ConfigLoader::merge`]
//!
//! TOML needs the `toml-config` feature (on by default); `yaml-config` adds
//! `karma.yaml` / `karma.yml`. Without explicit search paths the current
//! directory and `<config dir>/karma` are searched.

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::KarmaConfig;

const ENV_PREFIX: &str = "KARMA_";
const FILE_STEM: &str = "karma";

/// Selects the `karma.{profile}.*` overlay file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Case-insensitive; `dev` and `prod` are accepted.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            "production" | "prod" => Self::Production,
            other => Self::Custom(other.to_string()),
        }
    }

    /// `KARMA_PROFILE`, or development when unset.
    pub fn from_env() -> Self {
        std::env::var("KARMA_PROFILE")
            .map(|name| Self::parse(&name))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder over the sources listed in the module docs.
pub struct ConfigLoader {
    profile: Profile,
    search_paths: Vec<PathBuf>,
    config_file: Option<PathBuf>,
    load_env: bool,
    overrides: Vec<KarmaConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            config_file: None,
            load_env: true,
            overrides: Vec::new(),
        }
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a directory to search; the first one holding a config file wins.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Layers `config` over every other source. Later merges win.
    pub fn merge(mut self, config: KarmaConfig) -> Self {
        self.overrides.push(config);
        self
    }

    /// Extracts the merged configuration. Validation is left to
    /// [`super::validate_config`].
    pub fn load(self) -> ConfigResult<KarmaConfig> {
        let config: KarmaConfig = self
            .figment()?
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!(
            profile = %self.profile,
            logging_level = %config.logging.level,
            plugins = ?config.plugins.order,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(KarmaConfig::default()));

        figment = match &self.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path.clone()));
                }
                info!(path = %path.display(), "Loading configuration file");
                merge_file(figment, path)?
            }
            None => self.merge_searched_files(figment)?,
        };

        if self.load_env {
            trace!("Reading {ENV_PREFIX}* environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        for config in &self.overrides {
            figment = figment.merge(Serialized::defaults(config));
        }
        Ok(figment)
    }

    fn merge_searched_files(&self, mut figment: Figment) -> ConfigResult<Figment> {
        let search_paths = self.search_paths();
        let profile = self.profile.as_str();

        for dir in &search_paths {
            for ext in file_extensions() {
                let profiled = dir.join(format!("{FILE_STEM}.{profile}.{ext}"));
                if profiled.exists() {
                    debug!(path = %profiled.display(), "Loading profile configuration");
                    figment = merge_file(figment, &profiled)?;
                }

                let base = dir.join(format!("{FILE_STEM}.{ext}"));
                if base.exists() {
                    info!(path = %base.display(), "Loading configuration file");
                    return merge_file(figment, &base);
                }
            }
        }

        warn!(paths = ?search_paths, "No configuration file found, using defaults");
        Ok(figment)
    }

    fn search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join(FILE_STEM)))
            .collect()
    }
}

#[allow(unused_mut)]
fn file_extensions() -> Vec<&'static str> {
    let mut exts = Vec::new();
    #[cfg(feature = "toml-config")]
    exts.push("toml");
    #[cfg(feature = "yaml-config")]
    exts.extend(["yaml", "yml"]);
    exts
}

fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        ext => Err(ConfigError::ParseError(format!(
            "unsupported or disabled config format: .{ext}"
        ))),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.logging.level, "info");
            assert_eq!(config.store.path, "karma.db");
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "karma.toml",
                r#"
                [bot]
                jid = "1_99@chat.example.com"

                [store]
                path = ":memory:"

                [plugins]
                order = ["plusplus", "snark"]

                [plugins.plusplus]
                throttle_secs = 20
                "#,
            )?;
            jail.set_env("KARMA_PLUGINS__PLUSPLUS__THROTTLE_SECS", "30");
            jail.set_env("KARMA_LOGGING__LEVEL", "debug");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.bot.own_user_id(), Some(99));
            assert!(config.store.is_in_memory());
            assert_eq!(config.plugins.order, vec!["plusplus", "snark"]);
            assert_eq!(config.plugins.plusplus.throttle_secs, 30);
            assert_eq!(config.logging.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_merged_config_beats_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file("karma.toml", "[store]\npath = \"file.db\"\n")?;
            jail.set_env("KARMA_STORE__PATH", "env.db");

            let mut pinned = KarmaConfig::default();
            pinned.store.path = ":memory:".into();

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(pinned)
                .load()
                .map_err(|e| e.to_string())?;

            assert!(config.store.is_in_memory());
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_is_overridden_by_base_file() {
        Jail::expect_with(|jail| {
            jail.create_file("karma.production.toml", "[store]\npath = \"prod.db\"\n[bot]\nuser_id = 5\n")?;
            jail.create_file("karma.toml", "[store]\npath = \"base.db\"\n")?;

            let config = ConfigLoader::new()
                .profile("prod")
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.store.path, "base.db");
            assert_eq!(config.bot.user_id, Some(5));
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::new()
            .file("/definitely/not/here/karma.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_explicit_file_with_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("karma.ini");
        std::fs::write(&path, "level=debug").unwrap();

        let err = ConfigLoader::new().file(&path).without_env().load().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
        assert_eq!(Profile::Production.to_string(), "production");
    }
}
