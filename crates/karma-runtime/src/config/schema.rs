//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use karma_core::jid_to_user_id;
use karma_plugins::{BUILTIN_HANDLERS, THROTTLE_LIMIT};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KarmaConfig {
    /// The bot's own identity.
    #[serde(default)]
    pub bot: BotConfig,

    /// Where scores and the user directory live.
    #[serde(default)]
    pub store: StoreConfig,

    /// The handler chain.
    #[serde(default)]
    pub plugins: PluginsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Bot
// =============================================================================

/// The bot's own identity.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BotConfig {
    /// Transport identity, e.g. `12345_67890@chat.example.com`.
    #[serde(default)]
    pub jid: String,

    /// Explicit directory id; overrides the id parsed from `jid`.
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl BotConfig {
    /// The bot's own directory id, if one can be determined.
    pub fn own_user_id(&self) -> Option<i64> {
        self.user_id.or_else(|| jid_to_user_id(&self.jid))
    }
}

// =============================================================================
// Store
// =============================================================================

/// Store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file, or `:memory:`.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl StoreConfig {
    pub const IN_MEMORY: &'static str = ":memory:";

    pub fn is_in_memory(&self) -> bool {
        self.path == Self::IN_MEMORY
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "karma.db".to_string()
}

// =============================================================================
// Plugins
// =============================================================================

/// Handler chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Handler names in chain order.
    #[serde(default = "default_plugin_order")]
    pub order: Vec<String>,

    /// Award handler settings.
    #[serde(default)]
    pub plusplus: PlusPlusConfig,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            order: default_plugin_order(),
            plusplus: PlusPlusConfig::default(),
        }
    }
}

fn default_plugin_order() -> Vec<String> {
    BUILTIN_HANDLERS.iter().map(|name| name.to_string()).collect()
}

/// Award handler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlusPlusConfig {
    /// Cooldown between two accepted awards from one sender.
    #[serde(default = "default_throttle_secs")]
    pub throttle_secs: u32,
}

impl Default for PlusPlusConfig {
    fn default() -> Self {
        Self {
            throttle_secs: default_throttle_secs(),
        }
    }
}

fn default_throttle_secs() -> u32 {
    THROTTLE_LIMIT as u32
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,

    /// Destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-module levels, e.g. `karma_store = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

impl LoggingConfig {
    /// The base level as a `tracing` level, or `None` if it does not parse.
    pub fn tracing_level(&self) -> Option<tracing::Level> {
        parse_level(&self.level)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
            filters: HashMap::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Parses a level name, case-insensitively.
pub(crate) fn parse_level(level: &str) -> Option<tracing::Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(tracing::Level::TRACE),
        "debug" => Some(tracing::Level::DEBUG),
        "info" => Some(tracing::Level::INFO),
        "warn" => Some(tracing::Level::WARN),
        "error" => Some(tracing::Level::ERROR),
        _ => None,
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events to log.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}
