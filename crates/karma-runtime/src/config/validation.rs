//! Configuration validation utilities.

use std::collections::HashSet;

use karma_plugins::{BUILTIN_HANDLERS, snark};

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, KarmaConfig, LoggingConfig, PluginsConfig, StoreConfig, parse_level};

/// Validates the entire configuration.
pub fn validate_config(config: &KarmaConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_store_config(&config.store)?;
    validate_plugins_config(&config.plugins)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot.jid.is_empty() && bot.user_id.is_none() {
        return Err(ConfigError::missing_field("bot.jid"));
    }
    if bot.own_user_id().is_none() {
        return Err(ConfigError::validation(format!(
            "Cannot derive the bot's user id from jid '{}'; set bot.user_id",
            bot.jid
        )));
    }
    Ok(())
}

fn validate_store_config(store: &StoreConfig) -> ConfigResult<()> {
    if store.path.trim().is_empty() {
        return Err(ConfigError::missing_field("store.path"));
    }
    Ok(())
}

fn validate_plugins_config(plugins: &PluginsConfig) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for name in &plugins.order {
        if !BUILTIN_HANDLERS.contains(&name.as_str()) {
            return Err(ConfigError::UnknownPlugin(name.clone()));
        }
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::DuplicatePlugin(name.clone()));
        }
    }

    // The catch-all swallows everything addressed to the bot.
    if let Some(pos) = plugins.order.iter().position(|n| n == snark::NAME)
        && pos + 1 != plugins.order.len()
    {
        return Err(ConfigError::validation(format!(
            "'{}' must be the last plugin in plugins.order",
            snark::NAME
        )));
    }

    if plugins.plusplus.throttle_secs == 0 {
        return Err(ConfigError::validation(
            "plugins.plusplus.throttle_secs must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if logging.tracing_level().is_none() {
        return Err(ConfigError::validation(format!(
            "Invalid log level: {}. Valid values are: {:?}",
            logging.level, valid_log_levels
        )));
    }

    for (module, level) in &logging.filters {
        if parse_level(level).is_none() {
            return Err(ConfigError::validation(format!(
                "Invalid log level for '{module}': {level}"
            )));
        }
    }
    Ok(())
}
