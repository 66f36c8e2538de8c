//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup diagnostics of the environment configuration

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// HTTP client internals (`hyper`, `reqwest`) are filtered out so that
/// debug-level logs stay about relays.
///
/// # Arguments
/// * `log_file_path` - Path to the log file
/// * `level` - Minimum level for both outputs
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the file or a logger is already set
pub fn init_logger(log_file_path: &str, level: LevelFilter) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    let config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, config, log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    log::debug!("Logging at {} to {}", level, log_file_path);
    Ok(())
}

fn presence(set: bool) -> &'static str {
    if set {
        "set"
    } else {
        "NOT SET"
    }
}

/// Logs which configuration variables are set at application startup.
///
/// Secret values are never printed, only whether they are present.
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Configuration Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config::BOT_TOKEN.is_some() {
        log::info!("✅ Bot token: {}", presence(true));
    } else {
        log::error!("❌ Bot token: {} (TELEGRAM_API / BOT_TOKEN / TELOXIDE_TOKEN)", presence(false));
    }

    if config::RAPID_API_KEY.is_some() {
        log::info!("✅ RAPID_API_KEY: {}", presence(true));
    } else {
        log::error!("❌ RAPID_API_KEY: {}", presence(false));
        log::error!("   Every extraction will FAIL without an API key!");
    }

    log::info!("   RAPID_API_HOST: {}", *config::RAPID_API_HOST);
    log::info!("   Extraction endpoint: {}/post-dl", *config::RAPID_API_BASE_URL);

    match *config::PROXY_URL {
        Some(_) => log::info!("   PROXY_URL: {}", presence(true)),
        None => log::info!("   PROXY_URL: not set (direct connections)"),
    }
    if let Some(ref api_url) = *config::BOT_API_URL {
        log::info!("   BOT_API_URL: {}", api_url);
    }

    log::info!(
        "   Limits: {} req/min per user, {} concurrent relays, cache TTL {}s",
        *config::rate_limit::REQUESTS_PER_MINUTE,
        *config::queue::MAX_CONCURRENT_RELAYS,
        *config::cache::TTL_SECS
    );
    log::info!("   Liveness server port: {}", *config::server::PORT);
    log::info!("   Log level: {}", *config::LOG_LEVEL);
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("igrelay.log");

        init_logger(path.to_str().unwrap(), LevelFilter::Info).unwrap();
        log::info!("logger smoke marker");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("logger smoke marker"));
    }

    #[test]
    fn test_init_logger_unwritable_path() {
        let err = init_logger("/nonexistent-igrelay-dir/igrelay.log", LevelFilter::Info).unwrap_err();
        assert!(err.to_string().contains("Failed to create log file"));
    }
}
