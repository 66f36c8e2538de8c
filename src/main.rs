use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tokio::time::sleep;

use igrelay::cli::{Cli, Commands};
use igrelay::core::{config, health_server, init_logger, log_startup_configuration, metrics};
use igrelay::extract::{parse_instagram_link, LooterClient, LooterConfig, MediaExtractor};
use igrelay::relay::RelayService;
use igrelay::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, configuration, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();

    let cli = Cli::parse_args();

    // Log panics of handler tasks instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    init_logger(&config::LOG_FILE_PATH, *config::LOG_LEVEL)?;

    match cli.command {
        Some(Commands::Run) => run_bot().await,
        Some(Commands::Extract { url, json }) => run_cli_extract(url, json).await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot().await
        }
    }
}

/// Resolve one link and print its media (operator diagnostics)
#[allow(clippy::print_stdout)]
async fn run_cli_extract(url: String, json: bool) -> Result<()> {
    let link = parse_instagram_link(&url)?;
    let client = LooterClient::new(LooterConfig::from_env()?)?;

    let items = client.extract(&link).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        println!("{} ({} item(s))", link, items.len());
        for (index, item) in items.iter().enumerate() {
            println!("{:>2}. {:?} {}", index + 1, item.kind, item.source_url);
        }
    }
    Ok(())
}

async fn run_bot() -> Result<()> {
    let bot_init_start = std::time::Instant::now();
    log::info!("Starting bot...");

    metrics::init_metrics();
    log_startup_configuration();

    let extractor: Arc<dyn MediaExtractor> = Arc::new(LooterClient::new(LooterConfig::from_env()?)?);
    let service = Arc::new(RelayService::from_config(extractor));

    let port = *config::server::PORT;
    let health_service = Arc::clone(&service);
    tokio::spawn(async move {
        if let Err(e) = health_server::start_health_server(port, health_service).await {
            log::error!("Liveness server error: {}", e);
        }
    });

    let bot = create_bot()?;

    // Retry while the Bot API is unreachable (network hiccups at container start)
    let bot_info = {
        let mut attempt = 0;
        loop {
            match bot.get_me().await {
                Ok(info) => break info,
                Err(e) => {
                    attempt += 1;
                    if attempt >= config::retry::STARTUP_ATTEMPTS {
                        return Err(anyhow::anyhow!(
                            "Failed to connect to Bot API after {} attempts: {}",
                            attempt,
                            e
                        ));
                    }
                    let delay = Duration::from_secs(config::retry::STARTUP_DELAY_SECS << (attempt - 1));
                    log::warn!(
                        "Bot API not ready (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt,
                        config::retry::STARTUP_ATTEMPTS,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
            }
        }
    };
    let bot_username = bot_info.username.clone();
    log::info!("Bot username: {:?}, Bot ID: {}", bot_username, bot_info.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let handler = schema(HandlerDeps::new(service, bot_username));
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    log::info!("================================================");
    log::info!(
        "Bot initialization complete in {:.2}s, starting long polling",
        bot_init_start.elapsed().as_secs_f64()
    );
    log::info!("================================================");

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
