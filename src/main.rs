use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::time::sleep;

use copperbot::api::ApiClient;
use copperbot::cli::{Cli, Commands};
use copperbot::core::config;
use copperbot::init_logger;
use copperbot::session::create_session_store;
use copperbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// # Errors
/// Returns an error if initialization fails (logging, configuration, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Global panic handler so dispatcher panics are logged before the
    // retry loop restarts it
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env if present (before any config is read)
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::CheckConfig) => {
            print_config();
            Ok(())
        }
        Some(Commands::Run) | None => run_bot().await,
    }
}

fn print_config() {
    println!("api_url:         {}", config::COPPERX_API_URL.as_str());
    println!("session_backend: {}", config::SESSION_BACKEND.as_str());
    println!("log_file:        {}", config::LOG_FILE_PATH.as_str());
    println!("timeout_secs:    {}", *config::network::REQUEST_TIMEOUT_SECS);
    println!(
        "bot_token:       {}",
        if config::BOT_TOKEN.is_empty() { "(not set)" } else { "(set)" }
    );
}

async fn run_bot() -> Result<()> {
    log::info!("Starting copperbot");

    let bot = create_bot()?;

    let api = Arc::new(ApiClient::new(config::COPPERX_API_URL.as_str())?);
    let sessions = create_session_store().await?;
    let deps = HandlerDeps::new(api, sessions);
    let handler = schema(deps);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    log::info!("Connected to API at {}", config::COPPERX_API_URL.as_str());
    log::info!("Ready to receive updates");

    // Run the dispatcher with retry logic
    let mut retry_count = 0;
    let max_retries = config::retry::MAX_DISPATCHER_RETRIES;

    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // Run the dispatcher in a separate task so panics are caught via
        // the JoinHandle instead of taking the process down
        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler_clone)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    log::error!("Dispatcher panicked: {}", join_err);
                    if retry_count < max_retries {
                        retry_count += 1;
                        log::info!(
                            "Retrying dispatcher connection after panic (attempt {}/{})...",
                            retry_count,
                            max_retries
                        );
                        exponential_backoff(retry_count).await;
                    } else {
                        log::error!("Max retries reached after panic. Exiting...");
                        break;
                    }
                } else {
                    log::warn!("Dispatcher task was cancelled: {}", join_err);
                    break;
                }
            }
        }

        // Extra delay between retries to avoid hammering the API
        if retry_count > 0 {
            sleep(config::retry::dispatcher_delay()).await;
        }
    }

    Ok(())
}

async fn exponential_backoff(retry_count: u32) {
    let delay = Duration::from_secs(config::retry::EXPONENTIAL_BACKOFF_BASE.pow(retry_count));
    sleep(delay).await;
}
