use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

use vacuum_bot::config::Config;
use vacuum_bot::relay::{handlers, telegram, Relay, TelegramClient};
use vacuum_bot::{startup, valetudo};

#[derive(Parser)]
#[command(version, about = "Relay Telegram commands to a Valetudo robot vacuum")]
struct Args {
    /// Config file path
    #[arg(short, long, env = "VACUUM_BOT_CONFIG", default_value = "/etc/vacuum_bot.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Held until main returns so the file log is flushed on every exit path.
    let _guard = init_logging(config.log_dir.as_deref());

    info!("🚀 Starting vacuum-bot...");
    info!("Loaded config from {}", args.config.display());

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), String> {
    info!("Robot API: {}", config.api_url);
    info!("Authorized users: {:?}", config.authorized_users);

    let client = valetudo::Client::new(&config.api_url)
        .map_err(|e| format!("Failed to build robot API client: {e}"))?;

    let bot = telegram::build_bot(&config.bot_token, config.poll_timeout)
        .map_err(|e| format!("Failed to build Telegram client: {e}"))?;
    let telegram = Arc::new(TelegramClient::new(bot.clone()));

    let me = startup::retry(config.connection_attempts, config.retry_delay, || telegram.get_me()).await?;
    info!("Authorized on account @{}", me.username());

    // Menu registration is cosmetic; the bot works without it.
    telegram.set_commands().await.ok();

    let config = Arc::new(config);
    let relay = Arc::new(Relay::new(config.clone(), client));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

    let listener = Polling::builder(bot.clone())
        .timeout(config.poll_timeout)
        .build();

    // A single distribution key serializes every update through one worker.
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![relay, telegram])
        .distribution_function(|_| Some(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    Ok(())
}

fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "vacuum-bot.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                );
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(file_layer)
        .init();

    guard
}
