use revealbot::config::Config;
use revealbot::logger::{self, LogTag};
use revealbot::metadata::MetadataClient;
use revealbot::monitor::Monitor;
use revealbot::telegram::{self, CommandContext, RevealNotifier};
use std::sync::Arc;
use std::time::Duration;
use teloxide::Bot;
use tokio::sync::Notify;

/// Grace period for the monitor task after the dispatcher exits
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            logger::error(LogTag::Config, &format!("configuration error: {:#}", e));
            std::process::exit(1);
        }
    };

    logger::info(LogTag::System, "🧊 revealbot starting up");

    let client = match MetadataClient::new(config.clone()) {
        Ok(client) => client,
        Err(e) => {
            logger::error(
                LogTag::System,
                &format!("failed to build HTTP client: {}", e),
            );
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.bot_token);
    let notifier = RevealNotifier::new(bot.clone(), config.chat_id);
    let shutdown = Arc::new(Notify::new());

    let monitor = Monitor::new(config.clone(), client.clone(), notifier, shutdown.clone());
    let monitor_handle = tokio::spawn(async move {
        if let Err(e) = monitor.run().await {
            logger::error(LogTag::Monitor, &format!("monitoring stopped: {}", e));
        }
    });

    // Blocks until ctrl-c; commands run independently of the polling loop
    let context = Arc::new(CommandContext {
        config: config.clone(),
        client,
    });
    telegram::run_dispatcher(bot, context).await;

    shutdown.notify_waiters();
    if tokio::time::timeout(SHUTDOWN_GRACE, monitor_handle)
        .await
        .is_err()
    {
        logger::warning(
            LogTag::System,
            &format!(
                "monitor did not stop within {}s, exiting anyway",
                SHUTDOWN_GRACE.as_secs()
            ),
        );
    }

    logger::info(LogTag::System, "revealbot stopped");
}
