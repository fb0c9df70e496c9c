//! Command handling for the configured chat
//!
//! Two on-demand lookups, dispatched with dptree. Messages from any other
//! chat are silently ignored. The command handlers run independently of the
//! polling loop and never touch the watch-list.

use crate::classifier::classify_rarity;
use crate::config::Config;
use crate::logger::{self, LogTag};
use crate::metadata::MetadataClient;
use crate::telegram::formatters;
use std::sync::Arc;
use teloxide::dispatching::{HandlerExt, UpdateFilterExt};
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Reveal bot commands:")]
pub enum Command {
    #[command(description = "look up rarity rank and tier for a token")]
    Rarity(u64),
    #[command(description = "check reveal status for a token")]
    Test(u64),
}

/// Dependencies injected into every command handler
pub struct CommandContext {
    pub config: Arc<Config>,
    pub client: MetadataClient,
}

/// Run the command dispatcher until ctrl-c.
pub async fn run_dispatcher(bot: Bot, context: Arc<CommandContext>) {
    logger::info(LogTag::Telegram, "command dispatcher started");

    let handler = Update::filter_message()
        .filter_command::<Command>()
        .endpoint(handle_command);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![context])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    logger::info(LogTag::Telegram, "command dispatcher stopped");
}

async fn handle_command(
    bot: Bot,
    message: Message,
    command: Command,
    context: Arc<CommandContext>,
) -> ResponseResult<()> {
    // Only the configured chat gets responses
    if message.chat.id.0 != context.config.chat_id {
        return Ok(());
    }

    match command {
        Command::Rarity(token_id) => handle_rarity(&bot, &message, token_id, &context).await,
        Command::Test(token_id) => handle_test(&bot, &message, token_id, &context).await,
    }
}

async fn handle_rarity(
    bot: &Bot,
    message: &Message,
    token_id: u64,
    context: &CommandContext,
) -> ResponseResult<()> {
    let metadata = match context.client.fetch_rarity_metadata(token_id).await {
        Ok(Some(metadata)) => metadata,
        Ok(None) => {
            bot.send_message(
                message.chat.id,
                format!("Couldn't find rarity data for token #{}.", token_id),
            )
            .await?;
            return Ok(());
        }
        Err(e) => {
            logger::warning(
                LogTag::Api,
                &format!("rarity lookup failed for token #{}: {}", token_id, e),
            );
            bot.send_message(
                message.chat.id,
                format!(
                    "Couldn't fetch data for token #{}. Try again later!",
                    token_id
                ),
            )
            .await?;
            return Ok(());
        }
    };

    let (tier, rank) = classify_rarity(metadata.rarity_rank);
    let reply =
        formatters::format_rarity_message(token_id, &metadata, tier, &rank, &context.config);

    // Visual first: token image, else brand logo
    let image_url = metadata
        .image
        .as_deref()
        .unwrap_or(&context.config.brand_image_url);
    match reqwest::Url::parse(image_url) {
        Ok(url) => {
            bot.send_photo(message.chat.id, InputFile::url(url))
                .caption(reply.caption.clone())
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Err(_) => {
            bot.send_message(message.chat.id, reply.caption.clone())
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }

    for block in &reply.blocks {
        bot.send_message(message.chat.id, block)
            .parse_mode(ParseMode::Html)
            .await?;
    }

    Ok(())
}

async fn handle_test(
    bot: &Bot,
    message: &Message,
    token_id: u64,
    context: &CommandContext,
) -> ResponseResult<()> {
    bot.send_message(message.chat.id, format!("Testing token #{}...", token_id))
        .await?;

    match context.client.fetch_reveal_metadata(token_id).await {
        Ok(metadata) => {
            let reply = formatters::format_status_message(token_id, &metadata);
            bot.send_message(message.chat.id, reply)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Err(e) => {
            logger::warning(
                LogTag::Api,
                &format!("status lookup failed for token #{}: {}", token_id, e),
            );
            bot.send_message(
                message.chat.id,
                format!("❌ Could not fetch metadata for token #{}", token_id),
            )
            .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_lowercase_with_token_argument() {
        assert!(matches!(
            Command::parse("/rarity 42", "revealbot"),
            Ok(Command::Rarity(42))
        ));
        assert!(matches!(
            Command::parse("/test 7", "revealbot"),
            Ok(Command::Test(7))
        ));
    }

    #[test]
    fn command_without_argument_is_rejected() {
        assert!(Command::parse("/rarity", "revealbot").is_err());
    }
}
