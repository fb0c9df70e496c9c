//! Send surface over the teloxide Bot
//!
//! All outbound traffic goes to the single configured chat. HTML parse mode
//! throughout; failures come back as strings for the caller to log.

use crate::logger::{self, LogTag};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, ParseMode};

#[derive(Clone)]
pub struct RevealNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl RevealNotifier {
    pub fn new(bot: Bot, chat_id: i64) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
        }
    }

    /// Send a plain HTML message to the configured chat.
    pub async fn send_message(&self, text: &str) -> Result<(), String> {
        self.bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| format!("failed to send message: {}", e))?;

        logger::debug(
            LogTag::Telegram,
            &format!("sent message (length={})", text.len()),
        );
        Ok(())
    }

    /// Send an in-memory GIF with an HTML caption.
    pub async fn send_animation(
        &self,
        data: Vec<u8>,
        file_name: String,
        caption: &str,
    ) -> Result<(), String> {
        let file = InputFile::memory(data).file_name(file_name);
        self.bot
            .send_animation(self.chat_id, file)
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| format!("failed to send animation: {}", e))?;
        Ok(())
    }

    /// Send a remote image by URL with an HTML caption.
    pub async fn send_photo_url(&self, url: &str, caption: &str) -> Result<(), String> {
        let parsed = reqwest::Url::parse(url).map_err(|e| format!("invalid image URL: {}", e))?;
        self.bot
            .send_photo(self.chat_id, InputFile::url(parsed))
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| format!("failed to send photo: {}", e))?;
        Ok(())
    }
}
