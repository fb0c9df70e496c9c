//! Tagged console logging for revealbot
//!
//! Colored console output with per-module tags and a timestamp prefix.
//! Debug logs are only shown when the process is started with `--debug`.

use chrono::Local;
use colored::*;
use once_cell::sync::Lazy;
use std::io::{self, Write};

/// Module tags for log categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    System,
    Config,
    Api,
    Watchlist,
    Monitor,
    Animation,
    Telegram,
}

impl LogTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Api => "API",
            LogTag::Watchlist => "WATCHLIST",
            LogTag::Monitor => "MONITOR",
            LogTag::Animation => "ANIMATION",
            LogTag::Telegram => "TELEGRAM",
        }
    }

    fn label(&self) -> ColoredString {
        match self {
            LogTag::System => self.as_str().cyan().bold(),
            LogTag::Config => self.as_str().blue().bold(),
            LogTag::Api => self.as_str().bright_green().bold(),
            LogTag::Watchlist => self.as_str().magenta().bold(),
            LogTag::Monitor => self.as_str().yellow().bold(),
            LogTag::Animation => self.as_str().purple().bold(),
            LogTag::Telegram => self.as_str().bright_blue().bold(),
        }
    }
}

static DEBUG_ENABLED: Lazy<bool> = Lazy::new(|| std::env::args().any(|arg| arg == "--debug"));

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    write_log(tag, "ERROR".red().bold(), &message.red().to_string());
}

/// Log at WARNING level
pub fn warning(tag: LogTag, message: &str) {
    write_log(tag, "WARN".yellow().bold(), &message.yellow().to_string());
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    write_log(tag, "INFO".normal(), message);
}

/// Log at DEBUG level (only shown with --debug)
pub fn debug(tag: LogTag, message: &str) {
    if !*DEBUG_ENABLED {
        return;
    }
    write_log(tag, "DEBUG".purple().bold(), &message.dimmed().to_string());
}

fn write_log(tag: LogTag, level: ColoredString, message: &str) {
    let timestamp = Local::now().format("%H:%M:%S").to_string();
    println!(
        "{} [{}] [{}] {}",
        timestamp.dimmed(),
        tag.label(),
        level,
        message
    );
    io::stdout().flush().ok();
}
