//! Telegram integration for revealbot
//!
//! ```text
//! telegram/
//! ├── mod.rs        # public API
//! ├── bot.rs        # send surface (messages, photos, in-memory GIFs)
//! ├── commands.rs   # /rarity and /test dispatcher
//! └── formatters.rs # HTML message builders
//! ```

pub mod bot;
pub mod commands;
pub mod formatters;

pub use bot::RevealNotifier;
pub use commands::{run_dispatcher, Command, CommandContext};
