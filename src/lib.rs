pub mod animation;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod logger;
pub mod metadata;
pub mod monitor;
pub mod telegram;
pub mod watchlist;
