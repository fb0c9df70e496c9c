//! HTML message builders for reveal announcements and command replies
//!
//! Telegram captions cap out at 1024 characters, so long trait text is
//! sharded into multiple blocks on line boundaries instead of being
//! silently truncated.

use crate::classifier::RarityTier;
use crate::config::Config;
use crate::metadata::{RarityMetadata, RevealMetadata};
use chrono::NaiveDateTime;

/// Character budget per trait block
pub const TRAIT_BLOCK_LIMIT: usize = 1024;

/// A reveal announcement: caption for the visual, plus follow-up blocks
#[derive(Debug, Clone, PartialEq)]
pub struct RevealMessage {
    pub caption: String,
    pub extra_blocks: Vec<String>,
}

/// A rarity reply: caption for the visual, plus follow-up blocks
#[derive(Debug, Clone, PartialEq)]
pub struct RarityMessage {
    pub caption: String,
    pub blocks: Vec<String>,
}

// ============================================================================
// MESSAGE BUILDERS
// ============================================================================

/// Startup summary announcing the watch-list size, with collection links.
pub fn format_startup_message(count: usize, config: &Config) -> String {
    format!(
        "🧊 <b>NFT Reveal Bot</b>\n\nMonitoring <b>{}</b> unrevealed tokens\n\n\
         🐻 <a href=\"{}\">Website</a> | <a href=\"{}\">Twitter</a>",
        count, config.collection_site_url, config.collection_twitter_url
    )
}

/// Reveal announcement for one token.
pub fn format_reveal_message(
    token_id: u64,
    metadata: &RevealMetadata,
    config: &Config,
) -> RevealMessage {
    let caption = format!("🧊🔨 <b>NFT #{} Revealed!</b>", token_id);

    let mut body = String::new();
    if !metadata.attributes.is_empty() {
        let traits = metadata
            .attributes
            .iter()
            .map(|attr| {
                format!(
                    "• <i>{}: {}</i>",
                    html_escape(&attr.trait_type),
                    html_escape(&display_value(&attr.value))
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        body.push_str(&traits);
        body.push('\n');
    }
    body.push_str(&reveal_links(token_id, config));

    RevealMessage {
        caption,
        extra_blocks: shard_blocks(&body, TRAIT_BLOCK_LIMIT),
    }
}

/// Rarity lookup reply for one token.
pub fn format_rarity_message(
    token_id: u64,
    metadata: &RarityMetadata,
    tier: RarityTier,
    rank: &str,
    config: &Config,
) -> RarityMessage {
    let caption = format!(
        "🔍 <b>NFT #{} Rarity Check</b>\n\n{} <b>{}</b> (Rank: {})",
        token_id,
        tier.emoji(),
        tier.name(),
        rank
    );

    let mut body = String::new();
    if !metadata.attributes.is_empty() {
        let traits = metadata
            .attributes
            .iter()
            .map(|attr| {
                let supply = attr
                    .token_count
                    .map(|count| format!(" ({} in supply)", count))
                    .unwrap_or_default();
                format!(
                    "• {}: <b>{}</b>{}",
                    html_escape(&attr.key),
                    html_escape(&display_value(&attr.value)),
                    supply
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        body.push_str(&traits);
        body.push('\n');
    }
    body.push_str(&format_floor_summary(metadata));
    body.push('\n');
    body.push_str(&rarity_links(token_id, config));

    RarityMessage {
        caption,
        blocks: shard_blocks(&body, TRAIT_BLOCK_LIMIT),
    }
}

/// Diagnostic reply for the /test command.
pub fn format_status_message(token_id: u64, metadata: &RevealMetadata) -> String {
    let revealed = metadata.is_revealed != Some(false);
    let mut message = format!(
        "<b>Token #{} Status</b>\n\
         • Revealed: {}\n\
         • Revealed At: {}\n\
         • isRevealed field: {}",
        token_id,
        if revealed { "✅ Yes" } else { "❌ No" },
        format_revealed_at(metadata.revealed_at.as_deref()),
        metadata
            .is_revealed
            .map(|flag| flag.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    );

    if revealed {
        message.push_str(&format!(
            "\n• Image: {}\n• Attributes: {} traits",
            metadata
                .image
                .as_deref()
                .map(html_escape)
                .unwrap_or_else(|| "N/A".to_string()),
            metadata.attributes.len()
        ));
    }

    message
}

/// Collection floor plus the floor of the rarest (lowest-supply) trait.
pub fn format_floor_summary(metadata: &RarityMetadata) -> String {
    let floor = metadata
        .collection
        .as_ref()
        .and_then(|c| c.floor_ask_price.as_ref())
        .and_then(|p| p.amount.as_ref());

    let Some(amount) = floor else {
        return "💰 Floor price: not available".to_string();
    };

    let mut summary = format!(
        "💰 <b>Floor Price</b>: {:.3} ETH (${:.2})",
        amount.decimal.unwrap_or(0.0),
        amount.usd.unwrap_or(0.0)
    );

    if let Some(rarest) = metadata
        .attributes
        .iter()
        .filter(|attr| attr.token_count.is_some())
        .min_by_key(|attr| attr.token_count.unwrap_or(u64::MAX))
    {
        let trait_floor = rarest
            .floor_ask_price
            .as_ref()
            .and_then(|p| p.amount.as_ref())
            .and_then(|a| a.decimal)
            .unwrap_or(0.0);
        summary.push_str(&format!(
            "\n🔫 <b>Rarest Trait</b> ({}): {:.3} ETH",
            html_escape(&rarest.key),
            trait_floor
        ));
    }

    summary
}

/// Format a `revealedAt` timestamp as `YYYY-MM-DD HH:MM UTC`, or "N/A".
pub fn format_revealed_at(revealed_at: Option<&str>) -> String {
    let Some(raw) = revealed_at else {
        return "N/A".to_string();
    };
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.fZ") {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
        Err(_) => "N/A".to_string(),
    }
}

// ============================================================================
// MARKETPLACE LINKS
// ============================================================================

fn reveal_links(token_id: u64, config: &Config) -> String {
    let magic_eden = format!(
        "https://magiceden.io/item-details/abstract/{}/{}",
        config.collection_slug, token_id
    );
    let opensea = format!(
        "https://opensea.io/assets/ethereum/{}/{}",
        config.contract_address, token_id
    );
    format!(
        "<a href=\"{}\">Magic Eden</a> | <a href=\"{}\">OpenSea</a>",
        magic_eden, opensea
    )
}

fn rarity_links(token_id: u64, config: &Config) -> String {
    let reservoir = format!(
        "https://reservoir.market/abstract/collections/{}/{}",
        config.collection_slug, token_id
    );
    let magic_eden = format!(
        "https://magiceden.io/item-details/abstract/{}/{}",
        config.collection_slug, token_id
    );
    format!(
        "<a href=\"{}\">Reservoir</a> | <a href=\"{}\">Magic Eden</a>",
        reservoir, magic_eden
    )
}

// ============================================================================
// HELPERS
// ============================================================================

/// Split text into display blocks of at most `limit` characters, breaking on
/// line boundaries. A single overlong line is hard-split rather than lost.
pub fn shard_blocks(text: &str, limit: usize) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let mut line = line;
        // Hard-split lines that alone exceed the budget
        while line.len() > limit {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            let split_at = floor_char_boundary(line, limit);
            blocks.push(line[..split_at].to_string());
            line = &line[split_at..];
        }

        let needed = if current.is_empty() {
            line.len()
        } else {
            current.len() + 1 + line.len()
        };
        if needed > limit && !current.is_empty() {
            blocks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Render a JSON trait value without surrounding quotes.
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "N/A".to_string(),
        other => other.to_string(),
    }
}

pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
