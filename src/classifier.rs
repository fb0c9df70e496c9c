//! Reveal state and rarity tier classification
//!
//! Pure functions over fetched metadata. The reveal check is deliberately
//! strict: absent metadata or a missing `isRevealed` field is NOT treated as
//! unrevealed, so a token is only kept on the watch-list as "still hidden"
//! when the upstream explicitly says so.

use crate::metadata::RevealMetadata;

// ============================================================================
// REVEAL STATE
// ============================================================================

/// True iff metadata is present AND `isRevealed` is present and false.
pub fn is_unrevealed(metadata: Option<&RevealMetadata>) -> bool {
    matches!(metadata, Some(m) if m.is_revealed == Some(false))
}

// ============================================================================
// RARITY TIERS
// ============================================================================

/// Rarity buckets, most desirable first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RarityTier {
    Legendary,
    Epic,
    Rare,
    Uncommon,
    Common,
}

impl RarityTier {
    pub fn name(&self) -> &'static str {
        match self {
            RarityTier::Legendary => "Legendary",
            RarityTier::Epic => "Epic",
            RarityTier::Rare => "Rare",
            RarityTier::Uncommon => "Uncommon",
            RarityTier::Common => "Common",
        }
    }

    /// Tier color code used by the notification formatter
    pub fn color(&self) -> u32 {
        match self {
            RarityTier::Legendary => 0xffd700,
            RarityTier::Epic => 0x800080,
            RarityTier::Rare => 0x0000ff,
            RarityTier::Uncommon => 0x00ff00,
            RarityTier::Common => 0x808080,
        }
    }

    /// Closest colored-circle emoji to the tier color, for chat surfaces
    /// without embed colors
    pub fn emoji(&self) -> &'static str {
        match self.color() {
            0xffd700 => "🟡",
            0x800080 => "🟣",
            0x0000ff => "🔵",
            0x00ff00 => "🟢",
            _ => "⚪",
        }
    }
}

/// Bucket a rarity rank into a tier.
///
/// Thresholds are inclusive upper bounds evaluated in ascending order; an
/// absent or non-finite rank falls back to `(Common, "N/A")`.
pub fn classify_rarity(rank: Option<f64>) -> (RarityTier, String) {
    let rank = match rank {
        Some(r) if r.is_finite() => r,
        _ => return (RarityTier::Common, "N/A".to_string()),
    };

    let tier = if rank <= 100.0 {
        RarityTier::Legendary
    } else if rank <= 500.0 {
        RarityTier::Epic
    } else if rank <= 1500.0 {
        RarityTier::Rare
    } else if rank <= 2500.0 {
        RarityTier::Uncommon
    } else {
        RarityTier::Common
    };

    let display = if rank.fract() == 0.0 {
        format!("{}", rank as i64)
    } else {
        format!("{}", rank)
    };

    (tier, display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::RevealMetadata;

    fn metadata(is_revealed: Option<bool>) -> RevealMetadata {
        serde_json::from_value(match is_revealed {
            Some(flag) => serde_json::json!({ "isRevealed": flag }),
            None => serde_json::json!({}),
        })
        .unwrap()
    }

    #[test]
    fn unrevealed_truth_table() {
        assert!(!is_unrevealed(None));
        assert!(is_unrevealed(Some(&metadata(Some(false)))));
        assert!(!is_unrevealed(Some(&metadata(Some(true)))));
        // Missing field is not the same as unrevealed
        assert!(!is_unrevealed(Some(&metadata(None))));
    }

    #[test]
    fn tier_boundaries_are_inclusive() {
        assert_eq!(classify_rarity(Some(1.0)).0, RarityTier::Legendary);
        assert_eq!(classify_rarity(Some(100.0)).0, RarityTier::Legendary);
        assert_eq!(classify_rarity(Some(101.0)).0, RarityTier::Epic);
        assert_eq!(classify_rarity(Some(500.0)).0, RarityTier::Epic);
        assert_eq!(classify_rarity(Some(501.0)).0, RarityTier::Rare);
        assert_eq!(classify_rarity(Some(1500.0)).0, RarityTier::Rare);
        assert_eq!(classify_rarity(Some(1501.0)).0, RarityTier::Uncommon);
        assert_eq!(classify_rarity(Some(2500.0)).0, RarityTier::Uncommon);
        assert_eq!(classify_rarity(Some(2501.0)).0, RarityTier::Common);
    }

    #[test]
    fn tier_is_monotonic_in_rank() {
        let ranks = [1.0, 100.0, 250.0, 500.0, 900.0, 1500.0, 2000.0, 2500.0, 9999.0];
        let mut previous = RarityTier::Legendary;
        for rank in ranks {
            let (tier, _) = classify_rarity(Some(rank));
            assert!(tier >= previous, "tier regressed at rank {}", rank);
            previous = tier;
        }
    }

    #[test]
    fn absent_rank_is_common_na() {
        assert_eq!(
            classify_rarity(None),
            (RarityTier::Common, "N/A".to_string())
        );
        assert_eq!(
            classify_rarity(Some(f64::NAN)),
            (RarityTier::Common, "N/A".to_string())
        );
    }

    #[test]
    fn legendary_color_is_gold() {
        assert_eq!(RarityTier::Legendary.color(), 0xffd700);
        assert_eq!(RarityTier::Common.color(), 0x808080);
    }

    #[test]
    fn emoji_tracks_tier_color() {
        assert_eq!(RarityTier::Legendary.emoji(), "🟡");
        assert_eq!(RarityTier::Epic.emoji(), "🟣");
        assert_eq!(RarityTier::Rare.emoji(), "🔵");
        assert_eq!(RarityTier::Uncommon.emoji(), "🟢");
        assert_eq!(RarityTier::Common.emoji(), "⚪");
    }

    #[test]
    fn rank_display_drops_trailing_zero() {
        assert_eq!(classify_rarity(Some(42.0)).1, "42");
        assert_eq!(classify_rarity(Some(42.5)).1, "42.5");
    }
}
