//! Channel taxonomies for raw (platform, grouping) pairs.
//!
//! Each taxonomy is an ordered rule list; the first matching rule wins and the
//! `Other` variant catches everything left over. Matching is case-insensitive.

use serde::{Deserialize, Serialize};

/// Wide-column measure suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMeasure {
    Spend,
    Imps,
    Clicks,
    NewClicks,
}

impl ChannelMeasure {
    pub fn suffix(self) -> &'static str {
        match self {
            ChannelMeasure::Spend => "spend",
            ChannelMeasure::Imps => "imps",
            ChannelMeasure::Clicks => "clicks",
            ChannelMeasure::NewClicks => "new_clicks",
        }
    }
}

// === Marketing ===========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketingChannel {
    Meta,
    GoogleSearch,
    GoogleShopping,
    GoogleDisplay,
    GooglePmax,
    GoogleVideo,
    Other,
}

impl MarketingChannel {
    /// Channels that get their own wide columns, in output order.
    pub const PIVOTED: [MarketingChannel; 6] = [
        MarketingChannel::Meta,
        MarketingChannel::GoogleSearch,
        MarketingChannel::GoogleShopping,
        MarketingChannel::GoogleDisplay,
        MarketingChannel::GooglePmax,
        MarketingChannel::GoogleVideo,
    ];

    pub const ALL: [MarketingChannel; 7] = [
        MarketingChannel::Meta,
        MarketingChannel::GoogleSearch,
        MarketingChannel::GoogleShopping,
        MarketingChannel::GoogleDisplay,
        MarketingChannel::GooglePmax,
        MarketingChannel::GoogleVideo,
        MarketingChannel::Other,
    ];

    pub const MEASURES: [ChannelMeasure; 4] = [
        ChannelMeasure::Spend,
        ChannelMeasure::Imps,
        ChannelMeasure::Clicks,
        ChannelMeasure::NewClicks,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MarketingChannel::Meta => "meta",
            MarketingChannel::GoogleSearch => "google_search",
            MarketingChannel::GoogleShopping => "google_shopping",
            MarketingChannel::GoogleDisplay => "google_display",
            MarketingChannel::GooglePmax => "google_pmax",
            MarketingChannel::GoogleVideo => "google_video",
            MarketingChannel::Other => "other",
        }
    }

    pub fn column(self, measure: ChannelMeasure) -> String {
        format!("{}_{}", self.label(), measure.suffix())
    }

    /// Classify a raw (platform, grouping) pair.
    pub fn classify(platform: &str, grouping: &str) -> Self {
        let platform = platform.trim().to_lowercase();
        let grouping = grouping.to_lowercase();
        MARKETING_RULES
            .iter()
            .find(|(matches, _)| matches(&platform, &grouping))
            .map(|(_, channel)| *channel)
            .unwrap_or(MarketingChannel::Other)
    }
}

type MarketingRule = (fn(&str, &str) -> bool, MarketingChannel);

const META_PLATFORMS: [&str; 4] = ["facebook", "audience network", "instagram", "messenger"];

fn is_generic_paid_search(grouping: &str) -> bool {
    grouping.contains("paid search") && !grouping.contains("brand")
}

// Arguments are already lowercased. Google groupings that match none of the
// Google rules fall through to `Other` because no later rule accepts "google".
const MARKETING_RULES: [MarketingRule; 6] = [
    (|p, g| p == "google" && g.contains("shopping"), MarketingChannel::GoogleShopping),
    (|p, g| p == "google" && is_generic_paid_search(g), MarketingChannel::GoogleSearch),
    (|p, g| p == "google" && g.contains("display"), MarketingChannel::GoogleDisplay),
    (|p, g| p == "google" && g.contains("performance max"), MarketingChannel::GooglePmax),
    (|p, g| p == "google" && g.contains("video"), MarketingChannel::GoogleVideo),
    (|p, _| META_PLATFORMS.contains(&p), MarketingChannel::Meta),
];

// === Controls ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlChannel {
    BrandedSearch,
    Direct,
    OrganicSearch,
    Affiliate,
    Referral,
    Other,
}

impl ControlChannel {
    /// Every control channel is pivoted, `Other` included.
    pub const ALL: [ControlChannel; 6] = [
        ControlChannel::BrandedSearch,
        ControlChannel::Direct,
        ControlChannel::OrganicSearch,
        ControlChannel::Affiliate,
        ControlChannel::Referral,
        ControlChannel::Other,
    ];

    pub const MEASURES: [ChannelMeasure; 2] = [ChannelMeasure::Clicks, ChannelMeasure::NewClicks];

    pub fn label(self) -> &'static str {
        match self {
            ControlChannel::BrandedSearch => "branded_search",
            ControlChannel::Direct => "direct",
            ControlChannel::OrganicSearch => "organic_search",
            ControlChannel::Affiliate => "affiliate",
            ControlChannel::Referral => "referral",
            ControlChannel::Other => "other",
        }
    }

    pub fn column(self, measure: ChannelMeasure) -> String {
        format!("{}_{}", self.label(), measure.suffix())
    }

    /// Classify a raw channel grouping.
    pub fn classify(grouping: &str) -> Self {
        let grouping = grouping.to_lowercase();
        CONTROL_RULES
            .iter()
            .find(|(matches, _)| matches(&grouping))
            .map(|(_, channel)| *channel)
            .unwrap_or(ControlChannel::Other)
    }
}

type ControlRule = (fn(&str) -> bool, ControlChannel);

const CONTROL_RULES: [ControlRule; 5] = [
    (|g| g.contains("paid search") && g.contains("brand"), ControlChannel::BrandedSearch),
    (|g| g.contains("direct"), ControlChannel::Direct),
    (|g| g.contains("organic search"), ControlChannel::OrganicSearch),
    (|g| g.contains("affiliate"), ControlChannel::Affiliate),
    (|g| g.contains("referral"), ControlChannel::Referral),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_groupings() {
        assert_eq!(MarketingChannel::classify("google", "Paid Search - Generic"), MarketingChannel::GoogleSearch);
        assert_eq!(MarketingChannel::classify("Google", "Paid Shopping"), MarketingChannel::GoogleShopping);
        assert_eq!(MarketingChannel::classify("google", "Display"), MarketingChannel::GoogleDisplay);
        assert_eq!(MarketingChannel::classify("GOOGLE", "Performance Max"), MarketingChannel::GooglePmax);
        assert_eq!(MarketingChannel::classify("google", "Paid Video"), MarketingChannel::GoogleVideo);
        assert_eq!(MarketingChannel::classify("google", "Organic Search"), MarketingChannel::Other);
    }

    #[test]
    fn test_shopping_wins_over_later_rules() {
        assert_eq!(
            MarketingChannel::classify("google", "Paid Search - Shopping"),
            MarketingChannel::GoogleShopping
        );
    }

    #[test]
    fn test_meta_platforms() {
        for platform in ["facebook", "Audience Network", "INSTAGRAM", "messenger"] {
            assert_eq!(MarketingChannel::classify(platform, "Paid Social"), MarketingChannel::Meta);
        }
        assert_eq!(MarketingChannel::classify("tiktok", "Paid Social"), MarketingChannel::Other);
        assert_eq!(MarketingChannel::classify("", ""), MarketingChannel::Other);
    }

    #[test]
    fn test_branded_search_asymmetry() {
        assert_eq!(MarketingChannel::classify("google", "Paid Search - Branded"), MarketingChannel::Other);
        assert_eq!(ControlChannel::classify("Paid Search - Branded"), ControlChannel::BrandedSearch);
        assert_eq!(ControlChannel::classify("Paid Search - Generic"), ControlChannel::Other);
    }

    #[test]
    fn test_control_groupings() {
        assert_eq!(ControlChannel::classify("Direct"), ControlChannel::Direct);
        assert_eq!(ControlChannel::classify("Organic Search"), ControlChannel::OrganicSearch);
        assert_eq!(ControlChannel::classify("Affiliates"), ControlChannel::Affiliate);
        assert_eq!(ControlChannel::classify("Referral"), ControlChannel::Referral);
        assert_eq!(ControlChannel::classify("Email"), ControlChannel::Other);
    }

    #[test]
    fn test_classification_is_total_and_stable() {
        let platforms = ["google", "facebook", "instagram", "bing", "", "Messenger"];
        let groupings = ["Paid Search - Generic", "Paid Search - Branded", "Display", "Direct", "Video", "x"];
        for p in platforms {
            for g in groupings {
                let first = MarketingChannel::classify(p, g);
                assert!(MarketingChannel::ALL.contains(&first));
                assert_eq!(first, MarketingChannel::classify(p, g));
                let control = ControlChannel::classify(g);
                assert!(ControlChannel::ALL.contains(&control));
                assert_eq!(control, ControlChannel::classify(g));
            }
        }
    }

    #[test]
    fn test_column_names() {
        assert_eq!(MarketingChannel::GooglePmax.column(ChannelMeasure::Spend), "google_pmax_spend");
        assert_eq!(ControlChannel::Other.column(ChannelMeasure::NewClicks), "other_new_clicks");
    }
}
