use std::{env::var, path::PathBuf};

use crate::show::City;

/// Substrings that mark an item as merchandise or a donation. Checked first.
pub const MERCH_EXCLUSIONS: &[&str] = &[
    "t-shirt",
    "shirt",
    "hoodie",
    "sticker",
    "tote bag",
    "hat",
    "merch",
    "puzzle",
    "rolling papers",
    "yoga mat",
    "earplugs",
    "gift card",
    "tree planted",
    "meals to families",
    "water kit",
    "donate",
    "surprise reward",
    "points to donate",
    "boost",
    "propeller merch",
    "see all merch",
    "sweepstakes",
    "lyric sheet",
    "gift wrap",
    "poster signed by",
    "pennant",
    "patch",
    "pin supporting",
];

pub const SHOW_INDICATORS: &[&str] = &[
    "tickets to see",
    "pair of tickets",
    "festival",
    "concert",
    "show near you",
    "at a show",
    "passes to",
    "vip passes",
    "festival passes",
    "off your tickets",
    "tour poster",
];

/// Listing titles that are site navigation rather than rewards.
pub const NAV_NOISE: &[&str] = &["earn points", "rewards", "leaders", "impact", "learn more"];

/// Phrases on a venue row meaning the row can no longer be redeemed.
pub const SOLD_OUT_PHRASES: &[&str] = &[
    "sold out",
    "fully redeemed",
    "unavailable",
    "no longer available",
];

/// Phrases in a listing title meaning the whole show is gone.
pub const TITLE_SOLD_OUT_PHRASES: &[&str] = &["sold out", "fully redeemed", "unavailable"];

pub const TARGET_CITIES: &[(City, &[&str])] = &[
    (City::LosAngeles, &["los angeles", "la, ca", ", ca"]),
    (City::SanFrancisco, &["san francisco", "sf, ca"]),
    (City::Boulder, &["boulder", "boulder, co"]),
];

/// Keyword tables driving extraction, classification and location matching.
#[derive(Debug, Clone)]
pub struct Rules {
    pub merch_exclusions: &'static [&'static str],
    pub show_indicators: &'static [&'static str],
    pub nav_noise: &'static [&'static str],
    pub sold_out_phrases: &'static [&'static str],
    pub title_sold_out_phrases: &'static [&'static str],
    pub target_cities: &'static [(City, &'static [&'static str])],
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            merch_exclusions: MERCH_EXCLUSIONS,
            show_indicators: SHOW_INDICATORS,
            nav_noise: NAV_NOISE,
            sold_out_phrases: SOLD_OUT_PHRASES,
            title_sold_out_phrases: TITLE_SOLD_OUT_PHRASES,
            target_cities: TARGET_CITIES,
        }
    }
}

/// The rewards site being watched.
pub struct Site {
    pub listing_url: String,
    /// Prefixed to relative listing links.
    pub origin: String,
}

pub struct Config {
    pub site: Site,
    pub store_path: PathBuf,
    pub subscribers_path: PathBuf,
    pub telegram: Option<TelegramConfig>,
    pub discord_token: Option<String>,
}

pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl Config {
    pub fn from_env() -> Self {
        let telegram = match (var("TELEGRAM_BOT_TOKEN"), var("TELEGRAM_CHAT_ID")) {
            (Ok(bot_token), Ok(chat_id)) if !bot_token.is_empty() && !chat_id.is_empty() => {
                Some(TelegramConfig { bot_token, chat_id })
            }
            _ => None,
        };
        Self {
            site: Site {
                listing_url: var("SHOW_WATCHER_LISTING_URL")
                    .unwrap_or_else(|_| "https://www.propeller.la/rewards".to_string()),
                origin: var("SHOW_WATCHER_SITE_ORIGIN")
                    .unwrap_or_else(|_| "https://www.propeller.la".to_string()),
            },
            store_path: var("SHOW_WATCHER_STORE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/shows.json")),
            subscribers_path: var("SHOW_WATCHER_SUBSCRIBERS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/subscribers.json")),
            telegram,
            discord_token: var("DISCORD_TOKEN").ok().filter(|token| !token.is_empty()),
        }
    }
}
