use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A reward listing scraped from the rewards page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowRecord {
    pub title: String,
    pub url: String,
    /// Day the listing was scraped. The site has no listing-level date.
    pub date: NaiveDate,
    pub description: String,
    /// `None` until the detail page has been checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_locations: Option<Vec<LocationMatch>>,
}

impl ShowRecord {
    /// Identity key used for deduplication and as the store key.
    ///
    /// Collides when a title is edited or the url contains the separator.
    pub fn key(&self) -> String {
        show_key(&self.title, &self.url)
    }

    pub fn locations(&self) -> &[LocationMatch] {
        self.target_locations.as_deref().unwrap_or_default()
    }
}

pub fn show_key(title: &str, url: &str) -> String {
    format!("{title}_{url}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    #[serde(rename = "los angeles")]
    LosAngeles,
    #[serde(rename = "san francisco")]
    SanFrancisco,
    #[serde(rename = "boulder")]
    Boulder,
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            City::LosAngeles => "Los Angeles",
            City::SanFrancisco => "San Francisco",
            City::Boulder => "Boulder",
        })
    }
}

/// One venue row on a show's detail page that names a target city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationMatch {
    pub raw_text: String,
    pub city: City,
    pub available: bool,
}

/// A store entry. Created the first time a key is seen and never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedShow {
    #[serde(flatten)]
    pub show: ShowRecord,
    pub first_seen: NaiveDateTime,
    #[serde(default)]
    pub notified: bool,
    #[serde(default)]
    pub is_show: bool,
}
