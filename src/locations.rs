use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::warn;

use crate::{
    classify::mentions_any,
    config::Rules,
    fetch::PageFetcher,
    show::LocationMatch,
};

static LOCATION_ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.shop_sizes").unwrap());

/// Fetches a show's detail page and returns its target-city venue rows.
/// A failed fetch is logged and yields no rows.
pub async fn check_locations(
    fetcher: &dyn PageFetcher,
    url: &str,
    rules: &Rules,
) -> Vec<LocationMatch> {
    match fetcher.fetch(url).await {
        Ok(html) => parse_locations(&html, rules),
        Err(e) => {
            warn!("Error fetching show page {}: {}", url, e);
            Vec::new()
        }
    }
}

/// Reads the option rows of a detail page. A row can match several cities,
/// but only the first matching variant of each city.
pub fn parse_locations(html: &str, rules: &Rules) -> Vec<LocationMatch> {
    let document = Html::parse_document(html);
    let mut matches = Vec::new();
    for row in document.select(&LOCATION_ROW_SELECTOR) {
        let label = match row.value().attr("data-size") {
            Some(size) if !size.is_empty() => size.to_string(),
            _ => row.text().map(str::trim).collect(),
        };
        let lowered = label.to_lowercase();

        for (city, variants) in rules.target_cities {
            if !variants.iter().any(|variant| lowered.contains(variant)) {
                continue;
            }
            let quantity = row.value().attr("data-qty").unwrap_or("0");
            let available = !quantity.is_empty()
                && quantity != "0"
                && !mentions_any(&lowered, rules.sold_out_phrases);
            matches.push(LocationMatch {
                raw_text: label.clone(),
                city: *city,
                available,
            });
        }
    }
    matches
}

/// Rows that can still be redeemed.
pub fn available_only(matches: Vec<LocationMatch>) -> Vec<LocationMatch> {
    matches.into_iter().filter(|m| m.available).collect()
}
