use std::{collections::HashSet, sync::LazyLock};

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::{config::Rules, show::ShowRecord, show::show_key};

const MAX_TITLE_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 200;

/// Candidate containers, most specific first.
static CANDIDATE_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        r#"a[href*="/campaigns/"]"#,
        r#"a[href*="/rewards/"]"#,
        "div.campaign-item",
        "article.reward",
        r#"div[class*="reward"]"#,
        r#"div[class*="campaign"]"#,
    ]
    .iter()
    .map(|selector| Selector::parse(selector).unwrap())
    .collect()
});
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, span").unwrap());
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static LISTING_LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href*="/campaigns/"], a[href*="/rewards/"]"#).unwrap()
});

type Strategy = fn(&Extractor<'_>, &Html) -> Vec<ShowRecord>;

/// Tried in order; the first strategy that finds anything wins.
const STRATEGIES: &[Strategy] = &[structured_scan, link_scan];

struct Extractor<'a> {
    rules: &'a Rules,
    origin: &'a str,
    today: NaiveDate,
}

/// Parses the rewards listing page into show records, in document order.
pub fn extract_shows(html: &str, origin: &str, rules: &Rules, today: NaiveDate) -> Vec<ShowRecord> {
    let document = Html::parse_document(html);
    let extractor = Extractor {
        rules,
        origin,
        today,
    };
    STRATEGIES
        .iter()
        .map(|strategy| strategy(&extractor, &document))
        .find(|shows| !shows.is_empty())
        .unwrap_or_default()
}

fn structured_scan(extractor: &Extractor<'_>, document: &Html) -> Vec<ShowRecord> {
    let mut seen = HashSet::new();
    let mut shows = Vec::new();
    for selector in CANDIDATE_SELECTORS.iter() {
        for element in document.select(selector) {
            let Some((title, url)) = extractor.title_and_url(element) else {
                continue;
            };
            if !seen.insert(show_key(&title, &url)) {
                continue;
            }
            shows.push(ShowRecord {
                title: truncate(&title, MAX_TITLE_CHARS),
                url,
                date: extractor.today,
                description: truncate(&flattened_text(element), MAX_DESCRIPTION_CHARS),
                target_locations: None,
            });
        }
    }
    shows
}

/// Every listing link with text becomes a record with an empty description.
fn link_scan(extractor: &Extractor<'_>, document: &Html) -> Vec<ShowRecord> {
    document
        .select(&LISTING_LINK_SELECTOR)
        .filter_map(|link| {
            let text = link.text().collect::<String>();
            let title = text.trim();
            if title.is_empty() {
                return None;
            }
            Some(ShowRecord {
                title: truncate(title, MAX_TITLE_CHARS),
                url: extractor.absolute(link.value().attr("href").unwrap_or_default()),
                date: extractor.today,
                description: String::new(),
                target_locations: None,
            })
        })
        .collect()
}

impl Extractor<'_> {
    fn title_and_url(&self, element: ElementRef<'_>) -> Option<(String, String)> {
        let link = if element.value().name() == "a" {
            Some(element)
        } else {
            element.select(&LINK_SELECTOR).next()
        };
        let title = match element.select(&TITLE_SELECTOR).next() {
            Some(heading) => collapse_whitespace(&heading.text().collect::<String>()),
            None => collapse_whitespace(&link?.text().collect::<String>()),
        };
        if title.is_empty() {
            return None;
        }

        let lowered = title.to_lowercase();
        if let Some(noise) = self.rules.nav_noise.iter().find(|noise| lowered.contains(*noise)) {
            debug!("skipping navigation item {:?} (matched {:?})", title, noise);
            return None;
        }

        let href = link
            .and_then(|link| link.value().attr("href"))
            .unwrap_or_default();
        Some((title, self.absolute(href)))
    }

    fn absolute(&self, href: &str) -> String {
        if href.is_empty() || href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}{}", self.origin, href)
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text nodes trimmed and glued together, then whitespace-collapsed.
fn flattened_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().map(str::trim).collect::<String>())
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
