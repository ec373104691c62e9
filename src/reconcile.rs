use chrono::NaiveDateTime;
use tracing::debug;

use crate::{
    classify::{is_show, mentions_any},
    config::Rules,
    fetch::PageFetcher,
    locations::{available_only, check_locations},
    show::{ShowRecord, TrackedShow},
    store::ShowStore,
};

/// Merges a fresh scrape into the store and returns the shows to notify about.
///
/// Unseen keys are classified, location-checked when they look like shows,
/// and recorded. Seen shows that were never location-checked nor notified
/// get their locations backfilled. Queued shows carry only their available
/// rows in `target_locations`.
pub async fn detect_new_shows(
    current: Vec<ShowRecord>,
    store: &mut ShowStore,
    fetcher: &dyn PageFetcher,
    rules: &Rules,
    now: NaiveDateTime,
) -> Vec<ShowRecord> {
    let mut queued = Vec::new();

    for mut show in current {
        let key = show.key();
        match store.get_mut(&key) {
            None => {
                let is_show = is_show(&show, rules);
                let mut notify = false;
                let locations = if !is_show {
                    debug!("{:?} is not a show", show.title);
                    Vec::new()
                } else if mentions_any(&show.title, rules.title_sold_out_phrases) {
                    debug!("{:?} is already sold out", show.title);
                    Vec::new()
                } else {
                    let matches = check_locations(fetcher, &show.url, rules).await;
                    let available = available_only(matches.clone());
                    notify = !available.is_empty();
                    if notify { available } else { matches }
                };
                show.target_locations = Some(locations);
                if notify {
                    queued.push(show.clone());
                }
                store.insert(
                    key,
                    TrackedShow {
                        show,
                        first_seen: now,
                        notified: false,
                        is_show,
                    },
                );
            }
            Some(existing) => {
                if !existing.is_show
                    || existing.show.target_locations.is_some()
                    || existing.notified
                {
                    continue;
                }
                debug!("backfilling locations for {:?}", show.title);
                let available = available_only(check_locations(fetcher, &show.url, rules).await);
                if !available.is_empty() {
                    existing.show.target_locations = Some(available.clone());
                    show.target_locations = Some(available);
                    queued.push(show);
                }
            }
        }
    }

    queued
}

/// Records that the queued shows were handed to the notifier.
pub fn mark_notified(store: &mut ShowStore, queued: &[ShowRecord]) {
    for show in queued {
        if let Some(tracked) = store.get_mut(&show.key()) {
            tracked.notified = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        show::{City, LocationMatch},
        testing::{StaticPages, listing_record},
    };
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 27)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    const BOULDER_ROWS: &str = r#"
        <div class="shop_sizes" data-size="Fox Theatre | Boulder, CO" data-qty="5"></div>
        <div class="shop_sizes" data-size="Fox Theatre | Boulder, CO (late)" data-qty="0"></div>
    "#;

    #[tokio::test]
    async fn new_show_with_available_row_is_queued() {
        let show = listing_record("VIP Passes to See Artist X", "https://www.propeller.la/rewards/x");
        let pages = StaticPages::default().with_page(&show.url, BOULDER_ROWS);
        let mut store = ShowStore::new();

        let queued = detect_new_shows(vec![show.clone()], &mut store, &pages, &Rules::default(), now()).await;

        let expected = vec![LocationMatch {
            raw_text: "Fox Theatre | Boulder, CO".to_string(),
            city: City::Boulder,
            available: true,
        }];
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].target_locations.as_ref(), Some(&expected));
        let tracked = &store[&show.key()];
        assert!(tracked.is_show);
        assert!(!tracked.notified);
        assert_eq!(tracked.first_seen, now());
        assert_eq!(tracked.show.target_locations.as_ref(), Some(&expected));
    }

    #[tokio::test]
    async fn merchandise_is_tracked_but_not_queued() {
        let shirt = listing_record("Tour Poster T-Shirt Bundle", "https://www.propeller.la/rewards/shirt");
        let pages = StaticPages::default().with_page(&shirt.url, BOULDER_ROWS);
        let mut store = ShowStore::new();

        let queued = detect_new_shows(vec![shirt.clone()], &mut store, &pages, &Rules::default(), now()).await;

        assert!(queued.is_empty());
        let tracked = &store[&shirt.key()];
        assert!(!tracked.is_show);
        assert_eq!(tracked.show.target_locations, Some(Vec::new()));
        assert_eq!(pages.requests(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn sold_out_title_skips_the_detail_page() {
        let show = listing_record("SOLD OUT: Pair of Tickets", "https://www.propeller.la/rewards/gone");
        let pages = StaticPages::default().with_page(&show.url, BOULDER_ROWS);
        let mut store = ShowStore::new();

        let queued = detect_new_shows(vec![show.clone()], &mut store, &pages, &Rules::default(), now()).await;

        assert!(queued.is_empty());
        assert!(pages.requests().is_empty());
        assert!(store[&show.key()].is_show);
        assert_eq!(store[&show.key()].show.target_locations, Some(Vec::new()));
    }

    #[tokio::test]
    async fn show_without_available_rows_keeps_all_matches() {
        let show = listing_record("Pair of Tickets to See Y", "https://www.propeller.la/rewards/y");
        let pages = StaticPages::default().with_page(
            &show.url,
            r#"<div class="shop_sizes" data-size="Boulder, CO" data-qty="0"></div>"#,
        );
        let mut store = ShowStore::new();

        let queued = detect_new_shows(vec![show.clone()], &mut store, &pages, &Rules::default(), now()).await;

        assert!(queued.is_empty());
        let locations = store[&show.key()].show.target_locations.clone().unwrap();
        assert_eq!(locations.len(), 1);
        assert!(!locations[0].available);
    }

    #[tokio::test]
    async fn unchecked_show_from_earlier_run_is_backfilled() {
        let show = listing_record("Festival Passes", "https://www.propeller.la/rewards/fest");
        let mut store = ShowStore::new();
        store.insert(
            show.key(),
            TrackedShow {
                show: show.clone(),
                first_seen: now(),
                notified: false,
                is_show: true,
            },
        );
        let pages = StaticPages::default().with_page(&show.url, BOULDER_ROWS);

        let queued = detect_new_shows(vec![show.clone()], &mut store, &pages, &Rules::default(), now()).await;

        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].locations().len(), 1);
        assert_eq!(store[&show.key()].show.locations(), queued[0].locations());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn checked_or_notified_shows_are_left_alone() {
        let checked = listing_record("Festival Passes", "https://www.propeller.la/rewards/a");
        let notified = listing_record("Concert Tickets", "https://www.propeller.la/rewards/b");
        let mut store = ShowStore::new();
        let mut checked_entry = TrackedShow {
            show: checked.clone(),
            first_seen: now(),
            notified: false,
            is_show: true,
        };
        checked_entry.show.target_locations = Some(Vec::new());
        store.insert(checked.key(), checked_entry);
        store.insert(
            notified.key(),
            TrackedShow {
                show: notified.clone(),
                first_seen: now(),
                notified: true,
                is_show: true,
            },
        );
        let before = store.clone();
        let pages = StaticPages::default()
            .with_page(&checked.url, BOULDER_ROWS)
            .with_page(&notified.url, BOULDER_ROWS);

        let queued = detect_new_shows(vec![checked, notified], &mut store, &pages, &Rules::default(), now()).await;

        assert!(queued.is_empty());
        assert!(pages.requests().is_empty());
        assert_eq!(store, before);
    }

    #[tokio::test]
    async fn failed_backfill_leaves_entry_unchecked() {
        let show = listing_record("Festival Passes", "https://www.propeller.la/rewards/down");
        let mut store = ShowStore::new();
        store.insert(
            show.key(),
            TrackedShow {
                show: show.clone(),
                first_seen: now(),
                notified: false,
                is_show: true,
            },
        );

        let queued = detect_new_shows(vec![show.clone()], &mut store, &StaticPages::default(), &Rules::default(), now()).await;

        assert!(queued.is_empty());
        assert_eq!(store[&show.key()].show.target_locations, None);
    }

    #[tokio::test]
    async fn repeated_listing_in_one_scrape_is_checked_once() {
        let show = listing_record("Festival Passes", "https://www.propeller.la/rewards/dup");
        let pages = StaticPages::default().with_page(&show.url, BOULDER_ROWS);
        let mut store = ShowStore::new();

        let queued =
            detect_new_shows(vec![show.clone(), show.clone()], &mut store, &pages, &Rules::default(), now()).await;

        assert_eq!(queued.len(), 1);
        assert_eq!(pages.requests().len(), 1);
    }

    #[test]
    fn mark_notified_only_touches_queued_keys() {
        let a = listing_record("Festival Passes", "https://www.propeller.la/rewards/a");
        let b = listing_record("Concert Tickets", "https://www.propeller.la/rewards/b");
        let mut store = ShowStore::new();
        for show in [&a, &b] {
            store.insert(
                show.key(),
                TrackedShow {
                    show: show.clone(),
                    first_seen: now(),
                    notified: false,
                    is_show: true,
                },
            );
        }

        mark_notified(&mut store, &[a.clone()]);

        assert!(store[&a.key()].notified);
        assert!(!store[&b.key()].notified);
    }
}
