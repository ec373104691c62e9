use chrono::Local;
use tracing::{error, info};

use crate::{
    config::{Rules, Site},
    extract::extract_shows,
    fetch::PageFetcher,
    notify::{Notifier, status_label},
    reconcile::{detect_new_shows, mark_notified},
    store::ShowRepository,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub scraped: usize,
    pub notified: usize,
    pub tracked: usize,
}

/// One check of the rewards site: scrape, reconcile, notify, persist.
///
/// Never fails. Fetch and save errors are logged and the store is written
/// back. A store that cannot be loaded is left untouched and nothing is
/// checked, so a bad file never loses keys or triggers repeat alerts.
pub async fn run_once(
    site: &Site,
    rules: &Rules,
    fetcher: &dyn PageFetcher,
    repository: &dyn ShowRepository,
    notifier: &dyn Notifier,
) -> RunSummary {
    let mut store = match repository.load().await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to load show store, skipping this run: {}", e);
            return RunSummary {
                scraped: 0,
                notified: 0,
                tracked: 0,
            };
        }
    };

    info!("checking site {}", site.listing_url);
    let current = match fetcher.fetch(&site.listing_url).await {
        Ok(html) => extract_shows(&html, &site.origin, rules, Local::now().date_naive()),
        Err(e) => {
            error!("Error checking site {}: {}", site.listing_url, e);
            Vec::new()
        }
    };
    let scraped = current.len();
    info!("Found {} items on {}", scraped, site.listing_url);

    let queued = detect_new_shows(current, &mut store, fetcher, rules, Local::now().naive_local()).await;

    if queued.is_empty() {
        info!("No new shows found in target cities (Los Angeles, San Francisco, Boulder)");
    } else {
        info!("Found {} new show(s) in target cities", queued.len());
        for show in &queued {
            info!("  - {} ({})", show.title, show.date);
            for location in show.locations() {
                info!("    • {} - {}", location.raw_text, status_label(location));
            }
        }
        notifier.notify(&queued).await;
        mark_notified(&mut store, &queued);
    }

    if let Err(e) = repository.save(&store).await {
        error!("Failed to save show store: {}", e);
    }
    info!("Total shows tracked: {}", store.len());

    RunSummary {
        scraped,
        notified: queued.len(),
        tracked: store.len(),
    }
}
