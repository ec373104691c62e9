use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    fetch::{FetchError, PageFetcher},
    notify::Notifier,
    show::ShowRecord,
    store::{ShowRepository, ShowStore, StoreError},
};

pub fn listing_record(title: &str, url: &str) -> ShowRecord {
    ShowRecord {
        title: title.to_string(),
        url: url.to_string(),
        date: NaiveDate::from_ymd_opt(2025, 5, 27).unwrap(),
        description: String::new(),
        target_locations: None,
    }
}

/// Serves canned pages; unknown urls fail with a 404.
#[derive(Default)]
pub struct StaticPages {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl StaticPages {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StaticPages {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    pub store: Mutex<ShowStore>,
    pub saves: Mutex<usize>,
}

impl MemoryRepository {
    pub fn snapshot(&self) -> ShowStore {
        self.store.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShowRepository for MemoryRepository {
    async fn load(&self) -> Result<ShowStore, StoreError> {
        Ok(self.snapshot())
    }

    async fn save(&self, store: &ShowStore) -> Result<(), StoreError> {
        *self.store.lock().unwrap() = store.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub batches: Mutex<Vec<Vec<ShowRecord>>>,
}

impl RecordingNotifier {
    pub fn notified_titles(&self) -> Vec<String> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|show| show.title.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, shows: &[ShowRecord]) {
        self.batches.lock().unwrap().push(shows.to_vec());
    }
}
