use std::{collections::BTreeSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use dashmap::DashSet;
use poise::serenity_prelude as serenity;
use reqwest::Client;
use serde_json::json;
use tracing::{error, info};

use crate::{
    Error,
    commands::DiscordDm,
    config::{Config, TelegramConfig},
    show::{City, LocationMatch, ShowRecord},
};

/// Receives the shows queued by a run. Delivery failures never reach the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, shows: &[ShowRecord]);
}

/// One delivery route for show alerts.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, show: &ShowRecord) -> Result<(), Error>;
}

/// Sends every show through every channel, logging channel failures.
pub struct Dispatcher {
    channels: Vec<Box<dyn Channel>>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn Channel>>) -> Self {
        Self { channels }
    }

    pub fn from_config(config: &Config, subscribers: Arc<DashSet<serenity::UserId>>) -> Self {
        let mut channels: Vec<Box<dyn Channel>> = vec![Box::new(Terminal)];

        match &config.telegram {
            Some(telegram) => channels.push(Box::new(Telegram::new(telegram))),
            None => info!(
                "Telegram credentials not found. Set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID to enable Telegram alerts."
            ),
        }

        if let Some(token) = &config.discord_token {
            channels.push(Box::new(DiscordDm::new(token, subscribers)));
        }

        if cfg!(target_os = "macos") {
            channels.push(Box::new(Desktop));
        }

        Self::new(channels)
    }
}

#[async_trait]
impl Notifier for Dispatcher {
    async fn notify(&self, shows: &[ShowRecord]) {
        for show in shows {
            for channel in &self.channels {
                if let Err(e) = channel.send(show).await {
                    error!("{} notification failed for {}: {}", channel.name(), show.title, e);
                }
            }
        }
    }
}

/// Description preview used as the alert body.
pub fn summary(show: &ShowRecord) -> String {
    if show.description.is_empty() {
        "New show available!".to_string()
    } else {
        format!("{}...", show.description.chars().take(100).collect::<String>())
    }
}

pub fn status_label(location: &LocationMatch) -> &'static str {
    if location.available {
        "✓ Available"
    } else {
        "✗ Sold Out"
    }
}

pub struct Terminal;

#[async_trait]
impl Channel for Terminal {
    fn name(&self) -> &'static str {
        "Terminal"
    }

    async fn send(&self, show: &ShowRecord) -> Result<(), Error> {
        println!("{}", terminal_banner(show));
        Ok(())
    }
}

fn terminal_banner(show: &ShowRecord) -> String {
    let rule = "=".repeat(50);
    let mut banner = format!(
        "\n{rule}\n🎬 NEW SHOW ALERT - {}\n{rule}\nTitle: {}\nDetails: {}\n",
        Local::now().format("%Y-%m-%d %H:%M"),
        show.title,
        summary(show)
    );
    if !show.locations().is_empty() {
        banner.push_str("🎯 Target City Locations:\n");
        for location in show.locations() {
            banner.push_str(&format!("  • {} - {}\n", location.raw_text, status_label(location)));
        }
    }
    banner.push_str(&rule);
    banner.push('\n');
    banner
}

pub struct Telegram {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl Telegram {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }
}

#[async_trait]
impl Channel for Telegram {
    fn name(&self) -> &'static str {
        "Telegram"
    }

    async fn send(&self, show: &ShowRecord) -> Result<(), Error> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": telegram_message(show),
            "parse_mode": "Markdown",
            "disable_web_page_preview": false,
        });
        self.client
            .post(format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token))
            .json(&payload)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?;
        info!("Telegram notification sent for {}", show.title);
        Ok(())
    }
}

fn telegram_message(show: &ShowRecord) -> String {
    let mut message = format!("🎵 *New Show: {}*\n\n", show.title);
    if !show.locations().is_empty() {
        message.push_str("📍 *Available in your cities:*\n");
        for location in show.locations() {
            let status = if location.available { "✅" } else { "❌ SOLD OUT" };
            message.push_str(&format!("{} `{}`\n", status, location.raw_text));
        }
        message.push('\n');
    }
    if !show.url.is_empty() {
        message.push_str(&format!("🔗 [View Show Details]({})", show.url));
    }
    message
}

/// macOS notification center, via `osascript`.
pub struct Desktop;

#[async_trait]
impl Channel for Desktop {
    fn name(&self) -> &'static str {
        "macOS"
    }

    async fn send(&self, show: &ShowRecord) -> Result<(), Error> {
        let status = tokio::process::Command::new("osascript")
            .arg("-e")
            .arg(desktop_script(show))
            .status()
            .await?;
        if !status.success() {
            return Err(format!("osascript exited with {status}").into());
        }
        Ok(())
    }
}

fn desktop_script(show: &ShowRecord) -> String {
    let mut message = summary(show);
    let cities: BTreeSet<String> = show.locations().iter().map(|l| l.city.to_string()).collect();
    if !cities.is_empty() {
        message.push_str(&format!(
            " (in {})",
            cities.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    format!(
        r#"display notification "{}" with title "New Show: {}" sound name "default""#,
        escape_applescript(&message),
        escape_applescript(&show.title)
    )
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Canned show used by `test-notify` to exercise every channel.
pub fn sample_show() -> ShowRecord {
    ShowRecord {
        title: "Test Concert - The Weeknd".to_string(),
        url: "https://www.propeller.la/rewards/test".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 5, 27).unwrap_or_default(),
        description: "This is a test notification for The Weeknd concert".to_string(),
        target_locations: Some(vec![
            LocationMatch {
                raw_text: "6/25/25 @ SoFi Stadium | Los Angeles, CA".to_string(),
                city: City::LosAngeles,
                available: true,
            },
            LocationMatch {
                raw_text: "6/27/25 @ Chase Center | San Francisco, CA".to_string(),
                city: City::SanFrancisco,
                available: false,
            },
        ]),
    }
}
