use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use dashmap::DashSet;
use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::{
    Context, Error,
    config::TARGET_CITIES,
    notify::{Channel, status_label, summary},
    show::ShowRecord,
};

pub async fn load_subscribers(path: &Path) -> DashSet<serenity::UserId> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => match serde_json::from_str::<DashSet<serenity::UserId>>(&content) {
            Ok(subscribers) => subscribers,
            Err(e) => {
                error!("Failed to parse {}: {}", path.display(), e);
                DashSet::new()
            }
        },
        Err(e) => {
            info!("No subscribers loaded from {}: {}", path.display(), e);
            DashSet::new()
        }
    }
}

async fn write_subscribers(ctx: &Context<'_>) {
    let path = &ctx.data().subscribers_path;
    let serialized = match serde_json::to_string(&*ctx.data().subscribers) {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to serialize subscribers: {}", e);
            return;
        }
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            error!("Failed to create {}: {}", parent.display(), e);
            return;
        }
    }
    if let Err(e) = tokio::fs::write(path, serialized).await {
        error!("Failed to write subscribers to {}: {}", path.display(), e);
    }
}

/// Get a DM whenever a new show opens up in Los Angeles, San Francisco or Boulder.
#[poise::command(slash_command)]
pub async fn subscribe(ctx: Context<'_>) -> Result<(), Error> {
    if ctx.data().subscribers.contains(&ctx.author().id) {
        ctx.say(format!(
            "You are already getting alerts for {}.",
            target_cities()
        ))
        .await?;
    } else {
        ctx.data().subscribers.insert(ctx.author().id);
        write_subscribers(&ctx).await;
        ctx.say(format!(
            "You will get a DM when a show opens up in {}. {} subscriber(s) in total.",
            target_cities(),
            ctx.data().subscribers.len()
        ))
        .await?;
    }
    Ok(())
}

#[poise::command(slash_command)]
pub async fn unsubscribe(ctx: Context<'_>) -> Result<(), Error> {
    if ctx.data().subscribers.remove(&ctx.author().id).is_some() {
        write_subscribers(&ctx).await;
        ctx.say("You will no longer get show alerts.").await?;
    } else {
        ctx.say("You are not subscribed to show alerts. Use /subscribe to start.")
            .await?;
    }
    Ok(())
}

/// Human-readable list of the watched cities, e.g. "Los Angeles, San Francisco or Boulder".
fn target_cities() -> String {
    let names: Vec<String> = TARGET_CITIES.iter().map(|(city, _)| city.to_string()).collect();
    match names.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}

/// Direct-messages each show to every subscriber.
pub struct DiscordDm {
    http: serenity::Http,
    subscribers: Arc<DashSet<serenity::UserId>>,
}

impl DiscordDm {
    pub fn new(token: &str, subscribers: Arc<DashSet<serenity::UserId>>) -> Self {
        Self {
            http: serenity::Http::new(token),
            subscribers,
        }
    }
}

#[async_trait]
impl Channel for DiscordDm {
    fn name(&self) -> &'static str {
        "Discord"
    }

    async fn send(&self, show: &ShowRecord) -> Result<(), Error> {
        let message = discord_message(show);
        let users: Vec<serenity::UserId> = self.subscribers.iter().map(|user| *user).collect();
        for user in users {
            let channel = match user.create_dm_channel(&self.http).await {
                Ok(channel) => channel,
                Err(e) => {
                    error!("Failed to get DM channel for user {}: {}", user, e);
                    continue;
                }
            };

            if let Err(e) = channel.say(&self.http, &message).await {
                error!("Failed to send message to user {}: {}", user, e);
            }
        }
        Ok(())
    }
}

fn discord_message(show: &ShowRecord) -> String {
    let mut message = format!("🎵 New show: [{}]({})\n{}\n", show.title, show.url, summary(show));
    for location in show.locations() {
        message.push_str(&format!("📍 {} - {}\n", location.raw_text, status_label(location)));
    }
    message
}
