mod classify;
mod commands;
mod config;
mod extract;
mod fetch;
mod locations;
mod notify;
mod reconcile;
mod show;
mod store;
#[cfg(test)]
mod testing;
mod watcher;

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use dashmap::DashSet;
use poise::{FrameworkOptions, serenity_prelude as serenity};
use tracing::info;

use crate::{
    config::{Config, Rules},
    fetch::HttpFetcher,
    notify::{Dispatcher, Notifier},
    store::JsonFileRepository,
};

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

pub struct Data {
    subscribers: Arc<DashSet<serenity::UserId>>,
    subscribers_path: PathBuf,
}

/// Watches the Propeller rewards page for new shows in Los Angeles, San Francisco and Boulder.
#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check the rewards page once and notify about new shows (default)
    Check,
    /// Run the Discord bot that manages alert subscriptions
    Bot,
    /// Send a sample alert through every configured channel
    TestNotify,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(if cfg!(debug_assertions) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command.unwrap_or(Command::Check) {
        Command::Check => {
            let dispatcher = dispatcher(&config).await;
            let summary = watcher::run_once(
                &config.site,
                &Rules::default(),
                &HttpFetcher::new(),
                &JsonFileRepository::new(config.store_path.clone()),
                &dispatcher,
            )
            .await;
            info!(
                "Run finished: {} scraped, {} notified, {} tracked",
                summary.scraped, summary.notified, summary.tracked
            );
            Ok(())
        }
        Command::TestNotify => {
            dispatcher(&config)
                .await
                .notify(&[notify::sample_show()])
                .await;
            Ok(())
        }
        Command::Bot => run_bot(config).await,
    }
}

async fn dispatcher(config: &Config) -> Dispatcher {
    let subscribers = Arc::new(commands::load_subscribers(&config.subscribers_path).await);
    Dispatcher::from_config(config, subscribers)
}

async fn run_bot(config: Config) -> Result<(), Error> {
    let token = config
        .discord_token
        .clone()
        .ok_or("Missing `DISCORD_TOKEN` env var")?;
    let subscribers_path = config.subscribers_path.clone();

    let options: FrameworkOptions<Data, Error> = poise::FrameworkOptions {
        commands: vec![commands::subscribe(), commands::unsubscribe()],
        pre_command: |ctx| {
            Box::pin(async move {
                info!("Executing command {}...", ctx.command().qualified_name);
            })
        },
        post_command: |ctx| {
            Box::pin(async move {
                info!("Executed command {}!", ctx.command().qualified_name);
            })
        },
        ..Default::default()
    };

    let framework = poise::Framework::builder()
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                let subscribers = Arc::new(commands::load_subscribers(&subscribers_path).await);
                info!("Loaded {} subscriber(s)", subscribers.len());
                Ok(Data {
                    subscribers,
                    subscribers_path,
                })
            })
        })
        .options(options)
        .build();

    let intents = serenity::GatewayIntents::non_privileged();
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    client.start().await?;

    Ok(())
}
