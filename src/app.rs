use std::sync::Arc;

use futures::StreamExt;

use crate::config::{Config, Configuration};
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{ConnectTimeout, ProgressResource, RetentionStrategy};
use crate::parser::M3uParser;
use crate::services::SubscriptionService;
use crate::source::{SourceReader, UnsupportedContentResolver};

pub const USAGE: &str = "\
Usage:
  m3u --subscribe <title> <url> [all|skip-favorite|keep-all]
  m3u --unsubscribe <url>
  m3u --rename <url> <title>
  m3u --list
  m3u --channels <playlist-url>
  m3u --favourite <channel-url>
  m3u --refresh
  m3u --set-strategy <all|skip-favorite|keep-all>
  m3u --set-timeout <short|medium|long>
  m3u --set-ssl-verification <on|off>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Subscribe {
        title: String,
        url: String,
        strategy: Option<RetentionStrategy>,
    },
    Unsubscribe(String),
    Rename {
        url: String,
        title: String,
    },
    List,
    Channels(String),
    ToggleFavourite(String),
    Refresh,
    SetStrategy(RetentionStrategy),
    SetTimeout(ConnectTimeout),
    SetSslVerification(bool),
    Help,
}

impl Command {
    /// Parse the arguments that follow the program name.
    pub fn parse(args: &[String]) -> Result<Self> {
        let flag = match args.first() {
            Some(flag) => flag.as_str(),
            None => return Ok(Command::Help),
        };
        let arg = |i: usize| {
            args.get(i)
                .cloned()
                .ok_or_else(|| AppError::InvalidArgument(format!("{} expects more arguments", flag)))
        };

        let command = match flag {
            "--subscribe" => Command::Subscribe {
                title: arg(1)?,
                url: arg(2)?,
                strategy: args.get(3).map(|s| s.parse()).transpose()?,
            },
            "--unsubscribe" => Command::Unsubscribe(arg(1)?),
            "--rename" => Command::Rename {
                url: arg(1)?,
                title: arg(2)?,
            },
            "--list" => Command::List,
            "--channels" => Command::Channels(arg(1)?),
            "--favourite" | "--favorite" => Command::ToggleFavourite(arg(1)?),
            "--refresh" => Command::Refresh,
            "--set-strategy" => Command::SetStrategy(arg(1)?.parse()?),
            "--set-timeout" => Command::SetTimeout(arg(1)?.parse()?),
            "--set-ssl-verification" => Command::SetSslVerification(parse_switch(&arg(1)?)?),
            "--help" | "-h" => Command::Help,
            other => {
                return Err(AppError::InvalidArgument(format!("unknown option '{}'", other)))
            }
        };
        Ok(command)
    }
}

fn parse_switch(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(AppError::InvalidArgument(format!(
            "expected on or off, got '{}'",
            other
        ))),
    }
}

pub struct App {
    configuration: Configuration,
    service: SubscriptionService,
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let mut configuration = Configuration::new(config);
        configuration.on_change(Box::new(|config, change| {
            if let Err(e) = config.save() {
                tracing::warn!("Failed to save config after {}: {}", change, e);
            }
        }));

        let repository = Arc::new(Repository::new(&configuration.get().db_path).await?);
        let reader = SourceReader::new(configuration.get(), Arc::new(UnsupportedContentResolver))?;
        let service = SubscriptionService::new(
            repository,
            Arc::new(reader),
            Arc::new(M3uParser::new()),
        );

        Ok(Self {
            configuration,
            service,
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Subscribe {
                title,
                url,
                strategy,
            } => {
                let strategy = strategy.unwrap_or(self.configuration.get().retention_strategy);
                self.subscribe(&title, &url, strategy).await?;
            }

            Command::Unsubscribe(url) => match self.service.unsubscribe(&url).await? {
                Some(playlist) => println!("Unsubscribed from {} ({})", playlist.title, playlist.url),
                None => println!("No playlist at {}", url),
            },

            Command::Rename { url, title } => {
                self.service.rename(&url, &title).await;
                match self.service.get(&url).await? {
                    Some(playlist) => println!("Playlist {} is now '{}'", url, playlist.title),
                    None => println!("No playlist at {}", url),
                }
            }

            Command::List => {
                let playlists = self.service.observe_all().borrow().clone();
                for playlist in playlists {
                    let count = self.service.channels(&playlist.url).await?.len();
                    println!("{}\t{}\t{} channels", playlist.title, playlist.url, count);
                }
            }

            Command::Channels(url) => {
                for channel in self.service.channels(&url).await? {
                    println!("{}", serde_json::to_string(&channel)?);
                }
            }

            Command::ToggleFavourite(url) => match self.service.toggle_favourite(&url).await? {
                Some(true) => println!("Added {} to favourites", url),
                Some(false) => println!("Removed {} from favourites", url),
                None => println!("No channel at {}", url),
            },

            Command::Refresh => {
                let strategy = self.configuration.get().retention_strategy;
                let outcomes = self.service.refresh_all(strategy).await?;
                for (playlist, outcome) in &outcomes {
                    match outcome {
                        ProgressResource::Success(()) => {}
                        ProgressResource::Failure(e) | ProgressResource::Message(e) => {
                            println!("{}: {}", playlist.title, e)
                        }
                        ProgressResource::InProgress(_) => {}
                    }
                }
                println!("Refreshed {} playlists", outcomes.len());
            }

            Command::SetStrategy(strategy) => {
                self.configuration.set_retention_strategy(strategy);
                println!("Retention strategy: {}", strategy);
            }

            Command::SetTimeout(timeout) => {
                self.configuration.set_connect_timeout(timeout);
                println!("Connect timeout: {} ({} ms)", timeout, timeout.as_millis());
            }

            Command::SetSslVerification(enabled) => {
                self.configuration.set_ssl_verification(enabled);
                println!("SSL verification: {}", if enabled { "on" } else { "off" });
            }

            Command::Help => println!("{}", USAGE),
        }

        Ok(())
    }

    async fn subscribe(&self, title: &str, url: &str, strategy: RetentionStrategy) -> Result<()> {
        let mut stream = self.service.subscribe(title, url, strategy);
        let mut written = 0;

        while let Some(state) = stream.next().await {
            match state {
                ProgressResource::InProgress(count) => written = count,
                ProgressResource::Success(()) => {
                    println!("Subscribed to {}: {} channels written", url, written);
                }
                ProgressResource::Message(message) => println!("{}", message),
                ProgressResource::Failure(error) => {
                    return Err(anyhow::anyhow!("Failed to subscribe to {}: {}", url, error).into());
                }
            }
        }

        Ok(())
    }
}
