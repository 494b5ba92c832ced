//! Command-line arguments.
//!
//! Every flag overrides the matching config file / environment value.

use clap::Parser;

use crate::config::env::get_config_path;
use crate::config::types::{Config, RegistryBackend};

#[derive(Debug, Default, Parser)]
#[command(name = "charitybot", version, about = "Answers Twitter mentions with charity register details")]
pub struct Args {
    /// Config file path (defaults to $CHARITYBOT_CONFIG or charitybot.conf)
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Twitter authorisation: consumer key
    #[arg(long)]
    pub consumer_key: Option<String>,

    /// Twitter authorisation: consumer secret
    #[arg(long)]
    pub consumer_secret: Option<String>,

    /// Twitter authorisation: access token
    #[arg(long)]
    pub access_token: Option<String>,

    /// Twitter authorisation: access token secret
    #[arg(long)]
    pub access_token_secret: Option<String>,

    /// Time to sleep between mention checks, in seconds
    #[arg(short = 's', long = "sleep")]
    pub sleep: Option<u64>,

    /// Debug mode: print replies instead of posting them
    #[arg(long)]
    pub debug: bool,

    /// Registry backend: charitybase or findthatcharity
    #[arg(long)]
    pub backend: Option<RegistryBackend>,

    /// Replay mentions from a JSON file instead of calling Twitter
    #[arg(long)]
    pub fixtures: Option<String>,

    /// Handle the bot answers to
    #[arg(long)]
    pub handle: Option<String>,
}

impl Args {
    /// Config path to load and whether the user asked for it explicitly.
    pub fn config_path(&self) -> (String, bool) {
        match self.config {
            Some(ref path) => (path.clone(), true),
            None => {
                let explicit = std::env::var("CHARITYBOT_CONFIG").is_ok();
                (get_config_path(), explicit)
            }
        }
    }

    /// Apply command-line overrides on top of file and environment values.
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        let credentials = [
            (&self.consumer_key, &mut config.twitter.consumer_key),
            (&self.consumer_secret, &mut config.twitter.consumer_secret),
            (&self.access_token, &mut config.twitter.access_token),
            (&self.access_token_secret, &mut config.twitter.access_token_secret),
        ];
        for (flag, target) in credentials {
            if let Some(value) = flag {
                *target = value.clone();
            }
        }

        if let Some(sleep) = self.sleep {
            config.bot.poll_interval_secs = sleep;
        }
        if self.debug {
            config.bot.debug = true;
        }
        if let Some(backend) = self.backend {
            config.registry.backend = backend;
        }
        if let Some(ref fixtures) = self.fixtures {
            config.bot.fixtures = Some(fixtures.clone());
        }
        if let Some(ref handle) = self.handle {
            config.bot.handle = Some(handle.clone());
        }

        config
    }
}
