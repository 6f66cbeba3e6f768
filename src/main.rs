use std::path::PathBuf;

use cakeday_bot::start_bot;
use clap::Parser;
use serde::Deserialize;
use serenity::prelude::*;

pub mod birthdays;
mod cakeday_bot;
pub mod commands;
pub mod cron;
pub mod error;
pub mod helpers;
pub mod persistence;
pub mod structs;
pub mod template;
pub mod transport;

#[derive(Deserialize)]
struct DiscordBotEnv {
    pub discord_token: String,
}

#[derive(Parser)]
#[command(author,version, about, long_about = None)]
struct Args {
    /// Location to save and load from
    #[arg(short, long)]
    save_location: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv()?;
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let env_config: DiscordBotEnv = envy::from_env()?;

    let token = env_config.discord_token;

    let intents = GatewayIntents::empty();

    match start_bot(token, intents, args.save_location).await {
        Ok(_) => Ok(()),
        Err(e) => Err(anyhow::anyhow!("Serenity Error: {}", e)),
    }
}
