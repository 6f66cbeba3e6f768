use crate::structs::{Context, Error};

/// Check the bot is alive and see the gateway latency
#[poise::command(slash_command, owners_only)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(format!("Pong! Latency: {}ms", ctx.ping().await.as_millis()))
        .await?;

    Ok(())
}
