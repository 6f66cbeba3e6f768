use chrono::Utc;
use poise::serenity_prelude::{self as serenity, Channel, ChannelId, Mention, RoleId};

use crate::{
    commands::birthday::check_new_birthday,
    structs::{Context, Error, GuildSettings},
    template::{format_birthday_message, MAX_MESSAGE_LEN},
};

/// Admin commands for configuring birthday announcements
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands(
        "time",
        "channel",
        "role",
        "msgwithyear",
        "msgwithoutyear",
        "settings",
        "force"
    )
)]
pub async fn bdset(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Use one of the subcommands to configure birthday announcements")
        .await?;
    Ok(())
}

fn require_guild(ctx: &Context<'_>) -> Option<u64> {
    ctx.guild_id().map(|id| id.0)
}

/// Set the time of day (UTC) for the birthday announcement
#[poise::command(slash_command)]
pub async fn time(
    ctx: Context<'_>,
    #[description = "Hour of the day (24 hour clock, UTC)"]
    #[min = 0]
    #[max = 23]
    hour: u32,
    #[description = "Minute of the hour"]
    #[min = 0]
    #[max = 59]
    minute: u32,
) -> Result<(), Error> {
    let data = ctx.data();

    let Some(guild_id) = require_guild(&ctx) else {
        ctx.say("Only works inside servers").await?;
        return Ok(());
    };

    let time_utc_s = hour * 3600 + minute * 60;

    let guild_entry = data.state.guild_entry(guild_id).await;
    {
        let mut guild_data = guild_entry.write().await;
        guild_data.settings.time_utc_s = Some(time_utc_s);
    }
    data.saver.save();

    ctx.say(format!(
        "Time set! I'll send the birthday message and update the birthday role at {hour:02}:{minute:02} UTC."
    ))
    .await?;

    Ok(())
}

/// Set the channel where the birthday message will be sent
#[poise::command(slash_command)]
pub async fn channel(
    ctx: Context<'_>,
    #[description = "The channel announcements will be sent in"] channel: Channel,
) -> Result<(), Error> {
    let data = ctx.data();

    let Some(guild_id) = require_guild(&ctx) else {
        ctx.say("Only works inside servers").await?;
        return Ok(());
    };

    let guild_entry = data.state.guild_entry(guild_id).await;
    {
        let mut guild_data = guild_entry.write().await;
        guild_data.settings.channel_id = Some(channel.id().0);
    }
    data.saver.save();

    ctx.say(format!(
        "Channel set to {}.",
        Mention::Channel(channel.id())
    ))
    .await?;

    Ok(())
}

/// Set the role given to members on their birthday
#[poise::command(slash_command)]
pub async fn role(
    ctx: Context<'_>,
    #[description = "The role to hand out on birthdays"] role: serenity::Role,
) -> Result<(), Error> {
    let data = ctx.data();

    let Some(guild_id) = require_guild(&ctx) else {
        ctx.say("Only works inside servers").await?;
        return Ok(());
    };

    let guild_entry = data.state.guild_entry(guild_id).await;
    {
        let mut guild_data = guild_entry.write().await;
        guild_data.settings.role_id = Some(role.id.0);
    }
    data.saver.save();

    ctx.say(format!("Role set to {}.", role.name)).await?;

    Ok(())
}

/// Set the message sent when the member shared their birth year
#[poise::command(slash_command)]
pub async fn msgwithyear(
    ctx: Context<'_>,
    #[description = "Template, placeholders: {mention}, {name}, {new_age}"] message: String,
) -> Result<(), Error> {
    let data = ctx.data();

    let Some(guild_id) = require_guild(&ctx) else {
        ctx.say("Only works inside servers").await?;
        return Ok(());
    };

    if message.len() > MAX_MESSAGE_LEN {
        ctx.say(format!(
            "That message is too long! It needs to be under {MAX_MESSAGE_LEN} characters."
        ))
        .await?;
        return Ok(());
    }

    let guild_entry = data.state.guild_entry(guild_id).await;
    {
        let mut guild_data = guild_entry.write().await;
        guild_data.settings.message_w_year = Some(message.clone());
    }
    data.saver.save();

    let preview = format_birthday_message(
        &message,
        &Mention::User(ctx.author().id).to_string(),
        &ctx.author().name,
        Some(20),
    );
    ctx.say(format!(
        "Message set. Here's how it will look, if you're turning 20:\n{preview}"
    ))
    .await?;

    Ok(())
}

/// Set the message sent when the member kept their birth year to themselves
#[poise::command(slash_command)]
pub async fn msgwithoutyear(
    ctx: Context<'_>,
    #[description = "Template, placeholders: {mention}, {name}"] message: String,
) -> Result<(), Error> {
    let data = ctx.data();

    let Some(guild_id) = require_guild(&ctx) else {
        ctx.say("Only works inside servers").await?;
        return Ok(());
    };

    if message.len() > MAX_MESSAGE_LEN {
        ctx.say(format!(
            "That message is too long! It needs to be under {MAX_MESSAGE_LEN} characters."
        ))
        .await?;
        return Ok(());
    }

    let guild_entry = data.state.guild_entry(guild_id).await;
    {
        let mut guild_data = guild_entry.write().await;
        guild_data.settings.message_wo_year = Some(message.clone());
    }
    data.saver.save();

    let preview = format_birthday_message(
        &message,
        &Mention::User(ctx.author().id).to_string(),
        &ctx.author().name,
        None,
    );
    ctx.say(format!("Message set. Here's how it will look:\n{preview}"))
        .await?;

    Ok(())
}

fn describe_settings(settings: &GuildSettings) -> String {
    let time = match settings.time_utc_s {
        Some(s) => format!("{:02}:{:02} UTC", s / 3600, (s % 3600) / 60),
        None => "Not set".to_owned(),
    };
    let channel = match settings.channel_id {
        Some(id) => Mention::Channel(ChannelId(id)).to_string(),
        None => "Not set".to_owned(),
    };
    let role = match settings.role_id {
        Some(id) => Mention::Role(RoleId(id)).to_string(),
        None => "Not set".to_owned(),
    };
    let message_w_year = settings.message_w_year.as_deref().unwrap_or("No message set");
    let message_wo_year = settings
        .message_wo_year
        .as_deref()
        .unwrap_or("No message set");

    format!(
        "Settings for this server:\n- Channel: {channel}\n- Role: {role}\n- Time: {time}\n\n\
         Message with year:\n```\n{message_w_year}\n```\nMessage without year:\n```\n{message_wo_year}\n```"
    )
}

/// View the current settings for this server
#[poise::command(slash_command)]
pub async fn settings(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    let Some(guild_id) = require_guild(&ctx) else {
        ctx.say("Only works inside servers").await?;
        return Ok(());
    };

    let settings = {
        let guild_map = data.state.guild_map.read().await;
        match guild_map.get(&guild_id) {
            Some(guild_data) => guild_data.read().await.settings.clone(),
            None => GuildSettings::default(),
        }
    };

    ctx.say(describe_settings(&settings)).await?;

    Ok(())
}

/// Force-set a specific member's birthday
#[poise::command(slash_command)]
pub async fn force(
    ctx: Context<'_>,
    #[description = "The member whose birthday to set"] member: serenity::Member,
    #[description = "Month of their birthday"]
    #[min = 1]
    #[max = 12]
    month: u32,
    #[description = "Day of their birthday"]
    #[min = 1]
    #[max = 31]
    day: u32,
    #[description = "Year they were born, if their new age should be announced"] year: Option<i32>,
) -> Result<(), Error> {
    let data = ctx.data();

    let Some(guild_id) = require_guild(&ctx) else {
        ctx.say("Only works inside servers").await?;
        return Ok(());
    };

    let birthday = match check_new_birthday(month, day, year, Utc::now().date_naive()) {
        Ok(birthday) => birthday,
        Err(reason) => {
            ctx.say(reason).await?;
            return Ok(());
        }
    };

    let member_id = member.user.id.0;
    let guild_entry = data.state.guild_entry(guild_id).await;
    {
        let mut guild_data = guild_entry.write().await;
        guild_data.birthdays.insert(member_id, birthday);
    }
    data.saver.save();

    ctx.say(format!(
        "{}'s birthday has been set as {}.",
        member.user.name,
        birthday.display()
    ))
    .await?;

    Ok(())
}
