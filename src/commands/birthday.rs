use std::collections::HashMap;

use chrono::{NaiveDate, Utc};

use crate::{
    birthdays::{due_within, Birthday, MIN_YEAR},
    helpers::{is_guild_setup, member_display_name},
    structs::{Context, Error},
};

/// Parent command for setting and managing your birthday
#[poise::command(slash_command, guild_only, subcommands("set", "remove", "upcoming"))]
pub async fn birthday(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Use one of the subcommands to manage your birthday")
        .await?;
    Ok(())
}

/// Validation shared by `/birthday set` and `/bdset force`. When the year is
/// given the full date has to exist and lie in the past; without one the
/// (month, day) pair just has to exist in some year.
pub(crate) fn check_new_birthday(
    month: u32,
    day: u32,
    year: Option<i32>,
    today: NaiveDate,
) -> Result<Birthday, String> {
    let birthday = Birthday { month, day, year };

    match year {
        Some(year) if year < MIN_YEAR => {
            return Err(format!(
                "I'm sorry, but I can't set a birthday to before {MIN_YEAR}."
            ));
        }
        Some(year) => match NaiveDate::from_ymd_opt(year, month, day) {
            Some(born) if born > today => {
                return Err("You can't be born in the future!".to_owned());
            }
            Some(_) => {}
            None => return Err("That date doesn't exist, please double-check it.".to_owned()),
        },
        None if !birthday.is_valid() => {
            return Err("That date doesn't exist, please double-check it.".to_owned());
        }
        None => {}
    }

    Ok(birthday)
}

/// Set your birthday, optionally with the year if you're happy to share it
#[poise::command(slash_command)]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Month of your birthday"]
    #[min = 1]
    #[max = 12]
    month: u32,
    #[description = "Day of your birthday"]
    #[min = 1]
    #[max = 31]
    day: u32,
    #[description = "Year you were born, if you want your new age announced"] year: Option<i32>,
) -> Result<(), Error> {
    let data = ctx.data();

    let guild_id = match ctx.guild_id() {
        Some(id) => id.0,
        None => {
            ctx.say("Only works inside servers").await?;
            return Ok(());
        }
    };

    if !is_guild_setup(&data.state, guild_id).await {
        ctx.say("This command is not available until an admin has set the bot up with `/bdset`.")
            .await?;
        return Ok(());
    }

    let birthday = match check_new_birthday(month, day, year, Utc::now().date_naive()) {
        Ok(birthday) => birthday,
        Err(reason) => {
            ctx.say(reason).await?;
            return Ok(());
        }
    };

    let guild_entry = data.state.guild_entry(guild_id).await;
    {
        let mut guild_data = guild_entry.write().await;
        guild_data.birthdays.insert(ctx.author().id.0, birthday);
    }
    data.saver.save();

    ctx.say(format!(
        "Your birthday has been set as {}.",
        birthday.display()
    ))
    .await?;

    Ok(())
}

/// Remove your birthday
#[poise::command(slash_command)]
pub async fn remove(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    let guild_id = match ctx.guild_id() {
        Some(id) => id.0,
        None => {
            ctx.say("Only works inside servers").await?;
            return Ok(());
        }
    };

    if !is_guild_setup(&data.state, guild_id).await {
        ctx.say("This command is not available until an admin has set the bot up with `/bdset`.")
            .await?;
        return Ok(());
    }

    let guild_entry = data.state.guild_entry(guild_id).await;
    let removed = {
        let mut guild_data = guild_entry.write().await;
        guild_data.birthdays.remove(&ctx.author().id.0).is_some()
    };

    if removed {
        data.saver.save();
        ctx.say("Your birthday has been removed.").await?;
    } else {
        ctx.say("You don't have a birthday set on this server.")
            .await?;
    }

    Ok(())
}

/// View upcoming birthdays
#[poise::command(slash_command)]
pub async fn upcoming(
    ctx: Context<'_>,
    #[description = "Number of days to look ahead (default: 7)"]
    #[min = 1]
    #[max = 365]
    days: Option<i64>,
) -> Result<(), Error> {
    let data = ctx.data();
    let days = days.unwrap_or(7);

    let guild_id = match ctx.guild_id() {
        Some(id) => id.0,
        None => {
            ctx.say("Only works inside servers").await?;
            return Ok(());
        }
    };

    if !is_guild_setup(&data.state, guild_id).await {
        ctx.say("This command is not available until an admin has set the bot up with `/bdset`.")
            .await?;
        return Ok(());
    }

    if !(1..=365).contains(&days) {
        ctx.say("You must enter a number of days greater than 0 and smaller than 365.")
            .await?;
        return Ok(());
    }

    let birthdays = {
        let guild_map = data.state.guild_map.read().await;
        match guild_map.get(&guild_id) {
            Some(guild_data) => guild_data.read().await.birthdays.clone(),
            None => HashMap::new(),
        }
    };

    let due = match due_within(&birthdays, Utc::now().date_naive(), days) {
        Ok(due) => due,
        Err(e) => {
            ctx.say(e.to_string()).await?;
            return Ok(());
        }
    };

    if due.is_empty() {
        ctx.say("No upcoming birthdays.").await?;
        return Ok(());
    }

    // Display names come from the API one by one, so this can be slow.
    ctx.defer().await?;

    let mut response = "Upcoming birthdays:\n".to_owned();
    let mut current_group = None;

    for entry in due {
        if current_group != Some(entry.days_until) {
            let header = match entry.days_until {
                0 => "Today".to_owned(),
                1 => format!("{} (tomorrow)", entry.occurrence.format("%B %d")),
                n => format!("{} (in {n} days)", entry.occurrence.format("%B %d")),
            };
            response += &format!("**{header}**\n");
            current_group = Some(entry.days_until);
        }

        let name = member_display_name(ctx, guild_id, entry.member_id).await;
        match entry.new_age {
            Some(age) if entry.days_until == 0 => response += &format!("- {name} turns {age}\n"),
            Some(age) => response += &format!("- {name} will turn {age}\n"),
            None => response += &format!("- {name}\n"),
        }
    }

    ctx.say(response).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
    }

    #[test]
    fn accepts_plain_and_yearful_dates() {
        assert!(check_new_birthday(9, 24, None, today()).is_ok());
        assert!(check_new_birthday(9, 24, Some(2002), today()).is_ok());
        assert!(check_new_birthday(2, 29, None, today()).is_ok());
        assert!(check_new_birthday(2, 29, Some(2000), today()).is_ok());
    }

    #[test]
    fn rejects_future_ancient_and_nonexistent_dates() {
        assert!(check_new_birthday(9, 24, Some(2025), today()).is_err());
        assert!(check_new_birthday(9, 24, Some(1800), today()).is_err());
        assert!(check_new_birthday(2, 30, None, today()).is_err());
        // Feb 29 of a non-leap year never existed.
        assert!(check_new_birthday(2, 29, Some(2001), today()).is_err());
    }
}
