use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use poise::serenity_prelude::{Mention, UserId};
use serenity::CacheAndHttp;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{
    birthdays::{due_within, today_exact, Birthday},
    error::CakedayError,
    structs::{Data, GuildSettings},
    template::format_birthday_message,
    transport::{DiscordTransport, Transport},
};

const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Where a guild stands within the current UTC day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayState {
    /// Not yet reached the configured time, or never configured at all.
    Idle,
    /// Time reached and not yet notified today.
    Due,
    /// Already notified today, nothing more until the date advances.
    Notified,
}

/// The day-state transition function. Rolling over UTC midnight re-arms a
/// `Notified` guild implicitly, since `today` changes out from under the
/// marker.
pub fn classify(settings: &GuildSettings, today: NaiveDate, now_secs: u32) -> DayState {
    let Some(time_utc_s) = settings.time_utc_s else {
        return DayState::Idle;
    };
    if !settings.is_complete() {
        return DayState::Idle;
    }
    if now_secs < time_utc_s {
        return DayState::Idle;
    }
    if settings.last_notified == Some(today) {
        return DayState::Notified;
    }
    DayState::Due
}

/// Transport bookkeeping for one guild's pass. The day is marked done unless
/// every attempted call failed, which we treat as loss of connectivity worth
/// retrying on the next tick. Individual failures among successes are
/// best-effort losses, the day still counts.
#[derive(Debug, Default)]
struct PassOutcome {
    attempts: u32,
    successes: u32,
}

impl PassOutcome {
    fn record<T>(&mut self, result: &Result<T, CakedayError>) {
        self.attempts += 1;
        if result.is_ok() {
            self.successes += 1;
        }
    }

    fn should_mark(&self) -> bool {
        self.attempts == 0 || self.successes > 0
    }
}

/// Messages and role churn for one due guild. Failures are logged per member
/// and never abort the rest of the pass.
async fn run_guild_pass(
    transport: &dyn Transport,
    guild_id: u64,
    settings: &GuildSettings,
    birthdays: &HashMap<u64, Birthday>,
    today: NaiveDate,
) -> Result<PassOutcome, CakedayError> {
    let mut outcome = PassOutcome::default();

    let (Some(channel_id), Some(role_id), Some(msg_w_year), Some(msg_wo_year)) = (
        settings.channel_id,
        settings.role_id,
        settings.message_w_year.as_deref(),
        settings.message_wo_year.as_deref(),
    ) else {
        return Err(CakedayError::MissingConfiguration(guild_id));
    };

    let due_today = due_within(birthdays, today, 0).unwrap_or_default();
    let today_ids: HashSet<u64> = due_today.iter().map(|entry| entry.member_id).collect();
    let yesterday_ids: Vec<u64> = today
        .pred_opt()
        .map(|yesterday| today_exact(birthdays, yesterday))
        .unwrap_or_default();

    for entry in &due_today {
        let mention = Mention::User(UserId(entry.member_id)).to_string();
        let name = match transport.display_name(guild_id, entry.member_id).await {
            Ok(name) => name,
            Err(_) => "Unknown User".to_owned(),
        };

        let template = match entry.new_age {
            Some(_) => msg_w_year,
            None => msg_wo_year,
        };
        let text = format_birthday_message(template, &mention, &name, entry.new_age);

        let sent = transport.send_message(channel_id, &text).await;
        if let Err(e) = &sent {
            warn!(guild_id, member_id = entry.member_id, %e, "birthday message failed");
        }
        outcome.record(&sent);
    }

    for entry in &due_today {
        let held = transport.has_role(guild_id, entry.member_id, role_id).await;
        match held {
            Ok(true) => {}
            Ok(false) => {
                let granted = transport.grant_role(guild_id, entry.member_id, role_id).await;
                if let Err(e) = &granted {
                    warn!(guild_id, member_id = entry.member_id, %e, "role grant failed");
                }
                outcome.record(&granted);
            }
            Err(ref e) => {
                warn!(guild_id, member_id = entry.member_id, %e, "role lookup failed");
                outcome.record(&held);
            }
        }
    }

    for member_id in yesterday_ids {
        if today_ids.contains(&member_id) {
            continue;
        }

        let held = transport.has_role(guild_id, member_id, role_id).await;
        match held {
            Ok(true) => {
                let revoked = transport.revoke_role(guild_id, member_id, role_id).await;
                if let Err(e) = &revoked {
                    warn!(guild_id, member_id, %e, "role revoke failed");
                }
                outcome.record(&revoked);
            }
            Ok(false) => {}
            Err(ref e) => {
                warn!(guild_id, member_id, %e, "role lookup failed");
                outcome.record(&held);
            }
        }
    }

    Ok(outcome)
}

/// One scheduler pass over every configured guild. `now` is a parameter so
/// tests can pin the clock.
pub async fn run_tick(transport: &dyn Transport, data: &Data, now: DateTime<Utc>) {
    let today = now.date_naive();
    let now_secs = now.time().num_seconds_from_midnight();

    let guilds: Vec<_> = {
        let guild_map = data.state.guild_map.read().await;
        guild_map
            .iter()
            .map(|(&guild_id, guild_data)| (guild_id, Arc::clone(guild_data)))
            .collect()
    };

    for (guild_id, guild_data) in guilds {
        let (settings, birthdays) = {
            let guard = guild_data.read().await;
            (guard.settings.clone(), guard.birthdays.clone())
        };

        match classify(&settings, today, now_secs) {
            DayState::Idle | DayState::Notified => continue,
            DayState::Due => {}
        }

        debug!(guild_id, "guild due for birthday notifications");
        let outcome = match run_guild_pass(transport, guild_id, &settings, &birthdays, today).await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(guild_id, %e, "skipping guild");
                continue;
            }
        };

        if outcome.should_mark() {
            let mut guard = guild_data.write().await;
            guard.settings.last_notified = Some(today);
            drop(guard);

            data.saver.save();
            info!(guild_id, %today, "birthday notifications done for the day");
        } else {
            warn!(guild_id, "every transport call failed, retrying next tick");
        }
    }
}

/// Recurring scheduler task. Ticks are strictly sequential: a new tick only
/// starts after the previous pass finished, and missed ticks are skipped
/// rather than queued.
pub async fn birthday_ticker(context: Arc<CacheAndHttp>, data: Data) {
    let transport = DiscordTransport::new(Arc::clone(&context.http));

    let mut interval_timer = tokio::time::interval(TICK_INTERVAL);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval_timer.tick().await;
        run_tick(&transport, &data, Utc::now()).await;
    }
}
