use poise::serenity_prelude::{GuildId, UserId};

use crate::structs::{ApplicationState, Context};

/// Whether every notification setting for the guild has been configured.
/// Member-facing commands are gated on this, matching the scheduler.
pub async fn is_guild_setup(state: &ApplicationState, guild_id: u64) -> bool {
    let guild_map = state.guild_map.read().await;
    match guild_map.get(&guild_id) {
        Some(guild_data) => guild_data.read().await.settings.is_complete(),
        None => false,
    }
}

pub async fn member_display_name(ctx: Context<'_>, guild_id: u64, member_id: u64) -> String {
    match GuildId(guild_id).member(ctx, UserId(member_id)).await {
        Ok(member) => member.display_name().to_string(),
        Err(_) => "Unknown User".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use tokio::sync::RwLock;

    use super::*;
    use crate::structs::{GuildData, GuildSettings};

    #[tokio::test]
    async fn unknown_and_half_configured_guilds_are_not_setup() {
        let state = ApplicationState::default();
        assert!(!is_guild_setup(&state, 1).await);

        let mut half = GuildData::default();
        half.settings.channel_id = Some(20);
        half.settings.role_id = Some(30);
        state
            .guild_map
            .write()
            .await
            .insert(1, Arc::new(RwLock::new(half)));
        assert!(!is_guild_setup(&state, 1).await);
    }

    #[tokio::test]
    async fn fully_configured_guild_is_setup() {
        let full = GuildData {
            settings: GuildSettings {
                time_utc_s: Some(0),
                message_w_year: Some("{mention} turns {new_age}!".to_owned()),
                message_wo_year: Some("Happy birthday {mention}!".to_owned()),
                channel_id: Some(20),
                role_id: Some(30),
                last_notified: None,
            },
            birthdays: HashMap::new(),
        };

        let state = ApplicationState::default();
        state
            .guild_map
            .write()
            .await
            .insert(1, Arc::new(RwLock::new(full)));

        assert!(is_guild_setup(&state, 1).await);
    }
}
