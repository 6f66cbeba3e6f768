use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{birthdays::Birthday, persistence::SaveManager};

pub struct Data {
    pub state: Arc<ApplicationState>,
    pub saver: Arc<SaveManager>,
} // User data, which is stored and accessible in all command invocations

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Per-guild notification settings. `last_notified` is the idempotency
/// marker: the notification fires at most once per UTC calendar date.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct GuildSettings {
    /// Seconds after UTC midnight, whole-minute granularity.
    pub time_utc_s: Option<u32>,
    pub message_w_year: Option<String>,
    pub message_wo_year: Option<String>,
    pub channel_id: Option<u64>,
    pub role_id: Option<u64>,
    pub last_notified: Option<NaiveDate>,
}

impl GuildSettings {
    /// A guild with anything unset stays idle and the scheduler never
    /// touches it.
    pub fn is_complete(&self) -> bool {
        self.time_utc_s.is_some()
            && self.message_w_year.is_some()
            && self.message_wo_year.is_some()
            && self.channel_id.is_some()
            && self.role_id.is_some()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct GuildData {
    pub settings: GuildSettings,
    /// Keyed by member id, so at most one record per (guild, member).
    pub birthdays: HashMap<u64, Birthday>,
}

/// All guild state, behind a per-guild lock. The scheduler's marker
/// read-modify-write and the setting commands serialize per guild while
/// guilds stay independent of each other.
#[derive(Default)]
pub struct ApplicationState {
    pub guild_map: RwLock<HashMap<u64, Arc<RwLock<GuildData>>>>,
}

impl ApplicationState {
    pub fn from_snapshot(snapshot: HashMap<u64, GuildData>) -> Self {
        let guild_map = snapshot
            .into_iter()
            .map(|(guild_id, data)| (guild_id, Arc::new(RwLock::new(data))))
            .collect();

        Self {
            guild_map: RwLock::new(guild_map),
        }
    }

    /// Plain-data copy of every guild, for the save file.
    pub async fn snapshot(&self) -> HashMap<u64, GuildData> {
        let guild_map = self.guild_map.read().await;

        let mut snapshot = HashMap::with_capacity(guild_map.len());
        for (&guild_id, guild_data) in guild_map.iter() {
            snapshot.insert(guild_id, guild_data.read().await.clone());
        }
        snapshot
    }

    /// Fetch a guild's entry, creating an empty one the first time the
    /// guild is seen.
    pub async fn guild_entry(&self, guild_id: u64) -> Arc<RwLock<GuildData>> {
        let mut guild_map = self.guild_map.write().await;
        Arc::clone(guild_map.entry(guild_id).or_default())
    }
}
