use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, RoleId};
use serenity::http::Http;
use tokio::time::timeout;

use crate::error::CakedayError;

/// Upper bound on any single call to the chat platform. A guild's pass never
/// blocks the scheduler past this.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// The scheduler's view of the chat platform: plain ids in, success or
/// failure out. Ticks run against a mock in tests and never hold a live
/// framework context.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(&self, channel_id: u64, text: &str) -> Result<(), CakedayError>;

    async fn grant_role(
        &self,
        guild_id: u64,
        member_id: u64,
        role_id: u64,
    ) -> Result<(), CakedayError>;

    async fn revoke_role(
        &self,
        guild_id: u64,
        member_id: u64,
        role_id: u64,
    ) -> Result<(), CakedayError>;

    async fn has_role(
        &self,
        guild_id: u64,
        member_id: u64,
        role_id: u64,
    ) -> Result<bool, CakedayError>;

    async fn display_name(&self, guild_id: u64, member_id: u64) -> Result<String, CakedayError>;
}

pub struct DiscordTransport {
    http: Arc<Http>,
}

impl DiscordTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

async fn bounded<T>(
    call: impl Future<Output = serenity::Result<T>> + Send,
) -> Result<T, CakedayError> {
    match timeout(CALL_TIMEOUT, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(CakedayError::transport(e.to_string())),
        Err(_) => Err(CakedayError::TransportTimeout(CALL_TIMEOUT.as_secs())),
    }
}

#[async_trait]
impl Transport for DiscordTransport {
    async fn send_message(&self, channel_id: u64, text: &str) -> Result<(), CakedayError> {
        bounded(ChannelId(channel_id).say(&self.http, text))
            .await
            .map(|_| ())
    }

    async fn grant_role(
        &self,
        guild_id: u64,
        member_id: u64,
        role_id: u64,
    ) -> Result<(), CakedayError> {
        bounded(
            self.http
                .add_member_role(guild_id, member_id, role_id, None),
        )
        .await
    }

    async fn revoke_role(
        &self,
        guild_id: u64,
        member_id: u64,
        role_id: u64,
    ) -> Result<(), CakedayError> {
        bounded(
            self.http
                .remove_member_role(guild_id, member_id, role_id, None),
        )
        .await
    }

    async fn has_role(
        &self,
        guild_id: u64,
        member_id: u64,
        role_id: u64,
    ) -> Result<bool, CakedayError> {
        let member = bounded(self.http.get_member(guild_id, member_id)).await?;
        Ok(member.roles.contains(&RoleId(role_id)))
    }

    async fn display_name(&self, guild_id: u64, member_id: u64) -> Result<String, CakedayError> {
        let member = bounded(self.http.get_member(guild_id, member_id)).await?;
        Ok(member.display_name().to_string())
    }
}
