use thiserror::Error;

#[derive(Error, Debug)]
pub enum CakedayError {
    #[error("lookahead window must be between 0 and 365 days, got {0}")]
    InvalidRange(i64),

    #[error("guild {0} is not fully configured")]
    MissingConfiguration(u64),

    #[error("transport call failed: {0}")]
    Transport(String),

    #[error("transport call timed out after {0} seconds")]
    TransportTimeout(u64),

    #[error("malformed birthday record for member {member}: month {month}, day {day}")]
    MalformedRecord { member: u64, month: u32, day: u32 },
}

impl CakedayError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
