use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Runtime configuration loaded from environment variables.
///
/// All three values are required; a missing or malformed one aborts startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot API credential token.
    pub bot_token: String,
    /// Publication channel, a numeric `-100...` id.
    pub channel_id: i64,
    /// Accounts allowed to approve or reject submissions.
    pub moderator_ids: Vec<i64>,
}

impl Config {
    /// Load configuration from environment variables, reading a `.env` file
    /// first when one is present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();

        Ok(Self {
            bot_token: env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?,
            channel_id: env::var("CHANNEL_ID")
                .context("CHANNEL_ID must be set")?
                .trim()
                .parse()
                .context("CHANNEL_ID must be a numeric chat id")?,
            moderator_ids: parse_id_list(
                &env::var("MODERATOR_IDS").context("MODERATOR_IDS must be set")?,
            )?,
        })
    }
}

/// Comma-separated numeric ids; blank entries are skipped.
fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("Invalid moderator id: {s}"))
        })
        .collect()
}
