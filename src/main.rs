mod album;
mod config;
mod dispatch;
mod extract;
mod models;
mod moderation;
mod render;
mod telegram;

use std::sync::Arc;

use tracing::{info, Level};

use crate::config::Config;
use crate::moderation::{ModerationWorkflow, SubmissionStore};
use crate::telegram::{BotClient, Transport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("🏢 Listing Desk - real-estate submission moderation");

    let config = Config::from_env()?;
    info!(
        "Channel: {}, moderators: {:?}",
        config.channel_id, config.moderator_ids
    );

    let client = Arc::new(BotClient::new(&config.bot_token)?);
    let store = Arc::new(SubmissionStore::new());
    let workflow = Arc::new(ModerationWorkflow::new(
        store,
        client.clone() as Arc<dyn Transport>,
        config.channel_id,
        config.moderator_ids.clone(),
    ));

    tokio::select! {
        result = dispatch::run(client, workflow) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Bot stopped");
            Ok(())
        }
    }
}
