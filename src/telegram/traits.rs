use anyhow::Result;
use async_trait::async_trait;

use super::types::{InlineKeyboardMarkup, InputMedia};

/// Outbound transport surface the moderation workflow depends on.
///
/// [`super::BotClient`] is the production implementation; tests substitute a
/// recording mock.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
        disable_preview: bool,
    ) -> Result<()>;

    async fn send_photo(&self, chat_id: i64, file_id: &str) -> Result<()>;

    async fn send_video(&self, chat_id: i64, file_id: &str) -> Result<()>;

    async fn send_media_group(&self, chat_id: i64, media: &[InputMedia]) -> Result<()>;
}
