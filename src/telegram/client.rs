use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::traits::Transport;
use super::types::{ApiResponse, InlineKeyboardMarkup, InputMedia, Update};

/// Long-poll timeout requested from getUpdates.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Thin Telegram Bot API client over plain HTTPS.
pub struct BotClient {
    client: Client,
    base_url: String,
}

impl BotClient {
    pub fn new(token: &str) -> Result<Self> {
        // Request timeout sits above the long-poll window so getUpdates can
        // idle out server-side first.
        let client = Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 20))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("https://api.telegram.org/bot{token}"),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: Value) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to call {method}"))?;

        let api: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to decode {method} response"))?;

        if !api.ok {
            bail!(
                "{method} rejected: {}",
                api.description.unwrap_or_else(|| "no description".to_string())
            );
        }
        api.result
            .ok_or_else(|| anyhow!("{method} returned ok with no result"))
    }

    /// Long-polls for the next batch of updates.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({ "offset": offset, "timeout": POLL_TIMEOUT_SECS }),
        )
        .await
    }

    /// Drops any configured webhook so long polling owns the update stream.
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()> {
        let _: bool = self
            .call(
                "deleteWebhook",
                json!({ "drop_pending_updates": drop_pending_updates }),
            )
            .await?;
        Ok(())
    }

    pub async fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let _: Value = self
            .call(
                "editMessageText",
                json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
            )
            .await?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()> {
        let mut payload = json!({ "callback_query_id": callback_query_id, "show_alert": show_alert });
        if let Some(text) = text {
            payload["text"] = json!(text);
        }
        let _: bool = self.call("answerCallbackQuery", payload).await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for BotClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
        disable_preview: bool,
    ) -> Result<()> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": disable_preview,
        });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = serde_json::to_value(keyboard)?;
        }
        let _: Value = self.call("sendMessage", payload).await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, file_id: &str) -> Result<()> {
        let _: Value = self
            .call("sendPhoto", json!({ "chat_id": chat_id, "photo": file_id }))
            .await?;
        Ok(())
    }

    async fn send_video(&self, chat_id: i64, file_id: &str) -> Result<()> {
        let _: Value = self
            .call("sendVideo", json!({ "chat_id": chat_id, "video": file_id }))
            .await?;
        Ok(())
    }

    async fn send_media_group(&self, chat_id: i64, media: &[InputMedia]) -> Result<()> {
        let _: Value = self
            .call(
                "sendMediaGroup",
                json!({ "chat_id": chat_id, "media": media }),
            )
            .await?;
        Ok(())
    }
}
