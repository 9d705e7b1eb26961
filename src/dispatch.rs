//! Long-polling update loop: routes inbound Telegram updates to the album
//! aggregator and the moderation workflow.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::album::AlbumAggregator;
use crate::moderation::{DecisionOutcome, ModerationWorkflow};
use crate::telegram::types::{CallbackQuery, Message, Update};
use crate::telegram::{BotClient, Transport};

const WELCOME: &str = "👋 Welcome!\n\
    Send me TEXT and up to 10 PHOTOS (can be an album). I'll format a listing \
    (with Project & Payment plan fields) and send it for moderation.\n\n\
    To show a “Contact” button, include a contact line, e.g.:\n\
    Contact: @username or +971 50 123 45 67";

const HELP: &str = "Format:\n\
    • Free text AND/OR lines like 'Key: Value' (see /template)\n\
    • Photos: 1–10 (album is OK)\n\
    • “Contact” button appears only if you include a contact.\n\
    • Use Project: … and Payment plan: … if needed.";

const TEMPLATE: &str = "📋 Example (with Project & Payment plan):\n\n\
    Title: 2BR in Marina\n\
    Location: Dubai Marina\n\
    Project: Marina Gate\n\
    Bedrooms: 2\n\
    Bathrooms: 2\n\
    Area: 1,210 sqft\n\
    Price: AED 3 050 000\n\
    Status: Vacant\n\
    Parking: 1\n\
    Furnishing: Unfurnished\n\
    View: Sea\n\
    Floor: High\n\
    Handover: Q4 2025\n\
    Payment plan: 70/30 on handover\n\
    Contact: @broker_name, +971 50 123 45 67";

const HINT: &str = "Please send text and/or photos/videos (albums supported). See /template.";

const ACK_MEDIA: &str = "✅ Sent for moderation. Please wait for approval.";
const ACK_TEXT: &str = "✅ Text sent for moderation.";

/// Runs the dispatcher until the process is interrupted.
pub async fn run(client: Arc<BotClient>, workflow: Arc<ModerationWorkflow>) -> Result<()> {
    match client.delete_webhook(true).await {
        Ok(()) => info!("Webhook deleted (if one was set)"),
        Err(e) => warn!("delete_webhook warning: {e:#}"),
    }

    let (aggregator, mut albums) = AlbumAggregator::new(AlbumAggregator::DEFAULT_DELAY);
    {
        let client = client.clone();
        let workflow = workflow.clone();
        tokio::spawn(async move {
            while let Some(messages) = albums.recv().await {
                handle_album(&client, &workflow, messages).await;
            }
        });
    }

    let mut offset = 0i64;
    loop {
        let updates = match client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!("getUpdates failed: {e:#}");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };
        for update in updates {
            offset = offset.max(update.update_id + 1);
            handle_update(&client, &workflow, &aggregator, update).await;
        }
    }
}

async fn handle_update(
    client: &BotClient,
    workflow: &ModerationWorkflow,
    aggregator: &AlbumAggregator,
    update: Update,
) {
    if let Some(callback) = update.callback_query {
        handle_callback(client, workflow, callback).await;
        return;
    }
    let Some(message) = update.message else {
        return;
    };

    if let Some(text) = message.text.clone() {
        if text.starts_with('/') {
            if let Some(reply) = command_reply(&text) {
                send_reply(client, message.chat.id, reply).await;
                return;
            }
            // Unknown commands fall through and are treated as plain text.
        }
    }

    if message.media_group_id.is_some() && message.has_media() {
        aggregator.push(message).await;
        return;
    }

    let Some(author) = message.from.clone() else {
        return;
    };

    if message.has_media() {
        let caption = message.caption.clone().unwrap_or_default();
        let chat_id = message.chat.id;
        let id = workflow
            .create(author.id, &author.full_name(), &caption, &[message])
            .await;
        workflow.notify_moderators(&id).await;
        send_reply(client, chat_id, ACK_MEDIA).await;
    } else if let Some(text) = &message.text {
        let id = workflow
            .create(author.id, &author.full_name(), text, &[])
            .await;
        workflow.notify_moderators(&id).await;
        send_reply(client, message.chat.id, ACK_TEXT).await;
    } else {
        send_reply(client, message.chat.id, HINT).await;
    }
}

/// One flushed album becomes one submission; the first non-empty caption is
/// the listing text.
async fn handle_album(client: &BotClient, workflow: &ModerationWorkflow, messages: Vec<Message>) {
    let Some(first) = messages.first() else {
        return;
    };
    let Some(author) = first.from.clone() else {
        return;
    };
    let chat_id = first.chat.id;
    let caption = messages
        .iter()
        .find_map(|m| m.caption.clone().filter(|c| !c.is_empty()))
        .unwrap_or_default();

    let id = workflow
        .create(author.id, &author.full_name(), &caption, &messages)
        .await;
    workflow.notify_moderators(&id).await;
    send_reply(client, chat_id, ACK_MEDIA).await;
}

async fn handle_callback(
    client: &BotClient,
    workflow: &ModerationWorkflow,
    callback: CallbackQuery,
) {
    let Some(data) = callback.data.as_deref() else {
        return;
    };
    let Some((kind, submission_id)) = data.split_once(':') else {
        return;
    };

    let (outcome, suffix) = match kind {
        "approve" => (workflow.approve(submission_id).await, "✅ Published."),
        "reject" => (workflow.reject(submission_id).await, "❌ Rejected."),
        _ => return,
    };
    info!(
        "Moderator {} chose {kind} for {submission_id}: {outcome:?}",
        callback.from.id
    );

    match outcome {
        DecisionOutcome::Resolved => {
            if let Some(message) = &callback.message {
                let text = format!(
                    "{}\n\n{suffix}",
                    message.text.clone().unwrap_or_default()
                );
                if let Err(e) = client
                    .edit_message_text(message.chat.id, message.message_id, &text)
                    .await
                {
                    warn!("Marking moderator message failed: {e:#}");
                }
            }
        }
        DecisionOutcome::NotFound => {
            if let Err(e) = client
                .answer_callback_query(&callback.id, Some("Error: submission not found."), true)
                .await
            {
                warn!("answerCallbackQuery failed: {e:#}");
            }
        }
    }
}

fn command_reply(text: &str) -> Option<&'static str> {
    let token = text.split_whitespace().next()?;
    let command = token.split('@').next()?;
    match command {
        "/start" => Some(WELCOME),
        "/help" => Some(HELP),
        "/template" => Some(TEMPLATE),
        "/ping" => Some("pong ✅"),
        _ => None,
    }
}

async fn send_reply(client: &BotClient, chat_id: i64, text: &str) {
    if let Err(e) = client.send_message(chat_id, text, None, false).await {
        warn!("Reply to {chat_id} failed: {e:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_commands_have_replies() {
        assert_eq!(command_reply("/ping"), Some("pong ✅"));
        assert!(command_reply("/start").unwrap().starts_with("👋"));
        assert!(command_reply("/template").unwrap().contains("Marina Gate"));
        assert!(command_reply("/help").unwrap().contains("/template"));
    }

    #[test]
    fn command_with_bot_suffix_resolves() {
        assert_eq!(command_reply("/ping@listing_desk_bot"), Some("pong ✅"));
    }

    #[test]
    fn unknown_command_falls_through() {
        assert_eq!(command_reply("/publish now"), None);
    }
}
