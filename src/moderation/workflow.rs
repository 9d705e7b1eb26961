use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::extract::build_contact_actions;
use crate::models::Submission;
use crate::moderation::SubmissionStore;
use crate::render::render_listing;
use crate::telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputMedia, Message};
use crate::telegram::Transport;

/// Outcome of an approve/reject call.
///
/// `NotFound` is the well-defined "already handled" case, surfaced to the
/// moderator as a non-fatal alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    Resolved,
    NotFound,
}

/// Drives a submission from creation through moderator decision to
/// publication or rejection.
pub struct ModerationWorkflow {
    store: Arc<SubmissionStore>,
    transport: Arc<dyn Transport>,
    channel_id: i64,
    moderator_ids: Vec<i64>,
}

impl ModerationWorkflow {
    pub fn new(
        store: Arc<SubmissionStore>,
        transport: Arc<dyn Transport>,
        channel_id: i64,
        moderator_ids: Vec<i64>,
    ) -> Self {
        Self {
            store,
            transport,
            channel_id,
            moderator_ids,
        }
    }

    /// Builds and stores a pending submission, returning its id.
    ///
    /// Media references are deduplicated preserving first-seen order; for a
    /// photo the largest size is taken. Always succeeds — an empty
    /// submission is accepted.
    pub async fn create(
        &self,
        author_id: i64,
        author_name: &str,
        text: &str,
        media: &[Message],
    ) -> String {
        let mut photos = Vec::new();
        let mut videos = Vec::new();
        for message in media {
            if let Some(sizes) = &message.photo {
                if let Some(largest) = sizes.last() {
                    photos.push(largest.file_id.clone());
                }
            } else if let Some(video) = &message.video {
                videos.push(video.file_id.clone());
            }
        }

        let submission = Submission {
            id: Uuid::new_v4().simple().to_string(),
            author_id,
            author_name: author_name.to_string(),
            text: text.to_string(),
            photos: uniq_keep_order(photos),
            videos: uniq_keep_order(videos),
            submitted_at: Utc::now(),
        };
        let id = submission.id.clone();
        let (photos, videos) = (submission.photos.len(), submission.videos.len());

        self.store.insert(submission).await;
        info!(
            "New submission {} from {} ({} photos, {} videos, {} pending)",
            id,
            author_id,
            photos,
            videos,
            self.store.len().await
        );
        id
    }

    /// Sends the moderator preview: media, rendered document with the
    /// approve/reject keyboard, and a contact-button preview when the text
    /// carries a contact.
    ///
    /// No-op for an unknown id (already resolved). A failed delivery to one
    /// moderator never skips the remaining ones.
    pub async fn notify_moderators(&self, submission_id: &str) {
        let Some(submission) = self.store.get(submission_id).await else {
            return;
        };

        let preview = render_listing(&submission.author_name, &submission.text);
        let preview = format!("📝 <b>New submission</b>\n\n{preview}");
        let keyboard = decision_keyboard(submission_id);
        let media = input_media(&submission);
        let contact_keyboard = contact_keyboard(&submission.text);

        for moderator_id in &self.moderator_ids {
            if let Err(e) = self.deliver_media(*moderator_id, &media).await {
                warn!("Media preview to moderator {moderator_id} failed: {e:#}");
            }
            if let Err(e) = self
                .transport
                .send_message(*moderator_id, &preview, Some(keyboard.clone()), false)
                .await
            {
                warn!("Preview to moderator {moderator_id} failed: {e:#}");
            }
            if let Some(contact_keyboard) = &contact_keyboard {
                if let Err(e) = self
                    .transport
                    .send_message(
                        *moderator_id,
                        "🔗 Contact buttons that will appear in the channel:",
                        Some(contact_keyboard.clone()),
                        true,
                    )
                    .await
                {
                    warn!("Contact preview to moderator {moderator_id} failed: {e:#}");
                }
            }
        }
    }

    /// Publishes a submission to the channel and drops it from the store.
    ///
    /// The store removal is the linearization point: of two racing decisions
    /// only one sees the submission. Delivery failures are logged and
    /// absorbed — the decision stands.
    pub async fn approve(&self, submission_id: &str) -> DecisionOutcome {
        let Some(submission) = self.store.remove(submission_id).await else {
            return DecisionOutcome::NotFound;
        };

        let media = input_media(&submission);
        if let Err(e) = self.deliver_media(self.channel_id, &media).await {
            warn!("Publishing media for {submission_id} failed: {e:#}");
        }

        let document = render_listing(&submission.author_name, &submission.text);
        if let Err(e) = self
            .transport
            .send_message(
                self.channel_id,
                &document,
                contact_keyboard(&submission.text),
                true,
            )
            .await
        {
            warn!("Publishing document for {submission_id} failed: {e:#}");
        }

        info!("Submission {submission_id} published");
        if let Err(e) = self
            .transport
            .send_message(
                submission.author_id,
                "🎉 Your listing has been published.",
                None,
                false,
            )
            .await
        {
            warn!("Notify author failed: {e:#}");
        }
        DecisionOutcome::Resolved
    }

    /// Drops a submission from the store and tells the author.
    pub async fn reject(&self, submission_id: &str) -> DecisionOutcome {
        let Some(submission) = self.store.remove(submission_id).await else {
            return DecisionOutcome::NotFound;
        };

        info!("Submission {submission_id} rejected");
        if let Err(e) = self
            .transport
            .send_message(
                submission.author_id,
                "❌ Your listing was rejected.",
                None,
                false,
            )
            .await
        {
            warn!("Notify author failed: {e:#}");
        }
        DecisionOutcome::Resolved
    }

    async fn deliver_media(&self, chat_id: i64, media: &[InputMedia]) -> anyhow::Result<()> {
        match media {
            [] => Ok(()),
            [InputMedia::Photo { media }] => self.transport.send_photo(chat_id, media).await,
            [InputMedia::Video { media }] => self.transport.send_video(chat_id, media).await,
            group => self.transport.send_media_group(chat_id, group).await,
        }
    }
}

fn uniq_keep_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| !item.is_empty() && seen.insert(item.clone()))
        .collect()
}

fn input_media(submission: &Submission) -> Vec<InputMedia> {
    submission
        .photos
        .iter()
        .map(|p| InputMedia::Photo { media: p.clone() })
        .chain(
            submission
                .videos
                .iter()
                .map(|v| InputMedia::Video { media: v.clone() }),
        )
        .collect()
}

fn decision_keyboard(submission_id: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton::callback("✅ Approve", format!("approve:{submission_id}")),
            InlineKeyboardButton::callback("❌ Reject", format!("reject:{submission_id}")),
        ]],
    }
}

/// Contact deep links as an inline keyboard, one button per row. None when
/// the text has no usable contact.
fn contact_keyboard(text: &str) -> Option<InlineKeyboardMarkup> {
    let actions = build_contact_actions(text);
    if actions.is_empty() {
        return None;
    }
    Some(InlineKeyboardMarkup {
        inline_keyboard: actions
            .into_iter()
            .map(|action| vec![InlineKeyboardButton::url(action.label, action.url)])
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::telegram::types::{Chat, PhotoSize, Video};

    const CHANNEL_ID: i64 = -100;
    const MODERATORS: [i64; 2] = [11, 22];

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Message {
            chat_id: i64,
            text: String,
            buttons: usize,
        },
        Photo {
            chat_id: i64,
            file_id: String,
        },
        Video {
            chat_id: i64,
            file_id: String,
        },
        MediaGroup {
            chat_id: i64,
            len: usize,
        },
    }

    /// Transport double that records every call; `fail_chat` simulates a
    /// delivery failure for one recipient.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Sent>>,
        fail_chat: Option<i64>,
    }

    impl RecordingTransport {
        fn failing_for(chat_id: i64) -> Self {
            Self {
                fail_chat: Some(chat_id),
                ..Default::default()
            }
        }

        async fn sent(&self) -> Vec<Sent> {
            self.sent.lock().await.clone()
        }

        async fn check(&self, chat_id: i64, sent: Sent) -> anyhow::Result<()> {
            if self.fail_chat == Some(chat_id) {
                bail!("simulated delivery failure");
            }
            self.sent.lock().await.push(sent);
            Ok(())
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send_message(
            &self,
            chat_id: i64,
            text: &str,
            keyboard: Option<InlineKeyboardMarkup>,
            _disable_preview: bool,
        ) -> anyhow::Result<()> {
            let buttons = keyboard
                .map(|k| k.inline_keyboard.iter().map(Vec::len).sum())
                .unwrap_or(0);
            self.check(
                chat_id,
                Sent::Message {
                    chat_id,
                    text: text.to_string(),
                    buttons,
                },
            )
            .await
        }

        async fn send_photo(&self, chat_id: i64, file_id: &str) -> anyhow::Result<()> {
            self.check(
                chat_id,
                Sent::Photo {
                    chat_id,
                    file_id: file_id.to_string(),
                },
            )
            .await
        }

        async fn send_video(&self, chat_id: i64, file_id: &str) -> anyhow::Result<()> {
            self.check(
                chat_id,
                Sent::Video {
                    chat_id,
                    file_id: file_id.to_string(),
                },
            )
            .await
        }

        async fn send_media_group(
            &self,
            chat_id: i64,
            media: &[InputMedia],
        ) -> anyhow::Result<()> {
            self.check(
                chat_id,
                Sent::MediaGroup {
                    chat_id,
                    len: media.len(),
                },
            )
            .await
        }
    }

    fn workflow(transport: Arc<RecordingTransport>) -> ModerationWorkflow {
        ModerationWorkflow::new(
            Arc::new(SubmissionStore::new()),
            transport,
            CHANNEL_ID,
            MODERATORS.to_vec(),
        )
    }

    fn photo_message(file_id: &str) -> Message {
        Message {
            chat: Chat { id: 1 },
            photo: Some(vec![
                PhotoSize {
                    file_id: format!("{file_id}-small"),
                },
                PhotoSize {
                    file_id: file_id.to_string(),
                },
            ]),
            ..Default::default()
        }
    }

    fn video_message(file_id: &str) -> Message {
        Message {
            chat: Chat { id: 1 },
            video: Some(Video {
                file_id: file_id.to_string(),
            }),
            ..Default::default()
        }
    }

    const LISTING: &str = "Location: Dubai Marina\nPrice: AED 2 000 000\nContact: @broker_name";

    #[tokio::test]
    async fn create_takes_largest_photo_and_dedupes() {
        let transport = Arc::new(RecordingTransport::default());
        let flow = workflow(transport);

        let media = [
            photo_message("big-1"),
            photo_message("big-1"),
            photo_message("big-2"),
            video_message("vid-1"),
        ];
        let id = flow.create(5, "Author", "text", &media).await;

        let stored = flow.store.get(&id).await.unwrap();
        assert_eq!(stored.photos, vec!["big-1", "big-2"]);
        assert_eq!(stored.videos, vec!["vid-1"]);
    }

    #[tokio::test]
    async fn notify_sends_preview_to_every_moderator() {
        let transport = Arc::new(RecordingTransport::default());
        let flow = workflow(transport.clone());

        let id = flow.create(5, "Author", LISTING, &[photo_message("p1")]).await;
        flow.notify_moderators(&id).await;

        let sent = transport.sent().await;
        for moderator_id in MODERATORS {
            assert!(sent.contains(&Sent::Photo {
                chat_id: moderator_id,
                file_id: "p1".to_string(),
            }));
            assert!(sent.iter().any(|s| matches!(
                s,
                Sent::Message { chat_id, text, buttons: 2 }
                    if *chat_id == moderator_id && text.contains("New submission")
            )));
            // Contact preview rides along when the text has a contact.
            assert!(sent.iter().any(|s| matches!(
                s,
                Sent::Message { chat_id, text, buttons: 1 }
                    if *chat_id == moderator_id && text.contains("Contact buttons")
            )));
        }
    }

    #[tokio::test]
    async fn notify_survives_one_moderator_failing() {
        let transport = Arc::new(RecordingTransport::failing_for(MODERATORS[0]));
        let flow = workflow(transport.clone());

        let id = flow.create(5, "Author", LISTING, &[]).await;
        flow.notify_moderators(&id).await;

        let sent = transport.sent().await;
        assert!(sent.iter().all(|s| !matches!(s, Sent::Message { chat_id, .. } if *chat_id == MODERATORS[0])));
        assert!(sent.iter().any(
            |s| matches!(s, Sent::Message { chat_id, .. } if *chat_id == MODERATORS[1])
        ));
    }

    #[tokio::test]
    async fn notify_unknown_id_is_a_noop() {
        let transport = Arc::new(RecordingTransport::default());
        let flow = workflow(transport.clone());

        flow.notify_moderators("missing").await;
        assert!(transport.sent().await.is_empty());
    }

    #[tokio::test]
    async fn approve_publishes_and_notifies_author() {
        let transport = Arc::new(RecordingTransport::default());
        let flow = workflow(transport.clone());

        let id = flow
            .create(5, "Author", LISTING, &[photo_message("p1"), photo_message("p2")])
            .await;
        assert_eq!(flow.approve(&id).await, DecisionOutcome::Resolved);

        let sent = transport.sent().await;
        assert!(sent.contains(&Sent::MediaGroup {
            chat_id: CHANNEL_ID,
            len: 2,
        }));
        // Published document carries the rendered headline and the contact
        // button.
        assert!(sent.iter().any(|s| matches!(
            s,
            Sent::Message { chat_id, text, buttons: 1 }
                if *chat_id == CHANNEL_ID && text.contains("Dubai Marina")
        )));
        assert!(sent.iter().any(|s| matches!(
            s,
            Sent::Message { chat_id, text, .. }
                if *chat_id == 5 && text.contains("published")
        )));
    }

    #[tokio::test]
    async fn second_decision_observes_not_found() {
        let transport = Arc::new(RecordingTransport::default());
        let flow = workflow(transport.clone());

        let id = flow.create(5, "Author", LISTING, &[]).await;
        assert_eq!(flow.approve(&id).await, DecisionOutcome::Resolved);
        let sent_after_first = transport.sent().await.len();

        assert_eq!(flow.approve(&id).await, DecisionOutcome::NotFound);
        assert_eq!(flow.reject(&id).await, DecisionOutcome::NotFound);
        assert_eq!(transport.sent().await.len(), sent_after_first);
    }

    #[tokio::test]
    async fn reject_notifies_author_and_publishes_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let flow = workflow(transport.clone());

        let id = flow.create(5, "Author", LISTING, &[photo_message("p1")]).await;
        assert_eq!(flow.reject(&id).await, DecisionOutcome::Resolved);

        let sent = transport.sent().await;
        assert!(sent
            .iter()
            .all(|s| !matches!(s, Sent::Message { chat_id, .. } if *chat_id == CHANNEL_ID)));
        assert!(sent.iter().any(|s| matches!(
            s,
            Sent::Message { chat_id, text, .. }
                if *chat_id == 5 && text.contains("rejected")
        )));
    }

    #[tokio::test]
    async fn approve_stands_even_when_channel_delivery_fails() {
        let transport = Arc::new(RecordingTransport::failing_for(CHANNEL_ID));
        let flow = workflow(transport.clone());

        let id = flow.create(5, "Author", LISTING, &[]).await;
        assert_eq!(flow.approve(&id).await, DecisionOutcome::Resolved);
        assert_eq!(flow.approve(&id).await, DecisionOutcome::NotFound);

        // Author still told about the publication.
        assert!(transport.sent().await.iter().any(|s| matches!(
            s,
            Sent::Message { chat_id, .. } if *chat_id == 5
        )));
    }

    #[tokio::test]
    async fn empty_submission_is_accepted() {
        let transport = Arc::new(RecordingTransport::default());
        let flow = workflow(transport);

        let id = flow.create(5, "Author", "", &[]).await;
        assert!(flow.store.get(&id).await.is_some());
    }
}
