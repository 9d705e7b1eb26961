use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::telegram::types::Message;

/// Composite key for one media group in one chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AlbumKey {
    chat_id: i64,
    media_group_id: String,
}

/// Collapses a burst of media-group messages into a single downstream event.
///
/// The first message of a group opens a bucket and arms its flush timer; the
/// timer owner takes the bucket out of the map under the lock, so each
/// bucket flushes exactly once. A message with the same key arriving after
/// the flush opens a fresh bucket. Non-grouped messages never come through
/// here.
pub struct AlbumAggregator {
    delay: Duration,
    buckets: Arc<Mutex<HashMap<AlbumKey, Vec<Message>>>>,
    events: mpsc::UnboundedSender<Vec<Message>>,
}

impl AlbumAggregator {
    /// Default debounce window for grouped media.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<Vec<Message>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let aggregator = Self {
            delay,
            buckets: Arc::new(Mutex::new(HashMap::new())),
            events: tx,
        };
        (aggregator, rx)
    }

    /// Buffers one media-group message, arming the bucket timer when the
    /// message is the first of its group.
    pub async fn push(&self, message: Message) {
        let Some(group_id) = message.media_group_id.clone() else {
            return;
        };
        let key = AlbumKey {
            chat_id: message.chat.id,
            media_group_id: group_id,
        };

        let mut buckets = self.buckets.lock().await;
        if let Some(pending) = buckets.get_mut(&key) {
            pending.push(message);
            return;
        }
        buckets.insert(key.clone(), vec![message]);
        drop(buckets);

        let buckets = Arc::clone(&self.buckets);
        let events = self.events.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let flushed = buckets.lock().await.remove(&key);
            if let Some(messages) = flushed {
                debug!(
                    "Flushing album {}:{} with {} messages",
                    key.chat_id,
                    key.media_group_id,
                    messages.len()
                );
                // Receiver gone means shutdown; nothing left to deliver to.
                let _ = events.send(messages);
            }
        });
    }
}
