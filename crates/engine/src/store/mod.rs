//! Realtime document stores.
//!
//! A store holds the shared session documents and pushes whole-value
//! snapshots to subscribers. The ledger only talks to [`DocumentStore`]; the
//! backing implementation is picked by whoever builds the [`Engine`].
//!
//! [`Engine`]: crate::Engine

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use async_trait::async_trait;
use futures_util::{Stream, StreamExt, stream::BoxStream};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::{ResultEngine, document::Patch, document::Path};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

const NOTIFY_CAPACITY: usize = 256;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads the value at `path` once.
    async fn get(&self, path: &str) -> ResultEngine<Option<Value>>;

    /// Applies every entry of `patch` or none of them.
    async fn update(&self, patch: Patch) -> ResultEngine<()>;

    /// Replaces the value at `path`.
    async fn set(&self, path: &str, value: Value) -> ResultEngine<()> {
        self.update(Patch::new().put(path, value)).await
    }

    /// Removes the value at `path` and everything below it.
    async fn remove(&self, path: &str) -> ResultEngine<()> {
        self.update(Patch::new().delete(path)).await
    }

    /// Observes `path`. The first item is the current value, then one item
    /// per change touching the path. `None` means nothing is stored there.
    fn subscribe(&self, path: &str) -> ResultEngine<Subscription>;
}

/// Stream of whole-value snapshots for one path.
pub struct Subscription {
    inner: BoxStream<'static, ResultEngine<Option<Value>>>,
}

impl Subscription {
    pub fn new(inner: impl Stream<Item = ResultEngine<Option<Value>>> + Send + 'static) -> Self {
        Self {
            inner: inner.boxed(),
        }
    }

    /// Waits for the next snapshot. `None` once the store hung up.
    pub async fn next(&mut self) -> Option<ResultEngine<Option<Value>>> {
        self.inner.next().await
    }
}

impl Stream for Subscription {
    type Item = ResultEngine<Option<Value>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Fans out the paths touched by each committed update.
#[derive(Clone, Debug)]
pub(crate) struct Notifier {
    sender: broadcast::Sender<Vec<Path>>,
}

impl Default for Notifier {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self { sender }
    }
}

impl Notifier {
    pub(crate) fn notify(&self, changed: Vec<Path>) {
        // No receivers is fine: nobody is watching.
        let _ = self.sender.send(changed);
    }

    pub(crate) fn receiver(&self) -> broadcast::Receiver<Vec<Path>> {
        self.sender.subscribe()
    }
}

/// Builds a subscription that re-reads `path` from `store` whenever a
/// notification overlaps it.
///
/// The receiver is taken before the first read so no change between the two
/// can be missed. A lagging receiver just re-reads: snapshots replace each
/// other wholesale, so skipped notifications carry no extra information.
pub(crate) fn watch_path<S>(store: S, path: Path, receiver: broadcast::Receiver<Vec<Path>>) -> Subscription
where
    S: DocumentStore + 'static,
{
    let raw = path.to_string();
    let state = (store, path, raw, receiver, true);
    let stream = futures_util::stream::unfold(
        state,
        |(store, path, raw, mut receiver, first)| async move {
            if !first {
                loop {
                    match receiver.recv().await {
                        Ok(changed) if changed.iter().any(|c| c.overlaps(&path)) => break,
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!(path = %raw, skipped, "subscriber lagged, re-reading");
                            break;
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
            let snapshot = store.get(&raw).await;
            Some((snapshot, (store, path, raw, receiver, false)))
        },
    );
    Subscription::new(stream)
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
