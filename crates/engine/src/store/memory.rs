use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{DocumentStore, Notifier, Subscription, now_millis, watch_path};
use crate::{
    ResultEngine,
    document::{self, Patch, Path},
};

/// Process-local store. Clones share the same tree.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    tree: RwLock<Value>,
    notifier: Notifier,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> ResultEngine<Option<Value>> {
        let path = Path::parse(path)?;
        let tree = self.inner.tree.read().await;
        Ok(document::get(&tree, &path).cloned())
    }

    async fn update(&self, patch: Patch) -> ResultEngine<()> {
        let updates = patch.validate()?;
        let changed: Vec<Path> = updates.iter().map(|(path, _)| path.clone()).collect();
        {
            let mut tree = self.inner.tree.write().await;
            document::apply(&mut tree, updates, now_millis());
        }
        tracing::trace!(paths = changed.len(), "memory store updated");
        self.inner.notifier.notify(changed);
        Ok(())
    }

    fn subscribe(&self, path: &str) -> ResultEngine<Subscription> {
        let path = Path::parse(path)?;
        let receiver = self.inner.notifier.receiver();
        Ok(watch_path(self.clone(), path, receiver))
    }
}
