use crate::{
    EngineError, GameSession, Player, ResultEngine, SessionHandle, session::game_path,
    store::Subscription,
};

use super::Engine;

/// What the last store notification did to the mirrored session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new snapshot replaced the previous one.
    Updated,
    /// The session document is gone.
    Ended,
}

/// Live mirror of one session, fed by a store subscription.
#[derive(Debug)]
pub struct SessionWatcher {
    handle: SessionHandle,
    subscription: Subscription,
    snapshot: Option<GameSession>,
}

impl SessionWatcher {
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// The latest snapshot, `None` before the first one or after the end.
    pub fn snapshot(&self) -> Option<&GameSession> {
        self.snapshot.as_ref()
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.snapshot
            .as_ref()
            .and_then(|s| s.player(&self.handle.player_id))
    }

    pub fn is_creator(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|s| s.is_creator(&self.handle.player_id))
    }

    async fn pull(&mut self) -> ResultEngine<SessionEvent> {
        match self.subscription.next().await {
            None => Err(EngineError::Transport(
                "session subscription closed".to_string(),
            )),
            Some(Err(err)) => Err(err),
            Some(Ok(None)) => {
                self.snapshot = None;
                Ok(SessionEvent::Ended)
            }
            Some(Ok(Some(value))) => {
                self.snapshot = Some(serde_json::from_value(value)?);
                Ok(SessionEvent::Updated)
            }
        }
    }
}

impl Engine {
    /// Subscribe to the session behind `handle`. No snapshot is loaded yet;
    /// call [`Engine::refresh`] to wait for it.
    pub fn watch(&self, handle: SessionHandle) -> ResultEngine<SessionWatcher> {
        let subscription = self.store.subscribe(&game_path(&handle.game_id))?;
        Ok(SessionWatcher {
            handle,
            subscription,
            snapshot: None,
        })
    }

    /// Wait for the next notification and replace the mirrored snapshot.
    ///
    /// When the session disappeared the remembered identity is cleared, as if
    /// the game had been ended from this device.
    pub async fn refresh(&self, watcher: &mut SessionWatcher) -> ResultEngine<SessionEvent> {
        let event = watcher.pull().await?;
        if event == SessionEvent::Ended {
            tracing::warn!(game_id = %watcher.handle.game_id, "session no longer exists");
            if self.identity.load()?.as_ref() == Some(&watcher.handle) {
                self.identity.clear()?;
            }
        }
        Ok(event)
    }

    /// Subscribe and wait for the first snapshot.
    pub async fn open(&self, handle: SessionHandle) -> ResultEngine<SessionWatcher> {
        let mut watcher = self.watch(handle)?;
        match self.refresh(&mut watcher).await? {
            SessionEvent::Updated => Ok(watcher),
            SessionEvent::Ended => Err(EngineError::SessionNotFound(
                watcher.handle.game_id.clone(),
            )),
        }
    }

    /// Reopen the session remembered on this device, if any.
    ///
    /// A remembered session that no longer exists is forgotten and reported
    /// as not found.
    pub async fn resume(&self) -> ResultEngine<Option<SessionWatcher>> {
        let Some(handle) = self.identity.load()? else {
            return Ok(None);
        };
        tracing::debug!(game_id = %handle.game_id, "resuming remembered session");
        self.open(handle).await.map(Some)
    }
}
