use std::{fmt, sync::Arc};

use crate::{
    EngineError, GameSession, Money, ResultEngine, SessionHandle,
    identity::{IdentityStore, MemoryIdentityStore},
    session::game_path,
    store::DocumentStore,
};

mod ledger;
mod lifecycle;
mod requests;
mod watch;

pub use watch::{SessionEvent, SessionWatcher};

/// Opening balance of the bank in every new session.
pub const BANK_SEED: Money = Money::from_units(1_000_000_000);

/// One device's view of the shared ledger.
///
/// The engine holds no session state of its own: every operation takes the
/// snapshot it validates against (or the handle it acts for) explicitly.
pub struct Engine {
    store: Arc<dyn DocumentStore>,
    identity: Box<dyn IdentityStore>,
    bank_seed: Money,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("bank_seed", &self.bank_seed)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// The handle remembered on this device, if any.
    pub fn remembered(&self) -> ResultEngine<Option<SessionHandle>> {
        self.identity.load()
    }

    /// Forget the remembered handle without touching the store.
    pub fn forget(&self) -> ResultEngine<()> {
        self.identity.clear()
    }

    /// Read a session document once.
    pub async fn fetch_session(&self, game_id: &str) -> ResultEngine<Option<GameSession>> {
        match self.store.get(&game_path(game_id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Read a session document once, failing when it does not exist.
    pub async fn session(&self, game_id: &str) -> ResultEngine<GameSession> {
        self.fetch_session(game_id)
            .await?
            .ok_or_else(|| EngineError::SessionNotFound(game_id.to_string()))
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn DocumentStore>>,
    identity: Option<Box<dyn IdentityStore>>,
    bank_seed: Option<Money>,
}

impl EngineBuilder {
    /// Pass the required store
    pub fn store(self, store: impl DocumentStore + 'static) -> EngineBuilder {
        self.shared_store(Arc::new(store))
    }

    /// Pass a store already shared with other components
    pub fn shared_store(mut self, store: Arc<dyn DocumentStore>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Where the device remembers its seat. Defaults to memory only.
    pub fn identity(mut self, identity: impl IdentityStore + 'static) -> EngineBuilder {
        self.identity = Some(Box::new(identity));
        self
    }

    pub fn bank_seed(mut self, seed: Money) -> EngineBuilder {
        self.bank_seed = Some(seed);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine> {
        let store = self
            .store
            .ok_or_else(|| EngineError::NotConfigured("no document store".to_string()))?;
        Ok(Engine {
            store,
            identity: self
                .identity
                .unwrap_or_else(|| Box::new(MemoryIdentityStore::new())),
            bank_seed: self.bank_seed.unwrap_or(BANK_SEED),
        })
    }
}
