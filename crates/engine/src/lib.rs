//! Shared-ledger banking for board game tables.
//!
//! Every device at the table mirrors one session document held in a
//! [`DocumentStore`] and writes balance changes as atomic multi-path updates.

pub use commands::{
    BankDirection, BankTransactionCmd, CreateGameCmd, FundRequestCmd, JoinGameCmd, TransferCmd,
};
pub use document::Patch;
pub use error::{EngineError, ErrorKind};
pub use identity::{FileIdentityStore, IdentityStore, MemoryIdentityStore, SessionHandle};
pub use invite::invite_url;
pub use money::Money;
pub use ops::{BANK_SEED, Engine, EngineBuilder, SessionEvent, SessionWatcher};
pub use players::{BANK_ID, BANK_NAME, Player};
pub use requests::FundRequest;
pub use session::GameSession;
pub use store::{DocumentStore, MemoryStore, SqliteStore, Subscription};
pub use timestamp::ServerTime;
pub use transactions::Transaction;

mod commands;
pub mod document;
mod error;
pub mod identity;
pub mod ids;
mod invite;
mod money;
mod ops;
mod players;
mod requests;
pub mod session;
pub mod store;
mod timestamp;
mod transactions;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
