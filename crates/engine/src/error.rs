//! The module contains the error the engine can throw.
//!
//! Errors fall in four families, see [`ErrorKind`]:
//!
//! - validation: the request is rejected before anything is written
//!   ([`InvalidAmount`], [`InsufficientFunds`], [`InvalidTransfer`], ...);
//! - not found: the session or one of its records does not exist
//!   ([`SessionNotFound`], [`KeyNotFound`]);
//! - conflict: a player with the same name already sits at the table
//!   ([`ExistingKey`]);
//! - transport: the store could not be reached or configured.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`InvalidTransfer`]: EngineError::InvalidTransfer
//!  [`SessionNotFound`]: EngineError::SessionNotFound
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Game \"{0}\" not found")]
    SessionNotFound(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Store not configured: {0}")]
    NotConfigured(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Coarse classification used by callers to decide how to surface an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Transport,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Transport => "transport",
        }
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientFunds(_)
            | Self::InvalidAmount(_)
            | Self::InvalidTransfer(_)
            | Self::InvalidName(_)
            | Self::InvalidId(_)
            | Self::InvalidPath(_) => ErrorKind::Validation,
            Self::SessionNotFound(_) | Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::ExistingKey(_) => ErrorKind::Conflict,
            Self::NotConfigured(_)
            | Self::Transport(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::Database(_) => ErrorKind::Transport,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidTransfer(a), Self::InvalidTransfer(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidPath(a), Self::InvalidPath(b)) => a == b,
            (Self::SessionNotFound(a), Self::SessionNotFound(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::NotConfigured(a), Self::NotConfigured(b)) => a == b,
            (Self::Transport(a), Self::Transport(b)) => a == b,
            (Self::Serialization(a), Self::Serialization(b)) => a.to_string() == b.to_string(),
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_error_families() {
        assert_eq!(
            EngineError::InsufficientFunds("x".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::SessionNotFound("ABC123".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::ExistingKey("Alice".to_string()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            EngineError::Transport("offline".to_string()).kind(),
            ErrorKind::Transport
        );
    }

    #[test]
    fn session_not_found_message_names_the_game() {
        let err = EngineError::SessionNotFound("ABC123".to_string());
        assert_eq!(err.to_string(), "Game \"ABC123\" not found");
    }
}
