//! Command structs for engine operations.
//!
//! These types group parameters for write operations (transfers, requests,
//! game setup), keeping call sites readable and avoiding long argument lists.

use std::{fmt, str::FromStr};

use crate::{EngineError, Money};

/// Move money from one player to another.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_id: String,
    pub to_id: String,
    pub amount: Money,
    pub remarks: String,
}

impl TransferCmd {
    #[must_use]
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, amount: Money) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            amount,
            remarks: String::new(),
        }
    }

    #[must_use]
    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }
}

/// Which way money flows in a bank shortcut.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BankDirection {
    /// The player pays the bank.
    Pay,
    /// The bank pays the player.
    Receive,
}

impl fmt::Display for BankDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pay => "pay",
            Self::Receive => "receive",
        })
    }
}

impl FromStr for BankDirection {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pay" => Ok(Self::Pay),
            "receive" => Ok(Self::Receive),
            other => Err(EngineError::InvalidTransfer(format!(
                "unknown bank direction: {other}"
            ))),
        }
    }
}

/// Pay the bank or collect from it.
#[derive(Clone, Debug)]
pub struct BankTransactionCmd {
    pub player_id: String,
    pub direction: BankDirection,
    pub amount: Money,
    pub remarks: String,
}

impl BankTransactionCmd {
    #[must_use]
    pub fn new(player_id: impl Into<String>, direction: BankDirection, amount: Money) -> Self {
        Self {
            player_id: player_id.into(),
            direction,
            amount,
            remarks: String::new(),
        }
    }

    #[must_use]
    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }
}

/// Ask `to_id` to pay `amount` to `from_id`.
#[derive(Clone, Debug)]
pub struct FundRequestCmd {
    /// The requester, who will receive the money.
    pub from_id: String,
    /// The asked player, who will pay.
    pub to_id: String,
    pub amount: Money,
    pub remarks: String,
}

impl FundRequestCmd {
    #[must_use]
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, amount: Money) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            amount,
            remarks: String::new(),
        }
    }

    #[must_use]
    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }
}

/// Open a new session.
#[derive(Clone, Debug)]
pub struct CreateGameCmd {
    pub player_name: String,
    pub starting_budget: Money,
}

impl CreateGameCmd {
    #[must_use]
    pub fn new(player_name: impl Into<String>, starting_budget: Money) -> Self {
        Self {
            player_name: player_name.into(),
            starting_budget,
        }
    }
}

/// Take a seat in an existing session.
#[derive(Clone, Debug)]
pub struct JoinGameCmd {
    pub game_id: String,
    pub player_name: String,
}

impl JoinGameCmd {
    #[must_use]
    pub fn new(game_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            player_name: player_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_direction_parses_case_insensitively() {
        assert_eq!("Pay".parse::<BankDirection>().unwrap(), BankDirection::Pay);
        assert_eq!(
            " receive ".parse::<BankDirection>().unwrap(),
            BankDirection::Receive
        );
        assert!("steal".parse::<BankDirection>().is_err());
    }
}
