//! The module contains the `Player` record.

use serde::{Deserialize, Serialize};

use crate::Money;

/// Id of the distinguished bank player, identical in every session.
pub const BANK_ID: &str = "bank";
pub const BANK_NAME: &str = "Bank";

/// One seat at the table.
///
/// The bank is a player too: its balance is seeded very high and never
/// checked when it pays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub balance: Money,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_bank: bool,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, balance: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            balance,
            is_bank: false,
        }
    }

    pub fn bank(balance: Money) -> Self {
        Self {
            id: BANK_ID.to_string(),
            name: BANK_NAME.to_string(),
            balance,
            is_bank: true,
        }
    }

    /// Returns `true` if the player can pay `amount` right now.
    pub fn can_afford(&self, amount: Money) -> bool {
        self.is_bank || self.balance >= amount
    }
}
