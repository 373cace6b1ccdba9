//! Transaction records.
//!
//! A `Transaction` is the immutable trace of one transfer. Display names are
//! copied from the players when the transfer is written, so renaming or
//! removing a player later does not rewrite history.

use serde::{Deserialize, Serialize};

use crate::{Money, Player, ServerTime};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Payer display name at the time of the transfer.
    pub from: String,
    /// Payee display name at the time of the transfer.
    pub to: String,
    pub from_id: String,
    pub to_id: String,
    pub amount: Money,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub timestamp: ServerTime,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        from: &Player,
        to: &Player,
        amount: Money,
        remarks: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.name.clone(),
            to: to.name.clone(),
            from_id: from.id.clone(),
            to_id: to.id.clone(),
            amount,
            remarks: remarks.into(),
            timestamp: ServerTime::Pending,
        }
    }

    /// Returns `true` if `player_id` paid or received in this transaction.
    pub fn involves(&self, player_id: &str) -> bool {
        self.from_id == player_id || self.to_id == player_id
    }
}
