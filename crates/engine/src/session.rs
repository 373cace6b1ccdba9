//! The in-memory mirror of one session document.
//!
//! A [`GameSession`] is always a whole snapshot as delivered by the store.
//! It is never patched locally: the next notification replaces it.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    BANK_ID, FundRequest, Money, Player, ServerTime, Transaction, util::name_key,
};

/// Root collection holding every session document.
pub const GAMES_ROOT: &str = "games";
/// Balance given to a joining player when nobody else holds a regular seat.
pub const DEFAULT_JOIN_BALANCE: Money = Money::from_units(1_500);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub creator_id: String,
    #[serde(default, deserialize_with = "seated_players")]
    pub players: HashMap<String, Player>,
    #[serde(default)]
    pub transactions: HashMap<String, Transaction>,
    #[serde(default)]
    pub requests: HashMap<String, FundRequest>,
    #[serde(default)]
    pub created_at: ServerTime,
}

/// Reads the player map, skipping records that are not whole players.
///
/// A transfer validated against a stale snapshot can credit a player who
/// already left, which leaves a bare `{"balance": ..}` behind. Such leftovers
/// must not make the whole session unreadable. A missing `id` is taken from
/// the map key.
fn seated_players<'de, D>(deserializer: D) -> Result<HashMap<String, Player>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = HashMap::<String, Value>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .filter_map(|(key, mut entry)| {
            if let Value::Object(fields) = &mut entry {
                fields
                    .entry("id")
                    .or_insert_with(|| Value::String(key.clone()));
            }
            match serde_json::from_value::<Player>(entry) {
                Ok(player) => Some((key, player)),
                Err(err) => {
                    tracing::warn!(player_id = %key, %err, "skipping incomplete player record");
                    None
                }
            }
        })
        .collect())
}

/// Store path of a session document.
pub fn game_path(game_id: &str) -> String {
    format!("{GAMES_ROOT}/{game_id}")
}

pub(crate) fn player_path(game_id: &str, player_id: &str) -> String {
    format!("{GAMES_ROOT}/{game_id}/players/{player_id}")
}

pub(crate) fn balance_path(game_id: &str, player_id: &str) -> String {
    format!("{GAMES_ROOT}/{game_id}/players/{player_id}/balance")
}

pub(crate) fn transaction_path(game_id: &str, transaction_id: &str) -> String {
    format!("{GAMES_ROOT}/{game_id}/transactions/{transaction_id}")
}

pub(crate) fn request_path(game_id: &str, request_id: &str) -> String {
    format!("{GAMES_ROOT}/{game_id}/requests/{request_id}")
}

impl GameSession {
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn bank(&self) -> Option<&Player> {
        self.players
            .get(BANK_ID)
            .filter(|p| p.is_bank)
            .or_else(|| self.players.values().find(|p| p.is_bank))
    }

    pub fn is_creator(&self, player_id: &str) -> bool {
        !self.creator_id.is_empty() && self.creator_id == player_id
    }

    /// Finds a player by name, ignoring case. `bank` always finds the bank.
    pub fn find_player_by_name(&self, name: &str) -> Option<&Player> {
        let key = name_key(name);
        if key == BANK_ID {
            return self.bank();
        }
        self.players.values().find(|p| name_key(&p.name) == key)
    }

    /// Players in display order: the bank, then `local_id`, then the others
    /// by name.
    pub fn players_for_display(&self, local_id: Option<&str>) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by(|a, b| {
            let rank = |p: &Player| {
                if p.is_bank {
                    0
                } else if Some(p.id.as_str()) == local_id {
                    1
                } else {
                    2
                }
            };
            rank(a)
                .cmp(&rank(b))
                .then_with(|| name_key(&a.name).cmp(&name_key(&b.name)))
                .then_with(|| a.id.cmp(&b.id))
        });
        players
    }

    /// The transaction log, most recent first.
    pub fn transactions_newest_first(&self) -> Vec<&Transaction> {
        let mut transactions: Vec<&Transaction> = self.transactions.values().collect();
        transactions.sort_by(|a, b| {
            b.timestamp
                .sort_key()
                .cmp(&a.timestamp.sort_key())
                .then_with(|| b.id.cmp(&a.id))
        });
        transactions
    }

    /// Requests waiting for `player_id` to pay, oldest first.
    pub fn pending_requests_for(&self, player_id: &str) -> Vec<&FundRequest> {
        let mut requests: Vec<&FundRequest> = self
            .requests
            .values()
            .filter(|r| r.to_id == player_id)
            .collect();
        requests.sort_by(|a, b| {
            a.timestamp
                .sort_key()
                .cmp(&b.timestamp.sort_key())
                .then_with(|| a.id.cmp(&b.id))
        });
        requests
    }

    /// The request to present next to `player_id`.
    pub fn next_request_for(&self, player_id: &str) -> Option<&FundRequest> {
        self.pending_requests_for(player_id).into_iter().next()
    }

    /// Requests `player_id` sent and is still waiting on.
    pub fn outgoing_requests_for(&self, player_id: &str) -> Vec<&FundRequest> {
        let mut requests: Vec<&FundRequest> = self
            .requests
            .values()
            .filter(|r| r.from_id == player_id)
            .collect();
        requests.sort_by_key(|r| (r.timestamp.sort_key(), r.id.clone()));
        requests
    }

    /// Balance handed to a newly joining player.
    ///
    /// Copies the current balance of a regular player (the creator while
    /// seated, otherwise the lowest id) rather than the original budget.
    pub fn joining_balance(&self) -> Money {
        self.player(&self.creator_id)
            .filter(|p| !p.is_bank)
            .or_else(|| {
                self.players
                    .values()
                    .filter(|p| !p.is_bank)
                    .min_by(|a, b| a.id.cmp(&b.id))
            })
            .map_or(DEFAULT_JOIN_BALANCE, |p| p.balance)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn session() -> GameSession {
        serde_json::from_value(json!({
            "id": "ABC123",
            "creatorId": "player_b",
            "createdAt": 1,
            "players": {
                "bank": {"id": "bank", "name": "Bank", "balance": 100_000_000_000i64, "isBank": true},
                "player_a": {"id": "player_a", "name": "zed", "balance": 500},
                "player_b": {"id": "player_b", "name": "Alice", "balance": 900},
                "player_c": {"id": "player_c", "name": "bob", "balance": 100}
            },
            "transactions": {
                "tx_1": {"id": "tx_1", "from": "Bank", "to": "Alice", "fromId": "bank",
                         "toId": "player_b", "amount": 100, "remarks": "Go", "timestamp": 10},
                "tx_2": {"id": "tx_2", "from": "Alice", "to": "Bank", "fromId": "player_b",
                         "toId": "bank", "amount": 50, "remarks": "Tax", "timestamp": 20}
            },
            "requests": {
                "req_2": {"id": "req_2", "fromId": "player_a", "fromName": "zed",
                          "toId": "player_b", "toName": "Alice", "amount": 5, "timestamp": 30},
                "req_1": {"id": "req_1", "fromId": "player_c", "fromName": "bob",
                          "toId": "player_b", "toName": "Alice", "amount": 7, "timestamp": 25},
                "req_3": {"id": "req_3", "fromId": "player_b", "fromName": "Alice",
                          "toId": "player_c", "toName": "bob", "amount": 1, "timestamp": 5}
            }
        }))
        .unwrap()
    }

    #[test]
    fn missing_collections_deserialize_empty() {
        let session: GameSession =
            serde_json::from_value(json!({"id": "ABC123", "creatorId": "p"})).unwrap();
        assert!(session.players.is_empty());
        assert!(session.transactions.is_empty());
        assert!(session.requests.is_empty());
        assert_eq!(session.created_at, ServerTime::Pending);
    }

    #[test]
    fn leftover_balance_of_a_departed_player_is_skipped() {
        let session: GameSession = serde_json::from_value(json!({
            "id": "ABC123",
            "creatorId": "player_a",
            "players": {
                "bank": {"id": "bank", "name": "Bank", "balance": 1_000_000_000, "isBank": true},
                "player_a": {"name": "Alice", "balance": 900},
                "player_gone": {"balance": 25}
            }
        }))
        .unwrap();

        assert_eq!(session.players.len(), 2);
        assert_eq!(session.player("player_a").unwrap().id, "player_a");
        assert!(session.player("player_gone").is_none());
        assert_eq!(session.joining_balance(), Money::from_units(900));
    }

    #[test]
    fn display_order_puts_bank_then_local_player_first() {
        let session = session();
        let names: Vec<&str> = session
            .players_for_display(Some("player_a"))
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["Bank", "zed", "Alice", "bob"]);
    }

    #[test]
    fn log_is_newest_first() {
        let session = session();
        let ids: Vec<&str> = session
            .transactions_newest_first()
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, ["tx_2", "tx_1"]);
    }

    #[test]
    fn pending_requests_are_oldest_first_and_only_for_the_payer() {
        let session = session();
        let ids: Vec<&str> = session
            .pending_requests_for("player_b")
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, ["req_1", "req_2"]);
        assert_eq!(session.next_request_for("player_b").unwrap().id, "req_1");
        assert_eq!(session.outgoing_requests_for("player_b")[0].id, "req_3");
        assert!(session.next_request_for("player_a").is_none());
    }

    #[test]
    fn name_lookup_ignores_case_and_knows_the_bank() {
        let session = session();
        assert_eq!(session.find_player_by_name("ALICE").unwrap().id, "player_b");
        assert_eq!(session.find_player_by_name(" Bank ").unwrap().id, "bank");
        assert!(session.find_player_by_name("nobody").is_none());
    }

    #[test]
    fn joining_balance_copies_the_creator() {
        let mut session = session();
        assert_eq!(session.joining_balance(), Money::from_units(900));

        session.players.remove("player_b");
        assert_eq!(session.joining_balance(), Money::from_units(500));

        session.players.retain(|_, p| p.is_bank);
        assert_eq!(session.joining_balance(), DEFAULT_JOIN_BALANCE);
    }

    #[test]
    fn creator_check() {
        let session = session();
        assert!(session.is_creator("player_b"));
        assert!(!session.is_creator("player_a"));
    }
}
