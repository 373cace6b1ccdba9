//! Identifier generation.
//!
//! Session codes are short so they can be read out loud across the table;
//! collisions are possible and not checked. Record ids are UUIDv7 based, so
//! they sort by creation time.

use rand::Rng;
use uuid::Uuid;

pub const GAME_ID_LEN: usize = 6;
const GAME_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn new_game_id() -> String {
    let mut rng = rand::thread_rng();
    (0..GAME_ID_LEN)
        .map(|_| char::from(GAME_ID_ALPHABET[rng.gen_range(0..GAME_ID_ALPHABET.len())]))
        .collect()
}

pub fn new_player_id() -> String {
    prefixed("player")
}

pub fn new_transaction_id() -> String {
    prefixed("tx")
}

pub fn new_request_id() -> String {
    prefixed("req")
}

fn prefixed(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::now_v7().simple())
}
