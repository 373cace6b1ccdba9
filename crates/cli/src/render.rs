//! Plain-text views of a session snapshot.

use chrono::{DateTime, Utc};
use engine::{FundRequest, GameSession, Money, Player, ServerTime, Transaction};

/// Amount as shown in lists: `$15M`, `-$1.5K`, `$12.5`.
pub fn money(amount: Money) -> String {
    let compact = amount.compact();
    match compact.strip_prefix('-') {
        Some(abs) => format!("-${abs}"),
        None => format!("${compact}"),
    }
}

/// `just now`, `5m ago`, `3h ago`, `2d ago`; `pending` until the store
/// stamped the record.
pub fn relative_time(timestamp: ServerTime, now: DateTime<Utc>) -> String {
    let Some(at) = timestamp.to_datetime() else {
        return "pending".to_string();
    };
    let elapsed = now.signed_duration_since(at);
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}

fn player_line(player: &Player, session: &GameSession, local_id: &str) -> String {
    let mut tags = Vec::new();
    if player.id == local_id {
        tags.push("you");
    }
    if session.is_creator(&player.id) {
        tags.push("host");
    }
    let tags = if tags.is_empty() {
        String::new()
    } else {
        format!(" ({})", tags.join(", "))
    };
    format!("  {:<20} {:>10}{tags}", player.name, money(player.balance))
}

pub fn players(session: &GameSession, local_id: &str) -> String {
    let mut out = format!("Game {}\n", session.id);
    for player in session.players_for_display(Some(local_id)) {
        out.push_str(&player_line(player, session, local_id));
        out.push('\n');
    }
    out
}

fn transaction_line(tx: &Transaction, now: DateTime<Utc>) -> String {
    let remarks = if tx.remarks.is_empty() {
        String::new()
    } else {
        format!("  {}", tx.remarks)
    };
    format!(
        "  {:<9} {} -> {}  {}{remarks}",
        relative_time(tx.timestamp, now),
        tx.from,
        tx.to,
        money(tx.amount)
    )
}

pub fn log(session: &GameSession, limit: usize, now: DateTime<Utc>) -> String {
    let transactions = session.transactions_newest_first();
    if transactions.is_empty() {
        return "No transactions yet.\n".to_string();
    }
    let mut out = String::new();
    for tx in transactions.into_iter().take(limit) {
        out.push_str(&transaction_line(tx, now));
        out.push('\n');
    }
    out
}

pub fn incoming_request(request: &FundRequest, now: DateTime<Utc>) -> String {
    let remarks = if request.remarks.is_empty() {
        String::new()
    } else {
        format!(" for \"{}\"", request.remarks)
    };
    format!(
        "  [{}] {} asks you for {}{remarks} ({})",
        request.id,
        request.from_name,
        money(request.amount),
        relative_time(request.timestamp, now)
    )
}

pub fn outgoing_request(request: &FundRequest, now: DateTime<Utc>) -> String {
    format!(
        "  [{}] waiting on {} for {} ({})",
        request.id,
        request.to_name,
        money(request.amount),
        relative_time(request.timestamp, now)
    )
}

pub fn requests(session: &GameSession, local_id: &str, now: DateTime<Utc>) -> String {
    let incoming = session.pending_requests_for(local_id);
    let outgoing = session.outgoing_requests_for(local_id);
    if incoming.is_empty() && outgoing.is_empty() {
        return "No pending requests.\n".to_string();
    }
    let mut out = String::new();
    if !incoming.is_empty() {
        out.push_str("To pay:\n");
        for request in incoming {
            out.push_str(&incoming_request(request, now));
            out.push('\n');
        }
    }
    if !outgoing.is_empty() {
        out.push_str("Sent:\n");
        for request in outgoing {
            out.push_str(&outgoing_request(request, now));
            out.push('\n');
        }
    }
    out
}
