use crate::{
    BANK_ID, BankDirection, BankTransactionCmd, EngineError, GameSession, Money, Player,
    ResultEngine, Transaction, TransferCmd,
    document::Patch,
    ids::new_transaction_id,
    session::{balance_path, transaction_path},
    util::normalize_text,
};

use super::Engine;

/// A validated transfer, ready to be written.
pub(super) struct PreparedTransfer {
    pub(super) patch: Patch,
    pub(super) transaction: Transaction,
}

fn require_player<'a>(session: &'a GameSession, id: &str) -> ResultEngine<&'a Player> {
    session
        .player(id)
        .ok_or_else(|| EngineError::InvalidTransfer(format!("unknown player '{id}'")))
}

/// Check a transfer against `session` and build the update that applies it:
/// debit, credit and the new transaction record.
pub(super) fn prepare_transfer(
    session: &GameSession,
    from_id: &str,
    to_id: &str,
    amount: Money,
    remarks: &str,
) -> ResultEngine<PreparedTransfer> {
    let from = require_player(session, from_id)?;
    let to = require_player(session, to_id)?;
    if from.id == to.id {
        return Err(EngineError::InvalidTransfer(
            "payer and payee must differ".to_string(),
        ));
    }
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "amount must be positive".to_string(),
        ));
    }
    if !from.can_afford(amount) {
        return Err(EngineError::InsufficientFunds(format!(
            "{} does not have enough funds",
            from.name
        )));
    }

    let too_large = || EngineError::InvalidAmount("amount too large".to_string());
    let from_balance = from.balance.checked_sub(amount).ok_or_else(too_large)?;
    let to_balance = to.balance.checked_add(amount).ok_or_else(too_large)?;

    let transaction = Transaction::new(
        new_transaction_id(),
        from,
        to,
        amount,
        normalize_text(remarks),
    );
    let patch = Patch::new()
        .put(balance_path(&session.id, &from.id), serde_json::to_value(from_balance)?)
        .put(balance_path(&session.id, &to.id), serde_json::to_value(to_balance)?)
        .put(
            transaction_path(&session.id, &transaction.id),
            serde_json::to_value(&transaction)?,
        );
    Ok(PreparedTransfer { patch, transaction })
}

impl Engine {
    /// Move `cmd.amount` between two players of `session`.
    ///
    /// The checks run against the given snapshot; nothing is re-read. On
    /// success the debit, the credit and the transaction record are written in
    /// one atomic update and the new transaction id is returned. The snapshot
    /// itself is not touched: the change shows up with the next notification.
    pub async fn transfer_funds(
        &self,
        session: &GameSession,
        cmd: TransferCmd,
    ) -> ResultEngine<String> {
        let prepared = prepare_transfer(
            session,
            &cmd.from_id,
            &cmd.to_id,
            cmd.amount,
            &cmd.remarks,
        )
        .inspect_err(|err| {
            tracing::debug!(game_id = %session.id, from = %cmd.from_id, to = %cmd.to_id, "transfer rejected: {err}");
        })?;

        self.store.update(prepared.patch).await?;
        tracing::info!(
            game_id = %session.id,
            transaction_id = %prepared.transaction.id,
            from = %cmd.from_id,
            to = %cmd.to_id,
            amount = prepared.transaction.amount.cents(),
            "transfer written"
        );
        Ok(prepared.transaction.id)
    }

    /// Shortcut for transfers with the bank on one side.
    pub async fn bank_transaction(
        &self,
        session: &GameSession,
        cmd: BankTransactionCmd,
    ) -> ResultEngine<String> {
        let bank_id = session
            .bank()
            .map_or_else(|| BANK_ID.to_string(), |bank| bank.id.clone());
        let BankTransactionCmd {
            player_id,
            direction,
            amount,
            remarks,
        } = cmd;
        let transfer = match direction {
            BankDirection::Pay => TransferCmd::new(player_id, bank_id, amount),
            BankDirection::Receive => TransferCmd::new(bank_id, player_id, amount),
        };
        self.transfer_funds(session, transfer.remarks(remarks)).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::ServerTime;

    fn session() -> GameSession {
        let players = [
            Player::bank(Money::from_units(1_000)),
            Player::new("a", "Alice", Money::from_units(100)),
            Player::new("b", "Bob", Money::from_units(10)),
        ]
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();
        GameSession {
            id: "ABC123".to_string(),
            creator_id: "a".to_string(),
            players,
            transactions: HashMap::new(),
            requests: HashMap::new(),
            created_at: ServerTime::At(1),
        }
    }

    #[test]
    fn prepared_transfer_touches_both_balances_and_the_log() {
        let prepared =
            prepare_transfer(&session(), "a", "b", Money::from_units(40), " Rent ").unwrap();
        let updates = prepared.patch.into_inner();
        assert_eq!(updates.len(), 3);
        assert_eq!(
            updates["games/ABC123/players/a/balance"],
            serde_json::json!(6_000)
        );
        assert_eq!(
            updates["games/ABC123/players/b/balance"],
            serde_json::json!(5_000)
        );
        assert_eq!(prepared.transaction.remarks, "Rent");
        assert_eq!(prepared.transaction.from, "Alice");
        assert_eq!(prepared.transaction.to, "Bob");
    }

    #[test]
    fn rejections_follow_the_guard_order() {
        let session = session();
        let err = prepare_transfer(&session, "x", "b", Money::new(1), "").err();
        assert_eq!(
            err,
            Some(EngineError::InvalidTransfer("unknown player 'x'".to_string()))
        );
        assert!(matches!(
            prepare_transfer(&session, "a", "a", Money::new(1), ""),
            Err(EngineError::InvalidTransfer(_))
        ));
        assert!(matches!(
            prepare_transfer(&session, "a", "b", Money::ZERO, ""),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            prepare_transfer(&session, "a", "b", Money::new(-5), ""),
            Err(EngineError::InvalidAmount(_))
        ));
        assert_eq!(
            prepare_transfer(&session, "b", "a", Money::from_units(11), "").err(),
            Some(EngineError::InsufficientFunds(
                "Bob does not have enough funds".to_string()
            ))
        );
    }

    #[test]
    fn bank_may_go_negative() {
        let prepared =
            prepare_transfer(&session(), "bank", "a", Money::from_units(5_000), "").unwrap();
        let updates = prepared.patch.into_inner();
        assert_eq!(
            updates["games/ABC123/players/bank/balance"],
            serde_json::json!(-400_000)
        );
    }
}
