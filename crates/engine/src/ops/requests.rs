use crate::{
    EngineError, FundRequest, FundRequestCmd, GameSession, ResultEngine,
    ids::new_request_id,
    session::request_path,
    util::normalize_text,
};

use super::{Engine, ledger::prepare_transfer};

fn require_request<'a>(session: &'a GameSession, request_id: &str) -> ResultEngine<&'a FundRequest> {
    session
        .requests
        .get(request_id)
        .ok_or_else(|| EngineError::KeyNotFound(format!("request {request_id}")))
}

impl Engine {
    /// Ask `cmd.to_id` to pay `cmd.amount` to `cmd.from_id`.
    ///
    /// Funds are not checked here; the payer's balance matters only when the
    /// request is accepted. The bank settles instantly and is never asked.
    pub async fn create_request(
        &self,
        session: &GameSession,
        cmd: FundRequestCmd,
    ) -> ResultEngine<String> {
        let unknown = |id: &str| EngineError::InvalidTransfer(format!("unknown player '{id}'"));
        let requester = session.player(&cmd.from_id).ok_or_else(|| unknown(&cmd.from_id))?;
        let payer = session.player(&cmd.to_id).ok_or_else(|| unknown(&cmd.to_id))?;
        if requester.id == payer.id {
            return Err(EngineError::InvalidTransfer(
                "cannot request money from yourself".to_string(),
            ));
        }
        if requester.is_bank || payer.is_bank {
            return Err(EngineError::InvalidTransfer(
                "the bank settles directly, use a bank transaction".to_string(),
            ));
        }
        if !cmd.amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be positive".to_string(),
            ));
        }

        let request = FundRequest::new(
            new_request_id(),
            requester,
            payer,
            cmd.amount,
            normalize_text(&cmd.remarks),
        );
        self.store
            .set(
                &request_path(&session.id, &request.id),
                serde_json::to_value(&request)?,
            )
            .await?;
        tracing::info!(
            game_id = %session.id,
            request_id = %request.id,
            from = %request.from_id,
            to = %request.to_id,
            "fund request created"
        );
        Ok(request.id)
    }

    /// Pay a pending request: the asked player pays the requester and the
    /// request disappears, in one atomic update.
    ///
    /// When the payer cannot afford it nothing is written and the request
    /// stays pending.
    pub async fn accept_request(
        &self,
        session: &GameSession,
        request_id: &str,
    ) -> ResultEngine<String> {
        let request = require_request(session, request_id)?;
        let prepared = prepare_transfer(
            session,
            &request.to_id,
            &request.from_id,
            request.amount,
            &request.remarks,
        )?;
        let patch = prepared
            .patch
            .delete(request_path(&session.id, &request.id));
        self.store.update(patch).await?;
        tracing::info!(
            game_id = %session.id,
            request_id = %request.id,
            transaction_id = %prepared.transaction.id,
            "fund request accepted"
        );
        Ok(prepared.transaction.id)
    }

    /// Drop a pending request without paying.
    pub async fn decline_request(&self, session: &GameSession, request_id: &str) -> ResultEngine<()> {
        let request = require_request(session, request_id)?;
        self.store
            .remove(&request_path(&session.id, &request.id))
            .await?;
        tracing::info!(game_id = %session.id, request_id = %request.id, "fund request declined");
        Ok(())
    }
}
