use std::collections::HashMap;

use crate::{
    CreateGameCmd, EngineError, GameSession, JoinGameCmd, Player, ResultEngine, ServerTime,
    SessionHandle,
    ids::{new_game_id, new_player_id},
    session::{game_path, player_path},
    util::{normalize_game_id, normalize_player_name},
};

use super::Engine;

impl Engine {
    /// Open a new session with the bank and the creator, and remember the
    /// creator's seat on this device.
    ///
    /// The session code is random and not checked for collisions.
    pub async fn create_game(&self, cmd: CreateGameCmd) -> ResultEngine<SessionHandle> {
        let name = normalize_player_name(&cmd.player_name)?;
        if !cmd.starting_budget.is_positive() {
            return Err(EngineError::InvalidAmount(
                "starting budget must be positive".to_string(),
            ));
        }

        let game_id = new_game_id();
        let creator = Player::new(new_player_id(), name, cmd.starting_budget);
        let bank = Player::bank(self.bank_seed);
        let session = GameSession {
            id: game_id.clone(),
            creator_id: creator.id.clone(),
            players: HashMap::from([(bank.id.clone(), bank), (creator.id.clone(), creator.clone())]),
            transactions: HashMap::new(),
            requests: HashMap::new(),
            created_at: ServerTime::Pending,
        };

        self.store
            .set(&game_path(&game_id), serde_json::to_value(&session)?)
            .await?;

        let handle = SessionHandle::new(game_id, creator.id);
        self.identity.save(&handle)?;
        tracing::info!(game_id = %handle.game_id, player_id = %handle.player_id, "game created");
        Ok(handle)
    }

    /// Take a seat in an existing session.
    ///
    /// The newcomer starts with the current balance of a seated player. Only
    /// the new player record is written so concurrent changes elsewhere in
    /// the document are left alone.
    pub async fn join_game(&self, cmd: JoinGameCmd) -> ResultEngine<SessionHandle> {
        let game_id = normalize_game_id(&cmd.game_id)?;
        let name = normalize_player_name(&cmd.player_name)?;

        let session = self.session(&game_id).await?;
        if session.find_player_by_name(&name).is_some() {
            return Err(EngineError::ExistingKey(name));
        }

        let player = Player::new(new_player_id(), name, session.joining_balance());
        self.store
            .set(
                &player_path(&game_id, &player.id),
                serde_json::to_value(&player)?,
            )
            .await?;

        let handle = SessionHandle::new(game_id, player.id);
        self.identity.save(&handle)?;
        tracing::info!(game_id = %handle.game_id, player_id = %handle.player_id, "player joined");
        Ok(handle)
    }

    /// Delete the whole session for everyone and forget it locally.
    ///
    /// Only the creator is expected to do this; the engine does not check.
    pub async fn end_game(&self, handle: &SessionHandle) -> ResultEngine<()> {
        self.store.remove(&game_path(&handle.game_id)).await?;
        self.identity.clear()?;
        tracing::info!(game_id = %handle.game_id, "game ended");
        Ok(())
    }

    /// Give up this device's seat. The session goes on for the others.
    pub async fn leave_game(&self, handle: &SessionHandle) -> ResultEngine<()> {
        self.store
            .remove(&player_path(&handle.game_id, &handle.player_id))
            .await?;
        self.identity.clear()?;
        tracing::info!(game_id = %handle.game_id, player_id = %handle.player_id, "player left");
        Ok(())
    }
}
