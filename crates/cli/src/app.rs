//! One CLI invocation: resolve the device's seat, run a command, print.

use std::path::Path;

use chrono::Utc;
use engine::{
    BankDirection, BankTransactionCmd, CreateGameCmd, Engine, EngineError, FileIdentityStore,
    FundRequest, FundRequestCmd, GameSession, JoinGameCmd, Money, Player, SessionEvent,
    SessionHandle, TransferCmd, invite_url,
};
use serde::Serialize;

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    http_store::HttpStore,
    render,
};

pub struct App {
    engine: Engine,
    config: AppConfig,
}

/// The seat this device holds and the snapshot it was validated against.
struct Seat {
    handle: SessionHandle,
    session: GameSession,
}

impl Seat {
    fn local(&self) -> Result<&Player> {
        self.session
            .player(&self.handle.player_id)
            .ok_or(AppError::NoSession)
    }
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    time: String,
    from: &'a str,
    to: &'a str,
    amount: String,
    amount_cents: i64,
    remarks: &'a str,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let engine = Engine::builder()
            .store(HttpStore::new(&config.server_url)?)
            .identity(FileIdentityStore::new(&config.identity))
            .build()?;
        Ok(Self { engine, config })
    }

    /// Loads the remembered seat. A session deleted meanwhile, or a seat
    /// removed from it, is forgotten locally.
    async fn seat(&self) -> Result<Seat> {
        let watcher = self.engine.resume().await?.ok_or(AppError::NoSession)?;
        let handle = watcher.handle().clone();
        let Some(session) = watcher.snapshot().cloned() else {
            return Err(AppError::NoSession);
        };
        if session.player(&handle.player_id).is_none() {
            tracing::info!(game_id = %handle.game_id, "seat no longer in the game, forgetting it");
            self.engine.forget()?;
            return Err(AppError::Usage(format!(
                "you are no longer seated in game {}",
                handle.game_id
            )));
        }
        Ok(Seat { handle, session })
    }

    fn resolve_player<'a>(&self, session: &'a GameSession, who: &str) -> Result<&'a Player> {
        session
            .find_player_by_name(who)
            .or_else(|| session.player(who.trim()))
            .ok_or_else(|| AppError::Usage(format!("no player named '{}'", who.trim())))
    }

    pub async fn create(&self, name: &str, budget: Money) -> Result<()> {
        let handle = self
            .engine
            .create_game(CreateGameCmd::new(name, budget))
            .await?;
        println!("Game {} created.", handle.game_id);
        println!(
            "Invite: {}",
            invite_url(&self.config.invite_base, &handle.game_id)
        );
        Ok(())
    }

    pub async fn join(&self, game_id: &str, name: &str) -> Result<()> {
        let handle = self
            .engine
            .join_game(JoinGameCmd::new(game_id, name))
            .await?;
        let session = self.engine.session(&handle.game_id).await?;
        println!("Joined game {}.", handle.game_id);
        print!("{}", render::players(&session, &handle.player_id));
        Ok(())
    }

    pub async fn status(&self) -> Result<()> {
        let seat = self.seat().await?;
        print!("{}", render::players(&seat.session, &seat.handle.player_id));
        let waiting = seat.session.pending_requests_for(&seat.handle.player_id).len();
        if waiting > 0 {
            println!("{waiting} request(s) waiting for you, see `requests`.");
        }
        Ok(())
    }

    pub async fn log(&self, limit: usize) -> Result<()> {
        let seat = self.seat().await?;
        print!("{}", render::log(&seat.session, limit, Utc::now()));
        Ok(())
    }

    pub async fn pay(&self, to: &str, amount: Money, remarks: &str) -> Result<()> {
        let seat = self.seat().await?;
        let local = seat.local()?;
        let payee = self.resolve_player(&seat.session, to)?;
        self.engine
            .transfer_funds(
                &seat.session,
                TransferCmd::new(&local.id, &payee.id, amount).remarks(remarks),
            )
            .await?;
        println!("Paid {} to {}.", render::money(amount), payee.name);
        Ok(())
    }

    pub async fn bank(&self, direction: BankDirection, amount: Money, remarks: &str) -> Result<()> {
        let seat = self.seat().await?;
        let local = seat.local()?;
        self.engine
            .bank_transaction(
                &seat.session,
                BankTransactionCmd::new(&local.id, direction, amount).remarks(remarks),
            )
            .await?;
        match direction {
            BankDirection::Pay => println!("Paid {} to the bank.", render::money(amount)),
            BankDirection::Receive => {
                println!("Received {} from the bank.", render::money(amount))
            }
        }
        Ok(())
    }

    pub async fn request(&self, from: &str, amount: Money, remarks: &str) -> Result<()> {
        let seat = self.seat().await?;
        let local = seat.local()?;
        let payer = self.resolve_player(&seat.session, from)?;
        let request_id = self
            .engine
            .create_request(
                &seat.session,
                FundRequestCmd::new(&local.id, &payer.id, amount).remarks(remarks),
            )
            .await?;
        println!(
            "Asked {} for {} [{request_id}].",
            payer.name,
            render::money(amount)
        );
        Ok(())
    }

    pub async fn requests(&self) -> Result<()> {
        let seat = self.seat().await?;
        print!(
            "{}",
            render::requests(&seat.session, &seat.handle.player_id, Utc::now())
        );
        Ok(())
    }

    /// The request `id` addressed to this device, or the oldest one.
    fn pick_request<'a>(seat: &'a Seat, id: Option<&str>) -> Result<&'a FundRequest> {
        let local_id = &seat.handle.player_id;
        let request = match id {
            Some(id) => seat
                .session
                .requests
                .get(id.trim())
                .ok_or_else(|| EngineError::KeyNotFound(format!("request {}", id.trim())))?,
            None => seat
                .session
                .next_request_for(local_id)
                .ok_or_else(|| AppError::Usage("no request waiting for you".to_string()))?,
        };
        if &request.to_id != local_id {
            return Err(AppError::Usage(format!(
                "request {} is not addressed to you",
                request.id
            )));
        }
        Ok(request)
    }

    pub async fn accept(&self, id: Option<&str>) -> Result<()> {
        let seat = self.seat().await?;
        let request = Self::pick_request(&seat, id)?;
        self.engine
            .accept_request(&seat.session, &request.id)
            .await?;
        println!(
            "Paid {} to {}.",
            render::money(request.amount),
            request.from_name
        );
        Ok(())
    }

    pub async fn decline(&self, id: Option<&str>) -> Result<()> {
        let seat = self.seat().await?;
        let request = Self::pick_request(&seat, id)?;
        self.engine
            .decline_request(&seat.session, &request.id)
            .await?;
        println!("Declined {}'s request.", request.from_name);
        Ok(())
    }

    pub async fn leave(&self) -> Result<()> {
        let seat = self.seat().await?;
        self.engine.leave_game(&seat.handle).await?;
        println!("You left game {}.", seat.handle.game_id);
        Ok(())
    }

    pub async fn end(&self, force: bool) -> Result<()> {
        let seat = self.seat().await?;
        if !seat.session.is_creator(&seat.handle.player_id) && !force {
            return Err(AppError::Usage(
                "only the host ends the game for everyone, pass --force to do it anyway"
                    .to_string(),
            ));
        }
        self.engine.end_game(&seat.handle).await?;
        println!("Game {} ended.", seat.handle.game_id);
        Ok(())
    }

    pub async fn invite(&self) -> Result<()> {
        let handle = self.engine.remembered()?.ok_or(AppError::NoSession)?;
        println!("{}", invite_url(&self.config.invite_base, &handle.game_id));
        Ok(())
    }

    /// Print the table after every change until the game ends or Ctrl-C.
    pub async fn watch(&self) -> Result<()> {
        let mut watcher = self.engine.resume().await?.ok_or(AppError::NoSession)?;
        loop {
            if let Some(session) = watcher.snapshot() {
                let player_id = &watcher.handle().player_id;
                print!("{}", render::players(session, player_id));
                if let Some(request) = session.next_request_for(player_id) {
                    println!("{}", render::incoming_request(request, Utc::now()));
                }
                println!();
            }
            tokio::select! {
                event = self.engine.refresh(&mut watcher) => {
                    if event? == SessionEvent::Ended {
                        println!("The game has ended.");
                        return Ok(());
                    }
                }
                _ = tokio::signal::ctrl_c() => return Ok(()),
            }
        }
    }

    pub async fn export(&self, out: &Path) -> Result<()> {
        let seat = self.seat().await?;
        let rows = export_rows(&seat.session);
        let mut writer = csv::Writer::from_path(out)?;
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        println!("Wrote {} transaction(s) to {}.", rows.len(), out.display());
        Ok(())
    }
}

fn export_rows(session: &GameSession) -> Vec<ExportRow<'_>> {
    let mut transactions = session.transactions_newest_first();
    transactions.reverse();
    transactions
        .into_iter()
        .map(|tx| ExportRow {
            id: &tx.id,
            time: tx
                .timestamp
                .to_datetime()
                .map_or_else(|| "pending".to_string(), |at| at.to_rfc3339()),
            from: &tx.from,
            to: &tx.to,
            amount: tx.amount.to_string(),
            amount_cents: tx.amount.cents(),
            remarks: &tx.remarks,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use engine::{ServerTime, Transaction};

    use super::*;

    #[test]
    fn export_is_oldest_first() {
        let alice = Player::new("a", "Alice", Money::from_units(10));
        let bob = Player::new("b", "Bob", Money::from_units(10));
        let mut first = Transaction::new("tx_1", &alice, &bob, Money::new(150), "Tea");
        first.timestamp = ServerTime::At(1_000);
        let mut second = Transaction::new("tx_2", &bob, &alice, Money::new(99), "");
        second.timestamp = ServerTime::At(2_000);
        let session = GameSession {
            id: "ABC123".to_string(),
            creator_id: "a".to_string(),
            players: HashMap::new(),
            transactions: HashMap::from([
                (second.id.clone(), second),
                (first.id.clone(), first),
            ]),
            requests: HashMap::new(),
            created_at: ServerTime::At(0),
        };

        let rows = export_rows(&session);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "tx_1");
        assert_eq!(rows[0].amount, "$1.50");
        assert_eq!(rows[0].amount_cents, 150);
        assert_eq!(rows[0].time, "1970-01-01T00:00:01+00:00");
        assert_eq!(rows[1].id, "tx_2");
        assert_eq!(rows[1].from, "Bob");
    }
}
