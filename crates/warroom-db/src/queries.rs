//! Read-only queries against the store.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::{decode_action, Store};
use crate::GameView;
use native_db::transaction::RTransaction;
use warroom_core::{nations_by_name, Action, Error as GameError, GameId, Player, TurnLogEntry};

impl Store {
    /// Full state of one game: the record, its nations and its players.
    pub fn game(&self, game_id: GameId) -> Result<GameView> {
        let r = self.db.r_transaction()?;
        let game = stored_game(&r, game_id)?.to_game();

        let scan = r
            .scan()
            .secondary::<StoredNation>(StoredNationKey::game_id)?;
        let iter = scan.start_with(game_id.raw())?;
        let nations: std::result::Result<Vec<StoredNation>, _> = iter.collect();
        let nations = nations.map_err(|e| Error::Database(e.to_string()))?;

        let scan = r
            .scan()
            .secondary::<StoredPlayer>(StoredPlayerKey::game_id)?;
        let iter = scan.start_with(game_id.raw())?;
        let players: std::result::Result<Vec<StoredPlayer>, _> = iter.collect();
        let mut players: Vec<Player> = players
            .map_err(|e| Error::Database(e.to_string()))?
            .iter()
            .map(StoredPlayer::to_player)
            .collect();
        players.sort_by_key(|p| p.id);

        Ok(GameView {
            game,
            nations: nations_by_name(nations.iter().map(StoredNation::to_nation)),
            players,
        })
    }

    /// Actions queued for the next resolution, in submission order.
    pub fn pending_actions(&self, game_id: GameId) -> Result<Vec<Action>> {
        let r = self.db.r_transaction()?;
        stored_game(&r, game_id)?;

        let scan = r
            .scan()
            .secondary::<StoredAction>(StoredActionKey::game_id)?;
        let iter = scan.start_with(game_id.raw())?;
        let actions: std::result::Result<Vec<StoredAction>, _> = iter.collect();
        let mut actions = actions.map_err(|e| Error::Database(e.to_string()))?;
        actions.sort_by_key(|a| a.id);
        Ok(actions.iter().filter_map(decode_action).collect())
    }

    /// Every log entry of a game, in append order.
    pub fn turn_logs(&self, game_id: GameId) -> Result<Vec<TurnLogEntry>> {
        let r = self.db.r_transaction()?;
        stored_game(&r, game_id)?;

        let scan = r
            .scan()
            .secondary::<StoredTurnLog>(StoredTurnLogKey::game_id)?;
        let iter = scan.start_with(game_id.raw())?;
        let logs: std::result::Result<Vec<StoredTurnLog>, _> = iter.collect();
        let mut logs = logs.map_err(|e| Error::Database(e.to_string()))?;
        logs.sort_by_key(|l| l.id);
        logs.iter().map(StoredTurnLog::to_entry).collect()
    }
}

fn stored_game(r: &RTransaction<'_>, game_id: GameId) -> Result<StoredGame> {
    let stored: Option<StoredGame> = r.get().primary(game_id.raw())?;
    stored.ok_or_else(|| GameError::GameNotFound(game_id).into())
}
