//! Database store wrapper.
//!
//! Every mutating operation runs inside a single read-write transaction, so a
//! failed operation leaves no partial state behind. In particular a turn
//! resolution either persists completely or not at all.

use crate::error::{Error, Result};
use crate::models::*;
use crate::GameView;
use native_db::transaction::RwTransaction;
use native_db::*;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use warroom_core::{
    Action, ActionId, ActionKind, Error as GameError, Game, GameId, GameStatus, NationPatch,
    NationSeed, Player, PlayerId, StartingStock, TurnLogEntry, TurnReport,
};

/// Name given to games created without one.
pub const DEFAULT_GAME_NAME: &str = "WW2 Sim";

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredGame>().expect("StoredGame model");
    models.define::<StoredNation>().expect("StoredNation model");
    models.define::<StoredPlayer>().expect("StoredPlayer model");
    models.define::<StoredSequence>().expect("StoredSequence model");
    models.define::<StoredAction>().expect("StoredAction model");
    models.define::<StoredTurnLog>().expect("StoredTurnLog model");
    models
});

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Database store for persistent game state.
pub struct Store {
    pub(crate) db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create an open game with one unclaimed nation per seed.
    pub fn create_game(
        &self,
        name: Option<&str>,
        seeds: &[NationSeed],
        stock: &StartingStock,
    ) -> Result<Game> {
        let mut seen = HashSet::new();
        for seed in seeds {
            if !seen.insert(seed.name.as_str()) {
                return Err(Error::DuplicateKey(format!("nation {}", seed.name)));
            }
        }

        let rw = self.db.rw_transaction()?;
        let mut sequence = load_sequence(&rw)?;
        let id = GameId::new(sequence.next_game());
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_GAME_NAME);
        let game = Game::new(id, name);

        rw.insert(StoredGame::from_game(&game, now()))?;
        for seed in seeds {
            rw.insert(StoredNation::from_nation(id, &seed.spawn(stock)))?;
        }
        rw.upsert(sequence)?;
        rw.commit()?;

        tracing::info!(game = %id, name = %game.name, nations = seeds.len(), "game created");
        Ok(game)
    }

    /// Claim a nation of an open game for a new player.
    pub fn join_game(&self, game_id: GameId, player_name: &str, nation_name: &str) -> Result<Player> {
        let rw = self.db.rw_transaction()?;
        let game = load_game(&rw, game_id)?;
        game.to_game().ensure_status(GameStatus::Open)?;

        let nation = rw
            .get()
            .primary::<StoredNation>(StoredNation::key_for(game_id, nation_name))?
            .ok_or_else(|| GameError::NationNotFound(nation_name.to_string()))?;
        if nation.owner_player_id.is_some() {
            return Err(GameError::NationTaken(nation_name.to_string()).into());
        }

        let mut sequence = load_sequence(&rw)?;
        let player = Player {
            id: PlayerId::new(sequence.next_player()),
            name: player_name.to_string(),
            nation_name: nation_name.to_string(),
        };
        rw.insert(StoredPlayer::from_player(game_id, &player, now()))?;
        update_nation(&rw, game_id, nation_name, &NationPatch::new().with_owner(player.id))?;
        rw.upsert(sequence)?;
        rw.commit()?;

        tracing::info!(game = %game_id, player = %player.id, nation = %nation_name, "player joined");
        Ok(player)
    }

    /// Move an open game with enough players to `active`.
    pub fn start_game(&self, game_id: GameId, min_players: usize) -> Result<GameView> {
        let rw = self.db.rw_transaction()?;
        let stored = load_game(&rw, game_id)?;
        let mut game = stored.to_game();
        game.ensure_status(GameStatus::Open)?;

        let players = players_in(&rw, game_id)?.len();
        if players < min_players {
            return Err(GameError::NotEnoughPlayers {
                required: min_players,
                actual: players,
            }
            .into());
        }

        game.status = GameStatus::Active;
        rw.upsert(StoredGame::from_game(&game, stored.created_at))?;
        rw.commit()?;

        tracing::info!(game = %game_id, players, "game started");
        self.game(game_id)
    }

    /// Queue an action for the next resolution of an active game.
    ///
    /// Player membership is checked when the turn is resolved, not here.
    pub fn submit_action(&self, game_id: GameId, player_id: PlayerId, kind: ActionKind) -> Result<Action> {
        let rw = self.db.rw_transaction()?;
        load_game(&rw, game_id)?
            .to_game()
            .ensure_status(GameStatus::Active)?;

        let mut sequence = load_sequence(&rw)?;
        let action = Action::new(ActionId::new(sequence.next_action()), player_id, kind);
        rw.insert(StoredAction::from_action(game_id, &action, now())?)?;
        rw.upsert(sequence)?;
        rw.commit()?;

        tracing::debug!(game = %game_id, player = %player_id, action = %action.id, kind = %action.kind.action_type(), "action queued");
        Ok(action)
    }

    /// Apply a partial update to one nation.
    pub fn update_nation(&self, game_id: GameId, name: &str, patch: &NationPatch) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        update_nation(&rw, game_id, name, patch)?;
        rw.commit()?;
        Ok(())
    }

    /// Resolve the current turn of a game.
    ///
    /// Loads the game, its nations, players and pending actions, runs the
    /// engine and persists nation patches, new log entries, the drained queue
    /// and the new turn/status in one transaction. Fails with `GameNotFound`
    /// or `InvalidState` before anything is written.
    ///
    /// Callers must not resolve the same game concurrently.
    pub fn resolve_turn(&self, game_id: GameId) -> Result<TurnReport> {
        let rw = self.db.rw_transaction()?;
        let stored = load_game(&rw, game_id)?;
        let mut game = stored.to_game();

        let nations = nations_in(&rw, game_id)?
            .iter()
            .map(StoredNation::to_nation)
            .collect();
        let players: Vec<Player> = players_in(&rw, game_id)?
            .iter()
            .map(StoredPlayer::to_player)
            .collect();
        let pending = actions_in(&rw, game_id)?;
        let actions: Vec<Action> = pending.iter().filter_map(decode_action).collect();

        let resolution = warroom_core::resolve_turn(&game, nations, &players, &actions)?;

        for (name, patch) in &resolution.patches {
            update_nation(&rw, game_id, name, patch)?;
        }

        let mut sequence = load_sequence(&rw)?;
        let logged_at = now();
        for entry in &resolution.logs {
            rw.insert(StoredTurnLog::from_entry(
                sequence.next_log(),
                entry,
                logged_at.clone(),
            )?)?;
        }
        rw.upsert(sequence)?;

        // The whole queue goes, failed and undecodable actions included.
        for action in pending {
            rw.remove(action)?;
        }

        resolution.apply_to(&mut game);
        rw.upsert(StoredGame::from_game(&game, stored.created_at))?;
        rw.commit()?;

        if let Some(victory) = &resolution.victory {
            tracing::info!(game = %game_id, winner = %victory.winner_nation, kind = ?victory.kind, "game finished");
        }
        Ok(resolution.report())
    }

    /// Append entries to a game's turn log.
    pub fn append_logs(&self, entries: &[TurnLogEntry]) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let mut sequence = load_sequence(&rw)?;
        let logged_at = now();
        for entry in entries {
            rw.insert(StoredTurnLog::from_entry(
                sequence.next_log(),
                entry,
                logged_at.clone(),
            )?)?;
        }
        rw.upsert(sequence)?;
        rw.commit()?;
        Ok(())
    }
}

fn load_sequence(rw: &RwTransaction<'_>) -> Result<StoredSequence> {
    let stored: Option<StoredSequence> = rw.get().primary(StoredSequence::KEY.to_string())?;
    Ok(stored.unwrap_or_else(StoredSequence::new))
}

fn load_game(rw: &RwTransaction<'_>, game_id: GameId) -> Result<StoredGame> {
    let stored: Option<StoredGame> = rw.get().primary(game_id.raw())?;
    stored.ok_or_else(|| GameError::GameNotFound(game_id).into())
}

fn nations_in(rw: &RwTransaction<'_>, game_id: GameId) -> Result<Vec<StoredNation>> {
    let scan = rw
        .scan()
        .secondary::<StoredNation>(StoredNationKey::game_id)?;
    let iter = scan.start_with(game_id.raw())?;
    let nations: std::result::Result<Vec<StoredNation>, _> = iter.collect();
    nations.map_err(|e| Error::Database(e.to_string()))
}

fn players_in(rw: &RwTransaction<'_>, game_id: GameId) -> Result<Vec<StoredPlayer>> {
    let scan = rw
        .scan()
        .secondary::<StoredPlayer>(StoredPlayerKey::game_id)?;
    let iter = scan.start_with(game_id.raw())?;
    let players: std::result::Result<Vec<StoredPlayer>, _> = iter.collect();
    players.map_err(|e| Error::Database(e.to_string()))
}

/// Pending actions of a game in submission order.
fn actions_in(rw: &RwTransaction<'_>, game_id: GameId) -> Result<Vec<StoredAction>> {
    let scan = rw
        .scan()
        .secondary::<StoredAction>(StoredActionKey::game_id)?;
    let iter = scan.start_with(game_id.raw())?;
    let actions: std::result::Result<Vec<StoredAction>, _> = iter.collect();
    let mut actions = actions.map_err(|e| Error::Database(e.to_string()))?;
    actions.sort_by_key(|a| a.id);
    Ok(actions)
}

/// Decode a queued action, skipping rows whose payload no longer parses.
pub(crate) fn decode_action(stored: &StoredAction) -> Option<Action> {
    match stored.to_action() {
        Ok(action) => Some(action),
        Err(err) => {
            tracing::warn!(action = stored.id, game = stored.game_id, error = %err, "dropping undecodable action");
            None
        }
    }
}

/// Apply a typed patch to a stored nation within an open transaction.
pub(crate) fn update_nation(
    rw: &RwTransaction<'_>,
    game_id: GameId,
    name: &str,
    patch: &NationPatch,
) -> Result<()> {
    let stored: Option<StoredNation> = rw.get().primary(StoredNation::key_for(game_id, name))?;
    let mut nation = stored
        .ok_or_else(|| GameError::NationNotFound(name.to_string()))?
        .to_nation();
    patch.apply(&mut nation);
    rw.upsert(StoredNation::from_nation(game_id, &nation))?;
    Ok(())
}
