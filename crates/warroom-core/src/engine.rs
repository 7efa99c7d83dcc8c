//! Turn resolution engine
//!
//! [`resolve_turn`] is a pure state transition: it takes a game, its nations,
//! its players and its queued actions, and returns the next state together
//! with the log of what happened. It performs no I/O; callers load the inputs
//! and persist the [`Resolution`].
//!
//! Order of a pass:
//! 1. actions, strictly by submission order, each against the current state
//! 2. passive income for every nation
//! 3. turn increment
//! 4. victory evaluation
//!
//! Nations are enumerated in name-ascending order wherever order matters.

use crate::{
    nations_by_name, Action, ActionError, ActionId, ActionKind, BattleReport, Game, GameStatus,
    LogEntry, Nation, NationPatch, Nations, Player, PlayerId, Resource, Result, TurnLogEntry,
    Victory, VictoryType,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Troop count that wins the game outright
pub const TROOP_VICTORY_THRESHOLD: u64 = 100;

/// Once the turn counter exceeds this, the richest nation wins
pub const TURN_LIMIT: u32 = 20;

/// Morale and money swing applied to both sides of a decisive battle
const BATTLE_SWING: u64 = 5;

/// Morale lost by both sides of a drawn battle
const STALEMATE_MORALE_LOSS: u64 = 2;

/// Units of each input consumed per troop built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BuildCost {
    steel: u64,
    oil: u64,
    food: u64,
    money: u64,
    manpower: u64,
}

const COST_PER_TROOP: BuildCost = BuildCost {
    steel: 2,
    oil: 1,
    food: 1,
    money: 3,
    manpower: 1,
};

impl BuildCost {
    /// Total cost of `amount` troops, `None` if it does not fit in a `u64`
    fn times(&self, amount: u64) -> Option<BuildCost> {
        Some(BuildCost {
            steel: self.steel.checked_mul(amount)?,
            oil: self.oil.checked_mul(amount)?,
            food: self.food.checked_mul(amount)?,
            money: self.money.checked_mul(amount)?,
            manpower: self.manpower.checked_mul(amount)?,
        })
    }

    fn affordable_by(&self, nation: &Nation) -> bool {
        let r = &nation.resources;
        r.steel >= self.steel
            && r.oil >= self.oil
            && r.food >= self.food
            && nation.money >= self.money
            && r.manpower >= self.manpower
    }
}

/// Everything a resolution pass produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The new turn number
    pub turn: u32,
    /// `Finished` if a victory was declared, otherwise `Active`
    pub status: GameStatus,
    pub victory: Option<Victory>,
    /// Every nation after the pass, name ascending
    pub nations: Nations,
    /// Changed fields per nation; nations left untouched are absent
    pub patches: IndexMap<String, NationPatch>,
    /// Entries generated during this pass, in generation order
    pub logs: Vec<TurnLogEntry>,
    /// Every action processed, successful or not
    pub consumed: Vec<ActionId>,
}

impl Resolution {
    /// Write the new turn, status and victory into the game record
    pub fn apply_to(&self, game: &mut Game) {
        game.turn = self.turn;
        match &self.victory {
            Some(victory) => game.finish(victory.clone()),
            None => game.status = self.status,
        }
    }

    /// The caller-facing summary of the pass
    pub fn report(&self) -> TurnReport {
        TurnReport {
            turn: self.turn,
            logs: self.logs.clone(),
            victory: self.victory.clone(),
        }
    }
}

/// Result of a turn as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: u32,
    pub logs: Vec<TurnLogEntry>,
    pub victory: Option<Victory>,
}

/// Resolve one turn of an active game.
///
/// Fails with `InvalidState` unless the game is `Active`. Individual action
/// failures never fail the pass; they are recorded in [`Resolution::logs`].
pub fn resolve_turn(
    game: &Game,
    nations: Vec<Nation>,
    players: &[Player],
    actions: &[Action],
) -> Result<Resolution> {
    game.ensure_status(GameStatus::Active)?;

    let before = nations_by_name(nations);
    let mut current = before.clone();
    let players: HashMap<PlayerId, &Player> = players.iter().map(|p| (p.id, p)).collect();

    let mut queue: Vec<&Action> = actions.iter().collect();
    queue.sort_by_key(|action| action.id);

    let mut logs = Vec::new();
    for action in &queue {
        let entry = match resolve_action(&mut current, &players, action) {
            Ok(None) => {
                tracing::debug!(game = %game.id, action = %action.id, kind = %action.kind.action_type(), "action applied");
                None
            }
            Ok(Some(report)) => {
                tracing::debug!(
                    game = %game.id,
                    action = %action.id,
                    attacker = %report.attacker,
                    defender = %report.defender,
                    winner = ?report.winner,
                    "battle resolved"
                );
                Some(LogEntry::Battle(report))
            }
            Err(err) => {
                tracing::debug!(game = %game.id, action = %action.id, error = %err, "action rejected");
                Some(LogEntry::failed(action.kind.action_type(), &err))
            }
        };
        if let Some(entry) = entry {
            logs.push(TurnLogEntry {
                game_id: game.id,
                turn: game.turn,
                player_id: action.player_id,
                entry,
            });
        }
    }

    collect_passive_income(&mut current);

    let turn = game.turn.saturating_add(1);
    let victory = evaluate_victory(&current, turn);
    let status = if victory.is_some() {
        GameStatus::Finished
    } else {
        GameStatus::Active
    };

    let patches = current
        .iter()
        .filter_map(|(name, after)| {
            let patch = NationPatch::between(before.get(name)?, after);
            (!patch.is_empty()).then(|| (name.clone(), patch))
        })
        .collect();

    tracing::info!(
        game = %game.id,
        turn,
        actions = queue.len(),
        logged = logs.len(),
        victory = ?victory,
        "turn resolved"
    );

    Ok(Resolution {
        turn,
        status,
        victory,
        nations: current,
        patches,
        logs,
        consumed: queue.iter().map(|action| action.id).collect(),
    })
}

/// Apply one action. `Ok(Some(_))` for a fought battle.
fn resolve_action(
    nations: &mut Nations,
    players: &HashMap<PlayerId, &Player>,
    action: &Action,
) -> std::result::Result<Option<BattleReport>, ActionError> {
    let player = action.player_id;
    let name = players
        .get(&player)
        .map(|p| p.nation_name.as_str())
        .filter(|name| nations.contains_key(*name))
        .ok_or(ActionError::UnknownPlayer(player))?;

    match &action.kind {
        ActionKind::Build { amount } => build(acting(nations, name, player)?, *amount).map(|_| None),
        ActionKind::Research { investment } => {
            research(acting(nations, name, player)?, *investment).map(|_| None)
        }
        ActionKind::Trade { sell_money, buy } => {
            trade(acting(nations, name, player)?, *sell_money, buy).map(|_| None)
        }
        ActionKind::Attack {
            target_nation,
            send_troops,
        } => attack(nations, name, target_nation, *send_troops).map(Some),
    }
}

fn acting<'a>(
    nations: &'a mut Nations,
    name: &str,
    player: PlayerId,
) -> std::result::Result<&'a mut Nation, ActionError> {
    nations
        .get_mut(name)
        .ok_or(ActionError::UnknownPlayer(player))
}

fn build(nation: &mut Nation, amount: u64) -> std::result::Result<(), ActionError> {
    let cost = COST_PER_TROOP
        .times(amount)
        .filter(|cost| cost.affordable_by(nation))
        .ok_or(ActionError::InsufficientResources)?;

    let r = &mut nation.resources;
    r.steel -= cost.steel;
    r.oil -= cost.oil;
    r.food -= cost.food;
    r.manpower -= cost.manpower;
    nation.money -= cost.money;
    nation.troops = nation.troops.saturating_add(amount);
    nation.raise_morale(amount / 5);
    Ok(())
}

fn research(nation: &mut Nation, investment: u64) -> std::result::Result<(), ActionError> {
    if nation.money < investment {
        return Err(ActionError::InsufficientFunds {
            needed: investment,
            available: nation.money,
        });
    }
    nation.money -= investment;
    nation.raise_morale(investment / 2);
    Ok(())
}

fn trade(
    nation: &mut Nation,
    sell_money: u64,
    buy: &IndexMap<Resource, u64>,
) -> std::result::Result<(), ActionError> {
    if nation.money < sell_money {
        return Err(ActionError::InsufficientFunds {
            needed: sell_money,
            available: nation.money,
        });
    }
    nation.money -= sell_money;
    // Fixed exchange rate of one unit per two requested.
    for (&resource, &quantity) in buy {
        nation.resources.add(resource, quantity / 2);
    }
    nation.raise_morale(1);
    Ok(())
}

fn attack(
    nations: &mut Nations,
    attacker: &str,
    target: &str,
    send_troops: u64,
) -> std::result::Result<BattleReport, ActionError> {
    let send_troops = send_troops.max(1);
    if attacker == target {
        return Err(ActionError::SelfAttack);
    }
    let mut defending = nations
        .get(target)
        .cloned()
        .ok_or_else(|| ActionError::TargetNotFound(target.to_string()))?;
    let mut attacking = nations
        .get(attacker)
        .cloned()
        .ok_or_else(|| ActionError::TargetNotFound(attacker.to_string()))?;
    if attacking.troops < send_troops {
        return Err(ActionError::InsufficientTroops {
            needed: send_troops,
            available: attacking.troops,
        });
    }

    let report = resolve_battle(&mut attacking, &mut defending, send_troops);

    if let Some(slot) = nations.get_mut(attacker) {
        *slot = attacking;
    }
    if let Some(slot) = nations.get_mut(target) {
        *slot = defending;
    }
    Ok(report)
}

/// Fight a battle between two nations.
///
/// The defender always commits half its troops (rounded down). The side with
/// strictly greater committed strength wins; equal strength is a draw. Each
/// side loses half of what it committed, rounded down, regardless of the
/// outcome. Uncommitted troops are untouched.
///
/// The caller guarantees `attacker.troops >= send_troops`.
pub fn resolve_battle(attacker: &mut Nation, defender: &mut Nation, send_troops: u64) -> BattleReport {
    let send_troops = send_troops.min(attacker.troops);
    let defender_commit = defender.troops / 2;

    let winner = match send_troops.cmp(&defender_commit) {
        Ordering::Greater => {
            claim_victory(attacker, defender);
            Some(attacker.name.clone())
        }
        Ordering::Less => {
            claim_victory(defender, attacker);
            Some(defender.name.clone())
        }
        Ordering::Equal => {
            attacker.lower_morale(STALEMATE_MORALE_LOSS);
            defender.lower_morale(STALEMATE_MORALE_LOSS);
            None
        }
    };

    let attacker_losses = send_troops / 2;
    let defender_losses = defender_commit / 2;
    attacker.troops -= attacker_losses;
    defender.troops -= defender_losses;

    BattleReport {
        attacker: attacker.name.clone(),
        defender: defender.name.clone(),
        send_troops,
        defender_commit,
        attacker_losses,
        defender_losses,
        winner,
    }
}

fn claim_victory(winner: &mut Nation, loser: &mut Nation) {
    winner.raise_morale(BATTLE_SWING);
    winner.earn(BATTLE_SWING);
    loser.lower_morale(BATTLE_SWING);
    loser.forfeit(BATTLE_SWING);
}

/// End-of-turn income every nation receives
pub fn collect_passive_income(nations: &mut Nations) {
    for nation in nations.values_mut() {
        nation.resources.add(Resource::Steel, 2);
        nation.resources.add(Resource::Oil, 2);
        nation.resources.add(Resource::Food, 3);
        nation.earn(5);
        nation.raise_morale(1);
    }
}

/// Check the win conditions after the turn counter moved to `turn`.
///
/// Troops are checked first: the first nation (in map order) at or above
/// [`TROOP_VICTORY_THRESHOLD`] wins. Otherwise, past [`TURN_LIMIT`], the
/// nation with strictly the most money wins, earlier nations winning ties.
pub fn evaluate_victory(nations: &Nations, turn: u32) -> Option<Victory> {
    if let Some(nation) = nations
        .values()
        .find(|n| n.troops >= TROOP_VICTORY_THRESHOLD)
    {
        return Some(Victory {
            kind: VictoryType::Troops,
            winner_nation: nation.name.clone(),
        });
    }

    if turn <= TURN_LIMIT {
        return None;
    }

    let mut richest: Option<&Nation> = None;
    for nation in nations.values() {
        if richest.map_or(true, |r| nation.money > r.money) {
            richest = Some(nation);
        }
    }
    richest.map(|nation| Victory {
        kind: VictoryType::Economy,
        winner_nation: nation.name.clone(),
    })
}
