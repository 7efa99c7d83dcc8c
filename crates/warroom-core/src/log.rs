//! Turn log entries: the audit trail of resolved actions

use crate::{ActionError, ActionType, GameId, PlayerId};
use serde::{Deserialize, Serialize};

/// Outcome of one battle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleReport {
    pub attacker: String,
    pub defender: String,
    pub send_troops: u64,
    pub defender_commit: u64,
    pub attacker_losses: u64,
    pub defender_losses: u64,
    /// `None` on a tie
    pub winner: Option<String>,
}

/// What happened to one processed action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum LogEntry {
    /// The action was rejected and had no effect
    Failed {
        action: ActionType,
        kind: String,
        message: String,
    },
    /// An attack was fought
    Battle(BattleReport),
}

impl LogEntry {
    /// Record a rejected action
    pub fn failed(action: ActionType, err: &ActionError) -> Self {
        LogEntry::Failed {
            action,
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    /// Whether this entry records a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, LogEntry::Failed { .. })
    }
}

/// One entry of a game's turn log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnLogEntry {
    pub game_id: GameId,
    /// Turn during which the action was resolved (before the increment)
    pub turn: u32,
    pub player_id: PlayerId,
    pub entry: LogEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_entry_carries_kind_and_message() {
        let entry = LogEntry::failed(ActionType::Attack, &ActionError::SelfAttack);
        assert!(entry.is_failure());
        assert_eq!(
            entry,
            LogEntry::Failed {
                action: ActionType::Attack,
                kind: "self_attack".to_string(),
                message: "Cannot attack self".to_string(),
            }
        );
    }

    #[test]
    fn test_battle_entry_json_shape() {
        let entry = LogEntry::Battle(BattleReport {
            attacker: "Germany".to_string(),
            defender: "USSR".to_string(),
            send_troops: 5,
            defender_commit: 3,
            attacker_losses: 2,
            defender_losses: 1,
            winner: Some("Germany".to_string()),
        });
        assert!(!entry.is_failure());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["outcome"], "battle");
        assert_eq!(value["sendTroops"], 5);
        assert_eq!(value["winner"], "Germany");

        let back: LogEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }
}
