//! Player-submitted actions
//!
//! Each action kind carries its own typed parameters. Missing parameters take
//! the documented defaults when decoded, so `{"type":"build"}` builds one unit.

use crate::{ActionId, PlayerId, Resource};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Discriminant of an action, used in log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Build,
    Research,
    Trade,
    Attack,
}

impl ActionType {
    /// Lowercase name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Build => "build",
            ActionType::Research => "research",
            ActionType::Trade => "trade",
            ActionType::Attack => "attack",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an action does, with its parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionKind {
    /// Convert resources and money into troops
    Build {
        #[serde(default = "default_build_amount")]
        amount: u64,
    },
    /// Spend money for morale
    Research {
        #[serde(default = "default_investment")]
        investment: u64,
    },
    /// Sell money for resources at a fixed rate
    #[serde(rename_all = "camelCase")]
    Trade {
        #[serde(default = "default_sell_money")]
        sell_money: u64,
        #[serde(default = "default_buy")]
        buy: IndexMap<Resource, u64>,
    },
    /// Commit troops against another nation
    #[serde(rename_all = "camelCase")]
    Attack {
        target_nation: String,
        #[serde(default = "default_send_troops", deserialize_with = "troops_at_least_one")]
        send_troops: u64,
    },
}

fn default_build_amount() -> u64 {
    1
}

fn default_investment() -> u64 {
    10
}

fn default_sell_money() -> u64 {
    10
}

fn default_buy() -> IndexMap<Resource, u64> {
    IndexMap::from([(Resource::Oil, 5)])
}

fn default_send_troops() -> u64 {
    1
}

/// Any count below one, negative included, sends a single troop
fn troops_at_least_one<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match Count::deserialize(deserializer)? {
        Count::Unsigned(n) => n.max(1),
        Count::Signed(_) => 1,
    })
}

impl ActionKind {
    /// The discriminant of this action
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionKind::Build { .. } => ActionType::Build,
            ActionKind::Research { .. } => ActionType::Research,
            ActionKind::Trade { .. } => ActionType::Trade,
            ActionKind::Attack { .. } => ActionType::Attack,
        }
    }
}

/// A queued action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: ActionId,
    pub player_id: PlayerId,
    pub kind: ActionKind,
}

impl Action {
    /// Create a new queued action
    pub fn new(id: ActionId, player_id: PlayerId, kind: ActionKind) -> Self {
        Self {
            id,
            player_id,
            kind,
        }
    }
}
