//! Nation state: stockpiles, treasury, army and morale

use crate::PlayerId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of the morale scale (lower bound is 0)
pub const MAX_MORALE: u32 = 100;

/// A tradeable stockpiled resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Steel,
    Oil,
    Food,
    Manpower,
}

impl Resource {
    /// All resources, in storage order
    pub const ALL: [Resource; 4] = [
        Resource::Steel,
        Resource::Oil,
        Resource::Food,
        Resource::Manpower,
    ];

    /// Lowercase name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Steel => "steel",
            Resource::Oil => "oil",
            Resource::Food => "food",
            Resource::Manpower => "manpower",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stockpiled resources of a nation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub steel: u64,
    pub oil: u64,
    pub food: u64,
    pub manpower: u64,
}

impl Resources {
    /// Get the stock of one resource
    pub fn get(&self, resource: Resource) -> u64 {
        match resource {
            Resource::Steel => self.steel,
            Resource::Oil => self.oil,
            Resource::Food => self.food,
            Resource::Manpower => self.manpower,
        }
    }

    /// Get a mutable reference to the stock of one resource
    pub fn get_mut(&mut self, resource: Resource) -> &mut u64 {
        match resource {
            Resource::Steel => &mut self.steel,
            Resource::Oil => &mut self.oil,
            Resource::Food => &mut self.food,
            Resource::Manpower => &mut self.manpower,
        }
    }

    /// Add to a stock without overflowing
    pub fn add(&mut self, resource: Resource, amount: u64) {
        let stock = self.get_mut(resource);
        *stock = stock.saturating_add(amount);
    }
}

/// Values every nation starts a game with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingStock {
    pub steel: u64,
    pub oil: u64,
    pub food: u64,
    pub manpower: u64,
    pub money: u64,
    pub troops: u64,
    pub morale: u32,
}

impl Default for StartingStock {
    fn default() -> Self {
        Self {
            steel: 20,
            oil: 20,
            food: 20,
            manpower: 20,
            money: 50,
            troops: 10,
            morale: 50,
        }
    }
}

/// Name and display color of a nation created with a new game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationSeed {
    pub name: String,
    pub color: String,
}

impl NationSeed {
    /// Create a new seed
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    /// Instantiate the nation with the given starting stock
    pub fn spawn(&self, stock: &StartingStock) -> Nation {
        Nation::new(self.name.clone(), self.color.clone(), stock)
    }
}

/// A faction in a game, claimed by at most one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nation {
    pub name: String,
    pub owner_player_id: Option<PlayerId>,
    pub resources: Resources,
    pub money: u64,
    pub troops: u64,
    /// Always within `0..=MAX_MORALE`
    pub morale: u32,
    pub color: String,
}

impl Nation {
    /// Create an unclaimed nation with the given starting stock
    pub fn new(name: impl Into<String>, color: impl Into<String>, stock: &StartingStock) -> Self {
        Self {
            name: name.into(),
            owner_player_id: None,
            resources: Resources {
                steel: stock.steel,
                oil: stock.oil,
                food: stock.food,
                manpower: stock.manpower,
            },
            money: stock.money,
            troops: stock.troops,
            morale: stock.morale.min(MAX_MORALE),
            color: color.into(),
        }
    }

    /// Raise morale, capped at `MAX_MORALE`
    pub fn raise_morale(&mut self, amount: u64) {
        let raised = u64::from(self.morale).saturating_add(amount);
        self.morale = raised.min(u64::from(MAX_MORALE)) as u32;
    }

    /// Lower morale, floored at 0
    pub fn lower_morale(&mut self, amount: u64) {
        let lowered = u64::from(self.morale).saturating_sub(amount);
        self.morale = lowered as u32;
    }

    /// Add money without overflowing
    pub fn earn(&mut self, amount: u64) {
        self.money = self.money.saturating_add(amount);
    }

    /// Remove money, floored at 0
    pub fn forfeit(&mut self, amount: u64) {
        self.money = self.money.saturating_sub(amount);
    }

    /// Whether a player has claimed this nation
    pub fn is_claimed(&self) -> bool {
        self.owner_player_id.is_some()
    }
}

/// Nations of one game keyed by name
pub type Nations = IndexMap<String, Nation>;

/// Build a nation map enumerated in name-ascending order.
///
/// Every deterministic tie-break in turn resolution relies on this order.
pub fn nations_by_name(nations: impl IntoIterator<Item = Nation>) -> Nations {
    let mut map: Nations = nations
        .into_iter()
        .map(|nation| (nation.name.clone(), nation))
        .collect();
    map.sort_keys();
    map
}
