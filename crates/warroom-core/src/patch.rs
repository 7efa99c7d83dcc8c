//! Typed partial updates of nation records
//!
//! A `NationPatch` names every mutable nation attribute explicitly. Fields
//! left as `None` are untouched when the patch is applied, so a store can
//! persist only what a turn actually changed.

use crate::{Nation, PlayerId};
use serde::{Deserialize, Serialize};

/// A partial update of one nation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationPatch {
    pub steel: Option<u64>,
    pub oil: Option<u64>,
    pub food: Option<u64>,
    pub manpower: Option<u64>,
    pub money: Option<u64>,
    pub troops: Option<u64>,
    pub morale: Option<u32>,
    pub owner_player_id: Option<PlayerId>,
}

fn changed<T: PartialEq + Copy>(before: T, after: T) -> Option<T> {
    (before != after).then_some(after)
}

impl NationPatch {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// The patch that turns `before` into `after`
    pub fn between(before: &Nation, after: &Nation) -> Self {
        Self {
            steel: changed(before.resources.steel, after.resources.steel),
            oil: changed(before.resources.oil, after.resources.oil),
            food: changed(before.resources.food, after.resources.food),
            manpower: changed(before.resources.manpower, after.resources.manpower),
            money: changed(before.money, after.money),
            troops: changed(before.troops, after.troops),
            morale: changed(before.morale, after.morale),
            owner_player_id: if before.owner_player_id != after.owner_player_id {
                after.owner_player_id
            } else {
                None
            },
        }
    }

    /// Claim the nation for a player
    pub fn with_owner(mut self, player: PlayerId) -> Self {
        self.owner_player_id = Some(player);
        self
    }

    /// Check if the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the set fields to a nation
    pub fn apply(&self, nation: &mut Nation) {
        if let Some(v) = self.steel {
            nation.resources.steel = v;
        }
        if let Some(v) = self.oil {
            nation.resources.oil = v;
        }
        if let Some(v) = self.food {
            nation.resources.food = v;
        }
        if let Some(v) = self.manpower {
            nation.resources.manpower = v;
        }
        if let Some(v) = self.money {
            nation.money = v;
        }
        if let Some(v) = self.troops {
            nation.troops = v;
        }
        if let Some(v) = self.morale {
            nation.morale = v;
        }
        if let Some(v) = self.owner_player_id {
            nation.owner_player_id = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StartingStock;

    #[test]
    fn test_patch_between_only_sets_changed_fields() {
        let before = Nation::new("Germany", "#444", &StartingStock::default());
        let mut after = before.clone();
        after.troops += 3;
        after.morale = 60;

        let patch = NationPatch::between(&before, &after);
        assert_eq!(patch.troops, Some(before.troops + 3));
        assert_eq!(patch.morale, Some(60));
        assert_eq!(patch.steel, None);
        assert_eq!(patch.money, None);

        let mut target = before.clone();
        patch.apply(&mut target);
        assert_eq!(target, after);
    }

    #[test]
    fn test_empty_patch() {
        let nation = Nation::new("Italy", "#9467bd", &StartingStock::default());
        let patch = NationPatch::between(&nation, &nation);
        assert!(patch.is_empty());
        assert!(!NationPatch::new().with_owner(PlayerId::new(1)).is_empty());
    }

    #[test]
    fn test_owner_patch() {
        let mut nation = Nation::new("Japan", "#ff7f0e", &StartingStock::default());
        NationPatch::new()
            .with_owner(PlayerId::new(9))
            .apply(&mut nation);
        assert_eq!(nation.owner_player_id, Some(PlayerId::new(9)));
    }
}
