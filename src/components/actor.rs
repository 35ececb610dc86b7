use std::collections::{HashMap, HashSet};

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Stable identifier for addressing actors outside the ECS.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Team {
    Alliance,
    Horde,
}

/// Marker for privileged actors (game masters) that never accrue progress.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Exempt;

/// Core identity of a player-like actor.
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct ActorProfile {
    pub level: u32,
    pub race: u32,
    pub class: u32,
    pub gender: u32,
    pub team: Team,
}

#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorLocation {
    pub map: u32,
    pub zone: u32,
    pub area: u32,
    #[serde(default)]
    pub in_battleground: bool,
    #[serde(default)]
    pub in_instance: bool,
}

#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Vitals {
    pub health: u32,
    pub max_health: u32,
    #[serde(default)]
    pub in_combat: bool,
    #[serde(default)]
    pub mounted: bool,
    #[serde(default)]
    pub group_size: u32,
}

impl Vitals {
    pub fn new(max_health: u32) -> Self {
        Self {
            health: max_health,
            max_health,
            in_combat: false,
            mounted: false,
            group_size: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn health_pct(&self) -> u32 {
        if self.max_health == 0 {
            return 0;
        }
        ((self.health as u64 * 100) / self.max_health as u64) as u32
    }
}

#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wallet {
    pub money: u64,
    pub bank_slots: u32,
}

#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestLog {
    pub rewarded: HashSet<u32>,
}

/// Raw standing per faction id.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reputation {
    pub standings: HashMap<u32, i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillValue {
    pub value: u32,
    pub max: u32,
}

#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Skills {
    pub values: HashMap<u32, SkillValue>,
}

#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spellbook {
    pub known: HashSet<u32>,
    pub auras: HashSet<u32>,
}

/// Item id to stack count.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub items: HashMap<u32, u32>,
}

#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Honors {
    pub lifetime_honorable_kills: u32,
    pub titles: HashSet<u32>,
    pub achievements: HashSet<u32>,
}

/// Present on non-player actors spawned from a creature template.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreatureTemplate {
    pub entry: u32,
    pub creature_type: u32,
}
