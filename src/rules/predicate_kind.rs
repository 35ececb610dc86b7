use serde::{Deserialize, Serialize};

/// World-state check attached to a predicate tree leaf.
///
/// Like [`CriterionType`](crate::rules::CriterionType) this is an open id space;
/// evaluation goes through the predicate registry and unknown kinds are false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredicateKind(pub u16);

impl PredicateKind {
    /// Placeholder on combinator nodes; never satisfied as a leaf.
    pub const NONE: Self = Self(0);

    pub const TARGET_CREATURE_ENTRY: Self = Self(1);
    pub const TARGET_IS_PLAYER: Self = Self(2);
    pub const TARGET_IS_DEAD: Self = Self(3);
    pub const TARGET_IS_OPPOSING_TEAM: Self = Self(4);
    pub const ACTOR_HAS_AURA: Self = Self(8);
    pub const TARGET_HAS_AURA: Self = Self(10);
    pub const ITEM_QUALITY_AT_LEAST: Self = Self(14);
    pub const ITEM_QUALITY_EQUALS: Self = Self(15);
    pub const ACTOR_IS_ALIVE: Self = Self(16);
    pub const ACTOR_IN_AREA: Self = Self(17);
    pub const TARGET_IN_AREA: Self = Self(18);
    pub const ACTOR_IN_ZONE: Self = Self(19);
    pub const TARGET_LEVEL_AT_LEAST: Self = Self(25);
    pub const TARGET_LEVEL_EQUALS: Self = Self(26);
    pub const ACTOR_ON_MAP: Self = Self(32);
    pub const ACTOR_CLASS: Self = Self(35);
    pub const ACTOR_RACE: Self = Self(36);
    pub const TARGET_CLASS: Self = Self(37);
    pub const TARGET_RACE: Self = Self(38);
    pub const ACTOR_GENDER: Self = Self(39);
    pub const TARGET_HEALTH_PCT_BELOW: Self = Self(40);
    pub const ACTOR_HEALTH_PCT_BELOW: Self = Self(41);
    pub const ACTOR_HAS_ITEM: Self = Self(46);
    pub const QUEST_REWARDED: Self = Self(47);
    pub const QUEST_NOT_REWARDED: Self = Self(48);
    pub const REPUTATION_AT_LEAST: Self = Self(49);
    pub const NESTED_TREE: Self = Self(50);
    pub const SKILL_AT_LEAST: Self = Self(51);
    pub const GROUP_SIZE_AT_LEAST: Self = Self(52);
    pub const ACTOR_IN_INSTANCE: Self = Self(53);
    pub const ACTOR_TEAM: Self = Self(54);
    pub const ACTOR_LEVEL_AT_LEAST: Self = Self(55);
    pub const ACTOR_LEVEL_AT_MOST: Self = Self(56);
    pub const TARGET_LEVEL_AT_MOST: Self = Self(57);
    pub const MISC_VALUE1_EQUALS: Self = Self(58);
    pub const MISC_VALUE2_EQUALS: Self = Self(59);
    pub const MISC_VALUE1_AT_LEAST: Self = Self(60);
    pub const WORLD_EVENT_ACTIVE: Self = Self(62);
    pub const ACHIEVEMENT_EARNED: Self = Self(63);
    pub const ACTOR_HAS_TITLE: Self = Self(64);
    pub const ACTOR_IN_COMBAT: Self = Self(65);
    pub const ACTOR_MOUNTED: Self = Self(66);
    pub const TARGET_CREATURE_TYPE: Self = Self(67);
    pub const ACTOR_KNOWS_SPELL: Self = Self(68);
    pub const MONEY_AT_LEAST: Self = Self(69);
    pub const ACTOR_IN_BATTLEGROUND: Self = Self(70);
    pub const TARGET_IS_ALLIED_TEAM: Self = Self(71);
    pub const ACTOR_NOT_IN_COMBAT: Self = Self(72);
}

impl std::fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "predicate#{}", self.0)
    }
}
