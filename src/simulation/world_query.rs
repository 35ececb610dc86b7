use crate::components::actor::{ActorId, Team};

/// Standing thresholds for reputation ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReputationRank {
    Honored,
    Revered,
    Exalted,
}

impl ReputationRank {
    pub fn min_standing(self) -> i32 {
        match self {
            ReputationRank::Honored => 9_000,
            ReputationRank::Revered => 21_000,
            ReputationRank::Exalted => 42_000,
        }
    }
}

/// Read-only view of externally owned world state.
///
/// Only `is_valid_actor` is required; everything else defaults to the
/// neutral answer so a backend implements just what it can see.
pub trait WorldQuery {
    fn is_valid_actor(&self, actor: ActorId) -> bool;

    fn is_exempt(&self, _actor: ActorId) -> bool {
        false
    }

    fn is_player(&self, _actor: ActorId) -> bool {
        false
    }

    fn team(&self, _actor: ActorId) -> Option<Team> {
        None
    }

    fn level(&self, _actor: ActorId) -> u32 {
        0
    }

    fn race(&self, _actor: ActorId) -> u32 {
        0
    }

    fn class(&self, _actor: ActorId) -> u32 {
        0
    }

    fn gender(&self, _actor: ActorId) -> u32 {
        0
    }

    fn map(&self, _actor: ActorId) -> u32 {
        0
    }

    fn zone(&self, _actor: ActorId) -> u32 {
        0
    }

    fn area(&self, _actor: ActorId) -> u32 {
        0
    }

    fn in_battleground(&self, _actor: ActorId) -> bool {
        false
    }

    fn in_instance(&self, _actor: ActorId) -> bool {
        false
    }

    fn is_alive(&self, _actor: ActorId) -> bool {
        true
    }

    fn in_combat(&self, _actor: ActorId) -> bool {
        false
    }

    fn is_mounted(&self, _actor: ActorId) -> bool {
        false
    }

    fn health_pct(&self, _actor: ActorId) -> u32 {
        100
    }

    fn group_size(&self, _actor: ActorId) -> u32 {
        0
    }

    fn creature_entry(&self, _actor: ActorId) -> Option<u32> {
        None
    }

    fn creature_type(&self, _actor: ActorId) -> Option<u32> {
        None
    }

    fn has_aura(&self, _actor: ActorId, _spell: u32) -> bool {
        false
    }

    fn knows_spell(&self, _actor: ActorId, _spell: u32) -> bool {
        false
    }

    fn item_count(&self, _actor: ActorId, _item: u32) -> u32 {
        0
    }

    fn skill_value(&self, _actor: ActorId, _skill: u32) -> u32 {
        0
    }

    fn max_skill_value(&self, _actor: ActorId, _skill: u32) -> u32 {
        0
    }

    /// Every known faction and its raw standing.
    fn reputation_standings(&self, _actor: ActorId) -> Vec<(u32, i32)> {
        Vec::new()
    }

    fn reputation_standing(&self, actor: ActorId, faction: u32) -> i32 {
        self.reputation_standings(actor)
            .into_iter()
            .find(|(id, _)| *id == faction)
            .map(|(_, standing)| standing)
            .unwrap_or(0)
    }

    fn reputation_rank_count(&self, actor: ActorId, rank: ReputationRank) -> u32 {
        self.reputation_standings(actor)
            .into_iter()
            .filter(|(_, standing)| *standing >= rank.min_standing())
            .count() as u32
    }

    fn known_faction_count(&self, actor: ActorId) -> u32 {
        self.reputation_standings(actor).len() as u32
    }

    fn rewarded_quests(&self, _actor: ActorId) -> Vec<u32> {
        Vec::new()
    }

    fn is_quest_rewarded(&self, actor: ActorId, quest: u32) -> bool {
        self.rewarded_quests(actor).contains(&quest)
    }

    fn rewarded_quest_count(&self, actor: ActorId) -> u32 {
        self.rewarded_quests(actor).len() as u32
    }

    fn bank_slots(&self, _actor: ActorId) -> u32 {
        0
    }

    fn money(&self, _actor: ActorId) -> u64 {
        0
    }

    fn lifetime_honorable_kills(&self, _actor: ActorId) -> u32 {
        0
    }

    fn has_achieved(&self, _actor: ActorId, _achievement: u32) -> bool {
        false
    }

    fn has_title(&self, _actor: ActorId, _title: u32) -> bool {
        false
    }

    /// Zone of a quest template; negative ids are sort categories.
    fn quest_zone(&self, _quest: u32) -> Option<i32> {
        None
    }

    fn item_quality(&self, _item: u32) -> Option<u32> {
        None
    }

    fn is_world_event_active(&self, _event: u32) -> bool {
        false
    }
}
