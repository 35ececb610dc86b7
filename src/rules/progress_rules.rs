use std::collections::HashMap;

use crate::data::criteria::AtomicCriterion;
use crate::rules::criterion_type::CriterionType;
use crate::rules::event::CriteriaEvent;
use crate::simulation::progress::{ProgressRecord, UpdateMode};
use crate::simulation::time::CriteriaClock;
use crate::simulation::world_query::{ReputationRank, WorldQuery};

/// What a progress rule gets to look at for one candidate criterion.
pub struct RuleInput<'a> {
    pub criterion: &'a AtomicCriterion,
    pub event: &'a CriteriaEvent,
    pub world: &'a dyn WorldQuery,
    pub existing: Option<&'a ProgressRecord>,
    pub clock: &'a CriteriaClock,
}

impl RuleInput<'_> {
    fn asset(&self) -> u64 {
        u64::from(self.criterion.asset)
    }
}

/// Event precondition checked before a rule runs.
#[derive(Clone, Copy)]
pub enum Requirement {
    None,
    V1Present,
    /// `v1` is non-zero and equals the criterion asset.
    V1MatchesAsset,
    V2MatchesAsset,
    /// Resync events carry `v1 == 0` and match every criterion of the type.
    V1MatchesAssetIfPresent,
    Custom(fn(&RuleInput<'_>) -> bool),
}

impl Requirement {
    pub fn met(&self, input: &RuleInput<'_>) -> bool {
        let event = input.event;
        match self {
            Requirement::None => true,
            Requirement::V1Present => event.v1 != 0,
            Requirement::V1MatchesAsset => event.v1 != 0 && event.v1 == input.asset(),
            Requirement::V2MatchesAsset => event.v2 != 0 && event.v2 == input.asset(),
            Requirement::V1MatchesAssetIfPresent => event.v1 == 0 || event.v1 == input.asset(),
            Requirement::Custom(check) => check(input),
        }
    }
}

/// How an event becomes a counter update.
#[derive(Clone, Copy)]
pub enum ProgressRule {
    IncrementOne,
    AccumulateV1,
    AccumulateV2,
    HighestV1,
    /// Re-samples actor state and ignores the payload; `None` skips the update.
    Derived {
        mode: UpdateMode,
        sample: fn(&RuleInput<'_>) -> Option<u64>,
    },
    Special(fn(&RuleInput<'_>) -> Option<(u64, UpdateMode)>),
    /// Recognised, but produces no progress.
    Reserved,
}

impl ProgressRule {
    pub fn compute(&self, input: &RuleInput<'_>) -> Option<(u64, UpdateMode)> {
        let event = input.event;
        match self {
            ProgressRule::IncrementOne => Some((1, UpdateMode::Accumulate)),
            ProgressRule::AccumulateV1 => Some((event.v1, UpdateMode::Accumulate)),
            ProgressRule::AccumulateV2 => Some((event.v2, UpdateMode::Accumulate)),
            ProgressRule::HighestV1 => Some((event.v1, UpdateMode::Highest)),
            ProgressRule::Derived { mode, sample } => sample(input).map(|value| (value, *mode)),
            ProgressRule::Special(rule) => rule(input),
            ProgressRule::Reserved => None,
        }
    }
}

#[derive(Clone, Copy)]
pub struct CriterionRule {
    pub progress: ProgressRule,
    pub requirement: Requirement,
    /// Candidates are looked up by `v1` in the asset index.
    pub asset_indexed: bool,
    /// A repeated value still moves the record timestamp forward.
    pub refresh_timestamp: bool,
}

impl CriterionRule {
    pub fn new(progress: ProgressRule) -> Self {
        Self {
            progress,
            requirement: Requirement::None,
            asset_indexed: false,
            refresh_timestamp: false,
        }
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.asset_indexed = true;
        self
    }

    pub fn refreshes_timestamp(mut self) -> Self {
        self.refresh_timestamp = true;
        self
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self.progress, ProgressRule::Reserved)
    }
}

/// Registry of per-type progress rules.
#[derive(Clone, Default)]
pub struct ProgressRules {
    rules: HashMap<CriterionType, CriterionRule>,
}

impl std::fmt::Debug for ProgressRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressRules")
            .field("types", &self.rules.len())
            .finish()
    }
}

impl ProgressRules {
    pub fn register(&mut self, criterion_type: CriterionType, rule: CriterionRule) {
        self.rules.insert(criterion_type, rule);
    }

    pub fn get(&self, criterion_type: CriterionType) -> Option<&CriterionRule> {
        self.rules.get(&criterion_type)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn standard() -> Self {
        let mut rules = Self::default();

        let increment_on_asset = CriterionRule::new(ProgressRule::IncrementOne)
            .requires(Requirement::V1MatchesAsset)
            .indexed();
        for criterion_type in [
            CriterionType::KILL_CREATURE,
            CriterionType::WIN_BATTLEGROUND,
            CriterionType::COMPLETE_BATTLEGROUND,
            CriterionType::DEATH_AT_MAP,
            CriterionType::KILLED_BY_CREATURE,
            CriterionType::BE_SPELL_TARGET,
            CriterionType::BE_SPELL_TARGET2,
            CriterionType::CAST_SPELL,
            CriterionType::CAST_SPELL2,
            CriterionType::BG_OBJECTIVE_CAPTURE,
            CriterionType::HONORABLE_KILL_AT_AREA,
            CriterionType::WIN_ARENA,
            CriterionType::PLAY_ARENA,
            CriterionType::USE_ITEM,
            CriterionType::HK_CLASS,
            CriterionType::HK_RACE,
            CriterionType::DO_EMOTE,
            CriterionType::USE_GAMEOBJECT,
            CriterionType::FISH_IN_GAMEOBJECT,
            CriterionType::KILL_CREATURE_TYPE,
            CriterionType::DEATHS_FROM,
        ] {
            rules.register(criterion_type, increment_on_asset);
        }

        for criterion_type in [
            CriterionType::DEATH,
            CriterionType::DEATH_IN_DUNGEON,
            CriterionType::KILLED_BY_PLAYER,
            CriterionType::COMPLETE_DAILY_QUEST,
            CriterionType::HONORABLE_KILL,
            CriterionType::WIN_RATED_ARENA,
            CriterionType::VISIT_BARBER_SHOP,
            CriterionType::ROLL_NEED_ON_LOOT,
            CriterionType::ROLL_GREED_ON_LOOT,
            CriterionType::GET_KILLING_BLOWS,
            CriterionType::NUMBER_OF_TALENT_RESETS,
            CriterionType::SPECIAL_PVP_KILL,
            CriterionType::WIN_DUEL,
            CriterionType::LOSE_DUEL,
            CriterionType::CREATE_AUCTION,
            CriterionType::WON_AUCTIONS,
            CriterionType::LOOT_EPIC_ITEM,
            CriterionType::RECEIVE_EPIC_ITEM,
            CriterionType::ROLL_NEED,
            CriterionType::ROLL_GREED,
            CriterionType::QUEST_ABANDONED,
            CriterionType::FLIGHT_PATHS_TAKEN,
            CriterionType::ACCEPTED_SUMMONINGS,
            CriterionType::USE_LFD_TO_GROUP_WITH_PLAYERS,
            CriterionType::WIN_RATED_BATTLEGROUND,
        ] {
            rules.register(criterion_type, CriterionRule::new(ProgressRule::IncrementOne));
        }

        let accumulate_v1 =
            CriterionRule::new(ProgressRule::AccumulateV1).requires(Requirement::V1Present);
        for criterion_type in [
            CriterionType::DAMAGE_DONE,
            CriterionType::HEALING_DONE,
            CriterionType::MONEY_FROM_VENDORS,
            CriterionType::GOLD_SPENT_FOR_TALENTS,
            CriterionType::GOLD_SPENT_AT_BARBER,
            CriterionType::GOLD_SPENT_FOR_MAIL,
            CriterionType::LOOT_MONEY,
            CriterionType::GOLD_EARNED_BY_AUCTIONS,
            CriterionType::TOTAL_DAMAGE_RECEIVED,
            CriterionType::TOTAL_HEALING_RECEIVED,
            CriterionType::EARN_ACHIEVEMENT_POINTS,
        ] {
            rules.register(criterion_type, accumulate_v1);
        }

        let accumulate_v2 = CriterionRule::new(ProgressRule::AccumulateV2)
            .requires(Requirement::V1MatchesAsset)
            .indexed();
        rules.register(CriterionType::LOOT_ITEM, accumulate_v2);
        rules.register(CriterionType::OWN_ITEM, accumulate_v2);
        rules.register(
            CriterionType::LOOT_TYPE,
            CriterionRule::new(ProgressRule::AccumulateV1).requires(Requirement::V2MatchesAsset),
        );

        let highest = CriterionRule::new(ProgressRule::HighestV1).requires(Requirement::V1Present);
        for criterion_type in [
            CriterionType::FALL_WITHOUT_DYING,
            CriterionType::HIGHEST_TEAM_RATING,
            CriterionType::HIGHEST_PERSONAL_RATING,
            CriterionType::HIGHEST_AUCTION_BID,
            CriterionType::HIGHEST_AUCTION_SOLD,
            CriterionType::HIGHEST_HIT_DEALT,
            CriterionType::HIGHEST_HIT_RECEIVED,
            CriterionType::HIGHEST_HEAL_CAST,
            CriterionType::HIGHEST_HEALING_RECEIVED,
            CriterionType::REACH_BG_RATING,
        ] {
            rules.register(criterion_type, highest);
        }

        register_derived(&mut rules);

        rules.register(
            CriterionType::COMPLETE_DAILY_QUEST_DAILY,
            CriterionRule::new(ProgressRule::Special(daily_quest_progress)).refreshes_timestamp(),
        );
        rules.register(
            CriterionType::COMPLETE_QUESTS_IN_ZONE,
            CriterionRule::new(ProgressRule::Special(zone_quest_tally))
                .requires(Requirement::Custom(quest_in_criterion_zone)),
        );

        for criterion_type in [
            CriterionType::COMPLETE_RAID,
            CriterionType::OWN_RANK,
            CriterionType::LEARN_SKILLLINE_SPELLS,
            CriterionType::HIGHEST_HEALTH,
            CriterionType::HIGHEST_POWER,
            CriterionType::HIGHEST_STAT,
            CriterionType::HIGHEST_SPELLPOWER,
            CriterionType::HIGHEST_ARMOR,
            CriterionType::HIGHEST_RATING,
            CriterionType::LEARN_SKILL_LINE,
            CriterionType::SPENT_GOLD_GUILD_REPAIRS,
            CriterionType::REACH_GUILD_LEVEL,
            CriterionType::CRAFT_ITEMS_GUILD,
            CriterionType::CATCH_FROM_POOL,
            CriterionType::BUY_GUILD_BANK_SLOTS,
            CriterionType::EARN_GUILD_ACHIEVEMENT_POINTS,
            CriterionType::BUY_GUILD_TABARD,
            CriterionType::COMPLETE_QUESTS_GUILD,
            CriterionType::HONORABLE_KILLS_GUILD,
            CriterionType::KILL_CREATURE_TYPE_GUILD,
        ] {
            rules.register(criterion_type, CriterionRule::new(ProgressRule::Reserved));
        }

        rules
    }
}

fn derived_set(sample: fn(&RuleInput<'_>) -> Option<u64>) -> CriterionRule {
    CriterionRule::new(ProgressRule::Derived {
        mode: UpdateMode::Set,
        sample,
    })
}

fn register_derived(rules: &mut ProgressRules) {
    let on_asset = Requirement::V1MatchesAssetIfPresent;

    rules.register(CriterionType::REACH_LEVEL, derived_set(|input| {
        Some(u64::from(input.world.level(input.event.actor)))
    }));
    rules.register(
        CriterionType::REACH_SKILL_LEVEL,
        derived_set(|input| match input.event.v2 {
            0 => Some(u64::from(input.world.skill_value(input.event.actor, input.criterion.asset))),
            value => Some(value),
        })
        .requires(on_asset),
    );
    rules.register(
        CriterionType::LEARN_SKILL_LEVEL,
        derived_set(|input| match input.event.v2 {
            0 => Some(u64::from(
                input.world.max_skill_value(input.event.actor, input.criterion.asset),
            )),
            value => Some(value),
        })
        .requires(on_asset),
    );
    rules.register(
        CriterionType::COMPLETE_ACHIEVEMENT,
        derived_set(|input| {
            input
                .world
                .has_achieved(input.event.actor, input.criterion.asset)
                .then_some(1)
        })
        .requires(on_asset),
    );
    rules.register(CriterionType::COMPLETE_QUEST_COUNT, derived_set(|input| {
        Some(u64::from(input.world.rewarded_quest_count(input.event.actor)))
    }));
    rules.register(
        CriterionType::COMPLETE_QUEST,
        derived_set(|input| {
            input
                .world
                .is_quest_rewarded(input.event.actor, input.criterion.asset)
                .then_some(1)
        })
        .requires(on_asset),
    );
    rules.register(
        CriterionType::LEARN_SPELL,
        derived_set(|input| {
            input
                .world
                .knows_spell(input.event.actor, input.criterion.asset)
                .then_some(1)
        })
        .requires(on_asset),
    );
    rules.register(
        CriterionType::EXPLORE_AREA,
        derived_set(|_| Some(1)).requires(Requirement::V1MatchesAsset).indexed(),
    );
    rules.register(
        CriterionType::EQUIP_ITEM,
        derived_set(|_| Some(1)).requires(Requirement::V1MatchesAsset).indexed(),
    );
    rules.register(
        CriterionType::EQUIP_EPIC_ITEM,
        derived_set(|_| Some(1)).requires(Requirement::V1MatchesAsset).indexed(),
    );
    rules.register(CriterionType::BUY_BANK_SLOT, derived_set(|input| {
        Some(u64::from(input.world.bank_slots(input.event.actor)))
    }));
    rules.register(
        CriterionType::GAIN_REPUTATION,
        derived_set(|input| {
            let standing = input
                .world
                .reputation_standing(input.event.actor, input.criterion.asset);
            u64::try_from(standing).ok().filter(|standing| *standing > 0)
        })
        .requires(on_asset),
    );
    rules.register(CriterionType::GAIN_EXALTED_REPUTATION, derived_set(|input| {
        Some(u64::from(
            input
                .world
                .reputation_rank_count(input.event.actor, ReputationRank::Exalted),
        ))
    }));
    rules.register(CriterionType::GAIN_REVERED_REPUTATION, derived_set(|input| {
        Some(u64::from(
            input
                .world
                .reputation_rank_count(input.event.actor, ReputationRank::Revered),
        ))
    }));
    rules.register(CriterionType::GAIN_HONORED_REPUTATION, derived_set(|input| {
        Some(u64::from(
            input
                .world
                .reputation_rank_count(input.event.actor, ReputationRank::Honored),
        ))
    }));
    rules.register(CriterionType::KNOWN_FACTIONS, derived_set(|input| {
        Some(u64::from(input.world.known_faction_count(input.event.actor)))
    }));
    rules.register(CriterionType::ON_LOGIN, derived_set(|_| Some(1)));
    rules.register(
        CriterionType::EARN_HONORABLE_KILL,
        CriterionRule::new(ProgressRule::Derived {
            mode: UpdateMode::Highest,
            sample: |input| {
                Some(u64::from(
                    input.world.lifetime_honorable_kills(input.event.actor),
                ))
            },
        }),
    );
    rules.register(
        CriterionType::HIGHEST_GOLD_VALUE_OWNED,
        CriterionRule::new(ProgressRule::Derived {
            mode: UpdateMode::Highest,
            sample: |input| Some(input.world.money(input.event.actor)),
        }),
    );
}

/// Counts days on which at least one daily quest was completed, restarting
/// after a missed day.
fn daily_quest_progress(input: &RuleInput<'_>) -> Option<(u64, UpdateMode)> {
    let missed_day = input.clock.previous_reset_window();
    let last_reset = input.clock.last_reset();
    let last_update = input.existing.map(|record| record.updated_at);

    if input.event.v1 == 0 {
        return match last_update {
            Some(at) if at < missed_day => Some((0, UpdateMode::Set)),
            _ => None,
        };
    }
    match last_update {
        None => Some((1, UpdateMode::Set)),
        Some(at) if at < missed_day => Some((1, UpdateMode::Set)),
        Some(at) if at < last_reset => Some((1, UpdateMode::Accumulate)),
        Some(_) => None,
    }
}

fn zone_quest_tally(input: &RuleInput<'_>) -> Option<(u64, UpdateMode)> {
    if input.event.v1 != 0 {
        return Some((1, UpdateMode::Accumulate));
    }
    let zone = i64::from(input.criterion.asset);
    let count = input
        .world
        .rewarded_quests(input.event.actor)
        .into_iter()
        .filter(|quest| {
            input
                .world
                .quest_zone(*quest)
                .is_some_and(|quest_zone| quest_zone >= 0 && i64::from(quest_zone) == zone)
        })
        .count();
    Some((count as u64, UpdateMode::Set))
}

fn quest_in_criterion_zone(input: &RuleInput<'_>) -> bool {
    if input.event.v1 == 0 {
        return true;
    }
    let Ok(quest) = u32::try_from(input.event.v1) else {
        return false;
    };
    input
        .world
        .quest_zone(quest)
        .is_some_and(|zone| i64::from(zone) == i64::from(input.criterion.asset))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::components::actor::ActorId;
    use crate::simulation::time::{DAY, HOUR};

    #[derive(Default)]
    struct QuestWorld {
        rewarded: Vec<u32>,
        zones: HashMap<u32, i32>,
    }

    impl WorldQuery for QuestWorld {
        fn is_valid_actor(&self, _actor: ActorId) -> bool {
            true
        }

        fn rewarded_quests(&self, _actor: ActorId) -> Vec<u32> {
            self.rewarded.clone()
        }

        fn quest_zone(&self, quest: u32) -> Option<i32> {
            self.zones.get(&quest).copied()
        }

        fn level(&self, _actor: ActorId) -> u32 {
            42
        }
    }

    fn criterion(criterion_type: CriterionType, asset: u32) -> AtomicCriterion {
        serde_json::from_str(&format!(
            r#"{{ "id": 1, "type": {}, "asset": {asset} }}"#,
            criterion_type.0
        ))
        .unwrap()
    }

    fn record(updated_at: i64) -> ProgressRecord {
        ProgressRecord {
            counter: 1,
            updated_at,
            owner: ActorId(1),
            unsaved: false,
        }
    }

    fn run(
        criterion: &AtomicCriterion,
        v1: u64,
        world: &dyn WorldQuery,
        existing: Option<&ProgressRecord>,
        clock: &CriteriaClock,
    ) -> Option<(u64, UpdateMode)> {
        let event = CriteriaEvent::new(criterion.criterion_type, ActorId(1)).with_values(v1, 0, 0);
        let input = RuleInput {
            criterion,
            event: &event,
            world,
            existing,
            clock,
        };
        let rule = ProgressRules::standard();
        let rule = rule.get(criterion.criterion_type).unwrap();
        if !rule.requirement.met(&input) {
            return None;
        }
        rule.progress.compute(&input)
    }

    const RESET: i64 = 100 * DAY + 6 * HOUR;

    fn clock() -> CriteriaClock {
        CriteriaClock::at(RESET - HOUR, 6)
    }

    #[test]
    fn daily_completion_first_time_sets_one() {
        let daily = criterion(CriterionType::COMPLETE_DAILY_QUEST_DAILY, 0);
        let world = QuestWorld::default();
        assert_eq!(run(&daily, 7, &world, None, &clock()), Some((1, UpdateMode::Set)));
    }

    #[test]
    fn daily_completion_after_missed_day_restarts() {
        let daily = criterion(CriterionType::COMPLETE_DAILY_QUEST_DAILY, 0);
        let world = QuestWorld::default();
        let stale = record(RESET - 3 * DAY);
        assert_eq!(run(&daily, 7, &world, Some(&stale), &clock()), Some((1, UpdateMode::Set)));
    }

    #[test]
    fn daily_completion_first_today_accumulates() {
        let daily = criterion(CriterionType::COMPLETE_DAILY_QUEST_DAILY, 0);
        let world = QuestWorld::default();
        let yesterday = record(RESET - DAY - 2 * HOUR);
        assert_eq!(
            run(&daily, 7, &world, Some(&yesterday), &clock()),
            Some((1, UpdateMode::Accumulate))
        );
    }

    #[test]
    fn daily_completion_already_counted_today_is_ignored() {
        let daily = criterion(CriterionType::COMPLETE_DAILY_QUEST_DAILY, 0);
        let world = QuestWorld::default();
        let today = record(RESET - 12 * HOUR);
        assert_eq!(run(&daily, 7, &world, Some(&today), &clock()), None);
    }

    #[test]
    fn daily_login_resets_only_after_missed_day() {
        let daily = criterion(CriterionType::COMPLETE_DAILY_QUEST_DAILY, 0);
        let world = QuestWorld::default();
        let stale = record(RESET - 2 * DAY - 1);
        let recent = record(RESET - 2 * DAY);
        assert_eq!(run(&daily, 0, &world, Some(&stale), &clock()), Some((0, UpdateMode::Set)));
        assert_eq!(run(&daily, 0, &world, Some(&recent), &clock()), None);
        assert_eq!(run(&daily, 0, &world, None, &clock()), None);
    }

    #[test]
    fn zone_tally_counts_on_resync_and_filters_explicit_quests() {
        let zone_quests = criterion(CriterionType::COMPLETE_QUESTS_IN_ZONE, 12);
        let mut world = QuestWorld::default();
        world.rewarded = vec![1, 2, 3, 4];
        world.zones.insert(1, 12);
        world.zones.insert(2, 12);
        world.zones.insert(3, -12);
        world.zones.insert(4, 40);
        world.zones.insert(9, 12);

        assert_eq!(run(&zone_quests, 0, &world, None, &clock()), Some((2, UpdateMode::Set)));
        assert_eq!(run(&zone_quests, 9, &world, None, &clock()), Some((1, UpdateMode::Accumulate)));
        assert_eq!(run(&zone_quests, 4, &world, None, &clock()), None);
        assert_eq!(run(&zone_quests, 77, &world, None, &clock()), None);
    }

    #[test]
    fn asset_requirement_and_derived_sampling() {
        let world = QuestWorld::default();
        let kill = criterion(CriterionType::KILL_CREATURE, 1234);
        assert_eq!(run(&kill, 1234, &world, None, &clock()), Some((1, UpdateMode::Accumulate)));
        assert_eq!(run(&kill, 99, &world, None, &clock()), None);
        assert_eq!(run(&kill, 0, &world, None, &clock()), None);

        let level = criterion(CriterionType::REACH_LEVEL, 0);
        assert_eq!(run(&level, 0, &world, None, &clock()), Some((42, UpdateMode::Set)));
    }

    #[test]
    fn reserved_types_are_known_but_inert() {
        let rules = ProgressRules::standard();
        let rule = rules.get(CriterionType::HIGHEST_HEALTH).unwrap();
        assert!(rule.is_reserved());
        assert!(rules.get(CriterionType(9999)).is_none());

        let world = QuestWorld::default();
        let guild = criterion(CriterionType::REACH_GUILD_LEVEL, 0);
        assert_eq!(run(&guild, 25, &world, None, &clock()), None);
    }
}
