use bevy_ecs::prelude::*;

use crate::components::actor::{
    ActorId, ActorLocation, ActorProfile, CreatureTemplate, Exempt, Honors, Inventory, QuestLog,
    Reputation, Skills, Spellbook, Team, Vitals, Wallet,
};
use crate::core::ecs::ActorIndex;
use crate::data::reference::ReferenceData;
use crate::simulation::world_query::WorldQuery;

/// `WorldQuery` backed by the components of a bevy `World`.
pub struct EcsWorldQuery<'w> {
    world: &'w World,
    index: Option<&'w ActorIndex>,
    reference: Option<&'w ReferenceData>,
}

impl<'w> EcsWorldQuery<'w> {
    pub fn new(world: &'w World) -> Self {
        Self {
            world,
            index: world.get_resource::<ActorIndex>(),
            reference: world.get_resource::<ReferenceData>(),
        }
    }

    fn component<T: Component>(&self, actor: ActorId) -> Option<&'w T> {
        let entity = self.index?.get(actor)?;
        self.world.get::<T>(entity)
    }
}

impl WorldQuery for EcsWorldQuery<'_> {
    fn is_valid_actor(&self, actor: ActorId) -> bool {
        self.index
            .and_then(|index| index.get(actor))
            .is_some_and(|entity| self.world.get_entity(entity).is_some())
    }

    fn is_exempt(&self, actor: ActorId) -> bool {
        self.component::<Exempt>(actor).is_some()
    }

    fn is_player(&self, actor: ActorId) -> bool {
        self.component::<ActorProfile>(actor).is_some()
    }

    fn team(&self, actor: ActorId) -> Option<Team> {
        self.component::<ActorProfile>(actor).map(|profile| profile.team)
    }

    fn level(&self, actor: ActorId) -> u32 {
        self.component::<ActorProfile>(actor)
            .map_or(0, |profile| profile.level)
    }

    fn race(&self, actor: ActorId) -> u32 {
        self.component::<ActorProfile>(actor).map_or(0, |profile| profile.race)
    }

    fn class(&self, actor: ActorId) -> u32 {
        self.component::<ActorProfile>(actor)
            .map_or(0, |profile| profile.class)
    }

    fn gender(&self, actor: ActorId) -> u32 {
        self.component::<ActorProfile>(actor)
            .map_or(0, |profile| profile.gender)
    }

    fn map(&self, actor: ActorId) -> u32 {
        self.component::<ActorLocation>(actor).map_or(0, |loc| loc.map)
    }

    fn zone(&self, actor: ActorId) -> u32 {
        self.component::<ActorLocation>(actor).map_or(0, |loc| loc.zone)
    }

    fn area(&self, actor: ActorId) -> u32 {
        self.component::<ActorLocation>(actor).map_or(0, |loc| loc.area)
    }

    fn in_battleground(&self, actor: ActorId) -> bool {
        self.component::<ActorLocation>(actor)
            .is_some_and(|loc| loc.in_battleground)
    }

    fn in_instance(&self, actor: ActorId) -> bool {
        self.component::<ActorLocation>(actor)
            .is_some_and(|loc| loc.in_instance)
    }

    fn is_alive(&self, actor: ActorId) -> bool {
        self.component::<Vitals>(actor).map_or(true, Vitals::is_alive)
    }

    fn in_combat(&self, actor: ActorId) -> bool {
        self.component::<Vitals>(actor).is_some_and(|vitals| vitals.in_combat)
    }

    fn is_mounted(&self, actor: ActorId) -> bool {
        self.component::<Vitals>(actor).is_some_and(|vitals| vitals.mounted)
    }

    fn health_pct(&self, actor: ActorId) -> u32 {
        self.component::<Vitals>(actor).map_or(100, Vitals::health_pct)
    }

    fn group_size(&self, actor: ActorId) -> u32 {
        self.component::<Vitals>(actor).map_or(0, |vitals| vitals.group_size)
    }

    fn creature_entry(&self, actor: ActorId) -> Option<u32> {
        self.component::<CreatureTemplate>(actor)
            .map(|template| template.entry)
    }

    fn creature_type(&self, actor: ActorId) -> Option<u32> {
        self.component::<CreatureTemplate>(actor)
            .map(|template| template.creature_type)
    }

    fn has_aura(&self, actor: ActorId, spell: u32) -> bool {
        self.component::<Spellbook>(actor)
            .is_some_and(|book| book.auras.contains(&spell))
    }

    fn knows_spell(&self, actor: ActorId, spell: u32) -> bool {
        self.component::<Spellbook>(actor)
            .is_some_and(|book| book.known.contains(&spell))
    }

    fn item_count(&self, actor: ActorId, item: u32) -> u32 {
        self.component::<Inventory>(actor)
            .and_then(|inventory| inventory.items.get(&item).copied())
            .unwrap_or(0)
    }

    fn skill_value(&self, actor: ActorId, skill: u32) -> u32 {
        self.component::<Skills>(actor)
            .and_then(|skills| skills.values.get(&skill))
            .map_or(0, |value| value.value)
    }

    fn max_skill_value(&self, actor: ActorId, skill: u32) -> u32 {
        self.component::<Skills>(actor)
            .and_then(|skills| skills.values.get(&skill))
            .map_or(0, |value| value.max)
    }

    fn reputation_standings(&self, actor: ActorId) -> Vec<(u32, i32)> {
        let mut standings: Vec<(u32, i32)> = self
            .component::<Reputation>(actor)
            .map(|rep| rep.standings.iter().map(|(id, value)| (*id, *value)).collect())
            .unwrap_or_default();
        standings.sort_unstable();
        standings
    }

    fn reputation_standing(&self, actor: ActorId, faction: u32) -> i32 {
        self.component::<Reputation>(actor)
            .and_then(|rep| rep.standings.get(&faction).copied())
            .unwrap_or(0)
    }

    fn rewarded_quests(&self, actor: ActorId) -> Vec<u32> {
        let mut quests: Vec<u32> = self
            .component::<QuestLog>(actor)
            .map(|log| log.rewarded.iter().copied().collect())
            .unwrap_or_default();
        quests.sort_unstable();
        quests
    }

    fn is_quest_rewarded(&self, actor: ActorId, quest: u32) -> bool {
        self.component::<QuestLog>(actor)
            .is_some_and(|log| log.rewarded.contains(&quest))
    }

    fn rewarded_quest_count(&self, actor: ActorId) -> u32 {
        self.component::<QuestLog>(actor)
            .map_or(0, |log| log.rewarded.len() as u32)
    }

    fn bank_slots(&self, actor: ActorId) -> u32 {
        self.component::<Wallet>(actor).map_or(0, |wallet| wallet.bank_slots)
    }

    fn money(&self, actor: ActorId) -> u64 {
        self.component::<Wallet>(actor).map_or(0, |wallet| wallet.money)
    }

    fn lifetime_honorable_kills(&self, actor: ActorId) -> u32 {
        self.component::<Honors>(actor)
            .map_or(0, |honors| honors.lifetime_honorable_kills)
    }

    fn has_achieved(&self, actor: ActorId, achievement: u32) -> bool {
        self.component::<Honors>(actor)
            .is_some_and(|honors| honors.achievements.contains(&achievement))
    }

    fn has_title(&self, actor: ActorId, title: u32) -> bool {
        self.component::<Honors>(actor)
            .is_some_and(|honors| honors.titles.contains(&title))
    }

    fn quest_zone(&self, quest: u32) -> Option<i32> {
        self.reference?.quest_zones.get(&quest).copied()
    }

    fn item_quality(&self, item: u32) -> Option<u32> {
        self.reference?.item_quality.get(&item).copied()
    }

    fn is_world_event_active(&self, event: u32) -> bool {
        self.reference
            .is_some_and(|reference| reference.active_world_events.contains(&event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::actor::SkillValue;
    use crate::simulation::world_query::ReputationRank;

    fn world_with_actor() -> World {
        let mut world = World::new();
        world.insert_resource(ActorIndex::default());
        let mut reference = ReferenceData::default();
        reference.quest_zones.insert(500, 12);
        reference.active_world_events.insert(7);
        world.insert_resource(reference);

        let mut reputation = Reputation::default();
        reputation.standings.insert(72, 43_000);
        reputation.standings.insert(69, 10_000);
        let mut skills = Skills::default();
        skills.values.insert(
            164,
            SkillValue {
                value: 300,
                max: 375,
            },
        );
        let entity = world
            .spawn((
                ActorId(1),
                ActorProfile {
                    level: 70,
                    race: 4,
                    class: 11,
                    gender: 1,
                    team: Team::Alliance,
                },
                ActorLocation {
                    map: 530,
                    zone: 3519,
                    area: 3519,
                    in_battleground: false,
                    in_instance: false,
                },
                Vitals::new(200),
                reputation,
                skills,
            ))
            .id();
        world.resource_mut::<ActorIndex>().insert(ActorId(1), entity);
        world
    }

    #[test]
    fn reads_actor_components() {
        let world = world_with_actor();
        let query = EcsWorldQuery::new(&world);
        let actor = ActorId(1);

        assert!(query.is_valid_actor(actor));
        assert!(!query.is_valid_actor(ActorId(2)));
        assert!(query.is_player(actor));
        assert_eq!(query.team(actor), Some(Team::Alliance));
        assert_eq!(query.level(actor), 70);
        assert_eq!(query.zone(actor), 3519);
        assert_eq!(query.skill_value(actor, 164), 300);
        assert_eq!(query.max_skill_value(actor, 164), 375);
        assert_eq!(query.reputation_rank_count(actor, ReputationRank::Exalted), 1);
        assert_eq!(query.reputation_rank_count(actor, ReputationRank::Honored), 2);
        assert_eq!(query.known_faction_count(actor), 2);
        assert_eq!(query.health_pct(actor), 100);
    }

    #[test]
    fn missing_components_give_neutral_answers() {
        let world = world_with_actor();
        let query = EcsWorldQuery::new(&world);
        let actor = ActorId(1);

        assert_eq!(query.money(actor), 0);
        assert_eq!(query.item_count(actor, 1), 0);
        assert!(!query.is_quest_rewarded(actor, 500));
        assert!(!query.is_exempt(actor));
        assert_eq!(query.creature_entry(actor), None);
        assert_eq!(query.quest_zone(500), Some(12));
        assert!(query.is_world_event_active(7));
    }
}
