use std::collections::HashMap;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::SystemSet;
use bevy_utils::tracing::debug;

use crate::components::actor::{
    ActorId, ActorLocation, ActorProfile, Honors, Inventory, QuestLog, Reputation, Skills,
    Spellbook, Vitals, Wallet,
};
use crate::data::reference::ReferenceData;
use crate::data::settings::TrackerSettings;
use crate::rules::criterion_type::{CriterionScope, FailEvent, TimerStartEvent};
use crate::rules::event::CriteriaEvent;
use crate::rules::progress_rules::ProgressRules;
use crate::simulation::catalog::CriteriaCatalog;
use crate::simulation::notify::CriteriaEventLog;
use crate::simulation::predicates::PredicateRegistry;
use crate::simulation::time::{advance_clock_system, CriteriaClock, TickDelta};
use crate::simulation::tracker::ActorCriteria;
use crate::systems::criteria::{criteria_event_system, timed_criteria_system};

/// Canonical tick ordering for criteria processing.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum CriteriaSet {
    Events,
    Timers,
}

/// Immutable engine tables shared by every actor.
#[derive(Resource, Clone, Debug)]
pub struct CriteriaRuntime {
    pub catalog: Arc<CriteriaCatalog>,
    pub rules: Arc<ProgressRules>,
    pub predicates: Arc<PredicateRegistry>,
    pub scope: CriterionScope,
}

impl CriteriaRuntime {
    pub fn new(catalog: CriteriaCatalog, scope: CriterionScope) -> Self {
        Self {
            catalog: Arc::new(catalog),
            rules: Arc::new(ProgressRules::standard()),
            predicates: Arc::new(PredicateRegistry::standard()),
            scope,
        }
    }
}

/// Work requested of the engine, applied in order during `CriteriaSet::Events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaCommand {
    Event(CriteriaEvent),
    StartTimer {
        actor: ActorId,
        event: TimerStartEvent,
        asset: u32,
        already_elapsed_ms: u32,
    },
    StopTimer {
        actor: ActorId,
        event: TimerStartEvent,
        asset: u32,
    },
    Fail {
        actor: ActorId,
        event: FailEvent,
        asset: u32,
        even_if_complete: bool,
    },
    ResetAll {
        actor: ActorId,
    },
}

impl CriteriaCommand {
    /// Actor whose tracker the command runs against.
    pub fn actor(&self) -> ActorId {
        match self {
            CriteriaCommand::Event(event) => event.actor,
            CriteriaCommand::StartTimer { actor, .. }
            | CriteriaCommand::StopTimer { actor, .. }
            | CriteriaCommand::Fail { actor, .. }
            | CriteriaCommand::ResetAll { actor } => *actor,
        }
    }
}

#[derive(Resource, Debug, Default)]
pub struct CriteriaEventQueue(pub Vec<CriteriaCommand>);

impl CriteriaEventQueue {
    pub fn push(&mut self, command: CriteriaCommand) {
        self.0.push(command);
    }

    pub fn event(&mut self, event: CriteriaEvent) {
        self.0.push(CriteriaCommand::Event(event));
    }

    pub fn drain(&mut self) -> Vec<CriteriaCommand> {
        std::mem::take(&mut self.0)
    }
}

/// Lookup from stable actor ids to live entities.
#[derive(Resource, Debug, Default)]
pub struct ActorIndex(HashMap<ActorId, Entity>);

impl ActorIndex {
    pub fn get(&self, actor: ActorId) -> Option<Entity> {
        self.0.get(&actor).copied()
    }

    pub fn insert(&mut self, actor: ActorId, entity: Entity) -> Option<Entity> {
        self.0.insert(actor, entity)
    }

    pub fn remove(&mut self, actor: ActorId) -> Option<Entity> {
        self.0.remove(&actor)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build the ECS world with baseline resources.
pub fn create_world(
    runtime: CriteriaRuntime,
    settings: &TrackerSettings,
    reference: ReferenceData,
) -> World {
    let mut world = World::new();
    world.insert_resource(runtime);
    world.insert_resource(reference);
    world.insert_resource(CriteriaClock::system(settings.daily_reset_hour));
    world.insert_resource(TickDelta::default());
    world.insert_resource(CriteriaEventQueue::default());
    world.insert_resource(CriteriaEventLog::default());
    world.insert_resource(ActorIndex::default());
    world
}

/// Build the system schedule in the canonical order.
pub fn create_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.configure_sets((CriteriaSet::Events, CriteriaSet::Timers).chain());

    schedule.add_systems((
        criteria_event_system.in_set(CriteriaSet::Events),
        (timed_criteria_system, advance_clock_system)
            .chain()
            .in_set(CriteriaSet::Timers),
    ));

    schedule
}

/// Spawns a player actor with empty state and a fresh tracker.
pub fn spawn_actor(world: &mut World, actor: ActorId, profile: ActorProfile) -> Entity {
    let entity = world
        .spawn((
            actor,
            profile,
            ActorLocation::default(),
            Vitals::new(100),
            Wallet::default(),
            QuestLog::default(),
            Reputation::default(),
            Skills::default(),
            Spellbook::default(),
            Inventory::default(),
            Honors::default(),
            ActorCriteria::new(actor),
        ))
        .id();
    if let Some(previous) = world.resource_mut::<ActorIndex>().insert(actor, entity) {
        debug!("{} re-spawned, replacing entity {:?}", actor, previous);
    }
    entity
}

/// Swaps in a tracker restored from storage; false if the actor is not spawned.
pub fn attach_criteria(world: &mut World, criteria: ActorCriteria) -> bool {
    let Some(entity) = world.resource::<ActorIndex>().get(criteria.actor) else {
        return false;
    };
    match world.get_entity_mut(entity) {
        Some(mut entity) => {
            entity.insert(criteria);
            true
        }
        None => false,
    }
}

/// Logs the actor out, handing back its tracker for persistence.
pub fn end_session(world: &mut World, actor: ActorId) -> Option<ActorCriteria> {
    let entity = world.resource_mut::<ActorIndex>().remove(actor)?;
    let criteria = world
        .get_entity_mut(entity)
        .and_then(|mut entity| entity.take::<ActorCriteria>());
    world.despawn(entity);
    criteria
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::actor::Team;
    use crate::data::criteria::{CriterionId, TreeId};
    use crate::rules::criterion_type::CriterionType;
    use crate::simulation::notify::CriteriaNotice;

    const CATALOG: &str = r#"{
        "criteria": [
            { "id": 1, "type": 0, "asset": 1234 },
            { "id": 2, "type": 5 },
            {
                "id": 3, "type": 0, "asset": 55,
                "timer": { "start_event": "KILL_CREATURE", "start_asset": 55, "duration_secs": 2 }
            }
        ],
        "trees": [
            { "id": 10, "operator": 0, "amount": 1, "criterion": 1 },
            { "id": 20, "operator": 0, "amount": 20, "criterion": 2 },
            { "id": 30, "operator": 0, "amount": 5, "criterion": 3 }
        ],
        "predicates": []
    }"#;

    fn profile(level: u32) -> ActorProfile {
        ActorProfile {
            level,
            race: 1,
            class: 1,
            gender: 0,
            team: Team::Alliance,
        }
    }

    fn setup() -> (World, Schedule) {
        let catalog = CriteriaCatalog::from_definitions(serde_json::from_str(CATALOG).unwrap());
        let runtime = CriteriaRuntime::new(catalog, CriterionScope::Individual);
        let mut world = create_world(runtime, &TrackerSettings::default(), ReferenceData::default());
        spawn_actor(&mut world, ActorId(1), profile(20));
        (world, create_schedule())
    }

    #[test]
    fn queued_events_reach_the_actor_tracker() {
        let (mut world, mut schedule) = setup();
        world.resource_mut::<CriteriaEventQueue>().event(
            CriteriaEvent::new(CriterionType::KILL_CREATURE, ActorId(1)).with_values(1234, 0, 0),
        );
        world
            .resource_mut::<CriteriaEventQueue>()
            .event(CriteriaEvent::new(CriterionType::REACH_LEVEL, ActorId(1)));
        schedule.run(&mut world);

        let entity = world.resource::<ActorIndex>().get(ActorId(1)).unwrap();
        let criteria = world.get::<ActorCriteria>(entity).unwrap();
        assert_eq!(criteria.progress.counter(CriterionId(1)), Some(1));
        assert_eq!(criteria.progress.counter(CriterionId(2)), Some(20));

        let notices = world.resource_mut::<CriteriaEventLog>().drain();
        let completed: Vec<TreeId> = notices
            .iter()
            .filter_map(|notice| match notice {
                CriteriaNotice::TreeCompleted { tree, .. } => Some(*tree),
                _ => None,
            })
            .collect();
        assert_eq!(completed, vec![TreeId(10), TreeId(20)]);
        assert!(world.resource::<CriteriaEventQueue>().0.is_empty());
    }

    #[test]
    fn timers_expire_over_ticks() {
        let (mut world, mut schedule) = setup();
        world.resource_mut::<CriteriaEventQueue>().push(CriteriaCommand::StartTimer {
            actor: ActorId(1),
            event: TimerStartEvent::KillCreature,
            asset: 55,
            already_elapsed_ms: 0,
        });
        world.insert_resource(TickDelta(1_000));
        schedule.run(&mut world);

        let entity = world.resource::<ActorIndex>().get(ActorId(1)).unwrap();
        let criteria = world.get::<ActorCriteria>(entity).unwrap();
        assert_eq!(criteria.timers.remaining(TreeId(30)), Some(1_000));
        assert_eq!(criteria.progress.counter(CriterionId(3)), Some(0));

        schedule.run(&mut world);
        let criteria = world.get::<ActorCriteria>(entity).unwrap();
        assert!(criteria.timers.is_empty());
        assert_eq!(criteria.progress.counter(CriterionId(3)), None);
    }

    #[test]
    fn exempt_actors_are_ignored_and_sessions_end() {
        let (mut world, mut schedule) = setup();
        let entity = world.resource::<ActorIndex>().get(ActorId(1)).unwrap();
        world.entity_mut(entity).insert(crate::components::actor::Exempt);
        world.resource_mut::<CriteriaEventQueue>().event(
            CriteriaEvent::new(CriterionType::KILL_CREATURE, ActorId(1)).with_values(1234, 0, 0),
        );
        schedule.run(&mut world);
        assert!(world.resource::<CriteriaEventLog>().0.is_empty());

        let criteria = end_session(&mut world, ActorId(1)).unwrap();
        assert!(criteria.progress.is_empty());
        assert!(world.resource::<ActorIndex>().is_empty());
        assert!(world.get_entity(entity).is_none());
    }
}
