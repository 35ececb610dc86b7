use bevy_ecs::prelude::*;
use bevy_utils::tracing::{debug, warn};

use crate::components::actor::{ActorId, Team};
use crate::core::ecs::{ActorIndex, CriteriaCommand, CriteriaEventQueue, CriteriaRuntime};
use crate::core::query::EcsWorldQuery;
use crate::data::criteria::{AtomicCriterion, CriterionId, TreeId};
use crate::rules::criterion_type::{CriterionScope, FailEvent, TimerStartEvent};
use crate::rules::event::CriteriaEvent;
use crate::rules::progress_rules::{ProgressRules, RuleInput};
use crate::simulation::catalog::CriteriaCatalog;
use crate::simulation::completion::CompletionEvaluator;
use crate::simulation::notify::{CriteriaEventLog, CriteriaNotice, CriteriaObserver};
use crate::simulation::predicates::{PredicateEvaluator, PredicateRegistry};
use crate::simulation::progress::{ProgressChange, UpdateMode};
use crate::simulation::time::{CriteriaClock, TickDelta};
use crate::simulation::tracker::ActorCriteria;
use crate::simulation::world_query::WorldQuery;

/// Shared, read-only collaborators for one batch of criteria work.
pub struct CriteriaContext<'a> {
    pub catalog: &'a CriteriaCatalog,
    pub rules: &'a ProgressRules,
    pub predicates: &'a PredicateRegistry,
    pub world: &'a dyn WorldQuery,
    pub clock: &'a CriteriaClock,
    pub scope: CriterionScope,
}

/// Feeds one domain event through every matching criterion of `state`.
pub fn update_criteria(
    ctx: &CriteriaContext<'_>,
    state: &mut ActorCriteria,
    event: &CriteriaEvent,
    observer: &mut dyn CriteriaObserver,
) {
    let actor = event.actor;
    if !ctx.world.is_valid_actor(actor) {
        debug!("ignoring {} for invalid {}", event.criterion_type, actor);
        return;
    }
    if ctx.world.is_exempt(actor) {
        return;
    }
    let Some(rule) = ctx.rules.get(event.criterion_type) else {
        warn!("unknown criterion event {}", event.criterion_type);
        return;
    };
    if rule.is_reserved() {
        return;
    }

    let candidates = if rule.asset_indexed {
        let Ok(asset) = u32::try_from(event.v1) else {
            debug!("{} asset {} out of range", event.criterion_type, event.v1);
            return;
        };
        ctx.catalog
            .criteria_for(ctx.scope, event.criterion_type, Some(asset))
    } else {
        ctx.catalog.criteria_for(ctx.scope, event.criterion_type, None)
    };

    for &id in candidates {
        let Some(criterion) = ctx.catalog.criterion(id) else {
            debug!("criterion {} indexed but missing", id.0);
            continue;
        };
        if !can_update_criterion(ctx, state, criterion, event) {
            continue;
        }
        let input = RuleInput {
            criterion,
            event,
            world: ctx.world,
            existing: state.progress.get(id),
            clock: ctx.clock,
        };
        if !rule.requirement.met(&input) {
            continue;
        }
        let Some((value, mode)) = rule.progress.compute(&input) else {
            continue;
        };

        let changed = set_criterion_progress(ctx, state, criterion, value, mode, actor, observer);
        if !changed && rule.refresh_timestamp {
            state.progress.touch(id, actor, ctx.clock.now);
        }
        report_tree_updates(ctx, state, id, observer);
    }
}

/// Eligibility gate run before any progress rule.
fn can_update_criterion(
    ctx: &CriteriaContext<'_>,
    state: &ActorCriteria,
    criterion: &AtomicCriterion,
    event: &CriteriaEvent,
) -> bool {
    if ctx.catalog.is_disabled(criterion.id) {
        return false;
    }

    let team = ctx.world.team(event.actor);
    let trees = ctx.catalog.trees_for_criterion(criterion.id);
    if !trees.iter().any(|&index| tree_accepts(ctx.catalog, index, team)) {
        return false;
    }

    if criterion.timer.is_some()
        && !trees
            .iter()
            .any(|&index| state.timers.contains(ctx.catalog.tree(index).id))
    {
        return false;
    }

    if let Some(tree) = criterion.predicate_tree {
        let evaluator = PredicateEvaluator::new(ctx.catalog, ctx.predicates, ctx.world);
        if !evaluator.satisfied(tree, event.v1, event.v2, event.actor, event.target) {
            return false;
        }
    }

    fail_condition_holds(ctx.world, criterion, event.actor)
}

/// Team restriction on the tree and every ancestor.
fn tree_accepts(catalog: &CriteriaCatalog, index: usize, team: Option<Team>) -> bool {
    let mut current = Some(index);
    let mut steps = 0;
    while let Some(index) = current {
        if steps > catalog.tree_count() {
            break;
        }
        let node = catalog.tree(index);
        if !node.allows_team(team) {
            return false;
        }
        current = node.parent;
        steps += 1;
    }
    true
}

/// Criteria that fail on an event only accrue while that event is still possible.
fn fail_condition_holds(world: &dyn WorldQuery, criterion: &AtomicCriterion, actor: ActorId) -> bool {
    match criterion.fail_event {
        None => true,
        Some(FailEvent::Death) => world.is_alive(actor),
        Some(FailEvent::LeaveBattleground) => {
            world.in_battleground(actor)
                && (criterion.fail_asset == 0 || world.map(actor) == criterion.fail_asset)
        }
        Some(FailEvent::LeaveInstance) => world.in_instance(actor),
        Some(FailEvent::LeaveGroup) => world.group_size(actor) > 1,
    }
}

/// Applies a counter change and runs timer bookkeeping; true if the record changed.
fn set_criterion_progress(
    ctx: &CriteriaContext<'_>,
    state: &mut ActorCriteria,
    criterion: &AtomicCriterion,
    value: u64,
    mode: UpdateMode,
    source: ActorId,
    observer: &mut dyn CriteriaObserver,
) -> bool {
    let trees = ctx.catalog.trees_for_criterion(criterion.id);
    let timer = criterion.timer;
    if timer.is_some()
        && !trees
            .iter()
            .any(|&index| state.timers.contains(ctx.catalog.tree(index).id))
    {
        debug!(
            "dropping progress for timed criterion {} without a running timer",
            criterion.id.0
        );
        return false;
    }

    let counter = match state.progress.apply(
        criterion.id,
        value,
        mode,
        source,
        ctx.clock.now,
        timer.is_some(),
    ) {
        ProgressChange::Unchanged => return false,
        ProgressChange::Updated(counter) => counter,
    };

    let mut elapsed_ms = None;
    let mut timer_completed = false;
    if let Some(timer) = timer {
        let team = ctx.world.team(state.actor);
        let mut finished = Vec::new();
        {
            let evaluator = CompletionEvaluator::new(ctx.catalog, &state.progress, team);
            for &index in trees {
                let tree = ctx.catalog.tree(index).id;
                let Some(remaining) = state.timers.remaining(tree) else {
                    continue;
                };
                elapsed_ms = Some(timer.duration_ms().saturating_sub(remaining));
                if evaluator.is_complete(index) {
                    finished.push(tree);
                }
            }
        }
        for tree in finished {
            state.timers.remove(tree);
            timer_completed = true;
        }
    }

    observer.on_notice(CriteriaNotice::ProgressChanged {
        actor: state.actor,
        criterion: criterion.id,
        counter,
        elapsed_ms,
        timer_completed,
    });
    true
}

/// Re-checks every tree touched by a criterion, leaf first.
fn report_tree_updates(
    ctx: &CriteriaContext<'_>,
    state: &mut ActorCriteria,
    criterion: CriterionId,
    observer: &mut dyn CriteriaObserver,
) {
    let team = ctx.world.team(state.actor);
    let touched: Vec<(TreeId, bool)> = {
        let evaluator = CompletionEvaluator::new(ctx.catalog, &state.progress, team);
        ctx.catalog
            .touched_trees(criterion)
            .iter()
            .map(|&index| {
                let tree = ctx.catalog.tree(index).id;
                let newly_complete = !state.is_reported(tree) && evaluator.is_complete(index);
                (tree, newly_complete)
            })
            .collect()
    };

    for (tree, newly_complete) in touched {
        if newly_complete && state.mark_reported(tree) {
            observer.on_notice(CriteriaNotice::TreeCompleted {
                tree,
                actor: state.actor,
            });
        }
        observer.on_notice(CriteriaNotice::TreeUpdated {
            tree,
            actor: state.actor,
        });
    }
}

fn remove_criterion_progress(
    state: &mut ActorCriteria,
    criterion: CriterionId,
    observer: &mut dyn CriteriaObserver,
) {
    if state.progress.remove(criterion) {
        observer.on_notice(CriteriaNotice::ProgressRemoved {
            actor: state.actor,
            criterion,
        });
    }
}

/// Starts countdowns for criteria timed by `(start_event, asset)`.
pub fn start_criteria_timer(
    ctx: &CriteriaContext<'_>,
    state: &mut ActorCriteria,
    start_event: TimerStartEvent,
    asset: u32,
    already_elapsed_ms: u32,
    observer: &mut dyn CriteriaObserver,
) {
    let team = ctx.world.team(state.actor);
    for &id in ctx.catalog.timed_criteria(start_event) {
        let Some(criterion) = ctx.catalog.criterion(id) else {
            continue;
        };
        let Some(timer) = criterion.timer else {
            continue;
        };
        if timer.start_asset != asset
            || !criterion.scopes.contains(&ctx.scope)
            || ctx.catalog.is_disabled(id)
        {
            continue;
        }

        let duration = timer.duration_ms();
        let mut started = false;
        {
            let evaluator = CompletionEvaluator::new(ctx.catalog, &state.progress, team);
            for &index in ctx.catalog.trees_for_criterion(id) {
                let tree = ctx.catalog.tree(index).id;
                if state.timers.contains(tree) || evaluator.is_complete(index) {
                    continue;
                }
                if duration > already_elapsed_ms {
                    state.timers.start(tree, duration - already_elapsed_ms);
                    started = true;
                }
            }
        }
        if !started {
            continue;
        }

        let actor = state.actor;
        set_criterion_progress(ctx, state, criterion, 0, UpdateMode::Set, actor, observer);
    }
}

/// Cancels countdowns for `(start_event, asset)` and discards their progress.
pub fn remove_criteria_timer(
    ctx: &CriteriaContext<'_>,
    state: &mut ActorCriteria,
    start_event: TimerStartEvent,
    asset: u32,
    observer: &mut dyn CriteriaObserver,
) {
    for &id in ctx.catalog.timed_criteria(start_event) {
        let Some(criterion) = ctx.catalog.criterion(id) else {
            continue;
        };
        if criterion.timer.map(|timer| timer.start_asset) != Some(asset) {
            continue;
        }
        for &index in ctx.catalog.trees_for_criterion(id) {
            state.timers.remove(ctx.catalog.tree(index).id);
        }
        remove_criterion_progress(state, id, observer);
    }
}

/// Advances every running countdown; expired ones lose their progress.
pub fn update_timed_criteria(
    catalog: &CriteriaCatalog,
    state: &mut ActorCriteria,
    elapsed_ms: u32,
    observer: &mut dyn CriteriaObserver,
) {
    for tree in state.timers.advance(elapsed_ms) {
        let criterion = catalog
            .tree_index(tree)
            .and_then(|index| catalog.tree(index).criterion);
        match criterion {
            Some(criterion) => remove_criterion_progress(state, criterion, observer),
            None => debug!("expired timer on tree {} without a criterion", tree.0),
        }
    }
}

/// Drops progress of criteria that fail on `fail_event`.
pub fn reset_criteria(
    ctx: &CriteriaContext<'_>,
    state: &mut ActorCriteria,
    fail_event: FailEvent,
    fail_asset: u32,
    even_if_complete: bool,
    observer: &mut dyn CriteriaObserver,
) {
    let team = ctx.world.team(state.actor);
    let mut doomed = Vec::new();
    {
        let evaluator = CompletionEvaluator::new(ctx.catalog, &state.progress, team);
        for &id in ctx.catalog.criteria_with_fail_event(fail_event) {
            let Some(criterion) = ctx.catalog.criterion(id) else {
                continue;
            };
            if fail_asset != 0 && criterion.fail_asset != 0 && criterion.fail_asset != fail_asset {
                continue;
            }
            let trees = ctx.catalog.trees_for_criterion(id);
            let all_complete = trees.iter().all(|&index| evaluator.is_complete(index));
            if all_complete && !even_if_complete {
                continue;
            }
            doomed.push(id);
        }
    }
    for id in doomed {
        remove_criterion_progress(state, id, observer);
    }
}

/// Administrative wipe of every record, timer and reported completion.
pub fn reset_all(state: &mut ActorCriteria, observer: &mut dyn CriteriaObserver) {
    state.timers.clear();
    state.clear_reported();
    for criterion in state.progress.clear() {
        observer.on_notice(CriteriaNotice::ProgressRemoved {
            actor: state.actor,
            criterion,
        });
    }
}

/// Routes a queued command to the matching engine operation.
pub fn apply_command(
    ctx: &CriteriaContext<'_>,
    state: &mut ActorCriteria,
    command: &CriteriaCommand,
    observer: &mut dyn CriteriaObserver,
) {
    match *command {
        CriteriaCommand::Event(event) => update_criteria(ctx, state, &event, observer),
        CriteriaCommand::StartTimer {
            event,
            asset,
            already_elapsed_ms,
            ..
        } => start_criteria_timer(ctx, state, event, asset, already_elapsed_ms, observer),
        CriteriaCommand::StopTimer { event, asset, .. } => {
            remove_criteria_timer(ctx, state, event, asset, observer)
        }
        CriteriaCommand::Fail {
            event,
            asset,
            even_if_complete,
            ..
        } => reset_criteria(ctx, state, event, asset, even_if_complete, observer),
        CriteriaCommand::ResetAll { .. } => reset_all(state, observer),
    }
}

/// Exclusive system: drains the command queue against each actor's tracker.
///
/// The tracker is taken off its entity while the command runs so the world
/// stays readable through `EcsWorldQuery`.
pub fn criteria_event_system(world: &mut World) {
    let commands = match world.get_resource_mut::<CriteriaEventQueue>() {
        Some(mut queue) => queue.drain(),
        None => return,
    };
    if commands.is_empty() {
        return;
    }
    let Some(runtime) = world.get_resource::<CriteriaRuntime>().cloned() else {
        warn!("dropping {} criteria commands: no runtime", commands.len());
        return;
    };
    let clock = world
        .get_resource::<CriteriaClock>()
        .copied()
        .unwrap_or_default();

    let mut notices: Vec<CriteriaNotice> = Vec::new();
    for command in commands {
        let actor = command.actor();
        let Some(entity) = world
            .get_resource::<ActorIndex>()
            .and_then(|index| index.get(actor))
        else {
            debug!("no entity for {}", actor);
            continue;
        };
        let Some(mut state) = world
            .get_entity_mut(entity)
            .and_then(|mut entity| entity.take::<ActorCriteria>())
        else {
            debug!("{} has no criteria tracker", actor);
            continue;
        };
        {
            let query = EcsWorldQuery::new(world);
            let ctx = CriteriaContext {
                catalog: &runtime.catalog,
                rules: &runtime.rules,
                predicates: &runtime.predicates,
                world: &query,
                clock: &clock,
                scope: runtime.scope,
            };
            apply_command(&ctx, &mut state, &command, &mut notices);
        }
        world.entity_mut(entity).insert(state);
    }

    if let Some(mut log) = world.get_resource_mut::<CriteriaEventLog>() {
        log.0.extend(notices);
    }
}

/// System: counts running countdowns down by the tick delta.
pub fn timed_criteria_system(
    runtime: Option<Res<CriteriaRuntime>>,
    delta: Res<TickDelta>,
    mut log: ResMut<CriteriaEventLog>,
    mut actors: Query<&mut ActorCriteria>,
) {
    let Some(runtime) = runtime else {
        return;
    };
    if delta.0 == 0 {
        return;
    }
    for mut state in &mut actors {
        if state.timers.is_empty() {
            continue;
        }
        update_timed_criteria(&runtime.catalog, &mut state, delta.0, &mut *log);
    }
}
