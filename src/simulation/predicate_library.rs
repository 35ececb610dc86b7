use crate::components::actor::{ActorId, Team};
use crate::data::criteria::PredicateTreeId;
use crate::rules::predicate_kind::PredicateKind;
use crate::simulation::predicates::{PredicateContext, PredicateRegistry};
use crate::simulation::world_query::WorldQuery;

/// Operands are stored signed; negative ids never match anything.
fn id(operand: i64) -> Option<u32> {
    u32::try_from(operand).ok()
}

fn at_least(value: u64, operand: i64) -> bool {
    operand <= 0 || value >= operand as u64
}

fn target_check(ctx: &PredicateContext<'_>, check: impl FnOnce(&dyn WorldQuery, ActorId) -> bool) -> bool {
    match ctx.target {
        Some(target) if ctx.world.is_valid_actor(target) => check(ctx.world, target),
        _ => false,
    }
}

fn team_code(team: Option<Team>) -> i64 {
    match team {
        Some(Team::Alliance) => 0,
        Some(Team::Horde) => 1,
        None => -1,
    }
}

pub fn register_all(registry: &mut PredicateRegistry) {
    register_target_checks(registry);
    register_actor_checks(registry);
    register_inventory_checks(registry);
    register_progression_checks(registry);
    register_event_checks(registry);
}

fn register_target_checks(registry: &mut PredicateRegistry) {
    registry.register(PredicateKind::TARGET_CREATURE_ENTRY, |ctx| {
        target_check(ctx, |world, target| {
            world
                .creature_entry(target)
                .is_some_and(|entry| Some(entry) == id(ctx.operands.primary))
        })
    });
    registry.register(PredicateKind::TARGET_IS_PLAYER, |ctx| {
        target_check(ctx, |world, target| world.is_player(target))
    });
    registry.register(PredicateKind::TARGET_IS_DEAD, |ctx| {
        target_check(ctx, |world, target| !world.is_alive(target))
    });
    registry.register(PredicateKind::TARGET_IS_OPPOSING_TEAM, |ctx| {
        let own = ctx.world.team(ctx.actor);
        target_check(ctx, |world, target| {
            let theirs = world.team(target);
            own.is_some() && theirs.is_some() && own != theirs
        })
    });
    registry.register(PredicateKind::TARGET_IS_ALLIED_TEAM, |ctx| {
        let own = ctx.world.team(ctx.actor);
        target_check(ctx, |world, target| own.is_some() && world.team(target) == own)
    });
    registry.register(PredicateKind::TARGET_HAS_AURA, |ctx| {
        let Some(spell) = id(ctx.operands.primary) else {
            return false;
        };
        target_check(ctx, |world, target| world.has_aura(target, spell))
    });
    registry.register(PredicateKind::TARGET_IN_AREA, |ctx| {
        let Some(area) = id(ctx.operands.primary) else {
            return false;
        };
        target_check(ctx, |world, target| world.zone(target) == area || world.area(target) == area)
    });
    registry.register(PredicateKind::TARGET_LEVEL_AT_LEAST, |ctx| {
        target_check(ctx, |world, target| i64::from(world.level(target)) >= ctx.operands.primary)
    });
    registry.register(PredicateKind::TARGET_LEVEL_EQUALS, |ctx| {
        target_check(ctx, |world, target| i64::from(world.level(target)) == ctx.operands.primary)
    });
    registry.register(PredicateKind::TARGET_LEVEL_AT_MOST, |ctx| {
        target_check(ctx, |world, target| i64::from(world.level(target)) <= ctx.operands.primary)
    });
    registry.register(PredicateKind::TARGET_CLASS, |ctx| {
        target_check(ctx, |world, target| i64::from(world.class(target)) == ctx.operands.primary)
    });
    registry.register(PredicateKind::TARGET_RACE, |ctx| {
        target_check(ctx, |world, target| i64::from(world.race(target)) == ctx.operands.primary)
    });
    registry.register(PredicateKind::TARGET_HEALTH_PCT_BELOW, |ctx| {
        target_check(ctx, |world, target| i64::from(world.health_pct(target)) < ctx.operands.primary)
    });
    registry.register(PredicateKind::TARGET_CREATURE_TYPE, |ctx| {
        target_check(ctx, |world, target| {
            world
                .creature_type(target)
                .is_some_and(|creature_type| i64::from(creature_type) == ctx.operands.primary)
        })
    });
}

fn register_actor_checks(registry: &mut PredicateRegistry) {
    registry.register(PredicateKind::ACTOR_HAS_AURA, |ctx| {
        id(ctx.operands.primary).is_some_and(|spell| ctx.world.has_aura(ctx.actor, spell))
    });
    registry.register(PredicateKind::ACTOR_IS_ALIVE, |ctx| ctx.world.is_alive(ctx.actor));
    registry.register(PredicateKind::ACTOR_IN_AREA, |ctx| {
        id(ctx.operands.primary).is_some_and(|area| {
            ctx.world.zone(ctx.actor) == area || ctx.world.area(ctx.actor) == area
        })
    });
    registry.register(PredicateKind::ACTOR_IN_ZONE, |ctx| {
        id(ctx.operands.primary).is_some_and(|zone| ctx.world.zone(ctx.actor) == zone)
    });
    registry.register(PredicateKind::ACTOR_ON_MAP, |ctx| {
        id(ctx.operands.primary).is_some_and(|map| ctx.world.map(ctx.actor) == map)
    });
    registry.register(PredicateKind::ACTOR_CLASS, |ctx| {
        i64::from(ctx.world.class(ctx.actor)) == ctx.operands.primary
    });
    registry.register(PredicateKind::ACTOR_RACE, |ctx| {
        i64::from(ctx.world.race(ctx.actor)) == ctx.operands.primary
    });
    registry.register(PredicateKind::ACTOR_GENDER, |ctx| {
        i64::from(ctx.world.gender(ctx.actor)) == ctx.operands.primary
    });
    registry.register(PredicateKind::ACTOR_HEALTH_PCT_BELOW, |ctx| {
        i64::from(ctx.world.health_pct(ctx.actor)) < ctx.operands.primary
    });
    registry.register(PredicateKind::GROUP_SIZE_AT_LEAST, |ctx| {
        i64::from(ctx.world.group_size(ctx.actor)) >= ctx.operands.primary
    });
    registry.register(PredicateKind::ACTOR_IN_INSTANCE, |ctx| ctx.world.in_instance(ctx.actor));
    registry.register(PredicateKind::ACTOR_IN_BATTLEGROUND, |ctx| {
        ctx.world.in_battleground(ctx.actor)
    });
    registry.register(PredicateKind::ACTOR_TEAM, |ctx| {
        team_code(ctx.world.team(ctx.actor)) == ctx.operands.primary
    });
    registry.register(PredicateKind::ACTOR_LEVEL_AT_LEAST, |ctx| {
        i64::from(ctx.world.level(ctx.actor)) >= ctx.operands.primary
    });
    registry.register(PredicateKind::ACTOR_LEVEL_AT_MOST, |ctx| {
        i64::from(ctx.world.level(ctx.actor)) <= ctx.operands.primary
    });
    registry.register(PredicateKind::ACTOR_IN_COMBAT, |ctx| ctx.world.in_combat(ctx.actor));
    registry.register(PredicateKind::ACTOR_NOT_IN_COMBAT, |ctx| !ctx.world.in_combat(ctx.actor));
    registry.register(PredicateKind::ACTOR_MOUNTED, |ctx| ctx.world.is_mounted(ctx.actor));
    registry.register(PredicateKind::ACTOR_KNOWS_SPELL, |ctx| {
        id(ctx.operands.primary).is_some_and(|spell| ctx.world.knows_spell(ctx.actor, spell))
    });
    registry.register(PredicateKind::ACTOR_HAS_TITLE, |ctx| {
        id(ctx.operands.primary).is_some_and(|title| ctx.world.has_title(ctx.actor, title))
    });
}

fn register_inventory_checks(registry: &mut PredicateRegistry) {
    // Item-quality checks look at the item carried in the event's first value.
    registry.register(PredicateKind::ITEM_QUALITY_AT_LEAST, |ctx| {
        let Ok(item) = u32::try_from(ctx.misc1) else {
            return false;
        };
        ctx.world
            .item_quality(item)
            .is_some_and(|quality| i64::from(quality) >= ctx.operands.primary)
    });
    registry.register(PredicateKind::ITEM_QUALITY_EQUALS, |ctx| {
        let Ok(item) = u32::try_from(ctx.misc1) else {
            return false;
        };
        ctx.world
            .item_quality(item)
            .is_some_and(|quality| i64::from(quality) == ctx.operands.primary)
    });
    registry.register(PredicateKind::ACTOR_HAS_ITEM, |ctx| {
        id(ctx.operands.primary).is_some_and(|item| {
            let count = u64::from(ctx.world.item_count(ctx.actor, item));
            count >= 1 && at_least(count, ctx.operands.secondary)
        })
    });
    registry.register(PredicateKind::MONEY_AT_LEAST, |ctx| {
        at_least(ctx.world.money(ctx.actor), ctx.operands.primary)
    });
}

fn register_progression_checks(registry: &mut PredicateRegistry) {
    registry.register(PredicateKind::QUEST_REWARDED, |ctx| {
        id(ctx.operands.primary).is_some_and(|quest| ctx.world.is_quest_rewarded(ctx.actor, quest))
    });
    registry.register(PredicateKind::QUEST_NOT_REWARDED, |ctx| {
        id(ctx.operands.primary).is_some_and(|quest| !ctx.world.is_quest_rewarded(ctx.actor, quest))
    });
    registry.register(PredicateKind::REPUTATION_AT_LEAST, |ctx| {
        id(ctx.operands.primary).is_some_and(|faction| {
            i64::from(ctx.world.reputation_standing(ctx.actor, faction)) >= ctx.operands.secondary
        })
    });
    registry.register(PredicateKind::SKILL_AT_LEAST, |ctx| {
        id(ctx.operands.primary).is_some_and(|skill| {
            i64::from(ctx.world.skill_value(ctx.actor, skill)) >= ctx.operands.secondary
        })
    });
    registry.register(PredicateKind::ACHIEVEMENT_EARNED, |ctx| {
        id(ctx.operands.primary).is_some_and(|achievement| ctx.world.has_achieved(ctx.actor, achievement))
    });
    registry.register(PredicateKind::NESTED_TREE, |ctx| {
        id(ctx.operands.primary).is_some_and(|tree| ctx.nested(PredicateTreeId(tree)))
    });
}

fn register_event_checks(registry: &mut PredicateRegistry) {
    registry.register(PredicateKind::MISC_VALUE1_EQUALS, |ctx| {
        i64::try_from(ctx.misc1).is_ok_and(|value| value == ctx.operands.primary)
    });
    registry.register(PredicateKind::MISC_VALUE2_EQUALS, |ctx| {
        i64::try_from(ctx.misc2).is_ok_and(|value| value == ctx.operands.primary)
    });
    registry.register(PredicateKind::MISC_VALUE1_AT_LEAST, |ctx| at_least(ctx.misc1, ctx.operands.primary));
    registry.register(PredicateKind::WORLD_EVENT_ACTIVE, |ctx| {
        id(ctx.operands.primary).is_some_and(|event| ctx.world.is_world_event_active(event))
    });
}
