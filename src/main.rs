use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use bevy_ecs::prelude::*;

use milestone_tracker::components::actor::{ActorId, ActorProfile, QuestLog, Team};
use milestone_tracker::core::ecs::{
    attach_criteria, create_schedule, create_world, end_session, spawn_actor, ActorIndex,
    CriteriaCommand, CriteriaEventQueue, CriteriaRuntime,
};
use milestone_tracker::data::{
    load_criteria_definitions, load_reference_data, load_tracker_settings_or_default,
    ReferenceData,
};
use milestone_tracker::rules::{CriteriaEvent, CriterionType, FailEvent, TimerStartEvent};
use milestone_tracker::simulation::catalog::CriteriaCatalog;
use milestone_tracker::simulation::notify::{CriteriaEventLog, CriteriaNotice};
use milestone_tracker::simulation::time::{CriteriaClock, TickDelta};
use milestone_tracker::simulation::tracker::ActorCriteria;
use milestone_tracker::world::SqliteProgressDb;

const DEMO_ACTOR: ActorId = ActorId(1);
const COMMANDS: &str = "Commands: event <type> [v1 v2 v3] [target] | tick <ms> | timer <start|stop> <event> <asset> | fail <event> [asset] | level <n> | reward <quest> | status | save | reset | quit";

struct Paths {
    catalog: PathBuf,
    settings: PathBuf,
    reference: PathBuf,
    db: PathBuf,
}

fn main() {
    println!("Initializing Milestone Tracker (Criteria Debug)...");
    let paths = parse_paths(env::args().collect());

    let definitions = match load_criteria_definitions(&paths.catalog) {
        Ok(definitions) => definitions,
        Err(err) => {
            eprintln!("Failed to load criteria catalog: {}", err);
            std::process::exit(1);
        }
    };
    let settings = load_tracker_settings_or_default(&paths.settings);
    let reference = match load_reference_data(&paths.reference) {
        Ok(reference) => reference,
        Err(err) => {
            eprintln!("Reference data unavailable: {}", err);
            ReferenceData::default()
        }
    };
    let mut db = match SqliteProgressDb::open(&paths.db) {
        Ok(db) => db,
        Err(err) => {
            eprintln!("Failed to open progress db {}: {}", paths.db.display(), err);
            std::process::exit(1);
        }
    };

    let catalog = CriteriaCatalog::from_definitions(definitions);
    println!(
        "Catalog: criteria={}, trees={}, scope={:?}",
        catalog.criteria_count(),
        catalog.tree_count(),
        settings.scope
    );
    let runtime = CriteriaRuntime::new(catalog, settings.scope);
    let mut world = create_world(runtime, &settings, reference);
    let mut schedule = create_schedule();

    let entity = spawn_actor(
        &mut world,
        DEMO_ACTOR,
        ActorProfile {
            level: 1,
            race: 1,
            class: 1,
            gender: 0,
            team: Team::Alliance,
        },
    );
    match db.load_actor(DEMO_ACTOR) {
        Ok(criteria) => {
            println!("Restored {} criterion records", criteria.progress.len());
            attach_criteria(&mut world, criteria);
        }
        Err(err) => eprintln!("Failed to restore progress: {}", err),
    }

    println!("{}", COMMANDS);
    loop {
        print!("> ");
        io::stdout().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or("").to_lowercase();
        let args: Vec<&str> = parts.collect();

        match cmd.as_str() {
            "quit" | "exit" => break,
            "help" => println!("{}", COMMANDS),
            "event" => match parse_event(&args) {
                Some(event) => {
                    queue(&mut world, CriteriaCommand::Event(event));
                    run_tick(&mut world, &mut schedule, 0);
                }
                None => println!("Usage: event <type> [v1 v2 v3] [target]"),
            },
            "tick" => match args.first().and_then(|raw| raw.parse::<u32>().ok()) {
                Some(ms) => run_tick(&mut world, &mut schedule, ms),
                None => println!("Usage: tick <ms>"),
            },
            "timer" => {
                let action = args.first().copied().unwrap_or("");
                let event = args.get(1).and_then(|raw| raw.parse::<TimerStartEvent>().ok());
                let asset = args.get(2).and_then(|raw| raw.parse::<u32>().ok());
                match (action, event, asset) {
                    ("start", Some(event), Some(asset)) => {
                        queue(
                            &mut world,
                            CriteriaCommand::StartTimer {
                                actor: DEMO_ACTOR,
                                event,
                                asset,
                                already_elapsed_ms: 0,
                            },
                        );
                        run_tick(&mut world, &mut schedule, 0);
                    }
                    ("stop", Some(event), Some(asset)) => {
                        queue(
                            &mut world,
                            CriteriaCommand::StopTimer {
                                actor: DEMO_ACTOR,
                                event,
                                asset,
                            },
                        );
                        run_tick(&mut world, &mut schedule, 0);
                    }
                    _ => println!("Usage: timer <start|stop> <event> <asset>"),
                }
            }
            "fail" => match args.first().and_then(|raw| raw.parse::<FailEvent>().ok()) {
                Some(event) => {
                    let asset = args
                        .get(1)
                        .and_then(|raw| raw.parse::<u32>().ok())
                        .unwrap_or(0);
                    queue(
                        &mut world,
                        CriteriaCommand::Fail {
                            actor: DEMO_ACTOR,
                            event,
                            asset,
                            even_if_complete: false,
                        },
                    );
                    run_tick(&mut world, &mut schedule, 0);
                }
                None => println!("Usage: fail <event> [asset]"),
            },
            "level" => match args.first().and_then(|raw| raw.parse::<u32>().ok()) {
                Some(level) => {
                    if let Some(mut profile) = world.get_mut::<ActorProfile>(entity) {
                        profile.level = level;
                    }
                    println!("Level set to {}", level);
                }
                None => println!("Usage: level <n>"),
            },
            "reward" => match args.first().and_then(|raw| raw.parse::<u32>().ok()) {
                Some(quest) => {
                    if let Some(mut log) = world.get_mut::<QuestLog>(entity) {
                        log.rewarded.insert(quest);
                    }
                    println!("Quest {} rewarded", quest);
                }
                None => println!("Usage: reward <quest>"),
            },
            "reset" => {
                queue(&mut world, CriteriaCommand::ResetAll { actor: DEMO_ACTOR });
                run_tick(&mut world, &mut schedule, 0);
            }
            "status" => print_status(&world, entity),
            "save" => match world.get_mut::<ActorCriteria>(entity) {
                Some(mut criteria) => match db.save_actor(&mut criteria) {
                    Ok(()) => println!("Saved."),
                    Err(err) => println!("Save failed: {}", err),
                },
                None => println!("No criteria tracker attached."),
            },
            _ => println!("Unknown command: {}", cmd),
        }
    }

    if let Some(mut criteria) = end_session(&mut world, DEMO_ACTOR) {
        if criteria.has_unsaved_changes() {
            if let Err(err) = db.save_actor(&mut criteria) {
                eprintln!("Failed to save on exit: {}", err);
            }
        }
    }
}

fn parse_paths(args: Vec<String>) -> Paths {
    let mut iter = args.iter();
    let mut paths = Paths {
        catalog: PathBuf::from("./assets/data/criteria_catalog.json"),
        settings: PathBuf::from("./assets/data/tracker_settings.json"),
        reference: PathBuf::from("./assets/data/reference.json"),
        db: PathBuf::from("./assets/db/progress.db"),
    };
    while let Some(arg) = iter.next() {
        let slot = match arg.as_str() {
            "--catalog" => &mut paths.catalog,
            "--settings" => &mut paths.settings,
            "--reference" => &mut paths.reference,
            "--db" => &mut paths.db,
            _ => continue,
        };
        if let Some(value) = iter.next() {
            *slot = PathBuf::from(value);
        }
    }
    paths
}

fn parse_event(args: &[&str]) -> Option<CriteriaEvent> {
    let criterion_type = CriterionType(args.first()?.parse::<u16>().ok()?);
    let mut values = [0u64; 3];
    for (slot, raw) in values.iter_mut().zip(args.iter().skip(1)) {
        *slot = raw.parse().ok()?;
    }
    let mut event =
        CriteriaEvent::new(criterion_type, DEMO_ACTOR).with_values(values[0], values[1], values[2]);
    if let Some(target) = args.get(4) {
        event = event.with_target(ActorId(target.parse().ok()?));
    }
    Some(event)
}

fn queue(world: &mut World, command: CriteriaCommand) {
    world.resource_mut::<CriteriaEventQueue>().push(command);
}

fn run_tick(world: &mut World, schedule: &mut Schedule, elapsed_ms: u32) {
    world.insert_resource(TickDelta(elapsed_ms));
    schedule.run(world);
    world.insert_resource(TickDelta(0));
    for notice in world.resource_mut::<CriteriaEventLog>().drain() {
        print_notice(&notice);
    }
}

fn print_notice(notice: &CriteriaNotice) {
    match notice {
        CriteriaNotice::ProgressChanged {
            criterion,
            counter,
            elapsed_ms,
            timer_completed,
            ..
        } => match elapsed_ms {
            Some(elapsed) => println!(
                "  criterion {} -> {} (timer {}ms{})",
                criterion.0,
                counter,
                elapsed,
                if *timer_completed { ", done" } else { "" }
            ),
            None => println!("  criterion {} -> {}", criterion.0, counter),
        },
        CriteriaNotice::ProgressRemoved { criterion, .. } => {
            println!("  criterion {} removed", criterion.0)
        }
        CriteriaNotice::TreeCompleted { tree, .. } => println!("  tree {} COMPLETE", tree.0),
        CriteriaNotice::TreeUpdated { .. } => {}
    }
}

fn print_status(world: &World, entity: Entity) {
    println!("Clock: {}", world.resource::<CriteriaClock>());
    println!("Actors: {}", world.resource::<ActorIndex>().len());
    let Some(criteria) = world.get::<ActorCriteria>(entity) else {
        println!("No criteria tracker attached.");
        return;
    };
    let mut records: Vec<_> = criteria.progress.iter().collect();
    records.sort_by_key(|(id, _)| *id);
    for (id, record) in records {
        println!(
            "  criterion {}: {} (updated {}{})",
            id.0,
            record.counter,
            record.updated_at,
            if record.unsaved { ", unsaved" } else { "" }
        );
    }
    let mut timers: Vec<_> = criteria.timers.iter().collect();
    timers.sort();
    for (tree, remaining) in timers {
        println!("  timer on tree {}: {}ms left", tree.0, remaining);
    }
    let mut completed: Vec<_> = criteria.reported_trees().collect();
    completed.sort();
    if !completed.is_empty() {
        let ids: Vec<String> = completed.iter().map(|tree| tree.0.to_string()).collect();
        println!("  completed trees: {}", ids.join(", "));
    }
}
