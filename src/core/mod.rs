pub mod ecs;
pub mod query;

pub use ecs::{
    attach_criteria, create_schedule, create_world, end_session, spawn_actor, ActorIndex,
    CriteriaCommand, CriteriaEventQueue, CriteriaRuntime, CriteriaSet,
};
pub use query::EcsWorldQuery;
