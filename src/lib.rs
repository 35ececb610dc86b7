// Re-export core modules for use by the binary or other consumers
pub mod components;
pub mod core;
pub mod data;
pub mod rules;
pub mod simulation;
pub mod systems;
pub mod world;

// Expose the engine entry points needed for interaction
pub use crate::core::ecs::{CriteriaCommand, CriteriaEventQueue, CriteriaRuntime};
pub use crate::rules::{CriteriaEvent, CriterionType};
pub use crate::simulation::catalog::CriteriaCatalog;
pub use crate::simulation::notify::{CriteriaNotice, CriteriaObserver};
pub use crate::simulation::tracker::ActorCriteria;
pub use crate::systems::criteria::CriteriaContext;
