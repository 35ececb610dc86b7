use crate::components::actor::ActorId;
use crate::simulation::tracker::ActorCriteria;

/// Durable storage for per-actor criteria state.
pub trait ProgressRepository {
    /// Loads an actor's tracker; an unknown actor yields an empty one.
    fn load_actor(&self, actor: ActorId) -> Result<ActorCriteria, Box<dyn std::error::Error>>;
    /// Writes pending changes and marks the tracker saved.
    fn save_actor(&mut self, state: &mut ActorCriteria) -> Result<(), Box<dyn std::error::Error>>;
    fn delete_actor(&mut self, actor: ActorId) -> Result<(), Box<dyn std::error::Error>>;
}
