use std::collections::HashSet;

use bevy_ecs::prelude::*;

use crate::components::actor::ActorId;
use crate::data::criteria::TreeId;
use crate::simulation::progress::ProgressStore;
use crate::simulation::timed::TimedCriteria;

/// Everything the engine tracks for one actor session.
#[derive(Component, Debug, Clone)]
pub struct ActorCriteria {
    pub actor: ActorId,
    pub progress: ProgressStore,
    pub timers: TimedCriteria,
    completed: HashSet<TreeId>,
    completed_dirty: bool,
}

impl ActorCriteria {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            progress: ProgressStore::default(),
            timers: TimedCriteria::default(),
            completed: HashSet::new(),
            completed_dirty: false,
        }
    }

    pub fn is_reported(&self, tree: TreeId) -> bool {
        self.completed.contains(&tree)
    }

    /// Records a completion; false if it was already reported.
    pub fn mark_reported(&mut self, tree: TreeId) -> bool {
        let inserted = self.completed.insert(tree);
        self.completed_dirty |= inserted;
        inserted
    }

    pub fn reported_trees(&self) -> impl Iterator<Item = TreeId> + '_ {
        self.completed.iter().copied()
    }

    /// Forgets every reported completion so the trees can be earned again.
    pub fn clear_reported(&mut self) {
        if !self.completed.is_empty() {
            self.completed.clear();
            self.completed_dirty = true;
        }
    }

    /// True when the reported set differs from what was last saved.
    pub fn completions_changed(&self) -> bool {
        self.completed_dirty
    }

    /// Restores completions loaded from storage.
    pub fn restore_reported(&mut self, trees: impl IntoIterator<Item = TreeId>) {
        self.completed.extend(trees);
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.completed_dirty
            || self.progress.unsaved_records().next().is_some()
            || self.progress.removed().next().is_some()
    }

    pub fn mark_saved(&mut self) {
        self.progress.mark_clean();
        self.completed_dirty = false;
    }

    /// Drops all session state; the caller persists first if it wants to keep it.
    pub fn end_session(&mut self) {
        self.progress = ProgressStore::default();
        self.timers.clear();
        self.completed.clear();
        self.completed_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::criteria::CriterionId;
    use crate::simulation::progress::UpdateMode;

    #[test]
    fn completions_are_reported_once() {
        let mut criteria = ActorCriteria::new(ActorId(7));
        assert!(criteria.mark_reported(TreeId(1)));
        assert!(!criteria.mark_reported(TreeId(1)));
        assert!(criteria.is_reported(TreeId(1)));
        assert!(criteria.has_unsaved_changes());
        criteria.mark_saved();
        assert!(!criteria.has_unsaved_changes());
    }

    #[test]
    fn clearing_completions_marks_them_unsaved() {
        let mut criteria = ActorCriteria::new(ActorId(7));
        criteria.clear_reported();
        assert!(!criteria.has_unsaved_changes());

        criteria.mark_reported(TreeId(1));
        criteria.mark_saved();
        criteria.clear_reported();
        assert!(!criteria.is_reported(TreeId(1)));
        assert!(criteria.completions_changed());
        assert!(criteria.mark_reported(TreeId(1)));
    }

    #[test]
    fn end_session_clears_everything() {
        let mut criteria = ActorCriteria::new(ActorId(7));
        criteria
            .progress
            .apply(CriterionId(1), 3, UpdateMode::Set, ActorId(7), 0, false);
        criteria.timers.start(TreeId(2), 1_000);
        criteria.mark_reported(TreeId(3));

        criteria.end_session();

        assert!(criteria.progress.is_empty());
        assert!(criteria.timers.is_empty());
        assert!(!criteria.is_reported(TreeId(3)));
        assert!(!criteria.has_unsaved_changes());
    }
}
