use bevy_ecs::prelude::*;

use crate::components::actor::ActorId;
use crate::data::criteria::{CriterionId, TreeId};

/// Outbound messages produced while processing criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriteriaNotice {
    ProgressChanged {
        actor: ActorId,
        criterion: CriterionId,
        counter: u64,
        /// Set for timer-gated criteria with a running countdown.
        elapsed_ms: Option<u32>,
        timer_completed: bool,
    },
    ProgressRemoved {
        actor: ActorId,
        criterion: CriterionId,
    },
    TreeCompleted {
        tree: TreeId,
        actor: ActorId,
    },
    /// Post-update hook, fired for every touched tree whether complete or not.
    TreeUpdated {
        tree: TreeId,
        actor: ActorId,
    },
}

pub trait CriteriaObserver {
    fn on_notice(&mut self, notice: CriteriaNotice);
}

impl CriteriaObserver for Vec<CriteriaNotice> {
    fn on_notice(&mut self, notice: CriteriaNotice) {
        self.push(notice);
    }
}

/// Resource collecting notices for collaborators (rewards, network, UI).
#[derive(Resource, Debug, Default)]
pub struct CriteriaEventLog(pub Vec<CriteriaNotice>);

impl CriteriaObserver for CriteriaEventLog {
    fn on_notice(&mut self, notice: CriteriaNotice) {
        self.0.push(notice);
    }
}

impl CriteriaEventLog {
    pub fn drain(&mut self) -> Vec<CriteriaNotice> {
        std::mem::take(&mut self.0)
    }
}
