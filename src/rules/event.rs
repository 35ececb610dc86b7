use serde::{Deserialize, Serialize};

use crate::components::actor::ActorId;
use crate::rules::criterion_type::CriterionType;

/// One domain event offered to the criteria engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaEvent {
    #[serde(rename = "type")]
    pub criterion_type: CriterionType,
    #[serde(default)]
    pub v1: u64,
    #[serde(default)]
    pub v2: u64,
    #[serde(default)]
    pub v3: u64,
    pub actor: ActorId,
    #[serde(default)]
    pub target: Option<ActorId>,
}

impl CriteriaEvent {
    pub fn new(criterion_type: CriterionType, actor: ActorId) -> Self {
        Self {
            criterion_type,
            v1: 0,
            v2: 0,
            v3: 0,
            actor,
            target: None,
        }
    }

    pub fn with_values(mut self, v1: u64, v2: u64, v3: u64) -> Self {
        self.v1 = v1;
        self.v2 = v2;
        self.v3 = v3;
        self
    }

    pub fn with_target(mut self, target: ActorId) -> Self {
        self.target = Some(target);
        self
    }
}
