pub mod completion_rules;
pub mod criterion_type;
pub mod event;
pub mod predicate_kind;
pub mod progress_rules;

pub use completion_rules::criterion_complete;
pub use criterion_type::{CriterionScope, CriterionType, FailEvent, ParseKeywordError, TimerStartEvent};
pub use event::CriteriaEvent;
pub use predicate_kind::PredicateKind;
pub use progress_rules::{CriterionRule, ProgressRule, ProgressRules, Requirement, RuleInput};
