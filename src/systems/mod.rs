pub mod criteria;

pub use criteria::{
    apply_command, criteria_event_system, remove_criteria_timer, reset_all, reset_criteria,
    start_criteria_timer, timed_criteria_system, update_criteria, update_timed_criteria,
    CriteriaContext,
};
