pub mod criteria;
pub mod reference;
pub mod settings;

pub use criteria::{
    load_criteria_definitions, AtomicCriterion, CatalogDataError, CompletionTreeDef,
    CriteriaDefinitions, CriterionId, CriterionTimer, PredicateOperands, PredicateOperator,
    PredicateTreeDef, PredicateTreeId, TreeId, TreeOperator,
};
pub use reference::{load_reference_data, ReferenceData};
pub use settings::{load_tracker_settings, load_tracker_settings_or_default, TrackerSettings};
