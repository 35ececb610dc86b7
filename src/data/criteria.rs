use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::actor::Team;
use crate::rules::criterion_type::{CriterionScope, CriterionType, FailEvent, TimerStartEvent};
use crate::rules::predicate_kind::PredicateKind;

const CRITERIA_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriterionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredicateTreeId(pub u32);

/// Countdown attached to a criterion; progress only counts while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionTimer {
    pub start_event: TimerStartEvent,
    #[serde(default)]
    pub start_asset: u32,
    pub duration_secs: u32,
}

impl CriterionTimer {
    pub fn duration_ms(&self) -> u32 {
        self.duration_secs.saturating_mul(1000)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomicCriterion {
    pub id: CriterionId,
    #[serde(rename = "type")]
    pub criterion_type: CriterionType,
    #[serde(default)]
    pub asset: u32,
    #[serde(default)]
    pub predicate_tree: Option<PredicateTreeId>,
    #[serde(default)]
    pub timer: Option<CriterionTimer>,
    #[serde(default)]
    pub fail_event: Option<FailEvent>,
    #[serde(default)]
    pub fail_asset: u32,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<CriterionScope>,
}

fn default_scopes() -> Vec<CriterionScope> {
    vec![CriterionScope::Individual]
}

/// Completion tree combinator, stored as its numeric data code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum TreeOperator {
    Complete,
    NotComplete,
    CompleteAll,
    Sum,
    Highest,
    StartedAtLeast,
    CompleteAtLeast,
    ProgressBar,
    Unknown(u8),
}

impl From<u8> for TreeOperator {
    fn from(code: u8) -> Self {
        match code {
            0 => TreeOperator::Complete,
            1 => TreeOperator::NotComplete,
            4 => TreeOperator::CompleteAll,
            5 => TreeOperator::Sum,
            6 => TreeOperator::Highest,
            7 => TreeOperator::StartedAtLeast,
            8 => TreeOperator::CompleteAtLeast,
            9 => TreeOperator::ProgressBar,
            other => TreeOperator::Unknown(other),
        }
    }
}

impl From<TreeOperator> for u8 {
    fn from(op: TreeOperator) -> Self {
        match op {
            TreeOperator::Complete => 0,
            TreeOperator::NotComplete => 1,
            TreeOperator::CompleteAll => 4,
            TreeOperator::Sum => 5,
            TreeOperator::Highest => 6,
            TreeOperator::StartedAtLeast => 7,
            TreeOperator::CompleteAtLeast => 8,
            TreeOperator::ProgressBar => 9,
            TreeOperator::Unknown(code) => code,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionTreeDef {
    pub id: TreeId,
    #[serde(default)]
    pub parent: Option<TreeId>,
    pub operator: TreeOperator,
    #[serde(default)]
    pub amount: u64,
    #[serde(default)]
    pub criterion: Option<CriterionId>,
    #[serde(default)]
    pub order: i32,
    /// Restricts the node to actors of one team.
    #[serde(default)]
    pub team: Option<Team>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum PredicateOperator {
    SingleTrue,
    SingleFalse,
    All,
    Some,
    Unknown(u8),
}

impl From<u8> for PredicateOperator {
    fn from(code: u8) -> Self {
        match code {
            2 => PredicateOperator::SingleTrue,
            3 => PredicateOperator::SingleFalse,
            4 => PredicateOperator::All,
            8 => PredicateOperator::Some,
            other => PredicateOperator::Unknown(other),
        }
    }
}

impl From<PredicateOperator> for u8 {
    fn from(op: PredicateOperator) -> Self {
        match op {
            PredicateOperator::SingleTrue => 2,
            PredicateOperator::SingleFalse => 3,
            PredicateOperator::All => 4,
            PredicateOperator::Some => 8,
            PredicateOperator::Unknown(code) => code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PredicateOperands {
    #[serde(default)]
    pub primary: i64,
    #[serde(default)]
    pub secondary: i64,
    #[serde(default)]
    pub tertiary: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredicateTreeDef {
    pub id: PredicateTreeId,
    #[serde(default)]
    pub parent: Option<PredicateTreeId>,
    pub operator: PredicateOperator,
    /// Required match count for `Some`.
    #[serde(default)]
    pub amount: i32,
    #[serde(default)]
    pub kind: PredicateKind,
    #[serde(default)]
    pub operands: PredicateOperands,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriteriaDefinitions {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub criteria: Vec<AtomicCriterion>,
    #[serde(default)]
    pub trees: Vec<CompletionTreeDef>,
    #[serde(default)]
    pub predicates: Vec<PredicateTreeDef>,
    #[serde(default)]
    pub disabled_criteria: Vec<CriterionId>,
}

fn default_schema_version() -> u32 {
    CRITERIA_SCHEMA_VERSION
}

#[derive(Debug)]
pub enum CatalogDataError {
    Io { path: String, source: std::io::Error },
    Json { path: String, source: serde_json::Error },
    Validation(String),
}

impl std::fmt::Display for CatalogDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogDataError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path, source)
            }
            CatalogDataError::Json { path, source } => {
                write!(f, "failed to parse {}: {}", path, source)
            }
            CatalogDataError::Validation(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CatalogDataError {}

pub fn load_criteria_definitions(
    path: impl AsRef<Path>,
) -> Result<CriteriaDefinitions, CatalogDataError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| CatalogDataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let definitions: CriteriaDefinitions =
        serde_json::from_str(&raw).map_err(|source| CatalogDataError::Json {
            path: path.display().to_string(),
            source,
        })?;
    definitions.validate()?;
    Ok(definitions)
}

impl CriteriaDefinitions {
    pub fn validate(&self) -> Result<(), CatalogDataError> {
        if self.schema_version > CRITERIA_SCHEMA_VERSION {
            return Err(CatalogDataError::Validation(format!(
                "unsupported criteria schema version {}",
                self.schema_version
            )));
        }

        let mut criterion_ids = HashSet::new();
        for criterion in &self.criteria {
            if !criterion_ids.insert(criterion.id) {
                return Err(CatalogDataError::Validation(format!(
                    "duplicate criterion id {}",
                    criterion.id.0
                )));
            }
            if let Some(timer) = &criterion.timer {
                if timer.duration_secs == 0 {
                    return Err(CatalogDataError::Validation(format!(
                        "criterion {} has a timer with zero duration",
                        criterion.id.0
                    )));
                }
            }
            if criterion.scopes.is_empty() {
                return Err(CatalogDataError::Validation(format!(
                    "criterion {} has no scope",
                    criterion.id.0
                )));
            }
        }

        let mut tree_ids = HashSet::new();
        for tree in &self.trees {
            if !tree_ids.insert(tree.id) {
                return Err(CatalogDataError::Validation(format!(
                    "duplicate tree id {}",
                    tree.id.0
                )));
            }
        }

        // Parents that actually resolve; dangling ones make the node a root.
        let parents: HashSet<TreeId> = self
            .trees
            .iter()
            .filter_map(|tree| tree.parent)
            .filter(|parent| tree_ids.contains(parent))
            .collect();
        for tree in &self.trees {
            if tree.criterion.is_some() && parents.contains(&tree.id) {
                return Err(CatalogDataError::Validation(format!(
                    "tree {} owns a criterion but also has children",
                    tree.id.0
                )));
            }
        }

        let tree_links: HashMap<TreeId, TreeId> = self
            .trees
            .iter()
            .filter_map(|tree| tree.parent.map(|parent| (tree.id, parent)))
            .collect();
        if let Some(id) = first_parent_cycle(&tree_links) {
            return Err(CatalogDataError::Validation(format!(
                "tree {} is its own ancestor",
                id.0
            )));
        }

        let mut predicate_ids = HashSet::new();
        for predicate in &self.predicates {
            if !predicate_ids.insert(predicate.id) {
                return Err(CatalogDataError::Validation(format!(
                    "duplicate predicate tree id {}",
                    predicate.id.0
                )));
            }
        }

        let predicate_links: HashMap<PredicateTreeId, PredicateTreeId> = self
            .predicates
            .iter()
            .filter_map(|predicate| predicate.parent.map(|parent| (predicate.id, parent)))
            .collect();
        if let Some(id) = first_parent_cycle(&predicate_links) {
            return Err(CatalogDataError::Validation(format!(
                "predicate tree {} is its own ancestor",
                id.0
            )));
        }

        Ok(())
    }
}

/// First node (in key order) whose parent chain leads back to itself.
fn first_parent_cycle<K>(links: &HashMap<K, K>) -> Option<K>
where
    K: Copy + Eq + Ord + std::hash::Hash,
{
    let mut starts: Vec<K> = links.keys().copied().collect();
    starts.sort();
    starts.into_iter().find(|start| {
        let mut current = links.get(start).copied();
        // A chain longer than the link count has entered some other loop.
        for _ in 0..links.len() {
            match current {
                Some(id) if id == *start => return true,
                Some(id) => current = links.get(&id).copied(),
                None => return false,
            }
        }
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> CriteriaDefinitions {
        serde_json::from_str(raw).expect("definitions parse")
    }

    #[test]
    fn parses_operator_codes_and_defaults() {
        let defs = parse(
            r#"{
                "criteria": [{ "id": 1, "type": 0, "asset": 1234 }],
                "trees": [
                    { "id": 10, "operator": 4, "amount": 0 },
                    { "id": 11, "parent": 10, "operator": 0, "amount": 1, "criterion": 1 },
                    { "id": 12, "parent": 10, "operator": 42 }
                ],
                "predicates": [{ "id": 3, "operator": 8, "amount": 2 }]
            }"#,
        );
        assert_eq!(defs.schema_version, CRITERIA_SCHEMA_VERSION);
        assert_eq!(defs.criteria[0].scopes, vec![CriterionScope::Individual]);
        assert_eq!(defs.trees[0].operator, TreeOperator::CompleteAll);
        assert_eq!(defs.trees[2].operator, TreeOperator::Unknown(42));
        assert_eq!(defs.predicates[0].operator, PredicateOperator::Some);
        assert!(defs.validate().is_ok());
    }

    #[test]
    fn rejects_parent_cycles() {
        let trees = parse(
            r#"{
                "criteria": [{ "id": 1, "type": 0 }],
                "trees": [
                    { "id": 1, "parent": 2, "operator": 4 },
                    { "id": 2, "parent": 1, "operator": 4 },
                    { "id": 3, "parent": 1, "operator": 0, "criterion": 1 }
                ]
            }"#,
        );
        match trees.validate() {
            Err(CatalogDataError::Validation(message)) => assert!(message.contains("tree 1")),
            other => panic!("expected cycle rejection, got {:?}", other),
        }

        let looped = parse(r#"{ "criteria": [], "trees": [{ "id": 5, "parent": 5, "operator": 4 }] }"#);
        assert!(matches!(looped.validate(), Err(CatalogDataError::Validation(_))));

        let predicates = parse(
            r#"{
                "criteria": [],
                "predicates": [
                    { "id": 7, "parent": 9, "operator": 4 },
                    { "id": 8, "parent": 7, "operator": 4 },
                    { "id": 9, "parent": 8, "operator": 4 }
                ]
            }"#,
        );
        assert!(matches!(predicates.validate(), Err(CatalogDataError::Validation(_))));

        let dangling = parse(r#"{ "criteria": [], "trees": [{ "id": 5, "parent": 404, "operator": 4 }] }"#);
        assert!(dangling.validate().is_ok());
    }

    #[test]
    fn rejects_criterion_on_combinator_node() {
        let defs = parse(
            r#"{
                "criteria": [{ "id": 1, "type": 0 }],
                "trees": [
                    { "id": 10, "operator": 0, "criterion": 1 },
                    { "id": 11, "parent": 10, "operator": 0 }
                ]
            }"#,
        );
        assert!(matches!(defs.validate(), Err(CatalogDataError::Validation(_))));
    }

    #[test]
    fn dangling_parent_is_not_an_error() {
        let defs = parse(
            r#"{
                "criteria": [{ "id": 1, "type": 0 }],
                "trees": [{ "id": 11, "parent": 999, "operator": 0, "criterion": 1 }]
            }"#,
        );
        assert!(defs.validate().is_ok());
    }

    #[test]
    fn rejects_duplicates_and_zero_timers() {
        let dup = parse(r#"{ "criteria": [{ "id": 1, "type": 0 }, { "id": 1, "type": 5 }] }"#);
        assert!(dup.validate().is_err());

        let timer = parse(
            r#"{ "criteria": [{ "id": 1, "type": 0,
                 "timer": { "start_event": "KILL_CREATURE", "duration_secs": 0 } }] }"#,
        );
        assert!(timer.validate().is_err());
    }

    #[test]
    fn shipped_catalog_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/data/criteria_catalog.json");
        let defs = load_criteria_definitions(path).expect("shipped catalog is valid");
        assert!(!defs.criteria.is_empty());
        assert!(defs.trees.iter().any(|tree| tree.parent.is_some()));
    }
}
