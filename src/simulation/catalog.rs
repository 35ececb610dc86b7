use std::collections::{HashMap, HashSet};

use bevy_utils::tracing::debug;

use crate::components::actor::Team;
use crate::data::criteria::{
    AtomicCriterion, CriteriaDefinitions, CriterionId, PredicateOperands, PredicateOperator,
    PredicateTreeId, TreeId, TreeOperator,
};
use crate::rules::criterion_type::{CriterionScope, CriterionType, FailEvent, TimerStartEvent};
use crate::rules::predicate_kind::PredicateKind;

/// Completion tree node stored in the catalog arena. Links are arena indices.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: TreeId,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub operator: TreeOperator,
    pub amount: u64,
    pub criterion: Option<CriterionId>,
    pub order: i32,
    pub team: Option<Team>,
}

impl TreeNode {
    /// Team restriction gate shared by update eligibility and completion.
    pub fn allows_team(&self, team: Option<Team>) -> bool {
        match self.team {
            Some(required) => team == Some(required),
            None => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PredicateNode {
    pub id: PredicateTreeId,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub operator: PredicateOperator,
    pub amount: i32,
    pub kind: PredicateKind,
    pub operands: PredicateOperands,
}

/// Immutable criteria reference data plus lookup indices.
///
/// Built once before any actor attaches, then shared read-only.
#[derive(Debug, Default)]
pub struct CriteriaCatalog {
    criteria: HashMap<CriterionId, AtomicCriterion>,
    trees: Vec<TreeNode>,
    tree_index: HashMap<TreeId, usize>,
    predicates: Vec<PredicateNode>,
    predicate_index: HashMap<PredicateTreeId, usize>,
    by_type: HashMap<(CriterionScope, CriterionType), Vec<CriterionId>>,
    by_asset: HashMap<(CriterionScope, CriterionType, u32), Vec<CriterionId>>,
    trees_by_criterion: HashMap<CriterionId, Vec<usize>>,
    touched_by_criterion: HashMap<CriterionId, Vec<usize>>,
    timed_by_start_event: HashMap<TimerStartEvent, Vec<CriterionId>>,
    by_fail_event: HashMap<FailEvent, Vec<CriterionId>>,
    disabled: HashSet<CriterionId>,
}

impl CriteriaCatalog {
    pub fn from_definitions(definitions: CriteriaDefinitions) -> Self {
        let mut catalog = CriteriaCatalog::default();
        catalog.index_criteria(definitions.criteria);

        let mut tree_parents = Vec::new();
        for def in definitions.trees {
            catalog.tree_index.insert(def.id, catalog.trees.len());
            tree_parents.push(def.parent);
            catalog.trees.push(TreeNode {
                id: def.id,
                parent: None,
                children: Vec::new(),
                operator: def.operator,
                amount: def.amount,
                criterion: def.criterion,
                order: def.order,
                team: def.team,
            });
        }
        catalog.link_trees(&tree_parents);

        let mut predicate_parents = Vec::new();
        for def in definitions.predicates {
            catalog
                .predicate_index
                .insert(def.id, catalog.predicates.len());
            predicate_parents.push(def.parent);
            catalog.predicates.push(PredicateNode {
                id: def.id,
                parent: None,
                children: Vec::new(),
                operator: def.operator,
                amount: def.amount,
                kind: def.kind,
                operands: def.operands,
            });
        }
        catalog.link_predicates(&predicate_parents);

        catalog.index_tree_criteria();
        catalog.disabled = definitions.disabled_criteria.into_iter().collect();
        catalog
    }

    fn index_criteria(&mut self, mut criteria: Vec<AtomicCriterion>) {
        criteria.sort_by_key(|criterion| criterion.id);
        for criterion in criteria {
            for scope in &criterion.scopes {
                self.by_type
                    .entry((*scope, criterion.criterion_type))
                    .or_default()
                    .push(criterion.id);
                self.by_asset
                    .entry((*scope, criterion.criterion_type, criterion.asset))
                    .or_default()
                    .push(criterion.id);
            }
            if let Some(timer) = &criterion.timer {
                self.timed_by_start_event
                    .entry(timer.start_event)
                    .or_default()
                    .push(criterion.id);
            }
            if let Some(fail_event) = criterion.fail_event {
                self.by_fail_event
                    .entry(fail_event)
                    .or_default()
                    .push(criterion.id);
            }
            self.criteria.insert(criterion.id, criterion);
        }
    }

    fn link_trees(&mut self, parents: &[Option<TreeId>]) {
        for (index, parent) in parents.iter().enumerate() {
            let Some(parent_id) = parent else { continue };
            let Some(parent_index) = self.tree_index.get(parent_id).copied() else {
                debug!(
                    "tree {} has unresolved parent {}, treating as root",
                    self.trees[index].id.0, parent_id.0
                );
                continue;
            };
            if closes_cycle(|node| self.trees[node].parent, index, parent_index) {
                debug!(
                    "tree {} would cycle through parent {}, treating as root",
                    self.trees[index].id.0, parent_id.0
                );
                continue;
            }
            self.trees[index].parent = Some(parent_index);
            self.trees[parent_index].children.push(index);
        }
        let orders: Vec<(i32, TreeId)> = self.trees.iter().map(|t| (t.order, t.id)).collect();
        for node in &mut self.trees {
            node.children.sort_by_key(|child| orders[*child]);
        }
    }

    fn link_predicates(&mut self, parents: &[Option<PredicateTreeId>]) {
        for (index, parent) in parents.iter().enumerate() {
            let Some(parent_id) = parent else { continue };
            let Some(parent_index) = self.predicate_index.get(parent_id).copied() else {
                debug!(
                    "predicate tree {} has unresolved parent {}, treating as root",
                    self.predicates[index].id.0, parent_id.0
                );
                continue;
            };
            if closes_cycle(|node| self.predicates[node].parent, index, parent_index) {
                debug!(
                    "predicate tree {} would cycle through parent {}, treating as root",
                    self.predicates[index].id.0, parent_id.0
                );
                continue;
            }
            self.predicates[index].parent = Some(parent_index);
            self.predicates[parent_index].children.push(index);
        }
    }

    fn index_tree_criteria(&mut self) {
        for (index, node) in self.trees.iter().enumerate() {
            if let Some(criterion) = node.criterion {
                self.trees_by_criterion
                    .entry(criterion)
                    .or_default()
                    .push(index);
            }
        }
        let touched: Vec<(CriterionId, Vec<usize>)> = self
            .trees_by_criterion
            .iter()
            .map(|(criterion, leaves)| (*criterion, self.collect_touched(leaves)))
            .collect();
        self.touched_by_criterion.extend(touched);
    }

    /// Leaves first, then each ancestor once.
    fn collect_touched(&self, leaves: &[usize]) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut out: Vec<usize> = Vec::new();
        for &leaf in leaves {
            if seen.insert(leaf) {
                out.push(leaf);
            }
        }
        for &leaf in leaves {
            let mut current = self.trees[leaf].parent;
            while let Some(index) = current {
                if seen.insert(index) {
                    out.push(index);
                }
                current = self.trees[index].parent;
            }
        }
        out
    }

    pub fn criterion(&self, id: CriterionId) -> Option<&AtomicCriterion> {
        self.criteria.get(&id)
    }

    pub fn criteria_count(&self) -> usize {
        self.criteria.len()
    }

    /// Candidate criteria for an event; `asset` narrows to the asset index.
    pub fn criteria_for(
        &self,
        scope: CriterionScope,
        criterion_type: CriterionType,
        asset: Option<u32>,
    ) -> &[CriterionId] {
        let found = match asset {
            Some(asset) => self.by_asset.get(&(scope, criterion_type, asset)),
            None => self.by_type.get(&(scope, criterion_type)),
        };
        found.map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_disabled(&self, id: CriterionId) -> bool {
        self.disabled.contains(&id)
    }

    pub fn tree(&self, index: usize) -> &TreeNode {
        &self.trees[index]
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn tree_index(&self, id: TreeId) -> Option<usize> {
        self.tree_index.get(&id).copied()
    }

    /// Trees whose node directly owns the criterion.
    pub fn trees_for_criterion(&self, id: CriterionId) -> &[usize] {
        self.trees_by_criterion
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Owning trees plus all their ancestors, the set re-checked after an update.
    pub fn touched_trees(&self, id: CriterionId) -> &[usize] {
        self.touched_by_criterion
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn root_trees(&self) -> impl Iterator<Item = usize> + '_ {
        self.trees
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| index)
    }

    pub fn predicate(&self, index: usize) -> &PredicateNode {
        &self.predicates[index]
    }

    pub fn predicate_index(&self, id: PredicateTreeId) -> Option<usize> {
        self.predicate_index.get(&id).copied()
    }

    pub fn timed_criteria(&self, start_event: TimerStartEvent) -> &[CriterionId] {
        self.timed_by_start_event
            .get(&start_event)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn criteria_with_fail_event(&self, fail_event: FailEvent) -> &[CriterionId] {
        self.by_fail_event
            .get(&fail_event)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// True if linking `child` under `parent` would make `child` its own ancestor.
///
/// Links are only ever added through this check, so the existing parent chain
/// is acyclic and the walk ends.
fn closes_cycle(parent_of: impl Fn(usize) -> Option<usize>, child: usize, parent: usize) -> bool {
    let mut current = Some(parent);
    while let Some(index) = current {
        if index == child {
            return true;
        }
        current = parent_of(index);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::completion::CompletionEvaluator;
    use crate::simulation::progress::ProgressStore;

    fn catalog(raw: &str) -> CriteriaCatalog {
        let defs: CriteriaDefinitions = serde_json::from_str(raw).expect("definitions parse");
        CriteriaCatalog::from_definitions(defs)
    }

    #[test]
    fn links_children_in_order_and_tolerates_dangling_parents() {
        let catalog = catalog(
            r#"{
                "criteria": [{ "id": 1, "type": 0, "asset": 7 }, { "id": 2, "type": 0, "asset": 8 }],
                "trees": [
                    { "id": 10, "operator": 4 },
                    { "id": 12, "parent": 10, "operator": 0, "criterion": 2, "order": 2 },
                    { "id": 11, "parent": 10, "operator": 0, "criterion": 1, "order": 1 },
                    { "id": 13, "parent": 404, "operator": 0, "criterion": 1 }
                ]
            }"#,
        );
        let root = catalog.tree_index(TreeId(10)).unwrap();
        let children: Vec<TreeId> = catalog
            .tree(root)
            .children
            .iter()
            .map(|child| catalog.tree(*child).id)
            .collect();
        assert_eq!(children, vec![TreeId(11), TreeId(12)]);

        let orphan = catalog.tree_index(TreeId(13)).unwrap();
        assert!(catalog.tree(orphan).parent.is_none());
        assert_eq!(catalog.root_trees().count(), 2);
    }

    #[test]
    fn parent_cycles_are_broken_into_roots() {
        let catalog = catalog(
            r#"{
                "criteria": [{ "id": 1, "type": 0, "asset": 7 }],
                "trees": [
                    { "id": 1, "parent": 2, "operator": 4 },
                    { "id": 2, "parent": 1, "operator": 4 },
                    { "id": 3, "parent": 1, "operator": 0, "amount": 1, "criterion": 1 },
                    { "id": 4, "parent": 4, "operator": 4 }
                ],
                "predicates": [
                    { "id": 20, "parent": 21, "operator": 4 },
                    { "id": 21, "parent": 20, "operator": 4 }
                ]
            }"#,
        );
        let first = catalog.tree_index(TreeId(1)).unwrap();
        let second = catalog.tree_index(TreeId(2)).unwrap();
        assert_eq!(catalog.tree(first).parent, Some(second));
        assert!(catalog.tree(second).parent.is_none());
        let looped = catalog.tree_index(TreeId(4)).unwrap();
        assert!(catalog.tree(looped).parent.is_none());

        let progress = ProgressStore::default();
        let evaluator = CompletionEvaluator::new(&catalog, &progress, None);
        assert!(!evaluator.is_complete(second));

        let touched: Vec<TreeId> = catalog
            .touched_trees(CriterionId(1))
            .iter()
            .map(|index| catalog.tree(*index).id)
            .collect();
        assert_eq!(touched, vec![TreeId(3), TreeId(1), TreeId(2)]);

        let first = catalog.predicate_index(PredicateTreeId(20)).unwrap();
        let second = catalog.predicate_index(PredicateTreeId(21)).unwrap();
        assert_eq!(catalog.predicate(first).parent, Some(second));
        assert!(catalog.predicate(second).parent.is_none());
    }

    #[test]
    fn indexes_by_type_asset_and_scope() {
        let catalog = catalog(
            r#"{
                "criteria": [
                    { "id": 1, "type": 0, "asset": 7 },
                    { "id": 2, "type": 0, "asset": 8 },
                    { "id": 3, "type": 0, "asset": 7, "scopes": ["GROUP"] }
                ]
            }"#,
        );
        let individual = CriterionScope::Individual;
        assert_eq!(
            catalog.criteria_for(individual, CriterionType::KILL_CREATURE, None),
            &[CriterionId(1), CriterionId(2)]
        );
        assert_eq!(
            catalog.criteria_for(individual, CriterionType::KILL_CREATURE, Some(7)),
            &[CriterionId(1)]
        );
        assert_eq!(
            catalog.criteria_for(CriterionScope::Group, CriterionType::KILL_CREATURE, Some(7)),
            &[CriterionId(3)]
        );
        assert!(catalog
            .criteria_for(individual, CriterionType::REACH_LEVEL, None)
            .is_empty());
    }

    #[test]
    fn touched_trees_walk_up_to_roots_once() {
        let catalog = catalog(
            r#"{
                "criteria": [{ "id": 1, "type": 0 }],
                "trees": [
                    { "id": 1, "operator": 4 },
                    { "id": 2, "parent": 1, "operator": 4 },
                    { "id": 3, "parent": 2, "operator": 0, "criterion": 1 },
                    { "id": 4, "parent": 2, "operator": 0, "criterion": 1 }
                ]
            }"#,
        );
        let touched: Vec<TreeId> = catalog
            .touched_trees(CriterionId(1))
            .iter()
            .map(|index| catalog.tree(*index).id)
            .collect();
        assert_eq!(touched, vec![TreeId(3), TreeId(4), TreeId(2), TreeId(1)]);
    }

    #[test]
    fn timer_and_fail_indices() {
        let catalog = catalog(
            r#"{
                "criteria": [
                    { "id": 1, "type": 0, "fail_event": "DEATH",
                      "timer": { "start_event": "KILL_CREATURE", "start_asset": 5, "duration_secs": 30 } },
                    { "id": 2, "type": 0 }
                ],
                "disabled_criteria": [2]
            }"#,
        );
        assert_eq!(
            catalog.timed_criteria(TimerStartEvent::KillCreature),
            &[CriterionId(1)]
        );
        assert_eq!(
            catalog.criteria_with_fail_event(FailEvent::Death),
            &[CriterionId(1)]
        );
        assert!(catalog.is_disabled(CriterionId(2)));
        assert!(!catalog.is_disabled(CriterionId(1)));
    }
}
