use crate::components::actor::Team;
use crate::data::criteria::{CriterionId, TreeOperator};
use crate::rules::completion_rules::criterion_complete;
use crate::simulation::catalog::{CriteriaCatalog, TreeNode};
use crate::simulation::progress::ProgressStore;

/// Counter lookups the completion evaluator needs.
pub trait ProgressView {
    fn counter(&self, id: CriterionId) -> Option<u64>;
}

impl ProgressView for ProgressStore {
    fn counter(&self, id: CriterionId) -> Option<u64> {
        ProgressStore::counter(self, id)
    }
}

/// Pure evaluator of completion trees against one actor's progress.
pub struct CompletionEvaluator<'a, P: ProgressView + ?Sized> {
    catalog: &'a CriteriaCatalog,
    progress: &'a P,
    team: Option<Team>,
}

impl<'a, P: ProgressView + ?Sized> CompletionEvaluator<'a, P> {
    pub fn new(catalog: &'a CriteriaCatalog, progress: &'a P, team: Option<Team>) -> Self {
        Self {
            catalog,
            progress,
            team,
        }
    }

    pub fn is_complete(&self, index: usize) -> bool {
        let node = self.catalog.tree(index);
        if !node.allows_team(self.team) {
            return false;
        }
        let required = node.amount;
        match node.operator {
            TreeOperator::Complete => self.leaf_complete(node),
            TreeOperator::NotComplete => !self.leaf_complete(node),
            TreeOperator::CompleteAll => node.children.iter().all(|child| self.is_complete(*child)),
            TreeOperator::Sum => {
                let mut total = 0u64;
                self.walk(index, &mut |counter| total = total.saturating_add(counter));
                total >= required
            }
            TreeOperator::Highest => {
                let mut best = 0u64;
                self.walk(index, &mut |counter| best = best.max(counter));
                best >= required
            }
            TreeOperator::StartedAtLeast => {
                let mut started = 0u64;
                for child in &node.children {
                    let Some(criterion) = self.catalog.tree(*child).criterion else {
                        continue;
                    };
                    if self.progress.counter(criterion).unwrap_or(0) >= 1 {
                        started += 1;
                        if started >= required {
                            return true;
                        }
                    }
                }
                false
            }
            TreeOperator::CompleteAtLeast => {
                let mut completed = 0u64;
                for child in &node.children {
                    if self.is_complete(*child) {
                        completed += 1;
                        if completed >= required {
                            return true;
                        }
                    }
                }
                false
            }
            TreeOperator::ProgressBar => {
                let mut total = 0u64;
                for child in &node.children {
                    let child_node = self.catalog.tree(*child);
                    let Some(criterion) = child_node.criterion else {
                        continue;
                    };
                    if let Some(counter) = self.progress.counter(criterion) {
                        total = total.saturating_add(counter.saturating_mul(child_node.amount));
                    }
                }
                total >= required
            }
            TreeOperator::Unknown(_) => false,
        }
    }

    fn leaf_complete(&self, node: &TreeNode) -> bool {
        let Some(criterion_id) = node.criterion else {
            return false;
        };
        let Some(criterion) = self.catalog.criterion(criterion_id) else {
            return false;
        };
        criterion_complete(
            criterion.criterion_type,
            self.progress.counter(criterion_id),
            node.amount,
        )
    }

    /// Visits the counter of every criterion-bearing node in the subtree.
    fn walk(&self, index: usize, visit: &mut dyn FnMut(u64)) {
        let node = self.catalog.tree(index);
        if let Some(criterion) = node.criterion {
            if let Some(counter) = self.progress.counter(criterion) {
                visit(counter);
            }
        }
        for child in &node.children {
            self.walk(*child, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashMap;

    use super::*;
    use crate::data::criteria::{CriteriaDefinitions, TreeId};

    struct CountingProgress {
        counters: HashMap<CriterionId, u64>,
        lookups: Cell<usize>,
    }

    impl CountingProgress {
        fn new(values: &[(u32, u64)]) -> Self {
            Self {
                counters: values
                    .iter()
                    .map(|(id, counter)| (CriterionId(*id), *counter))
                    .collect(),
                lookups: Cell::new(0),
            }
        }
    }

    impl ProgressView for CountingProgress {
        fn counter(&self, id: CriterionId) -> Option<u64> {
            self.lookups.set(self.lookups.get() + 1);
            self.counters.get(&id).copied()
        }
    }

    /// Root 100 with operator/amount over leaves 1..=n (criterion i, amount 1, type KILL_CREATURE).
    fn flat_catalog(operator: u8, amount: u64, leaves: u32) -> CriteriaCatalog {
        let criteria: Vec<String> = (1..=leaves)
            .map(|id| format!(r#"{{ "id": {id}, "type": 0 }}"#))
            .collect();
        let mut trees = vec![format!(
            r#"{{ "id": 100, "operator": {operator}, "amount": {amount} }}"#
        )];
        trees.extend((1..=leaves).map(|id| {
            format!(
                r#"{{ "id": {id}, "parent": 100, "operator": 0, "amount": 1, "criterion": {id}, "order": {id} }}"#
            )
        }));
        let raw = format!(
            r#"{{ "criteria": [{}], "trees": [{}] }}"#,
            criteria.join(","),
            trees.join(",")
        );
        let defs: CriteriaDefinitions = serde_json::from_str(&raw).unwrap();
        CriteriaCatalog::from_definitions(defs)
    }

    fn root(catalog: &CriteriaCatalog) -> usize {
        catalog.tree_index(TreeId(100)).unwrap()
    }

    #[test]
    fn complete_all_handles_empty_and_incomplete_children() {
        let catalog = flat_catalog(4, 0, 0);
        let progress = CountingProgress::new(&[]);
        assert!(CompletionEvaluator::new(&catalog, &progress, None).is_complete(root(&catalog)));

        let catalog = flat_catalog(4, 0, 3);
        let progress = CountingProgress::new(&[(1, 1), (2, 0), (3, 1)]);
        assert!(!CompletionEvaluator::new(&catalog, &progress, None).is_complete(root(&catalog)));
    }

    #[test]
    fn sum_operator_uses_whole_subtree() {
        let progress = CountingProgress::new(&[(1, 2), (2, 5), (3, 1)]);
        let catalog = flat_catalog(5, 8, 3);
        assert!(CompletionEvaluator::new(&catalog, &progress, None).is_complete(root(&catalog)));
        let catalog = flat_catalog(5, 9, 3);
        assert!(!CompletionEvaluator::new(&catalog, &progress, None).is_complete(root(&catalog)));
    }

    #[test]
    fn highest_operator() {
        let progress = CountingProgress::new(&[(1, 2), (2, 7)]);
        let catalog = flat_catalog(6, 7, 2);
        assert!(CompletionEvaluator::new(&catalog, &progress, None).is_complete(root(&catalog)));
        let catalog = flat_catalog(6, 8, 2);
        assert!(!CompletionEvaluator::new(&catalog, &progress, None).is_complete(root(&catalog)));
    }

    #[test]
    fn complete_at_least_short_circuits() {
        let catalog = flat_catalog(8, 2, 4);
        let progress = CountingProgress::new(&[(2, 1), (3, 1), (4, 1)]);
        let evaluator = CompletionEvaluator::new(&catalog, &progress, None);
        assert!(evaluator.is_complete(root(&catalog)));
        assert_eq!(progress.lookups.get(), 3);
    }

    #[test]
    fn started_at_least_short_circuits() {
        let catalog = flat_catalog(7, 2, 4);
        let progress = CountingProgress::new(&[(2, 1), (3, 4), (4, 1)]);
        let evaluator = CompletionEvaluator::new(&catalog, &progress, None);
        assert!(evaluator.is_complete(root(&catalog)));
        assert_eq!(progress.lookups.get(), 3);

        let progress = CountingProgress::new(&[(2, 1)]);
        assert!(!CompletionEvaluator::new(&catalog, &progress, None).is_complete(root(&catalog)));
    }

    #[test]
    fn progress_bar_weights_by_child_amount() {
        let raw = r#"{
            "criteria": [{ "id": 1, "type": 0 }, { "id": 2, "type": 0 }],
            "trees": [
                { "id": 100, "operator": 9, "amount": 10 },
                { "id": 1, "parent": 100, "operator": 0, "amount": 3, "criterion": 1 },
                { "id": 2, "parent": 100, "operator": 0, "amount": 2, "criterion": 2 }
            ]
        }"#;
        let catalog = CriteriaCatalog::from_definitions(serde_json::from_str(raw).unwrap());
        let progress = CountingProgress::new(&[(1, 2), (2, 2)]);
        assert!(CompletionEvaluator::new(&catalog, &progress, None).is_complete(root(&catalog)));
        let progress = CountingProgress::new(&[(1, 2), (2, 1)]);
        assert!(!CompletionEvaluator::new(&catalog, &progress, None).is_complete(root(&catalog)));
    }

    #[test]
    fn not_complete_unknown_operator_and_team_gate() {
        let raw = r#"{
            "criteria": [{ "id": 1, "type": 0 }],
            "trees": [
                { "id": 1, "operator": 1, "amount": 1, "criterion": 1 },
                { "id": 2, "operator": 77, "amount": 0 },
                { "id": 3, "operator": 0, "amount": 1, "criterion": 1, "team": "HORDE" }
            ]
        }"#;
        let catalog = CriteriaCatalog::from_definitions(serde_json::from_str(raw).unwrap());
        let none = CountingProgress::new(&[]);
        let some = CountingProgress::new(&[(1, 1)]);
        let not_complete = catalog.tree_index(TreeId(1)).unwrap();
        let unknown = catalog.tree_index(TreeId(2)).unwrap();
        let horde_only = catalog.tree_index(TreeId(3)).unwrap();

        assert!(CompletionEvaluator::new(&catalog, &none, None).is_complete(not_complete));
        assert!(!CompletionEvaluator::new(&catalog, &some, None).is_complete(not_complete));
        assert!(!CompletionEvaluator::new(&catalog, &some, None).is_complete(unknown));
        assert!(!CompletionEvaluator::new(&catalog, &some, Some(Team::Alliance)).is_complete(horde_only));
        assert!(CompletionEvaluator::new(&catalog, &some, Some(Team::Horde)).is_complete(horde_only));
    }
}
