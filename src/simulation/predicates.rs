use std::collections::HashMap;

use bevy_utils::tracing::{debug, warn};

use crate::components::actor::ActorId;
use crate::data::criteria::{PredicateOperands, PredicateOperator, PredicateTreeId};
use crate::rules::predicate_kind::PredicateKind;
use crate::simulation::catalog::CriteriaCatalog;
use crate::simulation::predicate_library;
use crate::simulation::world_query::WorldQuery;

/// Nested predicate references deeper than this evaluate false.
pub const MAX_PREDICATE_DEPTH: u8 = 32;

/// Everything a leaf check receives.
pub struct PredicateContext<'a> {
    pub operands: PredicateOperands,
    pub misc1: u64,
    pub misc2: u64,
    pub actor: ActorId,
    pub target: Option<ActorId>,
    pub world: &'a dyn WorldQuery,
    evaluator: &'a PredicateEvaluator<'a>,
    depth: u8,
}

impl<'a> PredicateContext<'a> {
    /// Evaluates another predicate tree with the same event and actors.
    pub fn nested(&self, tree: PredicateTreeId) -> bool {
        self.evaluator
            .tree_satisfied(tree, self.misc1, self.misc2, self.actor, self.target, self.depth + 1)
    }
}

pub type PredicateFn = Box<dyn Fn(&PredicateContext<'_>) -> bool + Send + Sync>;

/// Open table of leaf checks keyed by kind.
#[derive(Default)]
pub struct PredicateRegistry {
    handlers: HashMap<PredicateKind, PredicateFn>,
}

impl std::fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("kinds", &self.handlers.len())
            .finish()
    }
}

impl PredicateRegistry {
    /// Registry preloaded with the built-in predicate library.
    pub fn standard() -> Self {
        let mut registry = Self::default();
        predicate_library::register_all(&mut registry);
        registry
    }

    /// Adds or replaces the check for `kind`.
    pub fn register<F>(&mut self, kind: PredicateKind, check: F)
    where
        F: Fn(&PredicateContext<'_>) -> bool + Send + Sync + 'static,
    {
        if self.handlers.insert(kind, Box::new(check)).is_some() {
            debug!("replaced predicate handler for {}", kind);
        }
    }

    pub fn contains(&self, kind: PredicateKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn evaluate(&self, kind: PredicateKind, ctx: &PredicateContext<'_>) -> bool {
        match self.handlers.get(&kind) {
            Some(check) => check(ctx),
            None => {
                debug!("no handler for {}, treating as unsatisfied", kind);
                false
            }
        }
    }
}

/// Recursive, side-effect free evaluator of predicate trees.
pub struct PredicateEvaluator<'a> {
    catalog: &'a CriteriaCatalog,
    registry: &'a PredicateRegistry,
    world: &'a dyn WorldQuery,
}

impl<'a> PredicateEvaluator<'a> {
    pub fn new(
        catalog: &'a CriteriaCatalog,
        registry: &'a PredicateRegistry,
        world: &'a dyn WorldQuery,
    ) -> Self {
        Self {
            catalog,
            registry,
            world,
        }
    }

    pub fn satisfied(
        &self,
        tree: PredicateTreeId,
        misc1: u64,
        misc2: u64,
        actor: ActorId,
        target: Option<ActorId>,
    ) -> bool {
        self.tree_satisfied(tree, misc1, misc2, actor, target, 0)
    }

    fn tree_satisfied(
        &self,
        tree: PredicateTreeId,
        misc1: u64,
        misc2: u64,
        actor: ActorId,
        target: Option<ActorId>,
        depth: u8,
    ) -> bool {
        match self.catalog.predicate_index(tree) {
            Some(index) => self.node_satisfied(index, misc1, misc2, actor, target, depth),
            None => {
                debug!("predicate tree {} missing from catalog", tree.0);
                false
            }
        }
    }

    fn node_satisfied(
        &self,
        index: usize,
        misc1: u64,
        misc2: u64,
        actor: ActorId,
        target: Option<ActorId>,
        depth: u8,
    ) -> bool {
        if depth > MAX_PREDICATE_DEPTH {
            warn!("predicate nesting exceeded {} levels", MAX_PREDICATE_DEPTH);
            return false;
        }
        let node = self.catalog.predicate(index);
        match node.operator {
            PredicateOperator::SingleTrue => {
                node.kind != PredicateKind::NONE
                    && self.leaf(node.kind, node.operands, misc1, misc2, actor, target, depth)
            }
            PredicateOperator::SingleFalse => {
                node.kind != PredicateKind::NONE
                    && !self.leaf(node.kind, node.operands, misc1, misc2, actor, target, depth)
            }
            PredicateOperator::All => node
                .children
                .iter()
                .all(|child| self.node_satisfied(*child, misc1, misc2, actor, target, depth + 1)),
            PredicateOperator::Some => {
                let mut needed = node.amount.max(1);
                for child in &node.children {
                    if self.node_satisfied(*child, misc1, misc2, actor, target, depth + 1) {
                        needed -= 1;
                        if needed == 0 {
                            return true;
                        }
                    }
                }
                false
            }
            PredicateOperator::Unknown(_) => false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn leaf(
        &self,
        kind: PredicateKind,
        operands: PredicateOperands,
        misc1: u64,
        misc2: u64,
        actor: ActorId,
        target: Option<ActorId>,
        depth: u8,
    ) -> bool {
        let ctx = PredicateContext {
            operands,
            misc1,
            misc2,
            actor,
            target,
            world: self.world,
            evaluator: self,
            depth,
        };
        self.registry.evaluate(kind, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::data::criteria::CriteriaDefinitions;

    struct NoWorld;

    impl WorldQuery for NoWorld {
        fn is_valid_actor(&self, _actor: ActorId) -> bool {
            true
        }
    }

    const YES: PredicateKind = PredicateKind(900);
    const NO: PredicateKind = PredicateKind(901);

    fn counting_registry(calls: &Arc<AtomicUsize>) -> PredicateRegistry {
        let mut registry = PredicateRegistry::default();
        let yes_calls = Arc::clone(calls);
        registry.register(YES, move |_| {
            yes_calls.fetch_add(1, Ordering::SeqCst);
            true
        });
        let no_calls = Arc::clone(calls);
        registry.register(NO, move |_| {
            no_calls.fetch_add(1, Ordering::SeqCst);
            false
        });
        registry
    }

    /// Root 1 with the given operator/amount and single-true leaves of the given kinds.
    fn combinator(operator: u8, amount: i32, kinds: &[PredicateKind]) -> CriteriaCatalog {
        let mut nodes = vec![format!(
            r#"{{ "id": 1, "operator": {operator}, "amount": {amount} }}"#
        )];
        for (offset, kind) in kinds.iter().enumerate() {
            nodes.push(format!(
                r#"{{ "id": {}, "parent": 1, "operator": 2, "kind": {} }}"#,
                offset + 2,
                kind.0
            ));
        }
        let raw = format!(r#"{{ "criteria": [], "predicates": [{}] }}"#, nodes.join(","));
        let defs: CriteriaDefinitions = serde_json::from_str(&raw).unwrap();
        CriteriaCatalog::from_definitions(defs)
    }

    fn eval(catalog: &CriteriaCatalog, registry: &PredicateRegistry) -> bool {
        PredicateEvaluator::new(catalog, registry, &NoWorld).satisfied(
            PredicateTreeId(1),
            0,
            0,
            ActorId(1),
            None,
        )
    }

    #[test]
    fn all_stops_at_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = counting_registry(&calls);
        let catalog = combinator(4, 0, &[YES, YES, NO, YES]);
        assert!(!eval(&catalog, &registry));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn some_stops_once_count_reached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = counting_registry(&calls);
        let catalog = combinator(8, 2, &[YES, NO, YES, YES]);
        assert!(eval(&catalog, &registry));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn some_requires_at_least_one() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = counting_registry(&calls);
        assert!(eval(&combinator(8, 0, &[NO, YES]), &registry));
        assert!(!eval(&combinator(8, 0, &[NO, NO]), &registry));
        assert!(!eval(&combinator(8, 3, &[YES, YES]), &registry));
    }

    #[test]
    fn single_false_and_unknown_kinds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = counting_registry(&calls);
        let raw = r#"{ "criteria": [], "predicates": [
            { "id": 1, "operator": 3, "kind": 901 },
            { "id": 2, "operator": 2, "kind": 4242 },
            { "id": 3, "operator": 3, "kind": 0 },
            { "id": 4, "operator": 99, "kind": 900 }
        ] }"#;
        let catalog = CriteriaCatalog::from_definitions(serde_json::from_str(raw).unwrap());
        let evaluator = PredicateEvaluator::new(&catalog, &registry, &NoWorld);
        let check = |id| evaluator.satisfied(PredicateTreeId(id), 0, 0, ActorId(1), None);
        assert!(check(1));
        assert!(!check(2));
        assert!(!check(3));
        assert!(!check(4));
        assert!(!check(404));
    }

    #[test]
    fn nested_cycles_terminate() {
        let registry = PredicateRegistry::standard();
        let raw = r#"{ "criteria": [], "predicates": [
            { "id": 1, "operator": 2, "kind": 50, "operands": { "primary": 2 } },
            { "id": 2, "operator": 2, "kind": 50, "operands": { "primary": 1 } }
        ] }"#;
        let catalog = CriteriaCatalog::from_definitions(serde_json::from_str(raw).unwrap());
        assert!(!eval(&catalog, &registry));
    }
}
