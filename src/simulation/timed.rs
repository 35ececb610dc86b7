use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::criteria::TreeId;

/// Running countdowns (milliseconds left) keyed by completion tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedCriteria {
    remaining: HashMap<TreeId, u32>,
}

impl TimedCriteria {
    pub fn contains(&self, tree: TreeId) -> bool {
        self.remaining.contains_key(&tree)
    }

    pub fn remaining(&self, tree: TreeId) -> Option<u32> {
        self.remaining.get(&tree).copied()
    }

    pub fn start(&mut self, tree: TreeId, remaining_ms: u32) {
        self.remaining.insert(tree, remaining_ms);
    }

    pub fn remove(&mut self, tree: TreeId) -> Option<u32> {
        self.remaining.remove(&tree)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TreeId, u32)> + '_ {
        self.remaining.iter().map(|(tree, ms)| (*tree, *ms))
    }

    pub fn clear(&mut self) {
        self.remaining.clear();
    }

    /// Counts every timer down; returns (sorted) the trees whose time ran out.
    pub fn advance(&mut self, elapsed_ms: u32) -> Vec<TreeId> {
        let mut expired = Vec::new();
        self.remaining.retain(|tree, remaining| {
            if *remaining > elapsed_ms {
                *remaining -= elapsed_ms;
                true
            } else {
                expired.push(*tree);
                false
            }
        });
        expired.sort();
        expired
    }
}
