use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::components::actor::ActorId;
use crate::data::criteria::CriterionId;

pub const COUNTER_MAX: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateMode {
    Set,
    Accumulate,
    Highest,
}

impl UpdateMode {
    pub fn apply(self, current: u64, value: u64) -> u64 {
        match self {
            UpdateMode::Set => value,
            UpdateMode::Accumulate => accumulate(current, value),
            UpdateMode::Highest => current.max(value),
        }
    }
}

pub fn accumulate(counter: u64, delta: u64) -> u64 {
    counter.saturating_add(delta)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub counter: u64,
    /// Unix seconds of the last mutation.
    pub updated_at: i64,
    /// Actor whose event produced the value; differs from the store owner for group credit.
    pub owner: ActorId,
    /// Set on every mutation, cleared by `mark_clean` once the record is persisted.
    #[serde(skip)]
    pub unsaved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressChange {
    Unchanged,
    Updated(u64),
}

/// Per-actor criterion counters.
#[derive(Debug, Clone, Default)]
pub struct ProgressStore {
    records: HashMap<CriterionId, ProgressRecord>,
    removed: HashSet<CriterionId>,
}

impl ProgressStore {
    pub fn get(&self, id: CriterionId) -> Option<&ProgressRecord> {
        self.records.get(&id)
    }

    pub fn counter(&self, id: CriterionId) -> Option<u64> {
        self.records.get(&id).map(|record| record.counter)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CriterionId, &ProgressRecord)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    /// Applies an update; zero never creates a record unless `timer_gated`,
    /// and an unchanged counter is reported as such (again unless `timer_gated`).
    pub fn apply(
        &mut self,
        id: CriterionId,
        value: u64,
        mode: UpdateMode,
        owner: ActorId,
        now: i64,
        timer_gated: bool,
    ) -> ProgressChange {
        match self.records.get_mut(&id) {
            None => {
                if value == 0 && !timer_gated {
                    return ProgressChange::Unchanged;
                }
                self.removed.remove(&id);
                self.records.insert(
                    id,
                    ProgressRecord {
                        counter: value,
                        updated_at: now,
                        owner,
                        unsaved: true,
                    },
                );
                ProgressChange::Updated(value)
            }
            Some(record) => {
                let next = mode.apply(record.counter, value);
                if next == record.counter && !timer_gated {
                    return ProgressChange::Unchanged;
                }
                record.counter = next;
                record.updated_at = now;
                record.owner = owner;
                record.unsaved = true;
                ProgressChange::Updated(next)
            }
        }
    }

    /// Moves the timestamp of an existing record without touching its counter.
    pub fn touch(&mut self, id: CriterionId, owner: ActorId, now: i64) -> bool {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.updated_at = now;
                record.owner = owner;
                record.unsaved = true;
                true
            }
            None => false,
        }
    }

    /// Restores a persisted record without marking it unsaved.
    pub fn restore(&mut self, id: CriterionId, mut record: ProgressRecord) {
        record.unsaved = false;
        self.records.insert(id, record);
    }

    pub fn remove(&mut self, id: CriterionId) -> bool {
        if self.records.remove(&id).is_some() {
            self.removed.insert(id);
            true
        } else {
            false
        }
    }

    /// Removes everything, returning the ids that existed.
    pub fn clear(&mut self) -> Vec<CriterionId> {
        let mut ids: Vec<CriterionId> = self.records.keys().copied().collect();
        ids.sort();
        self.removed.extend(ids.iter().copied());
        self.records.clear();
        ids
    }

    pub fn unsaved_records(&self) -> impl Iterator<Item = (CriterionId, &ProgressRecord)> {
        self.iter().filter(|(_, record)| record.unsaved)
    }

    pub fn removed(&self) -> impl Iterator<Item = CriterionId> + '_ {
        self.removed.iter().copied()
    }

    /// Called once the pending changes have been written out.
    pub fn mark_clean(&mut self) {
        for record in self.records.values_mut() {
            record.unsaved = false;
        }
        self.removed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTOR: ActorId = ActorId(1);

    #[test]
    fn accumulate_saturates() {
        assert_eq!(accumulate(COUNTER_MAX - 1, 5), COUNTER_MAX);
        assert_eq!(accumulate(3, 4), 7);
        assert_eq!(UpdateMode::Accumulate.apply(COUNTER_MAX, COUNTER_MAX), COUNTER_MAX);
    }

    #[test]
    fn highest_is_monotonic() {
        let mut store = ProgressStore::default();
        for value in [5, 3, 9, 1] {
            store.apply(CriterionId(1), value, UpdateMode::Highest, ACTOR, 0, false);
        }
        assert_eq!(store.counter(CriterionId(1)), Some(9));
    }

    #[test]
    fn zero_update_only_creates_timer_records() {
        let mut store = ProgressStore::default();
        let change = store.apply(CriterionId(1), 0, UpdateMode::Set, ACTOR, 0, false);
        assert_eq!(change, ProgressChange::Unchanged);
        assert!(store.get(CriterionId(1)).is_none());

        let change = store.apply(CriterionId(2), 0, UpdateMode::Set, ACTOR, 0, true);
        assert_eq!(change, ProgressChange::Updated(0));
        assert_eq!(store.counter(CriterionId(2)), Some(0));
    }

    #[test]
    fn repeated_set_reports_unchanged() {
        let mut store = ProgressStore::default();
        assert_eq!(
            store.apply(CriterionId(1), 4, UpdateMode::Set, ACTOR, 10, false),
            ProgressChange::Updated(4)
        );
        assert_eq!(
            store.apply(CriterionId(1), 4, UpdateMode::Set, ACTOR, 20, false),
            ProgressChange::Unchanged
        );
        assert_eq!(store.get(CriterionId(1)).unwrap().updated_at, 10);
        assert_eq!(
            store.apply(CriterionId(1), 4, UpdateMode::Set, ACTOR, 30, true),
            ProgressChange::Updated(4)
        );
    }

    #[test]
    fn unsaved_tracking_and_removal() {
        let mut store = ProgressStore::default();
        store.apply(CriterionId(1), 1, UpdateMode::Accumulate, ACTOR, 0, false);
        store.apply(CriterionId(2), 1, UpdateMode::Accumulate, ACTOR, 0, false);
        assert_eq!(store.unsaved_records().count(), 2);
        store.apply(CriterionId(2), 1, UpdateMode::Accumulate, ACTOR, 5, false);
        assert!(store.get(CriterionId(2)).unwrap().unsaved);
        store.mark_clean();
        assert_eq!(store.unsaved_records().count(), 0);

        assert!(store.remove(CriterionId(1)));
        assert!(!store.remove(CriterionId(1)));
        assert_eq!(store.removed().collect::<Vec<_>>(), vec![CriterionId(1)]);

        store.apply(CriterionId(1), 2, UpdateMode::Accumulate, ACTOR, 0, false);
        assert_eq!(store.removed().count(), 0);
        assert_eq!(store.counter(CriterionId(1)), Some(2));
    }
}
