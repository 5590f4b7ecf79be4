//! # Category Table
//!
//! Ordered `(category, entries)` pairs. Categories keep their insertion order
//! and entries keep registration order; both are traversed back to front so
//! entries can be removed by index during a single scan without touching the
//! part that has not been visited yet.

use super::dispatcher::Dispatcher;
use super::target::{TargetKey, TargetRef};
use crate::events::EventCategory;
use std::any::Any;
use std::sync::Arc;

pub(crate) struct Entry {
    pub(crate) target: TargetRef,
    pub(crate) dispatcher: Arc<dyn Dispatcher>,
}

pub(crate) struct EntryList {
    pub(crate) category: EventCategory,
    pub(crate) entries: Vec<Entry>,
}

/// Mutation requested from inside a running dispatch
pub(crate) enum PendingOp {
    Register {
        category: EventCategory,
        entry: Entry,
    },
    Unregister {
        category: EventCategory,
        key: TargetKey,
        // Holds the target so its address cannot be reused before the removal runs
        _target: Box<dyn Any + Send>,
    },
    Clear,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RemoveOutcome {
    pub(crate) removed: bool,
    pub(crate) purged: usize,
    pub(crate) category_dropped: bool,
}

#[derive(Default)]
pub(crate) struct CategoryTable {
    pub(crate) lists: Vec<EntryList>,
    /// Number of dispatches running on the lock-owning thread
    pub(crate) dispatch_depth: usize,
    pub(crate) pending: Vec<PendingOp>,
}

impl CategoryTable {
    pub(crate) fn position(&self, category: &EventCategory) -> Option<usize> {
        self.lists.iter().position(|list| list.category == *category)
    }

    pub(crate) fn insert(&mut self, category: EventCategory, entry: Entry) {
        match self.position(&category) {
            Some(idx) => self.lists[idx].entries.push(entry),
            None => self.lists.push(EntryList {
                category,
                entries: vec![entry],
            }),
        }
    }

    /// Remove the most recently registered entry for `key` under `category`.
    ///
    /// Every unavailable weak entry passed over during the scan is purged,
    /// whether or not a match is found.
    pub(crate) fn remove(&mut self, category: &EventCategory, key: TargetKey) -> RemoveOutcome {
        let mut outcome = RemoveOutcome::default();
        let Some(idx) = self.position(category) else {
            return outcome;
        };

        let entries = &mut self.lists[idx].entries;
        let mut i = entries.len();
        while i > 0 {
            i -= 1;
            match entries[i].target.resolved_key() {
                None => {
                    entries.remove(i);
                    outcome.purged += 1;
                }
                Some(candidate) if candidate == key => {
                    entries.remove(i);
                    outcome.removed = true;
                    break;
                }
                Some(_) => {}
            }
        }

        if entries.is_empty() {
            self.lists.remove(idx);
            outcome.category_dropped = true;
        }
        outcome
    }

    pub(crate) fn clear(&mut self) {
        self.lists.clear();
    }

    pub(crate) fn apply(&mut self, op: PendingOp) {
        match op {
            PendingOp::Register { category, entry } => self.insert(category, entry),
            PendingOp::Unregister { category, key, .. } => {
                self.remove(&category, key);
            }
            PendingOp::Clear => self.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;
    use crate::events::Event;

    struct Click;
    struct Key;
    crate::event_type!(Click);
    crate::event_type!(Key);

    fn noop() -> Arc<dyn Dispatcher> {
        Arc::new(|_: &dyn Event, _: &(dyn Any + Send + Sync)| -> Result<(), DispatchError> { Ok(()) })
    }

    fn entry(target: &Arc<u32>, strong: bool) -> Entry {
        Entry {
            target: TargetRef::new(target.clone(), strong),
            dispatcher: noop(),
        }
    }

    #[test]
    fn test_one_list_per_category_in_insertion_order() {
        let mut table = CategoryTable::default();
        let a = Arc::new(1_u32);
        table.insert(EventCategory::of::<Key>(), entry(&a, true));
        table.insert(EventCategory::of::<Click>(), entry(&a, true));
        table.insert(EventCategory::of::<Key>(), entry(&a, true));

        assert_eq!(table.lists.len(), 2);
        assert_eq!(table.lists[0].category, EventCategory::of::<Key>());
        assert_eq!(table.lists[0].entries.len(), 2);
        assert_eq!(table.position(&EventCategory::of::<Click>()), Some(1));
    }

    #[test]
    fn test_remove_takes_most_recent_duplicate_only() {
        let mut table = CategoryTable::default();
        let click = EventCategory::of::<Click>();
        let a = Arc::new(1_u32);
        let b = Arc::new(2_u32);
        table.insert(click, entry(&a, true));
        table.insert(click, entry(&b, true));
        table.insert(click, entry(&a, true));

        let outcome = table.remove(&click, TargetKey::of(&a));
        assert!(outcome.removed);
        assert!(!outcome.category_dropped);

        let keys: Vec<_> = table.lists[0]
            .entries
            .iter()
            .map(|e| e.target.resolved_key())
            .collect();
        assert_eq!(keys, vec![Some(TargetKey::of(&a)), Some(TargetKey::of(&b))]);
    }

    #[test]
    fn test_remove_purges_dead_weak_entries_even_without_match() {
        let mut table = CategoryTable::default();
        let click = EventCategory::of::<Click>();
        let keep = Arc::new(1_u32);
        let dead = Arc::new(2_u32);
        table.insert(click, entry(&keep, true));
        table.insert(click, entry(&dead, false));
        drop(dead);

        let stranger = Arc::new(3_u32);
        let outcome = table.remove(&click, TargetKey::of(&stranger));
        assert!(!outcome.removed);
        assert_eq!(outcome.purged, 1);
        assert_eq!(table.lists[0].entries.len(), 1);
    }

    #[test]
    fn test_emptied_category_is_dropped() {
        let mut table = CategoryTable::default();
        let click = EventCategory::of::<Click>();
        let a = Arc::new(1_u32);
        table.insert(click, entry(&a, true));

        let outcome = table.remove(&click, TargetKey::of(&a));
        assert!(outcome.category_dropped);
        assert!(table.lists.is_empty());
        assert_eq!(table.remove(&click, TargetKey::of(&a)), RemoveOutcome::default());
    }

    #[test]
    fn test_apply_pending_ops() {
        let mut table = CategoryTable::default();
        let click = EventCategory::of::<Click>();
        let a = Arc::new(1_u32);

        table.apply(PendingOp::Register {
            category: click,
            entry: entry(&a, true),
        });
        assert_eq!(table.lists.len(), 1);

        table.apply(PendingOp::Unregister {
            category: click,
            key: TargetKey::of(&a),
            _target: Box::new(a.clone()),
        });
        assert!(table.lists.is_empty());

        table.apply(PendingOp::Register {
            category: click,
            entry: entry(&a, true),
        });
        table.apply(PendingOp::Clear);
        assert!(table.lists.is_empty());
    }
}
