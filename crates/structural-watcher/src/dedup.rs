use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::ports::{ElementKey, HostElement, WeakElement};

/// Set of elements that already carry the click listener.
///
/// Entries hold weak handles only, so membership never keeps a removed
/// element alive. A key whose element has been dropped counts as absent.
pub struct InstrumentedSet<E: HostElement> {
    entries: DashMap<ElementKey, E::Weak>,
}

impl<E: HostElement> Default for InstrumentedSet<E> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<E: HostElement> InstrumentedSet<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the element was not yet a member.
    pub fn insert(&self, element: &E) -> bool {
        match self.entries.entry(element.key()) {
            Entry::Occupied(mut slot) => {
                // The key may have been reused by a newer element.
                if is_same(slot.get(), element) {
                    return false;
                }
                slot.insert(element.downgrade());
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(element.downgrade());
                true
            }
        }
    }

    pub fn contains(&self, element: &E) -> bool {
        self.entries
            .get(&element.key())
            .map_or(false, |weak| is_same(weak.value(), element))
    }

    /// Members whose element is still alive.
    pub fn live_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().upgrade().is_some())
            .count()
    }

    /// Drop entries for elements that no longer exist. Returns how many went.
    pub fn prune(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.upgrade().is_some());
        before - self.entries.len()
    }
}

fn is_same<E: HostElement>(weak: &E::Weak, element: &E) -> bool {
    weak.upgrade().map_or(false, |live| live.key() == element.key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryElement;

    #[test]
    fn insert_reports_first_sight_only() {
        let set = InstrumentedSet::new();
        let button = MemoryElement::element("button");
        assert!(set.insert(&button));
        assert!(!set.insert(&button));
        assert!(set.contains(&button));
        assert!(!set.contains(&MemoryElement::element("button")));
        assert_eq!(set.live_len(), 1);
    }

    #[test]
    fn dropped_elements_are_not_retained() {
        let set = InstrumentedSet::new();
        let button = MemoryElement::element("button");
        set.insert(&button);
        let weak = button.downgrade();
        drop(button);

        assert!(weak.upgrade().is_none());
        assert_eq!(set.live_len(), 0);
        assert_eq!(set.prune(), 1);
        assert_eq!(set.prune(), 0);
    }
}
