//! Explicit ownership of draggable instances.
//!
//! Whatever composes the widgets owns a registry and hands out ids; there
//! is no module-level instance map hiding behind the API.

use indexmap::IndexMap;

use crate::draggable::Draggable;

/// Handle to a registered [`Draggable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DraggableId(u64);

/// Owns a set of draggables keyed by generated id, iterated in insertion
/// order.
#[derive(Default)]
pub struct DraggableRegistry {
    entries: IndexMap<DraggableId, Draggable>,
    next_id: u64,
}

impl DraggableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, draggable: Draggable) -> DraggableId {
        self.next_id += 1;
        let id = DraggableId(self.next_id);
        self.entries.insert(id, draggable);
        id
    }

    pub fn get(&self, id: DraggableId) -> Option<&Draggable> {
        self.entries.get(&id)
    }

    /// Removes and returns the instance; the caller decides whether to
    /// dispose it or keep using it. Unknown ids return `None`.
    pub fn remove(&mut self, id: DraggableId) -> Option<Draggable> {
        self.entries.shift_remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DraggableId> + '_ {
        self.entries.keys().copied()
    }
}
