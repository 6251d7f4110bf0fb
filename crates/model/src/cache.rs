//! Entities addressable by server id or by name.
//!
//! The cache owns its entries in a flat arena; [`Slot`]s are stable indexes
//! into it and are what other structures hold instead of references.

use std::collections::HashMap;
use std::sync::Arc;

/// Server-assigned identifier.
pub type Id = i64;

/// Anything that can be stored in an [`IndexCache`].
pub trait Indexed {
    fn id(&self) -> Id;
    fn name(&self) -> &str;
}

impl<T: Indexed> Indexed for Arc<T> {
    fn id(&self) -> Id {
        (**self).id()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Position of an entry in its cache's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot(usize);

impl Slot {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Id/name index over owned entities.
///
/// Ids are unique within one cache; adding an entity whose id is already
/// present replaces it in place. Names may collide: the latest insertion
/// wins for name lookup while every entry stays reachable by id.
#[derive(Debug, Clone)]
pub struct IndexCache<T> {
    entries: Vec<T>,
    by_id: HashMap<Id, usize>,
    by_name: HashMap<String, usize>,
}

impl<T> Default for IndexCache<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_id: HashMap::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T: Indexed> IndexCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: T) -> Slot {
        let id = entity.id();
        let name = entity.name().to_string();
        let existing = self.by_id.get(&id).copied();
        let index = match existing {
            Some(index) => {
                let old_name = self.entries[index].name().to_string();
                if self.by_name.get(&old_name) == Some(&index) {
                    self.by_name.remove(&old_name);
                }
                self.entries[index] = entity;
                index
            }
            None => {
                self.entries.push(entity);
                self.by_id.insert(id, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.by_name.insert(name, index);
        Slot(index)
    }

    pub fn by_id(&self, id: Id) -> Option<&T> {
        self.by_id.get(&id).map(|&i| &self.entries[i])
    }

    pub fn by_name(&self, name: &str) -> Option<&T> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn slot_of(&self, id: Id) -> Option<Slot> {
        self.by_id.get(&id).copied().map(Slot)
    }

    pub fn get(&self, slot: Slot) -> Option<&T> {
        self.entries.get(slot.0)
    }

    pub(crate) fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        self.entries.get_mut(slot.0)
    }

    /// Every stored id. Order is unspecified.
    pub fn ids(&self) -> Vec<Id> {
        self.entries.iter().map(Indexed::id).collect()
    }

    /// Every stored name, colliding names included. Order is unspecified.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = Slot> {
        (0..self.entries.len()).map(Slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Indexed> FromIterator<T> for IndexCache<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut cache = Self::new();
        for entity in iter {
            cache.add(entity);
        }
        cache
    }
}
