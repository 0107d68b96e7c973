//! Ordered, id-indexed entity table.
//!
//! [`EntityTable`] keeps entries in insertion order for iteration and an
//! id -> slot map for O(1) lookup and uniqueness. Both always describe the
//! same member set: an insert either updates both or neither.

use std::collections::HashMap;
use std::fmt;

use crate::entity::{EntityId, EntityVariant};
use crate::CmsError;

/// Table of entities of variant type `T`.
///
/// `T` is usually `dyn EntityVariant` (a mixed table); a concrete variant
/// type gives a homogeneous table.
pub struct EntityTable<T: ?Sized + EntityVariant = dyn EntityVariant> {
    entries: Vec<Box<T>>,
    index: HashMap<EntityId, usize>,
}

impl<T: ?Sized + EntityVariant> EntityTable<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register an entry.
    ///
    /// An unset (or empty) id is derived from the entry's concrete type name
    /// and written back into the entry.
    ///
    /// Returns [`CmsError::DuplicateId`] if the id is taken; the table is
    /// left unchanged.
    pub fn add(&mut self, mut entry: Box<T>) -> Result<&mut T, CmsError> {
        let id = match entry.entity().id.clone() {
            Some(id) if !id.is_empty() => id,
            _ => {
                let derived = EntityId::new(entry.variant_name());
                entry.entity_mut().id = Some(derived.clone());
                derived
            }
        };

        if self.index.contains_key(&id) {
            return Err(CmsError::DuplicateId { id });
        }

        let slot = self.entries.len();
        self.entries.push(entry);
        self.index.insert(id, slot);
        Ok(&mut *self.entries[slot])
    }

    /// Default-construct an entry with an explicit id and register it.
    ///
    /// Unlike [`add`](Self::add), the id is never derived: an empty id is
    /// [`CmsError::EmptyId`].
    pub fn new_entity(&mut self, id: impl Into<EntityId>) -> Result<&mut T, CmsError>
    where
        T: Default + Sized,
    {
        let id = id.into();
        if id.is_empty() {
            return Err(CmsError::EmptyId);
        }
        let mut entry = Box::<T>::default();
        entry.entity_mut().id = Some(id);
        self.add(entry)
    }

    /// All entries in insertion order.
    pub fn get_all(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter().map(|entry| &**entry)
    }

    pub fn entries(&self) -> &[Box<T>] {
        &self.entries
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> + '_ {
        self.entries
            .iter()
            .filter_map(|entry| entry.entity().id.as_ref())
    }

    pub fn find_by_id(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&slot| &*self.entries[slot])
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut T> {
        let slot = *self.index.get(id)?;
        Some(&mut *self.entries[slot])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// First entry that can be viewed as `V`, in insertion order.
    pub fn find_by_type<V: EntityVariant>(&self) -> Option<&V> {
        self.entries
            .iter()
            .find_map(|entry| V::downcast_variant(&**entry))
    }

    /// Every entry that can be viewed as `V`, in insertion order.
    pub fn filter_by_type<V: EntityVariant>(&self) -> Vec<&V> {
        self.entries
            .iter()
            .filter_map(|entry| V::downcast_variant(&**entry))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized + EntityVariant> Default for EntityTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + EntityVariant> fmt::Debug for EntityTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityTable")
            .field("len", &self.entries.len())
            .field("ids", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
