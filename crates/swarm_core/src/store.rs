//! Typed component storage.
//!
//! Each component type lives in its own sparse set keyed by entity id,
//! giving O(1) add/remove/lookup without dynamic typing at call sites.
//! The [`EntityStore`] owns the set of live ids and every pool.

use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::components::{Component, ComponentKind, EntityId};
use crate::error::{GameError, Result};

/// Sparse set holding one component type.
///
/// Values are packed densely; removal swaps the last element into the hole.
#[derive(Debug, Clone)]
pub struct SparseSet<T> {
    sparse: HashMap<EntityId, usize>,
    ids: Vec<EntityId>,
    values: Vec<T>,
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self {
            sparse: HashMap::new(),
            ids: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T> SparseSet<T> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value for `id`, returning the previous value.
    pub fn insert(&mut self, id: EntityId, value: T) -> Option<T> {
        if let Some(&slot) = self.sparse.get(&id) {
            return Some(std::mem::replace(&mut self.values[slot], value));
        }
        self.sparse.insert(id, self.values.len());
        self.ids.push(id);
        self.values.push(value);
        None
    }

    /// Remove the value for `id`.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let slot = self.sparse.remove(&id)?;
        let value = self.values.swap_remove(slot);
        self.ids.swap_remove(slot);
        if let Some(&moved) = self.ids.get(slot) {
            self.sparse.insert(moved, slot);
        }
        Some(value)
    }

    /// Get the value for `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.sparse.get(&id).map(|&slot| &self.values[slot])
    }

    /// Get the value for `id` mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        match self.sparse.get(&id) {
            Some(&slot) => Some(&mut self.values[slot]),
            None => None,
        }
    }

    /// Check whether `id` has a value.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.sparse.contains_key(&id)
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.ids.iter().copied().zip(self.values.iter())
    }

    /// Iterate mutably in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.ids.iter().copied().zip(self.values.iter_mut())
    }
}

/// Type-erased view of a pool, used for whole-entity operations.
trait AnyPool: Send + Sync {
    fn kind(&self) -> ComponentKind;
    fn contains_entity(&self, id: EntityId) -> bool;
    fn remove_entity(&mut self, id: EntityId) -> bool;
    fn len(&self) -> usize;
    fn clone_box(&self) -> Box<dyn AnyPool>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyPool for SparseSet<T> {
    fn kind(&self) -> ComponentKind {
        T::KIND
    }

    fn contains_entity(&self, id: EntityId) -> bool {
        self.contains(id)
    }

    fn remove_entity(&mut self, id: EntityId) -> bool {
        self.remove(id).is_some()
    }

    fn len(&self) -> usize {
        SparseSet::len(self)
    }

    fn clone_box(&self) -> Box<dyn AnyPool> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owns every entity and all component pools.
///
/// Entity ids start at 1 and are never reused.
pub struct EntityStore {
    next_id: EntityId,
    entities: BTreeSet<EntityId>,
    pools: HashMap<TypeId, Box<dyn AnyPool>>,
}

impl EntityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entities: BTreeSet::new(),
            pools: HashMap::new(),
        }
    }

    /// Create a new entity with no components.
    pub fn create(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.insert(id);
        id
    }

    /// Destroy an entity and every component it holds.
    ///
    /// Returns `false` (and does nothing) if the id is unknown.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        if !self.entities.remove(&id) {
            return false;
        }
        for pool in self.pools.values_mut() {
            pool.remove_entity(id);
        }
        true
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains(&id)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the store has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Attach or replace a component, returning the replaced record.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownEntity`] if `id` does not exist.
    pub fn add_component<T: Component>(&mut self, id: EntityId, component: T) -> Result<Option<T>> {
        if !self.contains(id) {
            return Err(GameError::UnknownEntity(id));
        }
        Ok(self.pool_or_insert::<T>().insert(id, component))
    }

    /// Get a component, or `None` if the entity or record is absent.
    #[must_use]
    pub fn get_component<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.pool::<T>()?.get(id)
    }

    /// Get a component mutably.
    pub fn get_component_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.pool_mut::<T>()?.get_mut(id)
    }

    /// Check whether an entity holds a component of type `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, id: EntityId) -> bool {
        self.pool::<T>().is_some_and(|pool| pool.contains(id))
    }

    /// Remove a component. No-op when absent.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Option<T> {
        self.pool_mut::<T>()?.remove(id)
    }

    /// Sorted ids of every live entity.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    /// Read-only view of one entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        self.contains(id).then_some(EntityRef { id, store: self })
    }

    /// Iterate over all entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = EntityRef<'_>> {
        self.entities.iter().map(move |&id| EntityRef { id, store: self })
    }

    /// Iterate over every record of type `T` (pool order).
    pub fn components<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.pool::<T>().into_iter().flat_map(SparseSet::iter)
    }

    /// Iterate mutably over every record of type `T` (pool order).
    pub fn components_mut<T: Component>(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.pool_mut::<T>().into_iter().flat_map(SparseSet::iter_mut)
    }

    /// Sorted ids of entities holding a `T`.
    #[must_use]
    pub fn ids_with<T: Component>(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.components::<T>().map(|(id, _)| id).collect();
        ids.sort_unstable();
        ids
    }

    /// Kinds of every record attached to `id`, sorted.
    #[must_use]
    pub fn kinds_of(&self, id: EntityId) -> Vec<ComponentKind> {
        let mut kinds: Vec<ComponentKind> = self
            .pools
            .values()
            .filter(|pool| pool.contains_entity(id))
            .map(|pool| pool.kind())
            .collect();
        kinds.sort_unstable();
        kinds
    }

    /// Number of records of the given kind.
    #[must_use]
    pub fn count_of(&self, kind: ComponentKind) -> usize {
        self.pools
            .values()
            .filter(|pool| pool.kind() == kind)
            .map(|pool| pool.len())
            .sum()
    }

    fn pool<T: Component>(&self) -> Option<&SparseSet<T>> {
        self.pools
            .get(&TypeId::of::<T>())
            .and_then(|pool| pool.as_any().downcast_ref::<SparseSet<T>>())
    }

    fn pool_mut<T: Component>(&mut self) -> Option<&mut SparseSet<T>> {
        self.pools
            .get_mut(&TypeId::of::<T>())
            .and_then(|pool| pool.as_any_mut().downcast_mut::<SparseSet<T>>())
    }

    fn pool_or_insert<T: Component>(&mut self) -> &mut SparseSet<T> {
        self.pools
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(SparseSet::<T>::new()))
            .as_any_mut()
            .downcast_mut::<SparseSet<T>>()
            .expect("component pools are keyed by their own TypeId")
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EntityStore {
    fn clone(&self) -> Self {
        Self {
            next_id: self.next_id,
            entities: self.entities.clone(),
            pools: self
                .pools
                .iter()
                .map(|(type_id, pool)| (*type_id, pool.clone_box()))
                .collect(),
        }
    }
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pools: Vec<(ComponentKind, usize)> = self
            .pools
            .values()
            .map(|pool| (pool.kind(), pool.len()))
            .collect();
        pools.sort_unstable();
        f.debug_struct("EntityStore")
            .field("next_id", &self.next_id)
            .field("entities", &self.entities.len())
            .field("pools", &pools)
            .finish()
    }
}

/// Borrowed view of a single entity and its records.
#[derive(Clone, Copy)]
pub struct EntityRef<'a> {
    id: EntityId,
    store: &'a EntityStore,
}

impl<'a> EntityRef<'a> {
    /// The entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Get a record of type `T`.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&'a T> {
        self.store.get_component::<T>(self.id)
    }

    /// Check for a record of type `T`.
    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.store.has_component::<T>(self.id)
    }

    /// Kinds of every attached record.
    #[must_use]
    pub fn kinds(&self) -> Vec<ComponentKind> {
        self.store.kinds_of(self.id)
    }
}

impl fmt::Debug for EntityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("id", &self.id)
            .field("kinds", &self.kinds())
            .finish()
    }
}
