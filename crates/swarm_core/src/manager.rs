//! Indexed entity manager.
//!
//! Wraps [`EntityStore`] and keeps an ordered id list for every hot
//! component kind. All component adds, removes and entity destruction go
//! through this type, so the lists are updated in the same call as the
//! pools they mirror.

use std::any::Any;

use crate::components::{Component, EntityId, Hover, HotKind, Transform};
use crate::error::{GameError, Result};
use crate::factions::Faction;
use crate::game_state::GameState;
use crate::math::Vec2Fixed;
use crate::store::{EntityRef, EntityStore};

/// Entity store plus derived hot-kind indices.
#[derive(Debug, Clone, Default)]
pub struct EntityManager {
    store: EntityStore,
    factories: Vec<EntityId>,
    shields: Vec<EntityId>,
    drones: Vec<EntityId>,
    game_state: Option<EntityId>,
}

impl EntityManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the underlying store.
    #[must_use]
    pub const fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Create a new empty entity.
    pub fn create(&mut self) -> EntityId {
        self.store.create()
    }

    /// Check whether an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.store.contains(id)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if there are no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Destroy an entity and drop it from every index.
    ///
    /// Unknown ids are ignored; returns whether anything was destroyed.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        if !self.store.destroy(id) {
            return false;
        }
        for kind in [HotKind::Factory, HotKind::Shield, HotKind::Drone] {
            self.index_mut(kind).retain(|&e| e != id);
        }
        if self.game_state == Some(id) {
            self.game_state = None;
        }
        self.check_indices_in_debug();
        true
    }

    /// Attach or replace a component, returning the replaced record.
    ///
    /// # Errors
    ///
    /// - [`GameError::UnknownEntity`] if `id` does not exist.
    /// - [`GameError::FactionReassigned`] when changing an assigned faction.
    /// - [`GameError::GameStateExists`] when a second entity gets a
    ///   [`GameState`].
    pub fn add_component<T: Component>(&mut self, id: EntityId, component: T) -> Result<Option<T>> {
        if !self.store.contains(id) {
            return Err(GameError::UnknownEntity(id));
        }

        if let Some(requested) = (&component as &dyn Any).downcast_ref::<Faction>() {
            if let Some(&current) = self.store.get_component::<Faction>(id) {
                if current != *requested {
                    return Err(GameError::FactionReassigned {
                        entity: id,
                        current,
                        requested: *requested,
                    });
                }
            }
        }

        let is_game_state = (&component as &dyn Any).is::<GameState>();
        if is_game_state {
            if let Some(existing) = self.game_state.filter(|&existing| existing != id) {
                return Err(GameError::GameStateExists(existing));
            }
        }

        let replaced = self.store.add_component(id, component)?;
        if replaced.is_none() {
            if let Some(kind) = T::KIND.hot_kind() {
                self.index_mut(kind).push(id);
            }
        }
        if is_game_state {
            self.game_state = Some(id);
        }
        self.check_indices_in_debug();
        Ok(replaced)
    }

    /// Remove a component. No-op when absent.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Option<T> {
        let removed = self.store.remove_component::<T>(id)?;
        if let Some(kind) = T::KIND.hot_kind() {
            self.index_mut(kind).retain(|&e| e != id);
        }
        if self.game_state == Some(id) && (&removed as &dyn Any).is::<GameState>() {
            self.game_state = None;
        }
        self.check_indices_in_debug();
        Some(removed)
    }

    /// Get a component.
    #[must_use]
    pub fn get_component<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.store.get_component(id)
    }

    /// Get a component mutably.
    ///
    /// Replacing the record through this reference cannot change index
    /// membership.
    pub fn get_component_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.store.get_component_mut(id)
    }

    /// Check whether an entity holds a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, id: EntityId) -> bool {
        self.store.has_component::<T>(id)
    }

    /// Entities holding a [`crate::components::Factory`], in insertion order.
    #[must_use]
    pub fn factories(&self) -> &[EntityId] {
        &self.factories
    }

    /// Entities holding a [`crate::components::Shield`], in insertion order.
    #[must_use]
    pub fn shields(&self) -> &[EntityId] {
        &self.shields
    }

    /// Entities holding a [`crate::components::Drone`], in insertion order.
    #[must_use]
    pub fn drones(&self) -> &[EntityId] {
        &self.drones
    }

    /// The index list for a hot kind.
    #[must_use]
    pub fn index(&self, kind: HotKind) -> &[EntityId] {
        match kind {
            HotKind::Factory => &self.factories,
            HotKind::Shield => &self.shields,
            HotKind::Drone => &self.drones,
        }
    }

    /// Every live entity id, sorted.
    #[must_use]
    pub fn all_entity_ids(&self) -> Vec<EntityId> {
        self.store.ids().collect()
    }

    /// Iterate over all entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = EntityRef<'_>> {
        self.store.iter()
    }

    /// Iterate over every record of type `T`.
    pub fn components<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.store.components::<T>()
    }

    /// Iterate mutably over every record of type `T`.
    pub fn components_mut<T: Component>(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.store.components_mut::<T>()
    }

    // ------------------------------------------------------------------
    // GameState singleton
    // ------------------------------------------------------------------

    /// Create the GameState entity for the given players.
    ///
    /// # Errors
    ///
    /// - [`GameError::GameStateExists`] if one was already created.
    /// - [`GameError::NoPlayers`] if `players` is empty.
    pub fn create_game_state(
        &mut self,
        players: impl IntoIterator<Item = Faction>,
    ) -> Result<EntityId> {
        if let Some(existing) = self.game_state {
            return Err(GameError::GameStateExists(existing));
        }
        let state = GameState::new(players)?;
        let id = self.create();
        self.add_component(id, state)?;
        tracing::debug!(entity = id, "GameState created");
        Ok(id)
    }

    /// The entity holding the GameState.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoGameState`] before one is created.
    pub fn game_state_entity(&self) -> Result<EntityId> {
        self.game_state.ok_or(GameError::NoGameState)
    }

    /// The GameState record.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoGameState`] before one is created.
    pub fn game_state(&self) -> Result<&GameState> {
        let id = self.game_state_entity()?;
        self.store
            .get_component::<GameState>(id)
            .ok_or(GameError::NoGameState)
    }

    /// The GameState record, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoGameState`] before one is created.
    pub fn game_state_mut(&mut self) -> Result<&mut GameState> {
        let id = self.game_state_entity()?;
        self.store
            .get_component_mut::<GameState>(id)
            .ok_or(GameError::NoGameState)
    }

    // ------------------------------------------------------------------
    // Convenience lookups
    // ------------------------------------------------------------------

    /// Faction of an entity, if it has one.
    #[must_use]
    pub fn faction_of(&self, id: EntityId) -> Option<Faction> {
        self.get_component::<Faction>(id).copied()
    }

    /// World position of an entity, if it has a transform.
    #[must_use]
    pub fn position_of(&self, id: EntityId) -> Option<Vec2Fixed> {
        self.get_component::<Transform>(id).map(|t| t.position)
    }

    /// Mark `target` as the only hovered entity.
    ///
    /// Every other hover flag is cleared. A [`Hover`] record is added to
    /// the target when missing; `None` just clears.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownEntity`] if `target` does not exist.
    pub fn set_hovered(&mut self, target: Option<EntityId>) -> Result<()> {
        if let Some(id) = target {
            if !self.contains(id) {
                return Err(GameError::UnknownEntity(id));
            }
        }
        for (_, hover) in self.store.components_mut::<Hover>() {
            hover.is_hovered = false;
        }
        if let Some(id) = target {
            match self.store.get_component_mut::<Hover>(id) {
                Some(hover) => hover.is_hovered = true,
                None => {
                    let position = self.position_of(id).unwrap_or_default();
                    self.add_component(
                        id,
                        Hover {
                            is_hovered: true,
                            position,
                        },
                    )?;
                }
            }
        }
        Ok(())
    }

    /// First hovered entity in id order.
    #[must_use]
    pub fn hovered(&self) -> Option<EntityId> {
        self.store
            .components::<Hover>()
            .filter(|(_, hover)| hover.is_hovered)
            .map(|(id, _)| id)
            .min()
    }

    // ------------------------------------------------------------------
    // Index validation
    // ------------------------------------------------------------------

    /// Check every hot index against the component pools.
    ///
    /// Each list must hold exactly the ids owning that kind, without
    /// duplicates, and the GameState cache must point at a live record.
    #[must_use]
    pub fn indices_consistent(&self) -> bool {
        use crate::components::{Drone, Factory, Shield};

        fn matches(index: &[EntityId], mut expected: Vec<EntityId>) -> bool {
            let mut actual = index.to_vec();
            actual.sort_unstable();
            expected.sort_unstable();
            let before = actual.len();
            actual.dedup();
            before == actual.len() && actual == expected
        }

        let game_state_ok = match self.game_state {
            Some(id) => self.store.has_component::<GameState>(id),
            None => self.store.components::<GameState>().next().is_none(),
        };

        game_state_ok
            && matches(&self.factories, self.store.ids_with::<Factory>())
            && matches(&self.shields, self.store.ids_with::<Shield>())
            && matches(&self.drones, self.store.ids_with::<Drone>())
    }

    fn index_mut(&mut self, kind: HotKind) -> &mut Vec<EntityId> {
        match kind {
            HotKind::Factory => &mut self.factories,
            HotKind::Shield => &mut self.shields,
            HotKind::Drone => &mut self.drones,
        }
    }

    #[cfg(feature = "debug-validation")]
    fn check_indices_in_debug(&self) {
        if !self.indices_consistent() {
            tracing::error!(manager = ?self, "Hot index drifted from component pools");
            debug_assert!(false, "hot index drifted from component pools");
        }
    }

    #[cfg(not(feature = "debug-validation"))]
    #[allow(clippy::unused_self)]
    const fn check_indices_in_debug(&self) {}
}
