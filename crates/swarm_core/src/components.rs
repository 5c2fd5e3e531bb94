//! Component definitions.
//!
//! Components are pure data with no cross-entity behavior. Every entity is
//! an identifier plus at most one record of each kind below, held in the
//! typed pools of [`crate::store::EntityStore`].

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::factions::Faction;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Unique identifier for entities.
///
/// Identifiers are handed out monotonically and never reused, so a stale
/// id held as a weak reference can only ever resolve to nothing.
pub type EntityId = u64;

/// Every kind of record an entity can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// [`Faction`].
    Faction,
    /// [`Transform`].
    Transform,
    /// [`Factory`].
    Factory,
    /// [`PowerPlant`].
    PowerPlant,
    /// [`Drone`].
    Drone,
    /// [`Shield`].
    Shield,
    /// [`Garrison`].
    Garrison,
    /// [`AiController`].
    AiController,
    /// [`crate::game_state::GameState`].
    GameState,
    /// [`Label`].
    Label,
    /// [`Hover`].
    Hover,
    /// [`Tag`].
    Tag,
}

/// Component kinds iterated in bulk every tick.
///
/// The manager keeps an ordered id list for each of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotKind {
    /// Entities with a [`Factory`].
    Factory,
    /// Entities with a [`Shield`].
    Shield,
    /// Entities with a [`Drone`].
    Drone,
}

impl ComponentKind {
    /// Human-readable name, used in errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Faction => "Faction",
            Self::Transform => "Transform",
            Self::Factory => "Factory",
            Self::PowerPlant => "PowerPlant",
            Self::Drone => "Drone",
            Self::Shield => "Shield",
            Self::Garrison => "Garrison",
            Self::AiController => "AiController",
            Self::GameState => "GameState",
            Self::Label => "Label",
            Self::Hover => "Hover",
            Self::Tag => "Tag",
        }
    }

    /// The hot index this kind participates in, if any.
    #[must_use]
    pub const fn hot_kind(self) -> Option<HotKind> {
        match self {
            Self::Factory => Some(HotKind::Factory),
            Self::Shield => Some(HotKind::Shield),
            Self::Drone => Some(HotKind::Drone),
            _ => None,
        }
    }
}

/// A record type that can be stored on an entity.
pub trait Component: Any + Clone + fmt::Debug + Send + Sync {
    /// The kind tag for this record type.
    const KIND: ComponentKind;
}

impl Component for Faction {
    const KIND: ComponentKind = ComponentKind::Faction;
}

// ============================================================================
// Spatial
// ============================================================================

/// World placement of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transform {
    /// World position.
    pub position: Vec2Fixed,
    /// Rotation in degrees.
    #[serde(with = "fixed_serde")]
    pub rotation: Fixed,
    /// Scale factors.
    pub scale: Vec2Fixed,
}

impl Transform {
    /// Unrotated, unit-scale transform at `position`.
    #[must_use]
    pub fn at(position: Vec2Fixed) -> Self {
        Self {
            position,
            rotation: Fixed::ZERO,
            scale: Vec2Fixed::new(Fixed::ONE, Fixed::ONE),
        }
    }
}

impl Component for Transform {
    const KIND: ComponentKind = ComponentKind::Transform;
}

// ============================================================================
// Economy
// ============================================================================

/// A structure that builds drones over time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Factory {
    /// Display name.
    pub name: String,
    /// Drones per second.
    #[serde(with = "fixed_serde")]
    pub production_rate: Fixed,
    /// Fractional progress toward the next drone.
    #[serde(with = "fixed_serde")]
    pub accumulator: Fixed,
}

impl Factory {
    /// Create a factory with no progress.
    #[must_use]
    pub fn new(name: impl Into<String>, production_rate: Fixed) -> Self {
        Self {
            name: name.into(),
            production_rate,
            accumulator: Fixed::ZERO,
        }
    }

    /// Advance production progress by `dt` seconds.
    pub fn advance(&mut self, dt: Fixed) {
        let gained = self.production_rate.saturating_mul(dt);
        self.accumulator = self.accumulator.saturating_add(gained);
    }

    /// Check whether at least one whole drone is ready.
    #[must_use]
    pub fn has_ready_unit(&self) -> bool {
        self.accumulator >= Fixed::ONE
    }

    /// Consume one ready drone's worth of progress.
    pub fn take_unit(&mut self) {
        self.accumulator -= Fixed::ONE;
    }
}

impl Component for Factory {
    const KIND: ComponentKind = ComponentKind::Factory;
}

/// A structure that feeds its faction's energy pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PowerPlant {
    /// Maximum energy this plant contributes to its faction.
    pub capacity: u32,
    /// Energy accrued per second while the pool is below capacity.
    #[serde(with = "fixed_serde")]
    pub energy_regen: Fixed,
}

impl PowerPlant {
    /// Create a power plant.
    #[must_use]
    pub const fn new(capacity: u32, energy_regen: Fixed) -> Self {
        Self {
            capacity,
            energy_regen,
        }
    }
}

impl Component for PowerPlant {
    const KIND: ComponentKind = ComponentKind::PowerPlant;
}

// ============================================================================
// Units
// ============================================================================

/// A mobile combat unit.
///
/// The owning faction is the entity's [`Faction`] record. `target` is a weak
/// reference: it may name an entity that has since been destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Drone {
    /// Entity this drone is attacking, if any.
    pub target: Option<EntityId>,
    /// Travel speed in world units per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Patrol direction used when there is no target (zero = hold).
    pub heading: Vec2Fixed,
    /// Damage dealt per second while the target is in range.
    #[serde(with = "fixed_serde")]
    pub damage_per_second: Fixed,
}

impl Drone {
    /// Create an idle drone.
    #[must_use]
    pub const fn new(speed: Fixed, damage_per_second: Fixed) -> Self {
        Self {
            target: None,
            speed,
            heading: Vec2Fixed::ZERO,
            damage_per_second,
        }
    }

    /// Check if the drone has no target assigned.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.target.is_none()
    }

    /// Forget the current target.
    pub fn clear_target(&mut self) {
        self.target = None;
    }
}

impl Component for Drone {
    const KIND: ComponentKind = ComponentKind::Drone;
}

/// Regenerating damage buffer.
///
/// `0 ≤ current ≤ max` holds after every method call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shield {
    /// Current shield points.
    #[serde(with = "fixed_serde")]
    pub current: Fixed,
    /// Maximum shield points.
    #[serde(with = "fixed_serde")]
    pub max: Fixed,
    /// Points regenerated per second.
    #[serde(with = "fixed_serde")]
    pub regen_rate: Fixed,
}

impl Shield {
    /// Create a fully charged shield.
    #[must_use]
    pub fn new(max: Fixed, regen_rate: Fixed) -> Self {
        let max = max.max(Fixed::ZERO);
        Self {
            current: max,
            max,
            regen_rate,
        }
    }

    /// Create a shield with an explicit starting charge, clamped to `[0, max]`.
    #[must_use]
    pub fn with_current(current: Fixed, max: Fixed, regen_rate: Fixed) -> Self {
        let mut shield = Self::new(max, regen_rate);
        shield.current = current.clamp(Fixed::ZERO, shield.max);
        shield
    }

    /// Regenerate for `dt` seconds, clamped to `max`.
    pub fn regenerate(&mut self, dt: Fixed) {
        let gained = self.current.saturating_add(self.regen_rate.saturating_mul(dt));
        self.current = gained.clamp(Fixed::ZERO, self.max);
    }

    /// Absorb damage, returning the overflow that got through.
    pub fn absorb(&mut self, damage: Fixed) -> Fixed {
        if damage <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        let absorbed = damage.min(self.current);
        self.current -= absorbed;
        damage - absorbed
    }

    /// Check if the shield is fully depleted.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current == Fixed::ZERO
    }
}

impl Component for Shield {
    const KIND: ComponentKind = ComponentKind::Shield;
}

/// Drones stationed at a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Garrison {
    /// Number of stationed drones.
    pub count: u32,
    /// Overflow damage taken toward the next stationed drone lost.
    #[serde(with = "fixed_serde")]
    pub wear: Fixed,
}

impl Garrison {
    /// Create a garrison with `count` drones.
    #[must_use]
    pub const fn new(count: u32) -> Self {
        Self {
            count,
            wear: Fixed::ZERO,
        }
    }

    /// Station more drones.
    pub fn reinforce(&mut self, drones: u32) {
        self.count = self.count.saturating_add(drones);
    }

    /// Absorb overflow damage; every `durability` points costs one drone.
    ///
    /// Returns the damage left over once the garrison is empty.
    pub fn absorb(&mut self, damage: Fixed, durability: Fixed) -> Fixed {
        if damage <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        if durability <= Fixed::ZERO {
            self.count = 0;
            self.wear = Fixed::ZERO;
            return damage;
        }

        self.wear += damage;
        while self.count > 0 && self.wear >= durability {
            self.wear -= durability;
            self.count -= 1;
        }

        if self.count == 0 {
            let leftover = self.wear;
            self.wear = Fixed::ZERO;
            leftover
        } else {
            Fixed::ZERO
        }
    }
}

impl Component for Garrison {
    const KIND: ComponentKind = ComponentKind::Garrison;
}

// ============================================================================
// AI
// ============================================================================

/// Decision state for an AI-controlled faction.
///
/// The controlled faction is the entity's [`Faction`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AiController {
    /// Seconds accumulated since the last decision pass.
    #[serde(with = "fixed_serde")]
    pub decision_timer: Fixed,
    /// Seconds between decision passes for the current interval.
    #[serde(with = "fixed_serde")]
    pub decision_timer_max: Fixed,
    /// Last entity the AI assigned as a target (weak).
    pub highlighted: Option<EntityId>,
}

impl AiController {
    /// Create a controller that decides every `interval` seconds.
    #[must_use]
    pub const fn new(interval: Fixed) -> Self {
        Self {
            decision_timer: Fixed::ZERO,
            decision_timer_max: interval,
            highlighted: None,
        }
    }
}

impl Component for AiController {
    const KIND: ComponentKind = ComponentKind::AiController;
}

// ============================================================================
// Presentation metadata
// ============================================================================

/// Text drawn next to an entity by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Label {
    /// Current text.
    pub text: String,
    /// Offset from the entity position.
    pub offset: Vec2Fixed,
}

impl Label {
    /// Create a label.
    #[must_use]
    pub fn new(text: impl Into<String>, offset: Vec2Fixed) -> Self {
        Self {
            text: text.into(),
            offset,
        }
    }
}

impl Component for Label {
    const KIND: ComponentKind = ComponentKind::Label;
}

/// Pointer-hover state written by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hover {
    /// Whether the pointer is over this entity.
    pub is_hovered: bool,
    /// Screen position where the info panel should appear.
    pub position: Vec2Fixed,
}

impl Component for Hover {
    const KIND: ComponentKind = ComponentKind::Hover;
}

/// Free-form name used by tooling and logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name.
    pub name: String,
}

impl Tag {
    /// Create a tag.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Component for Tag {
    const KIND: ComponentKind = ComponentKind::Tag;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    #[test]
    fn test_shield_regen_clamps() {
        let mut shield = Shield::with_current(Fixed::ZERO, fx(50.0), fx(10.0));
        shield.regenerate(fx(2.0));
        assert_eq!(shield.current, fx(20.0));
        shield.regenerate(fx(5.0));
        assert_eq!(shield.current, fx(50.0));
    }

    #[test]
    fn test_shield_absorb_overflow() {
        let mut shield = Shield::with_current(fx(5.0), fx(10.0), Fixed::ZERO);
        let overflow = shield.absorb(fx(8.0));
        assert_eq!(overflow, fx(3.0));
        assert!(shield.is_depleted());
        assert_eq!(shield.absorb(fx(-1.0)), Fixed::ZERO);
    }

    #[test]
    fn test_shield_with_current_clamps() {
        let shield = Shield::with_current(fx(80.0), fx(50.0), Fixed::ONE);
        assert_eq!(shield.current, fx(50.0));
        let shield = Shield::with_current(fx(-3.0), fx(50.0), Fixed::ONE);
        assert_eq!(shield.current, Fixed::ZERO);
    }

    #[test]
    fn test_garrison_absorb() {
        let mut garrison = Garrison::new(2);
        assert_eq!(garrison.absorb(fx(15.0), fx(10.0)), Fixed::ZERO);
        assert_eq!(garrison.count, 1);
        assert_eq!(garrison.wear, fx(5.0));

        // 5 carried + 10 = one more drone lost, 5 spills over
        let leftover = garrison.absorb(fx(10.0), fx(10.0));
        assert_eq!(garrison.count, 0);
        assert_eq!(leftover, fx(5.0));
    }

    #[test]
    fn test_empty_garrison_passes_everything() {
        let mut garrison = Garrison::default();
        assert_eq!(garrison.absorb(fx(3.0), fx(10.0)), fx(3.0));
    }

    #[test]
    fn test_factory_progress_carries_over() {
        let mut factory = Factory::new("Factory #0", fx(1.0));
        factory.advance(fx(3.5));
        assert!(factory.has_ready_unit());
        factory.take_unit();
        factory.take_unit();
        factory.take_unit();
        assert!(!factory.has_ready_unit());
        assert_eq!(factory.accumulator, fx(0.5));
    }

    #[test]
    fn test_hot_kinds() {
        assert_eq!(ComponentKind::Drone.hot_kind(), Some(HotKind::Drone));
        assert_eq!(ComponentKind::Transform.hot_kind(), None);
    }
}
