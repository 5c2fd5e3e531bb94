//! Error types for the drone simulation.
//!
//! Lookups never produce errors: a missing entity or component is an
//! `Option::None`. Only structural misuse of the entity store and
//! misconfiguration surface as [`GameError`].

use thiserror::Error;

use crate::components::EntityId;
use crate::factions::Faction;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// A component was attached to an entity that does not exist.
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// An operation required the GameState singleton before it was created.
    #[error("No GameState entity exists")]
    NoGameState,

    /// A second GameState record was attached.
    #[error("GameState already exists on entity {0}")]
    GameStateExists(EntityId),

    /// A GameState was created without any registered players.
    #[error("GameState requires at least one player faction")]
    NoPlayers,

    /// An entity's faction was changed after assignment.
    #[error("Entity {entity} already belongs to {current:?}, cannot reassign to {requested:?}")]
    FactionReassigned {
        /// Entity whose faction was being replaced.
        entity: EntityId,
        /// Faction already assigned.
        current: Faction,
        /// Faction that was requested.
        requested: Faction,
    },

    /// An order targeted an entity lacking a required component.
    #[error("Entity {entity} has no {component} component")]
    MissingComponent {
        /// Entity that was addressed.
        entity: EntityId,
        /// Name of the missing component kind.
        component: &'static str,
    },

    /// Configuration values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },
}
