//! Faction identifiers.

use serde::{Deserialize, Serialize};

/// The side an entity fights for.
///
/// Attached to entities as a component. Once assigned it never changes;
/// the manager rejects reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The local player.
    Player1,
    /// The opposing (usually AI-controlled) player.
    Player2,
    /// Unowned structures scattered across the map.
    Neutral,
}

impl Faction {
    /// Both player factions, in panel order.
    pub const PLAYERS: [Self; 2] = [Self::Player1, Self::Player2];

    /// Get the display name for this faction.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Player1 => "Player 1",
            Self::Player2 => "Player 2",
            Self::Neutral => "Neutral",
        }
    }

    /// Check if this faction is one of the competing players.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self, Self::Player1 | Self::Player2)
    }

    /// Check if `other` is a valid attack target for this faction.
    ///
    /// Everything not on the same side is hostile, neutrals included.
    #[must_use]
    pub fn is_hostile_to(&self, other: Self) -> bool {
        *self != other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostility() {
        assert!(Faction::Player1.is_hostile_to(Faction::Player2));
        assert!(Faction::Player2.is_hostile_to(Faction::Neutral));
        assert!(!Faction::Player1.is_hostile_to(Faction::Player1));
    }

    #[test]
    fn test_players() {
        assert!(Faction::PLAYERS.iter().all(Faction::is_player));
        assert!(!Faction::Neutral.is_player());
        assert_eq!(Faction::Player2.display_name(), "Player 2");
    }
}
