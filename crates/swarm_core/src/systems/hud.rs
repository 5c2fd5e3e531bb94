//! HUD read model.
//!
//! A [`HudSnapshot`] is everything the heads-up display shows, captured
//! from the manager without mutating it. Rendering the text is left to
//! whatever front end consumes the snapshot.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Factory, Garrison, Hover, PowerPlant, Shield};
use crate::factions::Faction;
use crate::manager::EntityManager;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Top-bar panel for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPanel {
    /// Player shown.
    pub faction: Faction,
    /// Drones owned.
    pub drones: u32,
    /// Energy available.
    #[serde(with = "fixed_serde")]
    pub energy: Fixed,
    /// Whether energy no longer covers the fleet.
    pub production_blocked: bool,
}

impl PlayerPanel {
    /// Panel text, e.g. `"Player 1\nDrones: 3\nEnergy: 7"`.
    ///
    /// Player 1 shows the blocked marker after its drone count; the
    /// opponent's panel leads its drone line with it.
    #[must_use]
    pub fn text(&self) -> String {
        let name = self.faction.display_name();
        let energy = self.energy.to_num::<i64>();
        match (self.faction, self.production_blocked) {
            (Faction::Player1, true) => {
                format!("{name}\nDrones: {} [production blocked]\nEnergy: {energy}", self.drones)
            }
            (_, true) => {
                format!("{name}\n [production blocked] Drones: {}\nEnergy: {energy}", self.drones)
            }
            (_, false) => format!("{name}\nDrones: {}\nEnergy: {energy}", self.drones),
        }
    }
}

/// Info panel for the hovered entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoverInfo {
    /// Hovered entity.
    pub entity: EntityId,
    /// Where the panel should appear.
    pub position: Vec2Fixed,
    /// Panel text.
    pub text: String,
}

/// End-of-game banner, from the local player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverBanner {
    /// Player 1 won.
    Victory,
    /// Player 2 won.
    Defeat,
    /// Nobody survived.
    Draw,
}

impl GameOverBanner {
    /// Banner text.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Victory => "YOU WIN!",
            Self::Defeat => "YOU LOSE!",
            Self::Draw => "GAME OVER",
        }
    }

    fn from_winner(winner: Option<Faction>) -> Self {
        match winner {
            Some(Faction::Player1) => Self::Victory,
            Some(Faction::Player2) => Self::Defeat,
            _ => Self::Draw,
        }
    }
}

/// Everything the HUD displays for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudSnapshot {
    /// One panel per registered player. Empty before a GameState exists.
    pub players: Vec<PlayerPanel>,
    /// Info for the first hovered entity.
    pub hover: Option<HoverInfo>,
    /// Set once the game is over.
    pub game_over: Option<GameOverBanner>,
}

impl HudSnapshot {
    /// Capture the HUD state.
    ///
    /// A missing GameState yields no player panels and no banner.
    #[must_use]
    pub fn capture(manager: &EntityManager) -> Self {
        let mut snapshot = Self::default();

        if let Ok(state) = manager.game_state() {
            snapshot.players = state
                .players()
                .iter()
                .map(|&faction| PlayerPanel {
                    faction,
                    drones: state.drone_count(faction),
                    energy: state.energy(faction),
                    production_blocked: state.production_blocked(faction),
                })
                .collect();
            if state.is_game_over() {
                snapshot.game_over = Some(GameOverBanner::from_winner(state.winner()));
            }
        }

        snapshot.hover = manager.hovered().map(|entity| HoverInfo {
            entity,
            position: manager
                .get_component::<Hover>(entity)
                .map(|h| h.position)
                .unwrap_or_default(),
            text: hover_text(manager, entity),
        });
        snapshot
    }

    /// Panel for one player, if registered.
    #[must_use]
    pub fn panel(&self, faction: Faction) -> Option<&PlayerPanel> {
        self.players.iter().find(|p| p.faction == faction)
    }
}

/// Info panel text for an entity.
#[must_use]
pub fn hover_text(manager: &EntityManager, id: EntityId) -> String {
    let mut text = String::new();

    if let Some(factory) = manager.get_component::<Factory>(id) {
        let _ = write!(
            text,
            "{}\nProduction rate: {:.1} /s",
            factory.name,
            factory.production_rate.to_num::<f64>()
        );
    }
    if let Some(plant) = manager.get_component::<PowerPlant>(id) {
        let _ = write!(text, "FusionReactor\nCapacity: {}", plant.capacity);
    }
    if let Some(garrison) = manager.get_component::<Garrison>(id) {
        let _ = write!(text, "\nDrones stationed: {}", garrison.count);
    }
    if let Some(shield) = manager.get_component::<Shield>(id) {
        let _ = write!(
            text,
            "\nShield: {:.1}/{:.1}\nShield Regen: {:.1}/s",
            shield.current.to_num::<f64>(),
            shield.max.to_num::<f64>(),
            shield.regen_rate.to_num::<f64>()
        );
    }
    text
}
