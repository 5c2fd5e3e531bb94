//! Per-faction aggregate state.
//!
//! One [`GameState`] record exists per simulation, attached to a dedicated
//! entity through [`crate::manager::EntityManager::create_game_state`].

use std::collections::{BTreeMap, BTreeSet};

use crate::components::{Component, ComponentKind};
use crate::error::{GameError, Result};
use crate::factions::Faction;
use crate::math::Fixed;

/// Drone counts, energy pools and the game-over outcome.
///
/// Counts and energy are never negative: removal saturates at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    players: Vec<Faction>,
    drones: BTreeMap<Faction, u32>,
    energy: BTreeMap<Faction, Fixed>,
    is_game_over: bool,
    winner: Option<Faction>,
}

impl GameState {
    /// Create a game state for the given competing players.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoPlayers`] if `players` is empty.
    pub fn new(players: impl IntoIterator<Item = Faction>) -> Result<Self> {
        let mut registered: Vec<Faction> = Vec::new();
        for faction in players {
            if !registered.contains(&faction) {
                registered.push(faction);
            }
        }
        if registered.is_empty() {
            return Err(GameError::NoPlayers);
        }

        let drones = registered.iter().map(|&f| (f, 0)).collect();
        let energy = registered.iter().map(|&f| (f, Fixed::ZERO)).collect();
        Ok(Self {
            players: registered,
            drones,
            energy,
            is_game_over: false,
            winner: None,
        })
    }

    /// Registered players, in registration order.
    #[must_use]
    pub fn players(&self) -> &[Faction] {
        &self.players
    }

    /// Number of drones the faction owns.
    #[must_use]
    pub fn drone_count(&self, faction: Faction) -> u32 {
        self.drones.get(&faction).copied().unwrap_or(0)
    }

    /// Energy available to the faction.
    #[must_use]
    pub fn energy(&self, faction: Faction) -> Fixed {
        self.energy.get(&faction).copied().unwrap_or(Fixed::ZERO)
    }

    /// Whether the faction's energy no longer covers its fleet.
    #[must_use]
    pub fn production_blocked(&self, faction: Faction) -> bool {
        self.energy(faction) <= Fixed::from_num(self.drone_count(faction))
    }

    /// Whether one more drone may be built for the faction.
    ///
    /// Spawning is refused while `energy ≤ drones + 1`.
    #[must_use]
    pub fn can_spawn(&self, faction: Faction) -> bool {
        let threshold = Fixed::from_num(self.drone_count(faction)) + Fixed::ONE;
        self.energy(faction) > threshold
    }

    /// Record a new drone.
    pub fn add_drone(&mut self, faction: Faction) {
        let count = self.drones.entry(faction).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Record a lost drone. Saturates at zero.
    pub fn remove_drone(&mut self, faction: Faction) {
        if let Some(count) = self.drones.get_mut(&faction) {
            *count = count.saturating_sub(1);
        }
    }

    /// Overwrite the faction's energy, floored at zero.
    pub fn set_energy(&mut self, faction: Faction, amount: Fixed) {
        self.energy.insert(faction, amount.max(Fixed::ZERO));
    }

    /// Add energy to the faction's pool, never exceeding `cap`.
    ///
    /// A pool already above `cap` is left untouched.
    pub fn accrue_energy(&mut self, faction: Faction, amount: Fixed, cap: Fixed) {
        let current = self.energy(faction);
        if amount <= Fixed::ZERO || current >= cap {
            return;
        }
        let next = current.saturating_add(amount).min(cap);
        self.energy.insert(faction, next);
    }

    /// Remove energy from the faction's pool, floored at zero.
    pub fn drain_energy(&mut self, faction: Faction, amount: Fixed) {
        let next = self
            .energy(faction)
            .saturating_sub(amount.max(Fixed::ZERO))
            .max(Fixed::ZERO);
        self.energy.insert(faction, next);
    }

    /// Whether the match has ended.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    /// The winning faction. `None` while running or after a draw.
    #[must_use]
    pub const fn winner(&self) -> Option<Faction> {
        if self.is_game_over {
            self.winner
        } else {
            None
        }
    }

    /// Re-evaluate the game-over condition.
    ///
    /// A player survives while it owns drones or any faction in
    /// `structure_owners`. With one survivor it wins; with none the game
    /// ends in a draw. Needs at least two registered players and latches
    /// once set. Returns `true` on the transition.
    pub fn evaluate_game_over(&mut self, structure_owners: &BTreeSet<Faction>) -> bool {
        if self.is_game_over || self.players.len() < 2 {
            return false;
        }

        let survivors: Vec<Faction> = self
            .players
            .iter()
            .copied()
            .filter(|f| self.drone_count(*f) > 0 || structure_owners.contains(f))
            .collect();

        match survivors.as_slice() {
            [] => {
                self.is_game_over = true;
                self.winner = None;
                true
            }
            [only] => {
                self.is_game_over = true;
                self.winner = Some(*only);
                true
            }
            _ => false,
        }
    }
}

impl Component for GameState {
    const KIND: ComponentKind = ComponentKind::GameState;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_players() -> GameState {
        GameState::new(Faction::PLAYERS).unwrap()
    }

    #[test]
    fn test_new_requires_players() {
        assert_eq!(GameState::new(Vec::<Faction>::new()).unwrap_err(), GameError::NoPlayers);
        let state = GameState::new([Faction::Player1, Faction::Player1]).unwrap();
        assert_eq!(state.players(), &[Faction::Player1]);
    }

    #[test]
    fn test_drone_count_saturates() {
        let mut state = two_players();
        state.remove_drone(Faction::Player1);
        assert_eq!(state.drone_count(Faction::Player1), 0);
        state.add_drone(Faction::Player1);
        assert_eq!(state.drone_count(Faction::Player1), 1);
    }

    #[test]
    fn test_spawn_gate() {
        let mut state = two_players();
        state.set_energy(Faction::Player1, Fixed::from_num(3));
        state.add_drone(Faction::Player1);
        // 3 > 1 + 1
        assert!(state.can_spawn(Faction::Player1));
        state.add_drone(Faction::Player1);
        // 3 <= 2 + 1
        assert!(!state.can_spawn(Faction::Player1));
        assert!(!state.production_blocked(Faction::Player1));
        state.add_drone(Faction::Player1);
        assert!(state.production_blocked(Faction::Player1));
    }

    #[test]
    fn test_accrue_respects_cap() {
        let mut state = two_players();
        state.accrue_energy(Faction::Player1, Fixed::from_num(7), Fixed::from_num(10));
        state.accrue_energy(Faction::Player1, Fixed::from_num(7), Fixed::from_num(10));
        assert_eq!(state.energy(Faction::Player1), Fixed::from_num(10));

        state.set_energy(Faction::Player2, Fixed::from_num(50));
        state.accrue_energy(Faction::Player2, Fixed::ONE, Fixed::from_num(10));
        assert_eq!(state.energy(Faction::Player2), Fixed::from_num(50));
    }

    #[test]
    fn test_drain_floors_at_zero() {
        let mut state = two_players();
        state.set_energy(Faction::Player1, Fixed::from_num(4));
        state.drain_energy(Faction::Player1, Fixed::from_num(10));
        assert_eq!(state.energy(Faction::Player1), Fixed::ZERO);
        state.set_energy(Faction::Player1, Fixed::from_num(-5));
        assert_eq!(state.energy(Faction::Player1), Fixed::ZERO);
    }

    #[test]
    fn test_single_survivor_wins() {
        let mut state = two_players();
        state.add_drone(Faction::Player1);
        let owners = BTreeSet::new();
        assert!(state.evaluate_game_over(&owners));
        assert!(state.is_game_over());
        assert_eq!(state.winner(), Some(Faction::Player1));
    }

    #[test]
    fn test_structures_keep_player_alive() {
        let mut state = two_players();
        state.add_drone(Faction::Player1);
        let owners = BTreeSet::from([Faction::Player2]);
        assert!(!state.evaluate_game_over(&owners));
        assert!(!state.is_game_over());
    }

    #[test]
    fn test_simultaneous_elimination_is_draw() {
        let mut state = two_players();
        assert!(state.evaluate_game_over(&BTreeSet::new()));
        assert!(state.is_game_over());
        assert_eq!(state.winner(), None);
    }

    #[test]
    fn test_game_over_latches() {
        let mut state = two_players();
        state.add_drone(Faction::Player2);
        assert!(state.evaluate_game_over(&BTreeSet::new()));
        state.add_drone(Faction::Player1);
        assert!(!state.evaluate_game_over(&BTreeSet::new()));
        assert_eq!(state.winner(), Some(Faction::Player2));
    }

    #[test]
    fn test_single_player_never_ends() {
        let mut state = GameState::new([Faction::Player1]).unwrap();
        assert!(!state.evaluate_game_over(&BTreeSet::new()));
    }
}
