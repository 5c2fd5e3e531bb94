//! Simulation tuning.
//!
//! Values are plain data with sensible defaults and can be loaded from RON.
//! Decimal fields are converted to [`Fixed`] on load.
//!
//! # Example RON
//!
//! ```ron
//! SimConfig(
//!     map_width: 2560.0,
//!     map_height: 1440.0,
//!     difficulty: (
//!         decision_interval: 5.0,
//!         max_executions_per_turn: 10,
//!         max_distance_to_attack: 500.0,
//!     ),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{decimal_serde, Fixed};

/// Largest accepted map side and attack or engage distance, in world units.
///
/// Keeps squared distances between any two points on the map inside the
/// range of [`Fixed`].
pub const MAX_WORLD_EXTENT: i32 = 30_000;

/// Named AI difficulty presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DifficultyLevel {
    /// Slow, short-sighted AI.
    Easy,
    /// Default.
    #[default]
    Medium,
    /// Fast, aggressive AI.
    Hard,
    /// Decides every second across the whole map.
    Impossible,
}

impl DifficultyLevel {
    /// All presets, easiest first.
    pub const ALL: [Self; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::Impossible];

    /// The tuning values for this preset.
    #[must_use]
    pub fn settings(self) -> DifficultySettings {
        let (interval, executions, distance) = match self {
            Self::Easy => (10, 2, 300),
            Self::Medium => (5, 10, 500),
            Self::Hard => (3, 15, 750),
            Self::Impossible => (1, 30, 2000),
        };
        DifficultySettings {
            decision_interval: Fixed::from_num(interval),
            max_executions_per_turn: executions,
            max_distance_to_attack: Fixed::from_num(distance),
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Impossible => "Impossible",
        }
    }
}

/// AI decision cadence and reach. Mutable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultySettings {
    /// Seconds between AI decision passes.
    #[serde(with = "decimal_serde")]
    pub decision_interval: Fixed,
    /// Maximum target assignments per pass.
    pub max_executions_per_turn: u32,
    /// Maximum distance at which targets are chosen and attacked.
    #[serde(with = "decimal_serde")]
    pub max_distance_to_attack: Fixed,
}

impl Default for DifficultySettings {
    fn default() -> Self {
        DifficultyLevel::default().settings()
    }
}

impl From<DifficultyLevel> for DifficultySettings {
    fn from(level: DifficultyLevel) -> Self {
        level.settings()
    }
}

/// Stats given to newly built drones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneSettings {
    /// Travel speed in world units per second.
    #[serde(with = "decimal_serde")]
    pub speed: Fixed,
    /// Damage per second against the current target.
    #[serde(with = "decimal_serde")]
    pub damage_per_second: Fixed,
    /// Shield capacity.
    #[serde(with = "decimal_serde")]
    pub shield_max: Fixed,
    /// Shield regeneration per second.
    #[serde(with = "decimal_serde")]
    pub shield_regen: Fixed,
}

impl Default for DroneSettings {
    fn default() -> Self {
        Self {
            speed: Fixed::from_num(60),
            damage_per_second: Fixed::from_num(5),
            shield_max: Fixed::from_num(10),
            shield_regen: Fixed::ONE,
        }
    }
}

/// Combat resolution tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatSettings {
    /// Drones stop closing in once this near their target.
    #[serde(with = "decimal_serde")]
    pub engage_distance: Fixed,
    /// Overflow damage needed to kill one garrisoned drone.
    #[serde(with = "decimal_serde")]
    pub garrison_durability: Fixed,
    /// Shield capacity of factories and power plants.
    #[serde(with = "decimal_serde")]
    pub structure_shield_max: Fixed,
}

impl Default for CombatSettings {
    fn default() -> Self {
        Self {
            engage_distance: Fixed::from_num(30),
            garrison_durability: Fixed::from_num(10),
            structure_shield_max: Fixed::from_num(100),
        }
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Map width in world units.
    #[serde(with = "decimal_serde")]
    pub map_width: Fixed,
    /// Map height in world units.
    #[serde(with = "decimal_serde")]
    pub map_height: Fixed,
    /// AI tuning.
    pub difficulty: DifficultySettings,
    /// New drone stats.
    pub drone: DroneSettings,
    /// Combat tuning.
    pub combat: CombatSettings,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            map_width: Fixed::from_num(2560),
            map_height: Fixed::from_num(1440),
            difficulty: DifficultySettings::default(),
            drone: DroneSettings::default(),
            combat: CombatSettings::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a config from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] on malformed RON, or
    /// [`GameError::InvalidConfig`] if validation fails.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] if the file cannot be read or
    /// parsed, or [`GameError::InvalidConfig`] if validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&text).map_err(|e| match e {
            GameError::DataParseError { message, .. } => GameError::DataParseError {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("map_width", self.map_width),
            ("map_height", self.map_height),
            ("difficulty.decision_interval", self.difficulty.decision_interval),
        ];
        for (name, value) in positive {
            if value <= Fixed::ZERO {
                return Err(GameError::InvalidConfig(format!("{name} must be positive")));
            }
        }

        let non_negative = [
            ("difficulty.max_distance_to_attack", self.difficulty.max_distance_to_attack),
            ("drone.speed", self.drone.speed),
            ("drone.damage_per_second", self.drone.damage_per_second),
            ("drone.shield_max", self.drone.shield_max),
            ("drone.shield_regen", self.drone.shield_regen),
            ("combat.engage_distance", self.combat.engage_distance),
            ("combat.garrison_durability", self.combat.garrison_durability),
            ("combat.structure_shield_max", self.combat.structure_shield_max),
        ];
        for (name, value) in non_negative {
            if value < Fixed::ZERO {
                return Err(GameError::InvalidConfig(format!("{name} must not be negative")));
            }
        }

        let extent = Fixed::from_num(MAX_WORLD_EXTENT);
        let bounded = [
            ("map_width", self.map_width),
            ("map_height", self.map_height),
            ("difficulty.max_distance_to_attack", self.difficulty.max_distance_to_attack),
            ("combat.engage_distance", self.combat.engage_distance),
        ];
        for (name, value) in bounded {
            if value > extent {
                return Err(GameError::InvalidConfig(format!(
                    "{name} must not exceed {MAX_WORLD_EXTENT}"
                )));
            }
        }
        Ok(())
    }
}
