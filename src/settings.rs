//! Match settings
//!
//! Loaded from a JSON file; every section falls back to the classic game's
//! tuning when omitted.

use std::path::Path;

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// Errors raised while loading or validating settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Maze layout parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeSettings {
    /// Width in cells (centered on the origin)
    pub width: i32,
    /// Height in cells (centered on the origin)
    pub height: i32,
    /// Number of indestructible blocks
    pub solid_blocks: usize,
    /// Number of destructible or movable blocks
    pub destructible_blocks: usize,
    /// Share of `destructible_blocks` that are movable (0-1)
    pub movable_ratio: f32,
}

impl Default for MazeSettings {
    fn default() -> Self {
        Self {
            width: 11,
            height: 9,
            solid_blocks: 10,
            destructible_blocks: 15,
            movable_ratio: 0.5,
        }
    }
}

/// Per-actor starting stats and movement feel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorSettings {
    /// Top speed (grid units per second)
    pub move_speed: f32,
    /// How quickly velocity approaches the input target
    pub acceleration: f32,
    /// How quickly velocity decays without input
    pub deceleration: f32,
    /// Live bomb quota
    pub max_bombs: u32,
    /// Blast range in cells
    pub explosion_range: u32,
    /// Collider radius (grid units)
    pub radius: f32,
}

impl Default for ActorSettings {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            acceleration: 10.0,
            deceleration: 5.0,
            max_bombs: 3,
            explosion_range: 3,
            radius: 0.4,
        }
    }
}

/// Fuse timing, palette and blast visuals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BombSettings {
    /// Seconds between placement and detonation
    pub fuse_seconds: f32,
    /// Color at placement
    pub calm_color: Vec4,
    /// Color at half fuse
    pub warning_color: Vec4,
    /// Color at detonation
    pub danger_color: Vec4,
    /// Effect resource shown along the blast; `None` disables blast visuals
    pub explosion_effect: Option<String>,
    /// How long each blast effect lingers (seconds)
    pub effect_lifetime: f32,
}

impl Default for BombSettings {
    fn default() -> Self {
        Self {
            fuse_seconds: 2.0,
            calm_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            warning_color: Vec4::new(1.0, 0.5, 0.0, 1.0),
            danger_color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            explosion_effect: Some("explosion".to_string()),
            effect_lifetime: 0.3,
        }
    }
}

/// Push pressure thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushSettings {
    /// Seconds of continuous pressure before a block moves
    pub required_seconds: f32,
    /// Minimum velocity projection onto the push direction
    pub velocity_threshold: f32,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            required_seconds: 0.5,
            velocity_threshold: 0.1,
        }
    }
}

/// Block slide animation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideSettings {
    /// Seconds for a one-cell move
    pub duration_seconds: f32,
    /// Occupancy probe radius at the target cell (grid units)
    pub probe_radius: f32,
}

impl Default for SlideSettings {
    fn default() -> Self {
        Self {
            duration_seconds: 0.18,
            probe_radius: 0.2,
        }
    }
}

/// Power-up drop quotas
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpSettings {
    pub speed_boost_quota: u32,
    pub explosion_range_quota: u32,
    pub extra_bomb_quota: u32,
    /// Chance (0-1) to drop nothing even when a kind is available
    pub no_powerup_chance: f32,
}

impl Default for PowerUpSettings {
    fn default() -> Self {
        Self {
            speed_boost_quota: 5,
            explosion_range_quota: 5,
            extra_bomb_quota: 5,
            no_powerup_chance: 0.5,
        }
    }
}

/// Complete match configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    /// Seed for maze layout and power-up rolls
    pub seed: u64,
    /// World units per grid cell
    pub grid_size: f32,
    pub maze: MazeSettings,
    pub actor: ActorSettings,
    pub bomb: BombSettings,
    pub push: PushSettings,
    pub slide: SlideSettings,
    pub powerups: PowerUpSettings,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            grid_size: 1.0,
            maze: MazeSettings::default(),
            actor: ActorSettings::default(),
            bomb: BombSettings::default(),
            push: PushSettings::default(),
            slide: SlideSettings::default(),
            powerups: PowerUpSettings::default(),
        }
    }
}

impl ArenaSettings {
    /// Parse and validate settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is unusable
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn invalid(field: &'static str, reason: &'static str) -> SettingsError {
            SettingsError::Invalid { field, reason }
        }

        if self.grid_size <= 0.0 {
            return Err(invalid("grid_size", "must be positive"));
        }
        if self.bomb.fuse_seconds <= 0.0 {
            return Err(invalid("bomb.fuse_seconds", "must be positive"));
        }
        if self.push.required_seconds <= 0.0 {
            return Err(invalid("push.required_seconds", "must be positive"));
        }
        if self.slide.duration_seconds <= 0.0 {
            return Err(invalid("slide.duration_seconds", "must be positive"));
        }
        if self.slide.probe_radius <= 0.0 || self.slide.probe_radius >= 0.5 {
            return Err(invalid("slide.probe_radius", "must be within (0, 0.5)"));
        }
        if self.actor.radius <= 0.0 || self.actor.radius >= 0.5 {
            return Err(invalid("actor.radius", "must be within (0, 0.5)"));
        }
        if !(0.0..=1.0).contains(&self.powerups.no_powerup_chance) {
            return Err(invalid("powerups.no_powerup_chance", "must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.maze.movable_ratio) {
            return Err(invalid("maze.movable_ratio", "must be within [0, 1]"));
        }
        if self.maze.width <= 0 || self.maze.height <= 0 {
            return Err(invalid("maze", "dimensions must be positive"));
        }
        let Some(cells) = self.maze.width.checked_mul(self.maze.height) else {
            return Err(invalid("maze", "too many cells"));
        };
        let blocks = self
            .maze
            .solid_blocks
            .saturating_add(self.maze.destructible_blocks);
        if blocks > cells as usize {
            return Err(invalid("maze", "more blocks than cells"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ArenaSettings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings =
            ArenaSettings::from_json(r#"{ "seed": 7, "bomb": { "fuse_seconds": 3.0 } }"#).unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.bomb.fuse_seconds, 3.0);
        assert_eq!(settings.bomb.explosion_effect.as_deref(), Some("explosion"));
        assert_eq!(settings.push.required_seconds, 0.5);
    }

    #[test]
    fn test_effect_can_be_disabled() {
        let settings =
            ArenaSettings::from_json(r#"{ "bomb": { "explosion_effect": null } }"#).unwrap();
        assert!(settings.bomb.explosion_effect.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ArenaSettings::from_json(r#"{ "push": { "required_seconds": 0.0 } }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid {
                field: "push.required_seconds",
                ..
            }
        ));

        let err = ArenaSettings::from_json(r#"{ "maze": { "width": 2, "height": 2 } }"#)
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "maze", .. }));
    }

    #[test]
    fn test_huge_maze_rejected_without_overflow() {
        let err = ArenaSettings::from_json(
            r#"{ "maze": { "width": 2000000000, "height": 2000000000 } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid {
                field: "maze",
                reason: "too many cells"
            }
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = ArenaSettings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = ArenaSettings::load_or_default("/nonexistent/bomb-arena.json");
        assert_eq!(settings.grid_size, 1.0);
    }

    #[test]
    fn test_json_round_trip_keeps_colors() {
        let original = ArenaSettings::default();
        let json = original.to_json().unwrap();
        let parsed = ArenaSettings::from_json(&json).unwrap();
        assert_eq!(parsed.bomb.warning_color, original.bomb.warning_color);
    }
}
