//! Bomb Arena - simulation core for a two-player grid bomb game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (fuses, blasts, pushable blocks, actors)
//! - `settings`: Data-driven match configuration

pub mod settings;
pub mod sim;

pub use settings::{ArenaSettings, SettingsError};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed physics timestep (50 Hz)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta the clock will accept
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Gap (in grid units) under which an actor counts as touching a block
    pub const CONTACT_SKIN: f32 = 0.02;

    /// Half extent of a block collider (grid units)
    pub const BLOCK_HALF_EXTENT: f32 = 0.5;
    /// Bomb collider radius (grid units)
    pub const BOMB_RADIUS: f32 = 0.45;
    /// Pickup trigger radius (grid units)
    pub const PICKUP_RADIUS: f32 = 0.3;
    /// Probe radius used by the blast area walk (grid units)
    pub const BLAST_PROBE_RADIUS: f32 = 0.2;
}

/// Smoothstep easing: `t² · (3 − 2t)`, input clamped to [0, 1]
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation between two points
#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-6);
        // Clamped outside the unit interval
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(2.0), 1.0);
    }

    #[test]
    fn test_smoothstep_eases_in() {
        // Slower than linear near the start, faster in the middle
        assert!(smoothstep(0.1) < 0.1);
        assert!(smoothstep(0.9) > 0.9);
    }
}
