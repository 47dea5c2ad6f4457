//! Bomb fuse countdown
//!
//! A fuse runs `Armed -> Exploding -> Destroyed`. Only an armed fuse counts
//! down, and only the first ignition (timer or chain) gets to explode.

use glam::Vec4;
use serde::{Deserialize, Serialize};

use super::events::Services;
use super::state::Arena;
use crate::settings::BombSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuseState {
    Armed,
    Exploding,
    Destroyed,
}

/// Countdown for one bomb
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fuse {
    pub elapsed: f32,
    pub duration: f32,
    pub state: FuseState,
}

impl Fuse {
    pub fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration,
            state: FuseState::Armed,
        }
    }

    /// Fraction of the fuse burned, in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_armed(&self) -> bool {
        self.state == FuseState::Armed
    }

    /// Has the explosion been triggered?
    pub fn exploded(&self) -> bool {
        self.state != FuseState::Armed
    }

    /// Burn `dt` seconds. Returns true once the fuse has run out.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.is_armed() {
            return false;
        }
        self.elapsed += dt;
        self.progress() >= 1.0
    }

    /// Trigger the explosion. Only the first call returns true.
    pub fn ignite(&mut self) -> bool {
        if !self.is_armed() {
            return false;
        }
        self.state = FuseState::Exploding;
        true
    }

    /// Explosion side effects are done
    pub fn finish(&mut self) {
        self.state = FuseState::Destroyed;
    }
}

/// Fuse tint, from calm through warning to danger
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusePalette {
    pub calm: Vec4,
    pub warning: Vec4,
    pub danger: Vec4,
}

impl FusePalette {
    pub fn from_settings(settings: &BombSettings) -> Self {
        Self {
            calm: settings.calm_color,
            warning: settings.warning_color,
            danger: settings.danger_color,
        }
    }

    /// Color at fuse progress `t`
    pub fn color(&self, t: f32) -> Vec4 {
        let t = t.clamp(0.0, 1.0);
        if t < 0.5 {
            self.calm.lerp(self.warning, t * 2.0)
        } else {
            self.warning.lerp(self.danger, (t - 0.5) * 2.0)
        }
    }
}

impl Arena {
    /// Count down every armed bomb, report its tint and detonate the expired ones
    pub fn advance_fuses(&mut self, dt: f32, services: &mut Services<'_>) {
        let palette = FusePalette::from_settings(&self.settings.bomb);
        for id in self.world.bomb_ids() {
            // An earlier detonation this frame may have chained or removed it
            let Some(bomb) = self.world.bomb_mut(id) else {
                continue;
            };
            if !bomb.fuse.is_armed() {
                continue;
            }
            let expired = bomb.fuse.advance(dt);
            services
                .presentation
                .fuse_color(id, palette.color(bomb.fuse.progress()));
            if expired {
                self.detonate(id, services);
            }
        }
    }
}
