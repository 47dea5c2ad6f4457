//! Power-up drops
//!
//! Destroyed blocks ask a [`PowerUpAllocator`] whether to leave something
//! behind. The stock allocator enforces a per-kind quota for the match and a
//! flat chance of dropping nothing.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::settings::{ActorSettings, PowerUpSettings};

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// +1 move speed
    SpeedBoost,
    /// +1 blast range
    ExplosionRange,
    /// +1 live bomb
    ExtraBomb,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::SpeedBoost,
        PowerUpKind::ExplosionRange,
        PowerUpKind::ExtraBomb,
    ];

    fn index(self) -> usize {
        match self {
            PowerUpKind::SpeedBoost => 0,
            PowerUpKind::ExplosionRange => 1,
            PowerUpKind::ExtraBomb => 2,
        }
    }
}

/// Actor stats a power-up can raise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActorStats {
    pub move_speed: f32,
    pub max_bombs: u32,
    pub explosion_range: u32,
}

impl ActorStats {
    pub fn from_settings(settings: &ActorSettings) -> Self {
        Self {
            move_speed: settings.move_speed,
            max_bombs: settings.max_bombs,
            explosion_range: settings.explosion_range,
        }
    }

    /// Apply a collected power-up
    pub fn apply(&mut self, kind: PowerUpKind) {
        match kind {
            PowerUpKind::SpeedBoost => self.move_speed += 1.0,
            PowerUpKind::ExplosionRange => self.explosion_range += 1,
            PowerUpKind::ExtraBomb => self.max_bombs += 1,
        }
    }
}

/// Decides what (if anything) a destroyed block drops
pub trait PowerUpAllocator {
    fn choose_kind(&mut self) -> Option<PowerUpKind>;
}

/// Never drops anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDrops;

impl PowerUpAllocator for NoDrops {
    fn choose_kind(&mut self) -> Option<PowerUpKind> {
        None
    }
}

/// Quota-limited random drops
#[derive(Debug, Clone)]
pub struct QuotaAllocator {
    quotas: [u32; 3],
    spawned: [u32; 3],
    none_chance: f32,
    rng: Pcg32,
}

impl QuotaAllocator {
    pub fn new(settings: &PowerUpSettings, seed: u64) -> Self {
        Self {
            quotas: [
                settings.speed_boost_quota,
                settings.explosion_range_quota,
                settings.extra_bomb_quota,
            ],
            spawned: [0; 3],
            none_chance: settings.no_powerup_chance,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Kinds still under quota, in declaration order
    pub fn available(&self) -> Vec<PowerUpKind> {
        PowerUpKind::ALL
            .into_iter()
            .filter(|k| self.spawned[k.index()] < self.quotas[k.index()])
            .collect()
    }

    /// How many of `kind` have been handed out this match
    pub fn spawned(&self, kind: PowerUpKind) -> u32 {
        self.spawned[kind.index()]
    }
}

impl PowerUpAllocator for QuotaAllocator {
    fn choose_kind(&mut self) -> Option<PowerUpKind> {
        let available = self.available();
        if available.is_empty() {
            return None;
        }
        if self.rng.random::<f32>() < self.none_chance {
            return None;
        }
        let kind = available[self.rng.random_range(0..available.len())];
        self.spawned[kind.index()] += 1;
        Some(kind)
    }
}
