//! Spatial query interface
//!
//! The simulation never talks to a physics engine directly. Everything it
//! needs (point and circle overlap, ray casts, transform sync) goes through
//! [`SpatialQuery`], filtered by [`InteractionClass`] bits.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable handle for anything living in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of thing a collider is, for query filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InteractionClass(pub u32);

impl InteractionClass {
    pub const NONE: Self = Self(0);

    /// Indestructible terrain
    pub const SOLID: Self = Self(1 << 0);
    /// Breakable terrain
    pub const DESTRUCTIBLE: Self = Self(1 << 1);
    /// Breakable, pushable terrain
    pub const MOVABLE: Self = Self(1 << 2);
    /// Player-controlled body
    pub const ACTOR: Self = Self(1 << 3);
    /// Armed bomb
    pub const BOMB: Self = Self(1 << 4);
    /// Power-up trigger (never blocks anything)
    pub const PICKUP: Self = Self(1 << 5);

    /// Any block
    pub const TERRAIN: Self = Self(Self::SOLID.0 | Self::DESTRUCTIBLE.0 | Self::MOVABLE.0);

    /// What a blast ray can hit
    pub const BLAST: Self = Self(Self::TERRAIN.0 | Self::ACTOR.0 | Self::BOMB.0);

    /// What keeps a block from sliding into a cell
    pub const OCCUPANCY: Self = Self(Self::TERRAIN.0 | Self::ACTOR.0 | Self::BOMB.0);

    /// What an actor cannot walk through
    pub const ACTOR_BLOCKING: Self = Self(Self::TERRAIN.0 | Self::ACTOR.0 | Self::BOMB.0);

    /// Check if these flags contain all of `other`.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any of the given flags are set.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Is this a block of any kind?
    #[inline]
    pub fn is_terrain(self) -> bool {
        self.intersects(Self::TERRAIN)
    }
}

impl BitOr for InteractionClass {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for InteractionClass {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// One collider crossed by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: EntityId,
    pub class: InteractionClass,
    /// Distance from the ray origin to the entry point (zero if the ray starts inside)
    pub distance: f32,
}

/// Broad-phase queries the simulation consumes.
///
/// Results are only as fresh as the last [`SpatialQuery::resync_transforms`]
/// for entities whose positions were written without updating their colliders.
pub trait SpatialQuery {
    /// First collider matching `mask` that contains `pos`
    fn overlap_point(&self, pos: Vec2, mask: InteractionClass) -> Option<EntityId>;

    /// First collider matching `mask` that overlaps the circle, skipping `ignore`
    fn overlap_circle(
        &self,
        pos: Vec2,
        radius: f32,
        mask: InteractionClass,
        ignore: Option<EntityId>,
    ) -> Option<EntityId>;

    /// Every collider matching `mask` along the ray, in no particular order
    fn raycast_all(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: InteractionClass,
    ) -> Vec<RayHit>;

    /// Force collider positions to match logical positions
    fn resync_transforms(&mut self);
}

/// Sort hits nearest first; equal distances fall back to entity order.
pub fn sort_hits(hits: &mut [RayHit]) {
    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.entity.cmp(&b.entity))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_masks() {
        assert!(InteractionClass::BLAST.contains(InteractionClass::MOVABLE));
        assert!(InteractionClass::BLAST.intersects(InteractionClass::ACTOR));
        assert!(!InteractionClass::BLAST.intersects(InteractionClass::PICKUP));
        assert!(InteractionClass::DESTRUCTIBLE.is_terrain());
        assert!(!InteractionClass::BOMB.is_terrain());

        let mut mask = InteractionClass::SOLID;
        mask |= InteractionClass::BOMB;
        assert_eq!(mask, InteractionClass::SOLID | InteractionClass::BOMB);
    }

    #[test]
    fn test_sort_hits_nearest_first() {
        let hit = |id, distance| RayHit {
            entity: EntityId(id),
            class: InteractionClass::SOLID,
            distance,
        };
        let mut hits = vec![hit(3, 4.5), hit(2, 1.5), hit(1, 4.5)];
        sort_hits(&mut hits);
        let order: Vec<u32> = hits.iter().map(|h| h.entity.0).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }
}
