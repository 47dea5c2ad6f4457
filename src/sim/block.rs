//! Terrain blocks and their destruction contract

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Shape;
use super::powerup::{PowerUpAllocator, PowerUpKind};
use super::query::{EntityId, InteractionClass};
use crate::consts::BLOCK_HALF_EXTENT;

/// Block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// Indestructible; absorbs blasts
    Solid,
    /// Breaks on the first blast
    Destructible,
    /// Breaks on the first blast and can be pushed
    Movable,
}

impl BlockKind {
    pub fn class(self) -> InteractionClass {
        match self {
            BlockKind::Solid => InteractionClass::SOLID,
            BlockKind::Destructible => InteractionClass::DESTRUCTIBLE,
            BlockKind::Movable => InteractionClass::MOVABLE,
        }
    }

    pub fn is_breakable(self) -> bool {
        !matches!(self, BlockKind::Solid)
    }
}

/// What happened when a block was asked to break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// First destruction; may leave a power-up behind
    Destroyed { drop: Option<PowerUpKind> },
    /// Solid block: nothing happens
    Absorbed,
    /// Already gone: nothing happens
    AlreadyDestroyed,
}

/// A block entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: EntityId,
    pub kind: BlockKind,
    /// World position (cell center at rest, in between while sliding)
    pub pos: Vec2,
    #[serde(default)]
    destroyed: bool,
}

impl Block {
    pub fn new(id: EntityId, kind: BlockKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            destroyed: false,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Collider shape at the given grid size
    pub fn shape(&self, grid_size: f32) -> Shape {
        Shape::Box {
            half: Vec2::splat(BLOCK_HALF_EXTENT * grid_size),
        }
    }

    /// Break the block.
    ///
    /// Solid blocks and already-broken blocks ignore the call. The allocator
    /// is consulted only on the one call that actually breaks the block.
    pub fn destroy(&mut self, allocator: &mut dyn PowerUpAllocator) -> DestroyOutcome {
        if self.destroyed {
            return DestroyOutcome::AlreadyDestroyed;
        }
        if !self.kind.is_breakable() {
            log::debug!("Block {} is solid and cannot be destroyed", self.id);
            return DestroyOutcome::Absorbed;
        }
        self.destroyed = true;
        let drop = allocator.choose_kind();
        log::debug!("Block {} destroyed (drop: {:?})", self.id, drop);
        DestroyOutcome::Destroyed { drop }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::powerup::NoDrops;

    /// Counts how often it was asked and always hands out a speed boost
    struct Counting(u32);

    impl PowerUpAllocator for Counting {
        fn choose_kind(&mut self) -> Option<PowerUpKind> {
            self.0 += 1;
            Some(PowerUpKind::SpeedBoost)
        }
    }

    #[test]
    fn test_solid_never_breaks_or_drops() {
        let mut alloc = Counting(0);
        let mut block = Block::new(EntityId(1), BlockKind::Solid, Vec2::ZERO);
        for _ in 0..3 {
            assert_eq!(block.destroy(&mut alloc), DestroyOutcome::Absorbed);
        }
        assert!(!block.is_destroyed());
        assert_eq!(alloc.0, 0);
    }

    #[test]
    fn test_breakable_blocks_break_once() {
        for kind in [BlockKind::Destructible, BlockKind::Movable] {
            let mut alloc = Counting(0);
            let mut block = Block::new(EntityId(1), kind, Vec2::ZERO);
            assert_eq!(
                block.destroy(&mut alloc),
                DestroyOutcome::Destroyed {
                    drop: Some(PowerUpKind::SpeedBoost)
                }
            );
            assert_eq!(block.destroy(&mut alloc), DestroyOutcome::AlreadyDestroyed);
            assert!(block.is_destroyed());
            assert_eq!(alloc.0, 1, "allocator consulted exactly once");
        }
    }

    #[test]
    fn test_no_drop_allocator() {
        let mut block = Block::new(EntityId(4), BlockKind::Destructible, Vec2::ONE);
        assert_eq!(
            block.destroy(&mut NoDrops),
            DestroyOutcome::Destroyed { drop: None }
        );
    }
}
