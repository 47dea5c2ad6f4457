//! Entity store and reference broad-phase
//!
//! Entities live in id-sorted vectors. A separate collider table mirrors their
//! positions for spatial queries. Writing an entity's position directly leaves
//! its collider behind until `resync_transforms`; the `set_*_position` helpers
//! move both. A sliding block also claims its target cell, so actors and bombs
//! cannot get in under it before it lands.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actor::Actor;
use super::block::{Block, BlockKind};
use super::collision::Shape;
use super::fuse::Fuse;
use super::grid::{Cell, Grid};
use super::powerup::PowerUpKind;
use super::query::{EntityId, InteractionClass, RayHit, SpatialQuery};
use super::state::{Bomb, Pickup};

/// Broad-phase entry
#[derive(Debug, Clone, Copy, PartialEq)]
struct Collider {
    class: InteractionClass,
    center: Vec2,
    shape: Shape,
}

/// Every entity in the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub grid: Grid,
    /// Blocks (sorted by id)
    pub blocks: Vec<Block>,
    /// Bombs (sorted by id)
    pub bombs: Vec<Bomb>,
    /// Actors (sorted by id)
    pub actors: Vec<Actor>,
    /// Pickups (sorted by id)
    pub pickups: Vec<Pickup>,
    #[serde(skip)]
    colliders: BTreeMap<EntityId, Collider>,
    /// Target cells of sliding blocks, keyed by block
    #[serde(skip)]
    claims: BTreeMap<EntityId, Collider>,
    next_id: u32,
}

impl World {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            blocks: Vec::new(),
            bombs: Vec::new(),
            actors: Vec::new(),
            pickups: Vec::new(),
            colliders: BTreeMap::new(),
            claims: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn spawn_block(&mut self, kind: BlockKind, cell: Cell) -> EntityId {
        let id = self.allocate_id();
        let block = Block::new(id, kind, self.grid.center_of(cell));
        self.colliders.insert(
            id,
            Collider {
                class: kind.class(),
                center: block.pos,
                shape: block.shape(self.grid.size),
            },
        );
        self.blocks.push(block);
        id
    }

    pub fn spawn_bomb(
        &mut self,
        owner: EntityId,
        cell: Cell,
        range: u32,
        fuse_seconds: f32,
        pass_through: Vec<EntityId>,
    ) -> EntityId {
        let id = self.allocate_id();
        let bomb = Bomb {
            id,
            owner,
            pos: self.grid.center_of(cell),
            range,
            fuse: Fuse::new(fuse_seconds),
            pass_through,
        };
        self.colliders.insert(
            id,
            Collider {
                class: InteractionClass::BOMB,
                center: bomb.pos,
                shape: bomb.shape(self.grid.size),
            },
        );
        self.bombs.push(bomb);
        id
    }

    pub fn spawn_pickup(&mut self, kind: PowerUpKind, cell: Cell) -> EntityId {
        let id = self.allocate_id();
        let pickup = Pickup {
            id,
            kind,
            pos: self.grid.center_of(cell),
        };
        self.colliders.insert(
            id,
            Collider {
                class: InteractionClass::PICKUP,
                center: pickup.pos,
                shape: pickup.shape(self.grid.size),
            },
        );
        self.pickups.push(pickup);
        id
    }

    /// Insert an already-built actor (id must come from `allocate_id`)
    pub fn insert_actor(&mut self, actor: Actor) {
        if !actor.eliminated {
            self.colliders.insert(
                actor.id,
                Collider {
                    class: InteractionClass::ACTOR,
                    center: actor.pos,
                    shape: actor.shape(),
                },
            );
        }
        self.actors.push(actor);
    }

    pub fn block(&self, id: EntityId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_mut(&mut self, id: EntityId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// Block resting on `cell` (by logical position)
    #[cfg(test)]
    pub fn block_at(&self, cell: Cell) -> Option<&Block> {
        self.blocks.iter().find(|b| self.grid.cell_of(b.pos) == cell)
    }

    pub fn bomb(&self, id: EntityId) -> Option<&Bomb> {
        self.bombs.iter().find(|b| b.id == id)
    }

    pub fn bomb_mut(&mut self, id: EntityId) -> Option<&mut Bomb> {
        self.bombs.iter_mut().find(|b| b.id == id)
    }

    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn actor_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.id == id)
    }

    pub fn actor_ids(&self) -> Vec<EntityId> {
        self.actors.iter().map(|a| a.id).collect()
    }

    pub fn bomb_ids(&self) -> Vec<EntityId> {
        self.bombs.iter().map(|b| b.id).collect()
    }

    pub fn remove_block(&mut self, id: EntityId) -> Option<Block> {
        let idx = self.blocks.iter().position(|b| b.id == id)?;
        self.colliders.remove(&id);
        self.claims.remove(&id);
        Some(self.blocks.remove(idx))
    }

    pub fn remove_bomb(&mut self, id: EntityId) -> Option<Bomb> {
        let idx = self.bombs.iter().position(|b| b.id == id)?;
        self.colliders.remove(&id);
        Some(self.bombs.remove(idx))
    }

    pub fn remove_pickup(&mut self, id: EntityId) -> Option<Pickup> {
        let idx = self.pickups.iter().position(|p| p.id == id)?;
        self.colliders.remove(&id);
        Some(self.pickups.remove(idx))
    }

    /// Take an entity out of every query without removing it
    pub fn disable_collider(&mut self, id: EntityId) {
        self.colliders.remove(&id);
    }

    /// Whether `id` currently participates in queries
    pub fn has_collider(&self, id: EntityId) -> bool {
        self.colliders.contains_key(&id)
    }

    /// Move an actor; its collider follows immediately
    pub fn set_actor_position(&mut self, id: EntityId, pos: Vec2) {
        if let Some(actor) = self.actors.iter_mut().find(|a| a.id == id) {
            actor.pos = pos;
            if let Some(collider) = self.colliders.get_mut(&id) {
                collider.center = pos;
            }
        }
    }

    /// Move a block; its collider follows immediately
    pub fn set_block_position(&mut self, id: EntityId, pos: Vec2) {
        if let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) {
            block.pos = pos;
            if let Some(collider) = self.colliders.get_mut(&id) {
                collider.center = pos;
            }
        }
    }

    /// Reserve the cell centered on `target` for a sliding block
    pub fn claim_cell(&mut self, block: EntityId, target: Vec2) {
        let Some(b) = self.block(block) else {
            return;
        };
        let claim = Collider {
            class: b.kind.class(),
            center: target,
            shape: b.shape(self.grid.size),
        };
        self.claims.insert(block, claim);
    }

    pub fn release_claim(&mut self, block: EntityId) -> bool {
        self.claims.remove(&block).is_some()
    }

    /// Sliding block whose target cell overlaps a circle at `pos`
    pub fn claimant(
        &self,
        pos: Vec2,
        radius: f32,
        ignore: Option<EntityId>,
    ) -> Option<EntityId> {
        self.claims
            .iter()
            .find(|(id, c)| {
                Some(**id) != ignore && c.shape.overlaps_circle(c.center, pos, radius)
            })
            .map(|(id, _)| *id)
    }

    /// Everything `mover` cannot walk through: colliders and claimed cells.
    /// Bombs the mover is allowed to walk off are left out.
    fn obstacles(&self, mover: EntityId) -> impl Iterator<Item = (EntityId, &Collider)> + '_ {
        let colliders = self.colliders.iter().filter(move |(id, c)| {
            c.class.intersects(InteractionClass::ACTOR_BLOCKING)
                && !(c.class.intersects(InteractionClass::BOMB)
                    && self
                        .bomb(**id)
                        .is_some_and(|b| b.pass_through.contains(&mover)))
        });
        colliders
            .chain(self.claims.iter())
            .filter(move |(id, _)| **id != mover)
            .map(|(id, c)| (*id, c))
    }

    /// First obstacle that stops `mover` from occupying a circle at `pos`
    pub fn blocking_at(&self, pos: Vec2, radius: f32, mover: EntityId) -> Option<EntityId> {
        self.obstacles(mover)
            .find(|(_, c)| c.shape.overlaps_circle(c.center, pos, radius))
            .map(|(id, _)| id)
    }

    /// No obstacle overlaps `to` more deeply than it overlaps `from`
    fn no_deeper(&self, mover: EntityId, from: Vec2, to: Vec2, radius: f32) -> bool {
        self.obstacles(mover).all(|(_, c)| {
            let after = c.shape.penetration(c.center, to, radius);
            after <= 0.0 || after <= c.shape.penetration(c.center, from, radius)
        })
    }

    /// Move `mover` from `from` by up to `delta`, halving the step until it
    /// fits so the mover comes to rest against whatever it ran into. A mover
    /// already overlapping something may still move as long as it does not
    /// sink any further in.
    pub fn sweep(&self, mover: EntityId, from: Vec2, delta: Vec2, radius: f32) -> Vec2 {
        if delta == Vec2::ZERO {
            return from;
        }
        let mut step = delta;
        for _ in 0..6 {
            let candidate = from + step;
            if self.blocking_at(candidate, radius, mover).is_none()
                || self.no_deeper(mover, from, candidate, radius)
            {
                return candidate;
            }
            step *= 0.5;
        }
        from
    }

    /// Drop actors from bomb pass-through lists once they have stepped off
    pub fn refresh_pass_through(&mut self) {
        let grid_size = self.grid.size;
        let World { bombs, actors, .. } = self;
        for bomb in bombs.iter_mut() {
            let shape = bomb.shape(grid_size);
            let center = bomb.pos;
            bomb.pass_through.retain(|id| {
                actors.iter().any(|a| {
                    a.id == *id
                        && !a.eliminated
                        && shape.gap_to_circle(center, a.pos, a.radius) <= 0.0
                })
            });
        }
    }

    fn first_match(
        &self,
        mask: InteractionClass,
        ignore: Option<EntityId>,
        hit: impl Fn(&Collider) -> bool,
    ) -> Option<EntityId> {
        self.colliders
            .iter()
            .find(|(id, c)| Some(**id) != ignore && c.class.intersects(mask) && hit(*c))
            .map(|(id, _)| *id)
    }
}

impl SpatialQuery for World {
    fn overlap_point(&self, pos: Vec2, mask: InteractionClass) -> Option<EntityId> {
        self.first_match(mask, None, |c| c.shape.contains_point(c.center, pos))
    }

    fn overlap_circle(
        &self,
        pos: Vec2,
        radius: f32,
        mask: InteractionClass,
        ignore: Option<EntityId>,
    ) -> Option<EntityId> {
        self.first_match(mask, ignore, |c| c.shape.overlaps_circle(c.center, pos, radius))
    }

    fn raycast_all(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: InteractionClass,
    ) -> Vec<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec2::ZERO {
            return Vec::new();
        }
        self.colliders
            .iter()
            .filter(|(_, c)| c.class.intersects(mask))
            .filter_map(|(id, c)| {
                c.shape
                    .raycast(c.center, origin, dir, max_distance)
                    .map(|distance| RayHit {
                        entity: *id,
                        class: c.class,
                        distance,
                    })
            })
            .collect()
    }

    fn resync_transforms(&mut self) {
        let grid_size = self.grid.size;
        let mut colliders = BTreeMap::new();
        for block in self.blocks.iter().filter(|b| !b.is_destroyed()) {
            colliders.insert(
                block.id,
                Collider {
                    class: block.kind.class(),
                    center: block.pos,
                    shape: block.shape(grid_size),
                },
            );
        }
        for bomb in &self.bombs {
            colliders.insert(
                bomb.id,
                Collider {
                    class: InteractionClass::BOMB,
                    center: bomb.pos,
                    shape: bomb.shape(grid_size),
                },
            );
        }
        for actor in self.actors.iter().filter(|a| !a.eliminated) {
            colliders.insert(
                actor.id,
                Collider {
                    class: InteractionClass::ACTOR,
                    center: actor.pos,
                    shape: actor.shape(),
                },
            );
        }
        for pickup in &self.pickups {
            colliders.insert(
                pickup.id,
                Collider {
                    class: InteractionClass::PICKUP,
                    center: pickup.pos,
                    shape: pickup.shape(grid_size),
                },
            );
        }
        self.colliders = colliders;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::query::sort_hits;
    use glam::IVec2;

    #[test]
    fn test_raycast_finds_blocks_in_column() {
        let mut world = World::new(Grid::default());
        let near = world.spawn_block(BlockKind::Solid, IVec2::new(0, 2));
        let far = world.spawn_block(BlockKind::Destructible, IVec2::new(0, 3));
        world.spawn_block(BlockKind::Destructible, IVec2::new(0, 4)); // out of range
        world.spawn_block(BlockKind::Destructible, IVec2::new(1, 2)); // off the ray

        let mut hits = world.raycast_all(Vec2::ZERO, Vec2::Y, 3.0, InteractionClass::BLAST);
        sort_hits(&mut hits);
        let ids: Vec<_> = hits.iter().map(|h| h.entity).collect();
        assert_eq!(ids, vec![near, far]);
        assert!((hits[0].distance - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_mask_filters_queries() {
        let mut world = World::new(Grid::default());
        world.spawn_pickup(PowerUpKind::ExtraBomb, IVec2::new(0, 1));
        assert!(
            world
                .raycast_all(Vec2::ZERO, Vec2::Y, 3.0, InteractionClass::BLAST)
                .is_empty()
        );
        assert!(
            world
                .overlap_point(Vec2::new(0.0, 1.0), InteractionClass::PICKUP)
                .is_some()
        );
    }

    #[test]
    fn test_overlap_circle_ignores_self() {
        let mut world = World::new(Grid::default());
        let block = world.spawn_block(BlockKind::Movable, IVec2::ZERO);
        assert_eq!(
            world.overlap_circle(Vec2::ZERO, 0.2, InteractionClass::OCCUPANCY, None),
            Some(block)
        );
        assert_eq!(
            world.overlap_circle(Vec2::ZERO, 0.2, InteractionClass::OCCUPANCY, Some(block)),
            None
        );
    }

    #[test]
    fn test_colliders_lag_until_resync() {
        let mut world = World::new(Grid::default());
        let block = world.spawn_block(BlockKind::Movable, IVec2::ZERO);
        world.block_mut(block).unwrap().pos = Vec2::new(1.0, 0.0);

        let target = Vec2::new(1.0, 0.0);
        assert!(world.overlap_point(target, InteractionClass::MOVABLE).is_none());
        world.resync_transforms();
        assert_eq!(world.overlap_point(target, InteractionClass::MOVABLE), Some(block));
    }

    #[test]
    fn test_removed_entities_leave_queries() {
        let mut world = World::new(Grid::default());
        let block = world.spawn_block(BlockKind::Destructible, IVec2::new(0, 1));
        assert!(world.remove_block(block).is_some());
        assert!(world.remove_block(block).is_none());
        assert!(
            world
                .raycast_all(Vec2::ZERO, Vec2::Y, 3.0, InteractionClass::BLAST)
                .is_empty()
        );
    }

    #[test]
    fn test_block_at_cell() {
        let mut world = World::new(Grid::new(2.0));
        let block = world.spawn_block(BlockKind::Solid, IVec2::new(1, -1));
        assert_eq!(world.block_at(IVec2::new(1, -1)).map(|b| b.id), Some(block));
        assert_eq!(world.block(block).unwrap().pos, Vec2::new(2.0, -2.0));
        assert!(world.block_at(IVec2::ZERO).is_none());
    }
}
