//! Blast propagation
//!
//! A detonation casts one ray per direction (Up, Down, Left, Right). Each ray's
//! hits are sorted nearest first and walked in order: terrain takes the blast
//! and stops the ray, actors are knocked out and the ray continues, and other
//! bombs detonate in turn. Chains recurse immediately, so a whole cascade
//! resolves inside one call. The per-bomb fuse state keeps cycles finite.

use glam::Vec2;

use super::block::DestroyOutcome;
use super::events::{Services, SimEvent};
use super::grid::{Cell, Direction};
use super::query::{EntityId, InteractionClass, RayHit, SpatialQuery, sort_hits};
use super::state::Arena;
use crate::consts::BLAST_PROBE_RADIUS;

/// What the blast does to one entity along a ray
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlastAction {
    /// Terrain: destroy (or be absorbed) and stop the ray
    Strike(EntityId),
    /// Actor: eliminate, keep going
    Hit(EntityId),
    /// Another bomb: detonate it, keep going
    Chain(EntityId),
}

/// Turn one ray's hits into an ordered list of actions.
///
/// The detonating bomb's own collider is skipped. Nothing past the first
/// terrain hit is touched.
pub fn plan_ray(mut hits: Vec<RayHit>, source: EntityId) -> Vec<BlastAction> {
    sort_hits(&mut hits);
    let mut plan = Vec::new();
    for hit in hits {
        if hit.entity == source {
            continue;
        }
        if hit.class.is_terrain() {
            plan.push(BlastAction::Strike(hit.entity));
            break;
        }
        if hit.class.intersects(InteractionClass::ACTOR) {
            plan.push(BlastAction::Hit(hit.entity));
        } else if hit.class.intersects(InteractionClass::BOMB) {
            plan.push(BlastAction::Chain(hit.entity));
        }
    }
    plan
}

/// Everything one detonation did (chained bombs report separately)
#[derive(Debug, Clone, PartialEq)]
pub struct BlastReport {
    pub bomb: EntityId,
    pub origin: Cell,
    /// Blocks broken by this blast
    pub destroyed: Vec<EntityId>,
    /// Solid blocks that stopped a ray
    pub absorbed: Vec<EntityId>,
    pub hit_actors: Vec<EntityId>,
    /// Bombs this blast set off
    pub chained: Vec<EntityId>,
    /// Cells covered by the blast effect
    pub area: Vec<Cell>,
}

impl BlastReport {
    fn new(bomb: EntityId, origin: Cell) -> Self {
        Self {
            bomb,
            origin,
            destroyed: Vec::new(),
            absorbed: Vec::new(),
            hit_actors: Vec::new(),
            chained: Vec::new(),
            area: Vec::new(),
        }
    }
}

impl Arena {
    /// Detonate a bomb now. Returns `None` if it is missing or already went off.
    pub fn detonate(&mut self, id: EntityId, services: &mut Services<'_>) -> Option<BlastReport> {
        self.detonate_from(id, None, services)
    }

    fn detonate_from(
        &mut self,
        id: EntityId,
        chained_by: Option<EntityId>,
        services: &mut Services<'_>,
    ) -> Option<BlastReport> {
        let grid = self.world.grid;
        let bomb = self.world.bomb_mut(id)?;
        if !bomb.fuse.ignite() {
            return None;
        }
        let (origin_pos, range) = (bomb.pos, bomb.range);
        let origin = grid.cell_of(origin_pos);

        match chained_by {
            Some(by) => log::info!("Bomb {id} at {origin} set off by {by}"),
            None => log::info!("Bomb {id} exploded at {origin}"),
        }
        self.emit(SimEvent::BombExploded {
            bomb: id,
            cell: origin,
            chained_by,
        });

        let mut report = BlastReport::new(id, origin);
        report.area = self.blast_area(origin, range);
        match self.settings.bomb.explosion_effect.as_deref() {
            Some(effect) => services.presentation.blast(
                id,
                effect,
                &report.area,
                self.settings.bomb.effect_lifetime,
            ),
            None => log::warn!("No explosion effect configured; bomb {id} explodes without visuals"),
        }

        let reach = grid.cells_to_world(range as f32);
        for dir in Direction::ALL {
            let hits = self
                .world
                .raycast_all(origin_pos, dir.vector(), reach, InteractionClass::BLAST);
            for action in plan_ray(hits, id) {
                match action {
                    BlastAction::Strike(block) => self.strike_block(block, &mut report, services),
                    BlastAction::Hit(actor) => {
                        if self.eliminate_actor(actor, id, services) {
                            report.hit_actors.push(actor);
                        }
                    }
                    BlastAction::Chain(other) => {
                        if self.detonate_from(other, Some(id), services).is_some() {
                            report.chained.push(other);
                        }
                    }
                }
            }
        }

        self.retire_bomb(id);
        Some(report)
    }

    /// Cells the blast effect covers: the origin, then up to `range` cells
    /// each way, stopping on (and including) the first cell holding terrain.
    pub fn blast_area(&self, origin: Cell, range: u32) -> Vec<Cell> {
        let grid = self.world.grid;
        let probe = BLAST_PROBE_RADIUS * grid.size;
        let mut cells = vec![origin];
        for dir in Direction::ALL {
            for step in 1..=range as i32 {
                let cell = origin + dir.offset() * step;
                cells.push(cell);
                let blocked = self
                    .world
                    .overlap_circle(grid.center_of(cell), probe, InteractionClass::TERRAIN, None)
                    .is_some();
                if blocked {
                    break;
                }
            }
        }
        cells
    }

    fn strike_block(&mut self, block: EntityId, report: &mut BlastReport, services: &mut Services<'_>) {
        let grid = self.world.grid;
        let Some(target) = self.world.block_mut(block) else {
            return;
        };
        let kind = target.kind;
        let cell = grid.cell_of(target.pos);
        match target.destroy(&mut *services.allocator) {
            DestroyOutcome::Absorbed => report.absorbed.push(block),
            DestroyOutcome::AlreadyDestroyed => {}
            DestroyOutcome::Destroyed { drop } => {
                self.remove_block(block);
                report.destroyed.push(block);
                self.emit(SimEvent::BlockDestroyed { block, kind, cell });
                if let Some(kind) = drop {
                    let pickup = self.world.spawn_pickup(kind, cell);
                    log::debug!("Block {block} dropped {kind:?} at {cell}");
                    self.emit(SimEvent::PowerUpDropped { pickup, kind, cell });
                }
            }
        }
    }

    /// Knock an actor out. Returns false if it was already out.
    fn eliminate_actor(&mut self, actor: EntityId, bomb: EntityId, services: &mut Services<'_>) -> bool {
        let Some(target) = self.world.actor_mut(actor) else {
            return false;
        };
        if target.eliminated {
            return false;
        }
        target.eliminated = true;
        target.vel = Vec2::ZERO;
        self.world.disable_collider(actor);
        self.push.forget(actor);
        services.hits.actor_eliminated(actor);
        log::info!("Actor {actor} caught in blast of bomb {bomb}");
        self.emit(SimEvent::ActorEliminated { actor, bomb });
        true
    }

    /// Remove a spent bomb and give its owner the slot back
    fn retire_bomb(&mut self, id: EntityId) {
        let Some(mut bomb) = self.world.remove_bomb(id) else {
            return;
        };
        bomb.fuse.finish();
        if let Some(owner) = self.world.actor_mut(bomb.owner) {
            owner.live_bombs = owner.live_bombs.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ArenaSettings, PowerUpSettings};
    use crate::sim::block::BlockKind;
    use crate::sim::powerup::{PowerUpKind, QuotaAllocator};
    use crate::sim::testing::Harness;
    use glam::IVec2;

    fn hit(entity: u32, class: InteractionClass, distance: f32) -> RayHit {
        RayHit {
            entity: EntityId(entity),
            class,
            distance,
        }
    }

    fn arena() -> Arena {
        Arena::new(ArenaSettings::default())
    }

    fn bomb_at(arena: &mut Arena, owner: EntityId, cell: IVec2, range: u32) -> EntityId {
        let bomb = arena.world.spawn_bomb(owner, cell, range, 2.0, Vec::new());
        if let Some(actor) = arena.world.actor_mut(owner) {
            actor.live_bombs += 1;
        }
        bomb
    }

    fn explosions(arena: &Arena) -> Vec<(EntityId, Option<EntityId>)> {
        arena
            .events()
            .iter()
            .filter_map(|e| match e {
                SimEvent::BombExploded {
                    bomb, chained_by, ..
                } => Some((*bomb, *chained_by)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_nearest_solid_stops_ray() {
        let hits = vec![
            hit(7, InteractionClass::DESTRUCTIBLE, 5.0),
            hit(8, InteractionClass::ACTOR, 5.0),
            hit(9, InteractionClass::SOLID, 2.0),
        ];
        assert_eq!(plan_ray(hits, EntityId(1)), vec![BlastAction::Strike(EntityId(9))]);
    }

    #[test]
    fn test_ray_passes_actors_and_bombs() {
        let hits = vec![
            hit(5, InteractionClass::DESTRUCTIBLE, 3.0),
            hit(4, InteractionClass::DESTRUCTIBLE, 2.0),
            hit(3, InteractionClass::BOMB, 1.0),
            hit(2, InteractionClass::ACTOR, 0.5),
            hit(1, InteractionClass::BOMB, 0.0),
        ];
        assert_eq!(
            plan_ray(hits, EntityId(1)),
            vec![
                BlastAction::Hit(EntityId(2)),
                BlastAction::Chain(EntityId(3)),
                BlastAction::Strike(EntityId(4)),
            ]
        );
    }

    #[test]
    fn test_end_to_end_column() {
        let mut arena = arena();
        let mut harness = Harness::default();
        let owner = arena.spawn_actor(IVec2::new(-3, -3)).unwrap();
        let bomb = bomb_at(&mut arena, owner, IVec2::ZERO, 3);
        let crate_block = arena.spawn_block(BlockKind::Destructible, IVec2::new(0, 2));
        let wall = arena.spawn_block(BlockKind::Solid, IVec2::new(0, 3));

        let report = arena.detonate(bomb, &mut harness.services()).unwrap();
        assert_eq!(report.destroyed, vec![crate_block]);
        assert!(report.absorbed.is_empty(), "the wall sits behind the crate");
        assert!(arena.world.block(crate_block).is_none());
        assert!(arena.world.block(wall).is_some());
        assert!(arena.world.bomb(bomb).is_none());
        assert_eq!(arena.world.actor(owner).unwrap().live_bombs, 0);

        // Up stops at the crate's cell; the other arms run their full length
        assert!(report.area.contains(&IVec2::new(0, 2)));
        assert!(!report.area.contains(&IVec2::new(0, 3)));
        assert!(report.area.contains(&IVec2::new(0, -3)));
        assert_eq!(report.area.len(), 1 + 2 + 3 * 3);
    }

    #[test]
    fn test_solid_absorbs() {
        let mut arena = arena();
        let mut harness = Harness::default();
        let owner = arena.spawn_actor(IVec2::new(-3, -3)).unwrap();
        let bomb = bomb_at(&mut arena, owner, IVec2::ZERO, 3);
        let wall = arena.spawn_block(BlockKind::Solid, IVec2::new(2, 0));
        let behind = arena.spawn_block(BlockKind::Destructible, IVec2::new(3, 0));

        let report = arena.detonate(bomb, &mut harness.services()).unwrap();
        assert_eq!(report.absorbed, vec![wall]);
        assert!(report.destroyed.is_empty());
        assert!(arena.world.block(behind).is_some());
    }

    #[test]
    fn test_chain_reaction_in_one_cascade() {
        let mut arena = arena();
        let mut harness = Harness::default();
        let owner = arena.spawn_actor(IVec2::new(-3, -3)).unwrap();
        let a = bomb_at(&mut arena, owner, IVec2::ZERO, 3);
        let b = bomb_at(&mut arena, owner, IVec2::new(2, 0), 1);

        let report = arena.detonate(a, &mut harness.services()).unwrap();
        assert_eq!(report.chained, vec![b]);
        assert!(arena.world.bombs.is_empty());
        assert_eq!(arena.world.actor(owner).unwrap().live_bombs, 0);
        assert_eq!(explosions(&arena), vec![(a, None), (b, Some(a))]);
    }

    #[test]
    fn test_mutual_chain_terminates() {
        let mut arena = arena();
        let mut harness = Harness::default();
        let owner = arena.spawn_actor(IVec2::new(-3, -3)).unwrap();
        let a = bomb_at(&mut arena, owner, IVec2::ZERO, 3);
        let b = bomb_at(&mut arena, owner, IVec2::new(1, 0), 3);
        let c = bomb_at(&mut arena, owner, IVec2::new(0, 1), 3);

        arena.detonate(a, &mut harness.services()).unwrap();
        let fired = explosions(&arena);
        assert_eq!(fired.len(), 3);
        assert_eq!(fired[0], (a, None));
        assert!(fired.contains(&(b, Some(a))) || fired.contains(&(b, Some(c))));
        assert!(arena.detonate(a, &mut harness.services()).is_none());
        assert!(arena.detonate(b, &mut harness.services()).is_none());
    }

    #[test]
    fn test_actor_hit_once_across_chain() {
        let mut arena = arena();
        let mut harness = Harness::default();
        let owner = arena.spawn_actor(IVec2::new(-3, -3)).unwrap();
        let victim = arena.spawn_actor(IVec2::new(1, 0)).unwrap();
        let a = bomb_at(&mut arena, owner, IVec2::ZERO, 3);
        bomb_at(&mut arena, owner, IVec2::new(2, 0), 3);

        let report = arena.detonate(a, &mut harness.services()).unwrap();
        assert_eq!(report.hit_actors, vec![victim]);
        assert_eq!(harness.hits, vec![victim]);
        assert!(arena.world.actor(victim).unwrap().eliminated);
        assert!(!arena.world.has_collider(victim));
        let knocked_out = arena
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::ActorEliminated { .. }))
            .count();
        assert_eq!(knocked_out, 1);
    }

    #[test]
    fn test_actor_on_own_bomb_is_hit() {
        let mut arena = arena();
        let mut harness = Harness::default();
        let owner = arena.spawn_actor(IVec2::ZERO).unwrap();
        let bomb = bomb_at(&mut arena, owner, IVec2::ZERO, 2);

        let report = arena.detonate(bomb, &mut harness.services()).unwrap();
        assert_eq!(report.hit_actors, vec![owner]);
    }

    #[test]
    fn test_missing_effect_still_resolves() {
        let mut settings = ArenaSettings::default();
        settings.bomb.explosion_effect = None;
        let mut arena = Arena::new(settings);
        let mut harness = Harness::default();
        let owner = arena.spawn_actor(IVec2::new(-3, -3)).unwrap();
        let bomb = bomb_at(&mut arena, owner, IVec2::ZERO, 2);
        let block = arena.spawn_block(BlockKind::Movable, IVec2::new(-1, 0));

        let report = arena.detonate(bomb, &mut harness.services()).unwrap();
        assert_eq!(report.destroyed, vec![block]);
        assert!(harness.presentation.blasts.is_empty());
    }

    #[test]
    fn test_destroyed_block_drops_pickup() {
        let mut arena = arena();
        let allocator = QuotaAllocator::new(
            &PowerUpSettings {
                no_powerup_chance: 0.0,
                ..PowerUpSettings::default()
            },
            1,
        );
        let mut harness = Harness::with_allocator(allocator);
        let owner = arena.spawn_actor(IVec2::new(-3, -3)).unwrap();
        let bomb = bomb_at(&mut arena, owner, IVec2::ZERO, 2);
        arena.spawn_block(BlockKind::Destructible, IVec2::new(0, -1));

        arena.detonate(bomb, &mut harness.services()).unwrap();
        assert_eq!(arena.world.pickups.len(), 1);
        let pickup = &arena.world.pickups[0];
        assert_eq!(pickup.pos, glam::Vec2::new(0.0, -1.0));
        assert!(PowerUpKind::ALL.contains(&pickup.kind));
        assert_eq!(harness.presentation.blasts.len(), 1);
    }
}
