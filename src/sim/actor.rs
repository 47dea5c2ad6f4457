//! Player-controlled actors: movement, bomb placement, pickups

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Shape;
use super::events::SimEvent;
use super::powerup::ActorStats;
use super::query::{EntityId, InteractionClass, SpatialQuery};
use super::state::Arena;
use crate::settings::ActorSettings;

/// Which player controls the actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSlot {
    One,
    Two,
}

/// An actor in the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: EntityId,
    pub slot: PlayerSlot,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Collider radius (world units)
    pub radius: f32,
    pub stats: ActorStats,
    /// Bombs placed and not yet exploded
    pub live_bombs: u32,
    pub eliminated: bool,
}

impl Actor {
    pub fn new(
        id: EntityId,
        slot: PlayerSlot,
        pos: Vec2,
        settings: &ActorSettings,
        grid_size: f32,
    ) -> Self {
        Self {
            id,
            slot,
            pos,
            vel: Vec2::ZERO,
            radius: settings.radius * grid_size,
            stats: ActorStats::from_settings(settings),
            live_bombs: 0,
            eliminated: false,
        }
    }

    pub fn shape(&self) -> Shape {
        Shape::Circle {
            radius: self.radius,
        }
    }

    pub fn can_place_bomb(&self) -> bool {
        !self.eliminated && self.live_bombs < self.stats.max_bombs
    }
}

/// Per-step input for one actor
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActorInput {
    /// Desired direction; clamped to unit length
    pub movement: Vec2,
    /// Place a bomb this step (one-shot)
    pub place_bomb: bool,
}

/// Result of a bomb placement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceBombOutcome {
    Placed(EntityId),
    /// All of the actor's bombs are still live
    QuotaReached,
    /// Another bomb sits on the cell, or a sliding block is about to
    CellOccupied(EntityId),
    /// Actor missing or eliminated
    Inactive,
}

impl Arena {
    /// Ease the actor's velocity toward its input and move it, axis by axis
    pub fn drive_actor(&mut self, id: EntityId, input: ActorInput, dt: f32) {
        let grid_size = self.world.grid.size;
        let (accel, decel) = (self.settings.actor.acceleration, self.settings.actor.deceleration);
        let Some(actor) = self.world.actor_mut(id) else {
            return;
        };
        if actor.eliminated {
            return;
        }

        let movement = input.movement.clamp_length_max(1.0);
        let target = movement * actor.stats.move_speed * grid_size;
        actor.vel = actor.vel.lerp(target, (accel * dt).min(1.0));
        if movement == Vec2::ZERO {
            // Idle actors get extra braking on top of the approach to zero
            actor.vel = actor.vel.lerp(Vec2::ZERO, (decel * dt).min(1.0));
        }
        let (start, vel, radius) = (actor.pos, actor.vel, actor.radius);

        let delta = vel * dt;
        let after_x = self.world.sweep(id, start, Vec2::new(delta.x, 0.0), radius);
        let after_y = self.world.sweep(id, after_x, Vec2::new(0.0, delta.y), radius);
        // Velocity is kept when blocked: it is the actor's push against the obstacle
        self.world.set_actor_position(id, after_y);
    }

    /// Drop a bomb on the actor's cell
    pub fn place_bomb(&mut self, id: EntityId) -> PlaceBombOutcome {
        let grid = self.world.grid;
        let Some(actor) = self.world.actor(id) else {
            return PlaceBombOutcome::Inactive;
        };
        if actor.eliminated {
            return PlaceBombOutcome::Inactive;
        }
        if !actor.can_place_bomb() {
            log::debug!("Actor {id} has no bombs left");
            return PlaceBombOutcome::QuotaReached;
        }

        let cell = grid.cell_of(actor.pos);
        let center = grid.center_of(cell);
        if let Some(existing) = self.world.overlap_point(center, InteractionClass::BOMB) {
            return PlaceBombOutcome::CellOccupied(existing);
        }
        if let Some(block) = self.world.claimant(center, 0.0, None) {
            return PlaceBombOutcome::CellOccupied(block);
        }

        let range = actor.stats.explosion_range;
        let bomb_radius = crate::consts::BOMB_RADIUS * grid.size;
        let standing: Vec<EntityId> = self
            .world
            .actors
            .iter()
            .filter(|a| !a.eliminated && a.pos.distance(center) <= a.radius + bomb_radius)
            .map(|a| a.id)
            .collect();

        let bomb = self
            .world
            .spawn_bomb(id, cell, range, self.settings.bomb.fuse_seconds, standing);
        if let Some(actor) = self.world.actor_mut(id) {
            actor.live_bombs += 1;
        }
        log::info!("Actor {id} placed bomb {bomb} at {cell} (range {range})");
        self.emit(SimEvent::BombPlaced {
            bomb,
            owner: id,
            cell,
        });
        PlaceBombOutcome::Placed(bomb)
    }

    /// Hand pickups to the actors touching them
    pub fn collect_pickups(&mut self) {
        let grid_size = self.world.grid.size;
        let mut collected = Vec::new();
        for actor in self.world.actors.iter().filter(|a| !a.eliminated) {
            for pickup in &self.world.pickups {
                if collected.iter().any(|(p, _, _)| *p == pickup.id) {
                    continue;
                }
                if pickup
                    .shape(grid_size)
                    .overlaps_circle(pickup.pos, actor.pos, actor.radius)
                {
                    collected.push((pickup.id, actor.id, pickup.kind));
                }
            }
        }

        for (pickup, actor, kind) in collected {
            self.world.remove_pickup(pickup);
            if let Some(a) = self.world.actor_mut(actor) {
                a.stats.apply(kind);
            }
            log::info!("Actor {actor} collected {kind:?}");
            self.emit(SimEvent::PowerUpCollected {
                pickup,
                actor,
                kind,
            });
        }
    }
}
