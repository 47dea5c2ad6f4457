//! Arena state and entity types
//!
//! `Arena` owns the world plus every per-entity side table (push pressure,
//! slide jobs). Tables are keyed by `EntityId` and purged when an entity
//! leaves the world.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, PlayerSlot};
use super::block::BlockKind;
use super::collision::Shape;
use super::events::SimEvent;
use super::fuse::Fuse;
use super::grid::{Cell, Grid};
use super::maze::generate_maze;
use super::powerup::PowerUpKind;
use super::push::PushTracker;
use super::query::EntityId;
use super::slide::SlideMotion;
use super::world::World;
use crate::consts::{BOMB_RADIUS, PICKUP_RADIUS};
use crate::settings::ArenaSettings;

/// Most actors an arena accepts
pub const MAX_ACTORS: usize = 2;

/// A placed bomb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bomb {
    pub id: EntityId,
    pub owner: EntityId,
    /// Cell center the bomb was snapped to
    pub pos: Vec2,
    /// Blast range in cells
    pub range: u32,
    pub fuse: Fuse,
    /// Actors standing on the bomb when it was placed; they may walk off it
    #[serde(default)]
    pub pass_through: Vec<EntityId>,
}

impl Bomb {
    /// Has the explosion been triggered (by timer or chain)?
    pub fn exploded(&self) -> bool {
        self.fuse.exploded()
    }

    pub fn shape(&self, grid_size: f32) -> Shape {
        Shape::Circle {
            radius: BOMB_RADIUS * grid_size,
        }
    }
}

/// A power-up waiting to be collected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub kind: PowerUpKind,
    pub pos: Vec2,
}

impl Pickup {
    pub fn shape(&self, grid_size: f32) -> Shape {
        Shape::Circle {
            radius: PICKUP_RADIUS * grid_size,
        }
    }
}

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    Playing,
    /// At most one actor left standing
    Over { winner: Option<EntityId> },
}

/// Complete simulation state for one match
#[derive(Debug, Clone)]
pub struct Arena {
    pub settings: ArenaSettings,
    pub world: World,
    pub push: PushTracker,
    pub slides: SlideMotion,
    pub phase: MatchPhase,
    /// Physics steps taken
    pub time_ticks: u64,
    events: Vec<SimEvent>,
}

impl Arena {
    /// Empty arena (no blocks, no actors)
    pub fn new(settings: ArenaSettings) -> Self {
        let grid = Grid::new(settings.grid_size);
        Self {
            settings,
            world: World::new(grid),
            push: PushTracker::default(),
            slides: SlideMotion::default(),
            phase: MatchPhase::Playing,
            time_ticks: 0,
            events: Vec::new(),
        }
    }

    /// Arena with actors at `spawns` and a generated maze around them.
    ///
    /// Spawn cells and their orthogonal neighbours are kept clear so nobody
    /// starts boxed in.
    pub fn with_maze(settings: ArenaSettings, spawns: &[Cell]) -> Self {
        let mut arena = Self::new(settings);
        let mut reserved = Vec::new();
        for &spawn in spawns {
            reserved.push(spawn);
            for dir in super::grid::Direction::ALL {
                reserved.push(spawn + dir.offset());
            }
        }
        let layout = generate_maze(&arena.settings.maze, arena.settings.seed, &reserved);
        for (cell, kind) in layout {
            arena.world.spawn_block(kind, cell);
        }
        for &spawn in spawns {
            arena.spawn_actor(spawn);
        }
        log::info!(
            "Arena ready: {} blocks, {} actors",
            arena.world.blocks.len(),
            arena.world.actors.len()
        );
        arena
    }

    /// Place a block on a cell (used by layouts and tests)
    pub fn spawn_block(&mut self, kind: BlockKind, cell: Cell) -> EntityId {
        self.world.spawn_block(kind, cell)
    }

    /// Add an actor at `cell`; refused once both slots are taken
    pub fn spawn_actor(&mut self, cell: Cell) -> Option<EntityId> {
        let slot = match self.world.actors.len() {
            0 => PlayerSlot::One,
            1 => PlayerSlot::Two,
            _ => {
                log::warn!("Arena already has {MAX_ACTORS} actors; ignoring spawn at {cell}");
                return None;
            }
        };
        let grid = self.world.grid;
        let id = self.world.allocate_id();
        let actor = Actor::new(id, slot, grid.center_of(cell), &self.settings.actor, grid.size);
        self.world.insert_actor(actor);
        Some(id)
    }

    /// Remove a block and everything that refers to it
    pub fn remove_block(&mut self, id: EntityId) -> bool {
        self.push.forget(id);
        self.slides.cancel(&mut self.world, id);
        self.world.remove_block(id).is_some()
    }

    /// Record an event for the caller
    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Events since the last drain
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// End the match once at most one actor is still standing
    pub fn update_phase(&mut self) {
        if matches!(self.phase, MatchPhase::Over { .. }) || self.world.actors.len() < MAX_ACTORS {
            return;
        }
        let alive: Vec<EntityId> = self
            .world
            .actors
            .iter()
            .filter(|a| !a.eliminated)
            .map(|a| a.id)
            .collect();
        if alive.len() <= 1 {
            let winner = alive.first().copied();
            match winner {
                Some(id) => log::info!("Match over: {id} wins"),
                None => log::info!("Match over: draw"),
            }
            self.phase = MatchPhase::Over { winner };
            self.emit(SimEvent::MatchOver { winner });
        }
    }
}
