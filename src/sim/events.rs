//! Simulation events and output sinks
//!
//! The core never renders or plays audio. It reports what happened through
//! [`SimEvent`]s (drained by the caller) and pushes per-frame visual values to
//! a [`PresentationSink`]. Collaborators are handed in as [`Services`].

use glam::{Vec2, Vec4};

use super::block::BlockKind;
use super::contacts::ContactEventSource;
use super::grid::Cell;
use super::powerup::{PowerUpAllocator, PowerUpKind};
use super::query::EntityId;
use super::slide::SlideRejection;

/// Something gameplay-relevant that happened during a step
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    BombPlaced {
        bomb: EntityId,
        owner: EntityId,
        cell: Cell,
    },
    BombExploded {
        bomb: EntityId,
        cell: Cell,
        /// Bomb whose blast set this one off, if any
        chained_by: Option<EntityId>,
    },
    BlockDestroyed {
        block: EntityId,
        kind: BlockKind,
        cell: Cell,
    },
    PowerUpDropped {
        pickup: EntityId,
        kind: PowerUpKind,
        cell: Cell,
    },
    PowerUpCollected {
        pickup: EntityId,
        actor: EntityId,
        kind: PowerUpKind,
    },
    ActorEliminated {
        actor: EntityId,
        bomb: EntityId,
    },
    SlideStarted {
        block: EntityId,
        to: Cell,
    },
    SlideCompleted {
        block: EntityId,
        cell: Cell,
    },
    SlideRejected {
        block: EntityId,
        reason: SlideRejection,
    },
    MatchOver {
        winner: Option<EntityId>,
    },
}

/// Receives purely visual per-frame values. Never mutates the simulation.
pub trait PresentationSink {
    /// Current fuse tint of an armed bomb
    fn fuse_color(&mut self, _bomb: EntityId, _color: Vec4) {}

    /// Interpolated position of a sliding block
    fn slide_position(&mut self, _block: EntityId, _pos: Vec2) {}

    /// Blast effect covering `cells`, lingering for `lifetime` seconds
    fn blast(&mut self, _bomb: EntityId, _effect: &str, _cells: &[Cell], _lifetime: f32) {}
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresentation;

impl PresentationSink for NullPresentation {}

/// Told when an actor is knocked out (disable its input and physics)
pub trait ActorHitSink {
    fn actor_eliminated(&mut self, actor: EntityId);
}

impl ActorHitSink for Vec<EntityId> {
    fn actor_eliminated(&mut self, actor: EntityId) {
        self.push(actor);
    }
}

/// Keeps the latest presentation values for inspection
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub fuse_colors: Vec<(EntityId, Vec4)>,
    pub slide_positions: Vec<(EntityId, Vec2)>,
    pub blasts: Vec<(EntityId, String, Vec<Cell>)>,
}

impl Recorder {
    /// Most recent fuse color reported for `bomb`
    pub fn last_fuse_color(&self, bomb: EntityId) -> Option<Vec4> {
        self.fuse_colors
            .iter()
            .rev()
            .find(|(id, _)| *id == bomb)
            .map(|(_, c)| *c)
    }
}

impl PresentationSink for Recorder {
    fn fuse_color(&mut self, bomb: EntityId, color: Vec4) {
        self.fuse_colors.push((bomb, color));
    }

    fn slide_position(&mut self, block: EntityId, pos: Vec2) {
        self.slide_positions.push((block, pos));
    }

    fn blast(&mut self, bomb: EntityId, effect: &str, cells: &[Cell], _lifetime: f32) {
        self.blasts.push((bomb, effect.to_string(), cells.to_vec()));
    }
}

/// External collaborators injected into each step
pub struct Services<'a> {
    pub allocator: &'a mut dyn PowerUpAllocator,
    pub contacts: &'a mut dyn ContactEventSource,
    pub presentation: &'a mut dyn PresentationSink,
    pub hits: &'a mut dyn ActorHitSink,
}
