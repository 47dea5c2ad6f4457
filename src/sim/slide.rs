//! One-cell block slides
//!
//! A slide request is checked against the target cell before anything moves.
//! Accepted slides claim the target cell, ease from start to target with
//! smoothstep while the block's collider follows along, then snap onto the
//! cell, release the claim and refresh the broad-phase.

use std::collections::BTreeMap;

use glam::Vec2;

use super::block::BlockKind;
use super::events::{PresentationSink, Services, SimEvent};
use super::grid::{Cell, Direction};
use super::query::{EntityId, InteractionClass, SpatialQuery};
use super::state::Arena;
use super::world::World;
use crate::settings::SlideSettings;
use crate::{lerp, smoothstep};

/// An in-flight slide
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideJob {
    pub block: EntityId,
    pub start: Vec2,
    pub target: Vec2,
    pub direction: Direction,
    /// Seconds since the slide started
    pub elapsed: f32,
}

/// Why a slide request was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideRejection {
    /// Already sliding that way
    AlreadySliding,
    /// Something sits on (or is heading into) the target cell
    Occupied(EntityId),
    NotMovable,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideOutcome {
    Started { target: Cell },
    /// Replaced a slide in another direction
    Superseded { target: Cell },
    Rejected(SlideRejection),
}

/// Active slides, at most one per block
#[derive(Debug, Clone, Default)]
pub struct SlideMotion {
    jobs: BTreeMap<EntityId, SlideJob>,
}

impl SlideMotion {
    pub fn is_sliding(&self, block: EntityId) -> bool {
        self.jobs.contains_key(&block)
    }

    pub fn job(&self, block: EntityId) -> Option<&SlideJob> {
        self.jobs.get(&block)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Drop a block's slide, leaving it wherever it is
    pub fn cancel(&mut self, world: &mut World, block: EntityId) -> bool {
        world.release_claim(block);
        self.jobs.remove(&block).is_some()
    }

    /// Try to start moving `block` one cell in `direction`
    pub fn request(
        &mut self,
        world: &mut World,
        block: EntityId,
        direction: Direction,
        settings: &SlideSettings,
    ) -> SlideOutcome {
        let Some(b) = world.block(block) else {
            return SlideOutcome::Rejected(SlideRejection::Missing);
        };
        if b.kind != BlockKind::Movable {
            return SlideOutcome::Rejected(SlideRejection::NotMovable);
        }
        if self.jobs.get(&block).is_some_and(|job| job.direction == direction) {
            return SlideOutcome::Rejected(SlideRejection::AlreadySliding);
        }

        let grid = world.grid;
        let target_cell = grid.cell_of(b.pos) + direction.offset();
        let target = grid.center_of(target_cell);
        let probe = settings.probe_radius * grid.size;
        if let Some(other) =
            world.overlap_circle(target, probe, InteractionClass::OCCUPANCY, Some(block))
        {
            return SlideOutcome::Rejected(SlideRejection::Occupied(other));
        }
        if let Some(other) = world.claimant(target, probe, Some(block)) {
            return SlideOutcome::Rejected(SlideRejection::Occupied(other));
        }

        let job = SlideJob {
            block,
            start: b.pos,
            target,
            direction,
            elapsed: 0.0,
        };
        world.claim_cell(block, target);
        match self.jobs.insert(block, job) {
            Some(_) => SlideOutcome::Superseded {
                target: target_cell,
            },
            None => SlideOutcome::Started {
                target: target_cell,
            },
        }
    }

    /// Move every slide forward by `dt`. Returns the blocks that arrived.
    pub fn advance(
        &mut self,
        world: &mut World,
        dt: f32,
        settings: &SlideSettings,
        presentation: &mut dyn PresentationSink,
    ) -> Vec<(EntityId, Cell)> {
        let mut arrived = Vec::new();
        let mut lost = Vec::new();
        for (id, job) in self.jobs.iter_mut() {
            job.elapsed += dt;
            let t = (job.elapsed / settings.duration_seconds).min(1.0);
            let pos = if t >= 1.0 {
                job.target
            } else {
                lerp(job.start, job.target, smoothstep(t))
            };
            if world.block(*id).is_none() {
                lost.push(*id);
                continue;
            }
            world.set_block_position(*id, pos);
            presentation.slide_position(*id, pos);
            if t >= 1.0 {
                arrived.push((*id, world.grid.cell_of(pos)));
            }
        }

        for id in lost.into_iter().chain(arrived.iter().map(|(id, _)| *id)) {
            self.jobs.remove(&id);
            world.release_claim(id);
        }
        if !arrived.is_empty() {
            world.resync_transforms();
        }
        arrived
    }
}

impl Arena {
    /// Ask for a one-cell slide and record the outcome
    pub fn request_slide(&mut self, block: EntityId, direction: Direction) -> SlideOutcome {
        let outcome = self
            .slides
            .request(&mut self.world, block, direction, &self.settings.slide);
        match outcome {
            SlideOutcome::Started { target } | SlideOutcome::Superseded { target } => {
                log::debug!("Block {block} sliding {direction:?} to {target}");
                self.emit(SimEvent::SlideStarted { block, to: target });
            }
            SlideOutcome::Rejected(reason) => {
                log::debug!("Block {block} slide {direction:?} rejected: {reason:?}");
                self.emit(SimEvent::SlideRejected { block, reason });
            }
        }
        outcome
    }

    /// Advance slide animations by a frame
    pub fn advance_slides(&mut self, dt: f32, services: &mut Services<'_>) {
        let arrived = self.slides.advance(
            &mut self.world,
            dt,
            &self.settings.slide,
            &mut *services.presentation,
        );
        for (block, cell) in arrived {
            log::debug!("Block {block} settled at {cell}");
            self.emit(SimEvent::SlideCompleted { block, cell });
        }
    }
}
