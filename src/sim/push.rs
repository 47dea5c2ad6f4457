//! Push pressure on movable blocks
//!
//! Each (block, interactor) pair in sustained contact accumulates time while
//! the interactor keeps moving into the block along the dominant axis. Any
//! pause or change of direction starts the count over. A full count asks
//! `SlideMotion` for a one-cell move and resets.

use std::collections::BTreeMap;

use glam::Vec2;

use super::block::BlockKind;
use super::contacts::ContactEvent;
use super::grid::Direction;
use super::query::EntityId;
use super::slide::SlideOutcome;
use super::state::Arena;
use crate::settings::PushSettings;

/// Pressure accumulated by one interactor on one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PushState {
    pub direction: Direction,
    /// Seconds of uninterrupted pushing
    pub accumulated: f32,
}

/// One sustained-contact sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PushSample {
    pub block_pos: Vec2,
    pub interactor_pos: Vec2,
    /// Interactor velocity, or the relative contact velocity when it has none
    pub velocity: Vec2,
}

/// Push states keyed by (block, interactor)
#[derive(Debug, Clone, Default)]
pub struct PushTracker {
    states: BTreeMap<(EntityId, EntityId), PushState>,
}

impl PushTracker {
    /// Feed one sustained-contact tick. Returns the direction to slide the
    /// block in once the pressure threshold is reached.
    pub fn sustain(
        &mut self,
        block: EntityId,
        interactor: EntityId,
        sample: PushSample,
        dt: f32,
        settings: &PushSettings,
    ) -> Option<Direction> {
        let direction = Direction::dominant(sample.block_pos - sample.interactor_pos);
        let state = self.states.entry((block, interactor)).or_insert(PushState {
            direction,
            accumulated: 0.0,
        });
        if state.direction != direction {
            state.direction = direction;
            state.accumulated = 0.0;
        }

        if sample.velocity.dot(direction.vector()) <= settings.velocity_threshold {
            state.accumulated = 0.0;
            return None;
        }

        state.accumulated += dt;
        if state.accumulated >= settings.required_seconds {
            state.accumulated = 0.0;
            return Some(direction);
        }
        None
    }

    /// Contact ended; drop the pair
    pub fn end_contact(&mut self, block: EntityId, interactor: EntityId) -> bool {
        self.states.remove(&(block, interactor)).is_some()
    }

    /// Drop every pair involving `entity` (as block or interactor)
    pub fn forget(&mut self, entity: EntityId) {
        self.states
            .retain(|(block, interactor), _| *block != entity && *interactor != entity);
    }

    pub fn state(&self, block: EntityId, interactor: EntityId) -> Option<&PushState> {
        self.states.get(&(block, interactor))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl Arena {
    /// Apply one contact event. Returns the slide outcome when pressure
    /// triggered a slide request.
    pub fn handle_contact(&mut self, event: ContactEvent, dt: f32) -> Option<SlideOutcome> {
        match event {
            ContactEvent::Ended { block, interactor } => {
                self.push.end_contact(block, interactor);
                None
            }
            ContactEvent::Sustained {
                block,
                interactor,
                interactor_velocity,
                relative_velocity,
            } => {
                let block_pos = match self.world.block(block) {
                    Some(b) if b.kind == BlockKind::Movable => b.pos,
                    _ => return None,
                };
                let interactor_pos = match self.world.actor(interactor) {
                    Some(a) if !a.eliminated => a.pos,
                    _ => return None,
                };
                let sample = PushSample {
                    block_pos,
                    interactor_pos,
                    velocity: interactor_velocity.unwrap_or(relative_velocity),
                };
                let direction =
                    self.push
                        .sustain(block, interactor, sample, dt, &self.settings.push)?;
                log::debug!("Actor {interactor} pushed block {block} {direction:?}");
                Some(self.request_slide(block, direction))
            }
        }
    }
}
