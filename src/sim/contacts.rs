//! Contact event sources
//!
//! Push pressure is driven by sustained-contact events between actors and
//! movable blocks. The physics layer that produces them is pluggable; this
//! module ships a geometric one for headless runs and a queue for tests.

use std::collections::BTreeSet;

use glam::Vec2;

use super::block::BlockKind;
use super::query::EntityId;
use super::world::World;
use crate::consts::CONTACT_SKIN;

/// One contact report for a (block, interactor) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEvent {
    /// Still touching this step
    Sustained {
        block: EntityId,
        interactor: EntityId,
        /// The interactor's own velocity, when it has one
        interactor_velocity: Option<Vec2>,
        relative_velocity: Vec2,
    },
    /// No longer touching
    Ended { block: EntityId, interactor: EntityId },
}

/// Produces the contacts for one physics step
pub trait ContactEventSource {
    fn poll(&mut self, world: &World) -> Vec<ContactEvent>;
}

/// Never reports anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContacts;

impl ContactEventSource for NoContacts {
    fn poll(&mut self, _world: &World) -> Vec<ContactEvent> {
        Vec::new()
    }
}

/// Derives contacts from geometry: a live actor within `CONTACT_SKIN` of a
/// movable block is touching it.
#[derive(Debug, Clone, Default)]
pub struct ProximityContacts {
    touching: BTreeSet<(EntityId, EntityId)>,
}

impl ContactEventSource for ProximityContacts {
    fn poll(&mut self, world: &World) -> Vec<ContactEvent> {
        let grid_size = world.grid.size;
        let skin = CONTACT_SKIN * grid_size;
        let mut events = Vec::new();
        let mut now = BTreeSet::new();

        for block in world
            .blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Movable && !b.is_destroyed())
        {
            let shape = block.shape(grid_size);
            for actor in world.actors.iter().filter(|a| !a.eliminated) {
                if shape.gap_to_circle(block.pos, actor.pos, actor.radius) > skin {
                    continue;
                }
                now.insert((block.id, actor.id));
                events.push(ContactEvent::Sustained {
                    block: block.id,
                    interactor: actor.id,
                    interactor_velocity: Some(actor.vel),
                    relative_velocity: actor.vel,
                });
            }
        }

        for &(block, interactor) in self.touching.difference(&now) {
            events.push(ContactEvent::Ended { block, interactor });
        }
        self.touching = now;
        events
    }
}
