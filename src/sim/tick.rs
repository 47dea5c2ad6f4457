//! Step drivers
//!
//! `physics_step` runs at the fixed rate (movement, bomb placement, pickups,
//! contacts and push pressure). `frame_step` runs once per rendered frame
//! (fuse countdown, slide animation, match outcome). `FrameClock` feeds real
//! frame time into both.

use std::collections::BTreeMap;

use super::actor::ActorInput;
use super::events::Services;
use super::query::EntityId;
use super::state::{Arena, MatchPhase};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

/// Input commands for a single step, per actor
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub actors: BTreeMap<EntityId, ActorInput>,
}

impl TickInput {
    pub fn set(&mut self, actor: EntityId, input: ActorInput) {
        self.actors.insert(actor, input);
    }

    /// Forget one-shot commands once a step has consumed them
    pub fn clear_one_shots(&mut self) {
        for input in self.actors.values_mut() {
            input.place_bomb = false;
        }
    }
}

/// Advance the fixed-rate part of the simulation by `dt`
pub fn physics_step(arena: &mut Arena, input: &TickInput, dt: f32, services: &mut Services<'_>) {
    if matches!(arena.phase, MatchPhase::Over { .. }) {
        return;
    }
    arena.time_ticks += 1;

    for id in arena.world.actor_ids() {
        let actor_input = input.actors.get(&id).copied().unwrap_or_default();
        if actor_input.place_bomb {
            arena.place_bomb(id);
        }
        arena.drive_actor(id, actor_input, dt);
    }
    arena.world.refresh_pass_through();
    arena.collect_pickups();

    for event in services.contacts.poll(&arena.world) {
        arena.handle_contact(event, dt);
    }
}

/// Advance the per-frame part of the simulation by the frame delta
pub fn frame_step(arena: &mut Arena, dt: f32, services: &mut Services<'_>) {
    if matches!(arena.phase, MatchPhase::Over { .. }) {
        return;
    }
    arena.advance_fuses(dt, services);
    arena.advance_slides(dt, services);
    arena.update_phase();
}

/// Fixed-timestep accumulator
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    accumulator: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one rendered frame: as many physics steps as the elapsed time
    /// allows (capped), then the frame step. Returns the physics steps run.
    pub fn advance(
        &mut self,
        arena: &mut Arena,
        input: &mut TickInput,
        frame_dt: f32,
        services: &mut Services<'_>,
    ) -> u32 {
        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            physics_step(arena, input, SIM_DT, services);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            input.clear_one_shots();
        }

        frame_step(arena, dt, services);
        substeps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ArenaSettings;
    use crate::sim::block::BlockKind;
    use crate::sim::contacts::ProximityContacts;
    use crate::sim::events::SimEvent;
    use crate::sim::powerup::QuotaAllocator;
    use crate::sim::testing::Harness;
    use glam::{IVec2, Vec2};

    fn mover(x: f32, y: f32) -> ActorInput {
        ActorInput {
            movement: Vec2::new(x, y),
            place_bomb: false,
        }
    }

    #[test]
    fn test_clock_substeps_and_clamp() {
        let mut arena = Arena::new(ArenaSettings::default());
        let mut harness = Harness::default();
        let mut input = TickInput::default();
        let mut clock = FrameClock::new();

        assert_eq!(clock.advance(&mut arena, &mut input, 0.01, &mut harness.services()), 0);
        assert_eq!(clock.advance(&mut arena, &mut input, 0.035, &mut harness.services()), 2);
        // A long stall only counts for MAX_FRAME_DT
        assert_eq!(clock.advance(&mut arena, &mut input, 5.0, &mut harness.services()), 5);
        assert_eq!(arena.time_ticks, 7);
    }

    #[test]
    fn test_bomb_request_is_one_shot() {
        let mut arena = Arena::new(ArenaSettings::default());
        let actor = arena.spawn_actor(IVec2::ZERO).unwrap();
        let mut harness = Harness::default();
        let mut input = TickInput::default();
        input.set(
            actor,
            ActorInput {
                movement: Vec2::X,
                place_bomb: true,
            },
        );

        let mut clock = FrameClock::new();
        clock.advance(&mut arena, &mut input, 0.1, &mut harness.services());
        assert_eq!(arena.world.bombs.len(), 1);
        assert!(!input.actors[&actor].place_bomb);
    }

    #[test]
    fn test_sustained_walk_pushes_block() {
        let mut arena = Arena::new(ArenaSettings::default());
        let actor = arena.spawn_actor(IVec2::ZERO).unwrap();
        let block = arena.spawn_block(BlockKind::Movable, IVec2::new(1, 0));
        let mut harness = Harness::default().with_contacts(ProximityContacts::default());
        let mut input = TickInput::default();
        input.set(actor, mover(1.0, 0.0));

        let mut clock = FrameClock::new();
        for _ in 0..50 {
            clock.advance(&mut arena, &mut input, SIM_DT, &mut harness.services());
        }
        assert_eq!(arena.world.block(block).unwrap().pos, Vec2::new(2.0, 0.0));
        assert!(
            arena
                .events()
                .contains(&SimEvent::SlideCompleted {
                    block,
                    cell: IVec2::new(2, 0)
                })
        );
    }

    #[test]
    fn test_match_ends_when_actor_caught() {
        let mut arena = Arena::new(ArenaSettings::default());
        let runner = arena.spawn_actor(IVec2::ZERO).unwrap();
        let sitter = arena.spawn_actor(IVec2::new(2, 0)).unwrap();
        let mut harness = Harness::default();
        let mut input = TickInput::default();
        input.set(
            runner,
            ActorInput {
                movement: -Vec2::X,
                place_bomb: true,
            },
        );

        let mut clock = FrameClock::new();
        for _ in 0..110 {
            clock.advance(&mut arena, &mut input, SIM_DT, &mut harness.services());
        }
        assert!(arena.world.actor(sitter).unwrap().eliminated);
        assert!(!arena.world.actor(runner).unwrap().eliminated);
        assert_eq!(
            arena.phase,
            MatchPhase::Over {
                winner: Some(runner)
            }
        );
        assert_eq!(harness.hits, vec![sitter]);
    }

    #[test]
    fn test_determinism() {
        fn run() -> (String, Vec<SimEvent>) {
            let settings = ArenaSettings::default();
            let spawns = [IVec2::new(-5, -4), IVec2::new(5, 4)];
            let mut arena = Arena::with_maze(settings.clone(), &spawns);
            let ids = arena.world.actor_ids();
            let mut harness = Harness::with_allocator(QuotaAllocator::new(&settings.powerups, 7))
                .with_contacts(ProximityContacts::default());
            let mut clock = FrameClock::new();
            let mut input = TickInput::default();

            for frame in 0..300 {
                let t = frame as f32 * 0.05;
                input.set(
                    ids[0],
                    ActorInput {
                        movement: Vec2::new(t.cos(), t.sin()),
                        place_bomb: frame % 60 == 0,
                    },
                );
                input.set(ids[1], mover(-1.0, (t * 0.5).sin()));
                clock.advance(&mut arena, &mut input, 1.0 / 60.0, &mut harness.services());
            }
            let snapshot = serde_json::to_string(&arena.world).unwrap();
            (snapshot, arena.drain_events())
        }

        assert_eq!(run(), run());
    }
}
