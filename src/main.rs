//! Headless match runner
//!
//! Plays a scripted match on a generated maze and prints the final state as
//! JSON. Pass a settings file path as the first argument to override the
//! defaults; `RUST_LOG` controls log verbosity.

use bomb_arena::ArenaSettings;
use bomb_arena::sim::{
    ActorInput, Arena, Cell, Direction, EntityId, FrameClock, MatchPhase, NullPresentation,
    ProximityContacts, QuotaAllocator, Services, SimEvent, TickInput, World,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

/// Rendered frames per second of the scripted run
const FRAME_DT: f32 = 1.0 / 60.0;
/// Longest match the runner plays (frames)
const MAX_FRAMES: u32 = 60 * 90;
/// Frames between scripted input changes
const DECISION_FRAMES: u32 = 20;

#[derive(Serialize)]
struct Snapshot<'a> {
    phase: MatchPhase,
    time_ticks: u64,
    frames: u32,
    world: &'a World,
}

fn main() {
    env_logger::init();
    log::info!("Bomb Arena (headless) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => ArenaSettings::load_or_default(path),
        None => ArenaSettings::default(),
    };

    let (w, h) = (settings.maze.width, settings.maze.height);
    let (x0, y0) = (-(w / 2), -(h / 2));
    let spawns = [Cell::new(x0, y0), Cell::new(x0 + w - 1, y0 + h - 1)];

    let mut arena = Arena::with_maze(settings.clone(), &spawns);
    let mut allocator = QuotaAllocator::new(&settings.powerups, settings.seed);
    let mut contacts = ProximityContacts::default();
    let mut presentation = NullPresentation;
    let mut hits: Vec<EntityId> = Vec::new();
    let mut script = Pcg32::seed_from_u64(settings.seed ^ 0xA5A5);

    let mut clock = FrameClock::new();
    let mut input = TickInput::default();
    let actors = arena.world.actor_ids();
    let mut frames = 0;

    while frames < MAX_FRAMES && arena.phase == MatchPhase::Playing {
        if frames % DECISION_FRAMES == 0 {
            for &id in &actors {
                let dir = Direction::ALL[script.random_range(0..Direction::ALL.len())];
                input.set(
                    id,
                    ActorInput {
                        movement: dir.vector(),
                        place_bomb: script.random_bool(0.25),
                    },
                );
            }
        }

        let mut services = Services {
            allocator: &mut allocator,
            contacts: &mut contacts,
            presentation: &mut presentation,
            hits: &mut hits,
        };
        clock.advance(&mut arena, &mut input, FRAME_DT, &mut services);
        frames += 1;

        for event in arena.drain_events() {
            match event {
                SimEvent::SlideRejected { .. } => log::trace!("{event:?}"),
                _ => log::debug!("frame {frames}: {event:?}"),
            }
        }
    }

    match arena.phase {
        MatchPhase::Over { winner: Some(id) } => log::info!("Winner: {id} after {frames} frames"),
        MatchPhase::Over { winner: None } => log::info!("Draw after {frames} frames"),
        MatchPhase::Playing => log::info!("No result after {frames} frames"),
    }

    let snapshot = Snapshot {
        phase: arena.phase,
        time_ticks: arena.time_ticks,
        frames,
        world: &arena.world,
    };
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to serialize final state: {e}"),
    }
}
