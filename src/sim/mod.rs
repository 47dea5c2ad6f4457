//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timesteps only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod actor;
pub mod block;
pub mod collision;
pub mod contacts;
pub mod events;
pub mod explosion;
pub mod fuse;
pub mod grid;
pub mod maze;
pub mod powerup;
pub mod push;
pub mod query;
pub mod slide;
pub mod state;
pub mod tick;
pub mod world;

pub use actor::{Actor, ActorInput, PlaceBombOutcome, PlayerSlot};
pub use block::{Block, BlockKind, DestroyOutcome};
pub use contacts::{ContactEvent, ContactEventSource, NoContacts, ProximityContacts};
pub use events::{ActorHitSink, NullPresentation, PresentationSink, Recorder, Services, SimEvent};
pub use explosion::{BlastAction, BlastReport, plan_ray};
pub use fuse::{Fuse, FusePalette, FuseState};
pub use grid::{Cell, Direction, Grid};
pub use powerup::{ActorStats, NoDrops, PowerUpAllocator, PowerUpKind, QuotaAllocator};
pub use push::{PushSample, PushState, PushTracker};
pub use query::{EntityId, InteractionClass, RayHit, SpatialQuery};
pub use slide::{SlideJob, SlideMotion, SlideOutcome, SlideRejection};
pub use state::{Arena, Bomb, MAX_ACTORS, MatchPhase, Pickup};
pub use tick::{FrameClock, TickInput, frame_step, physics_step};
pub use world::World;
