//! NES games exposed as episodic, step-driven reinforcement learning environments.
//!
//! [`NesEnv`] drives a [`Console`] one frame per step and asks a
//! [`RewardPolicy`] to score the change between consecutive RAM snapshots.
//! Game-specific policies live in [`games`]; [`LexicographicReward`] scores
//! any ROM from an objective file.

pub mod console;
#[cfg(feature = "window")]
pub mod display;
pub mod emulator;
pub mod env;
pub mod error;
pub mod games;
pub mod input;
pub mod objectives;
pub mod policy;
pub mod snapshot;

pub use console::{Console, DEFAULT_SKIP_FRAME_LIMIT, SkipOutcome};
pub use emulator::{Emulator, SaveState, TetanesEmulator};
pub use env::{EnvConfig, EpisodeState, Frame, Info, NesEnv, RenderMode, StepResult};
pub use error::{EnvError, Result};
pub use input::{ActionTable, Buttons};
pub use objectives::{LexicographicReward, Objective, ObjectiveSet};
pub use policy::RewardPolicy;
pub use snapshot::{Endian, MemoryView, RAM_SIZE, Ram, Which};
