pub mod dsp; // Oscillators, envelopes and wave shapers
pub mod engine; // Render entry point and transport control
pub mod error;
pub mod sequencing; // Commands, streams, time managers, sequencers
pub mod synth; // Voices, instruments and the device graph

pub use engine::{config::EngineConfig, Engine, Transport};
pub use error::{EngineError, Result};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 192_000.0;
