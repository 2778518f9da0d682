//! Real-world scenario benchmarks.
//!
//! These model how the player uses the engine: complete voices, poly
//! instruments, and a sequenced multi-instrument song.

mod engine;
mod voices;

pub use engine::bench_engine;
pub use voices::bench_voices;
