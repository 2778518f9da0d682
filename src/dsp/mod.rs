//! Low-level DSP primitives used by voices.
//!
//! These components are allocation-free on the sample path and cheap to
//! clone, making them safe to embed directly inside voice structs. They stay
//! focused on the signal math; the synth layer owns phase, frequency and
//! note state.

/// Attack/decay/sustain/release and gate envelopes.
pub mod envelope;
/// Phase-to-sample waveform generators.
pub mod oscillator;
/// Phase transfer functions for phase distortion.
pub mod shaper;

pub use envelope::{Adsr, AdsrParam, Envelope, EnvelopeStage};
pub use oscillator::{Oscillator, OscillatorSwitch, Waveform, Wavetable};
pub use shaper::WaveShaper;
