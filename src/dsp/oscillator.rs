use std::f32::consts::TAU;

use crate::error::{EngineError, Result};

/*
Oscillators
===========

An oscillator here is only a wave SHAPE: a pure function from phase to
sample. It does not know about time or frequency. The voice owns the
phase accumulator and decides how fast the phase moves; the oscillator
answers "what is the waveform's value at this point of the cycle?".

  phase   0.0 ──────────────── 0.5 ──────────────── 1.0 (wraps to 0.0)

  saw        -1 ╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱ +1
  square     -1 ▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁ +1 ▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔
  triangle   -1 ╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱╱ +1 ╲╲╲╲╲╲╲╲╲╲╲╲╲╲╲╲╲╲ -1
  pulse      +1 while phase < width, -1 after

Because every variant is a function of phase plus static configuration,
two voices cloned from the same prototype can never disturb each other.
*/

/// The pure-function waveforms.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Saw,
    Square,
    Triangle,
}

impl Waveform {
    #[inline]
    pub fn value(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Saw => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    -1.0
                } else {
                    1.0
                }
            }
            Waveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
        }
    }
}

/// A single-cycle lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct Wavetable {
    table: Vec<f32>,
    interpolate: bool,
}

impl Wavetable {
    /// With `interpolate`, reads blend linearly between neighbouring entries
    /// (wrapping at the end of the cycle) instead of stepping.
    pub fn new(table: Vec<f32>, interpolate: bool) -> Result<Self> {
        if table.is_empty() {
            return Err(EngineError::EmptyWavetable);
        }
        Ok(Self { table, interpolate })
    }

    /// Sample `samples` points of a waveform into a table.
    pub fn from_waveform(waveform: Waveform, samples: usize, interpolate: bool) -> Result<Self> {
        let table = (0..samples)
            .map(|i| waveform.value(i as f32 / samples as f32))
            .collect();
        Self::new(table, interpolate)
    }

    #[inline]
    pub fn value(&self, phase: f32) -> f32 {
        let len = self.table.len();
        let position = phase * len as f32;
        // phase just below 1.0 can round up to len in f32
        let index = (position as usize).min(len - 1);

        if !self.interpolate {
            return self.table[index];
        }

        let frac = position - index as f32;
        let a = self.table[index];
        let b = self.table[(index + 1) % len];
        a * (1.0 - frac) + b * frac
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// An ordered set of oscillators with one of them active.
#[derive(Debug, Clone, Default)]
pub struct OscillatorSwitch {
    oscillators: Vec<Oscillator>,
    selected: usize,
}

impl OscillatorSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, oscillator: Oscillator) -> Self {
        self.add(oscillator);
        self
    }

    pub fn add(&mut self, oscillator: Oscillator) {
        self.oscillators.push(oscillator);
    }

    /// Make `index` the active oscillator.
    ///
    /// An out-of-range index is rejected and the previous selection stays.
    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.oscillators.len() {
            return Err(EngineError::InvalidOscillatorIndex {
                index,
                len: self.oscillators.len(),
            });
        }
        self.selected = index;
        Ok(())
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn len(&self) -> usize {
        self.oscillators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oscillators.is_empty()
    }

    /// An empty switch is silent.
    #[inline]
    pub fn value(&self, phase: f32) -> f32 {
        self.oscillators
            .get(self.selected)
            .map_or(0.0, |osc| osc.value(phase))
    }
}

/// A waveform generator: `value(phase)` for phase in [0, 1).
#[derive(Debug, Clone)]
pub enum Oscillator {
    Basic(Waveform),
    Pulse { width: f32 },
    Wavetable(Wavetable),
    Switch(OscillatorSwitch),
}

impl Oscillator {
    pub fn sine() -> Self {
        Oscillator::Basic(Waveform::Sine)
    }

    pub fn saw() -> Self {
        Oscillator::Basic(Waveform::Saw)
    }

    pub fn square() -> Self {
        Oscillator::Basic(Waveform::Square)
    }

    pub fn triangle() -> Self {
        Oscillator::Basic(Waveform::Triangle)
    }

    pub fn pulse(width: f32) -> Self {
        Oscillator::Pulse {
            width: width.clamp(0.0, 1.0),
        }
    }

    #[inline]
    pub fn value(&self, phase: f32) -> f32 {
        match self {
            Oscillator::Basic(waveform) => waveform.value(phase),
            Oscillator::Pulse { width } => {
                if phase < *width {
                    1.0
                } else {
                    -1.0
                }
            }
            Oscillator::Wavetable(table) => table.value(phase),
            Oscillator::Switch(switch) => switch.value(phase),
        }
    }

    /// Change the pulse width; other variants report an error.
    pub fn set_pulse_width(&mut self, new_width: f32) -> Result<()> {
        match self {
            Oscillator::Pulse { width } => {
                *width = new_width.clamp(0.0, 1.0);
                Ok(())
            }
            _ => Err(EngineError::NoSuchVoiceParameter("pulse width")),
        }
    }

    /// Select a waveform on a switch oscillator.
    pub fn select(&mut self, index: usize) -> Result<()> {
        match self {
            Oscillator::Switch(switch) => switch.select(index),
            _ => Err(EngineError::InvalidOscillatorIndex { index, len: 0 }),
        }
    }
}

impl From<Waveform> for Oscillator {
    fn from(waveform: Waveform) -> Self {
        Oscillator::Basic(waveform)
    }
}

impl From<Wavetable> for Oscillator {
    fn from(table: Wavetable) -> Self {
        Oscillator::Wavetable(table)
    }
}

impl From<OscillatorSwitch> for Oscillator {
    fn from(switch: OscillatorSwitch) -> Self {
        Oscillator::Switch(switch)
    }
}
