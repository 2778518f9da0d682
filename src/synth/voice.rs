use crate::{
    dsp::{Envelope, Oscillator, WaveShaper},
    error::{EngineError, Result},
};

/*
Voice
=====

One monophonic synthesis unit: a phase accumulator driving an oscillator,
multiplied by an envelope.

  phase ──→ [signal path] ──→ oscillator.value() ──→ × envelope ──→ × volume

Per sample:
  1. read the oscillator at the current phase (through the signal path)
  2. advance the envelope one sample and multiply
  3. advance phase by sample_duration * frequency, wrapping once into [0, 1)

The signal path is what distinguishes the voice kinds:

  Osc               phase read directly
  Fm                phase offset by a modulator oscillator's output
  PhaseDistortion   phase bent by a WaveShaper before the read
  Unison            several detuned copies of the oscillator, averaged

Click avoidance: note_on only resets the phase when the envelope was silent.
Re-striking a sounding note keeps the waveform continuous.
*/

/// One detuned copy in a unison stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnisonPart {
    ratio: f32,
    phase: f32,
}

impl UnisonPart {
    fn from_cents(cents: f32) -> Self {
        Self {
            ratio: 2.0_f32.powf(cents / 1200.0),
            phase: 0.0,
        }
    }
}

/// The signal path between the phase accumulator and the envelope.
#[derive(Debug, Clone)]
pub enum VoiceKind {
    Osc {
        osc: Oscillator,
    },
    Fm {
        carrier: Oscillator,
        modulator: Oscillator,
        /// Modulator frequency as a multiple of the carrier frequency.
        ratio: f32,
        /// Modulation depth in cycles of carrier phase.
        index: f32,
        mod_phase: f32,
    },
    PhaseDistortion {
        osc: Oscillator,
        shaper: WaveShaper,
    },
    Unison {
        osc: Oscillator,
        parts: Vec<UnisonPart>,
    },
}

#[derive(Debug, Clone)]
pub struct Voice {
    kind: VoiceKind,
    envelope: Envelope,
    frequency: f32,
    phase: f32,
    volume: f32,
}

impl Voice {
    fn with_kind(kind: VoiceKind, envelope: Envelope) -> Self {
        Self {
            kind,
            envelope,
            frequency: 440.0,
            phase: 0.0,
            volume: 1.0,
        }
    }

    /// A plain oscillator voice.
    pub fn new(osc: Oscillator, envelope: Envelope) -> Self {
        Self::with_kind(VoiceKind::Osc { osc }, envelope)
    }

    /// Two-operator FM: `modulator` runs at `ratio` times the note frequency
    /// and shifts the carrier's phase by up to `index` cycles.
    pub fn fm(
        carrier: Oscillator,
        modulator: Oscillator,
        envelope: Envelope,
        ratio: f32,
        index: f32,
    ) -> Self {
        Self::with_kind(
            VoiceKind::Fm {
                carrier,
                modulator,
                ratio,
                index,
                mod_phase: 0.0,
            },
            envelope,
        )
    }

    pub fn phase_distortion(osc: Oscillator, shaper: WaveShaper, envelope: Envelope) -> Self {
        Self::with_kind(VoiceKind::PhaseDistortion { osc, shaper }, envelope)
    }

    /// A stack of copies of `osc`, one per entry in `detune_cents`.
    ///
    /// Allocates once here; the stack size is fixed afterwards.
    pub fn unison(osc: Oscillator, envelope: Envelope, detune_cents: &[f32]) -> Self {
        let parts = if detune_cents.is_empty() {
            vec![UnisonPart::from_cents(0.0)]
        } else {
            detune_cents.iter().copied().map(UnisonPart::from_cents).collect()
        };
        Self::with_kind(VoiceKind::Unison { osc, parts }, envelope)
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn note_on(&mut self, frequency: f32) {
        if !self.envelope.is_on() {
            self.reset_phase();
        }
        self.frequency = frequency;
        self.envelope.trig(true);
    }

    /// Release the envelope; frequency and phase carry on through the tail.
    pub fn note_off(&mut self) {
        self.envelope.trig(false);
    }

    pub fn is_on(&self) -> bool {
        self.envelope.is_on()
    }

    /// Render one sample.
    #[inline]
    pub fn process(&mut self, sample_duration: f32) -> f32 {
        let step = sample_duration * self.frequency;

        let raw = match &mut self.kind {
            VoiceKind::Osc { osc } => osc.value(self.phase),
            VoiceKind::Fm {
                carrier,
                modulator,
                ratio,
                index,
                mod_phase,
            } => {
                let offset = *index * modulator.value(*mod_phase);
                let value = carrier.value(wrap(self.phase + offset));
                *mod_phase = wrap(*mod_phase + step * *ratio);
                value
            }
            VoiceKind::PhaseDistortion { osc, shaper } => osc.value(shaper.value(self.phase)),
            VoiceKind::Unison { osc, parts } => {
                let mut sum = 0.0;
                for part in parts.iter_mut() {
                    sum += osc.value(part.phase);
                    part.phase = wrap(part.phase + step * part.ratio);
                }
                sum / parts.len() as f32
            }
        };

        let output = self.volume * raw * self.envelope.process(sample_duration);

        self.phase += step;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        output
    }

    fn reset_phase(&mut self) {
        self.phase = 0.0;
        match &mut self.kind {
            VoiceKind::Fm { mod_phase, .. } => *mod_phase = 0.0,
            VoiceKind::Unison { parts, .. } => {
                for part in parts.iter_mut() {
                    part.phase = 0.0;
                }
            }
            VoiceKind::Osc { .. } | VoiceKind::PhaseDistortion { .. } => {}
        }
    }

    /// The oscillator that sets the voice's timbre (the carrier for FM).
    pub fn oscillator(&self) -> &Oscillator {
        match &self.kind {
            VoiceKind::Osc { osc }
            | VoiceKind::PhaseDistortion { osc, .. }
            | VoiceKind::Unison { osc, .. } => osc,
            VoiceKind::Fm { carrier, .. } => carrier,
        }
    }

    pub fn oscillator_mut(&mut self) -> &mut Oscillator {
        match &mut self.kind {
            VoiceKind::Osc { osc }
            | VoiceKind::PhaseDistortion { osc, .. }
            | VoiceKind::Unison { osc, .. } => osc,
            VoiceKind::Fm { carrier, .. } => carrier,
        }
    }

    pub fn set_oscillator(&mut self, oscillator: Oscillator) {
        *self.oscillator_mut() = oscillator;
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }

    pub fn set_envelope(&mut self, envelope: Envelope) {
        self.envelope = envelope;
    }

    pub fn set_retrigger(&mut self, retrigger: bool) {
        self.envelope.set_retrigger(retrigger);
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn kind(&self) -> &VoiceKind {
        &self.kind
    }

    pub fn set_fm_index(&mut self, new_index: f32) -> Result<()> {
        match &mut self.kind {
            VoiceKind::Fm { index, .. } => {
                *index = new_index;
                Ok(())
            }
            _ => Err(EngineError::NoSuchVoiceParameter("fm index")),
        }
    }

    pub fn set_fm_ratio(&mut self, new_ratio: f32) -> Result<()> {
        match &mut self.kind {
            VoiceKind::Fm { ratio, .. } => {
                *ratio = new_ratio;
                Ok(())
            }
            _ => Err(EngineError::NoSuchVoiceParameter("fm ratio")),
        }
    }

    pub fn set_shaper(&mut self, new_shaper: WaveShaper) -> Result<()> {
        match &mut self.kind {
            VoiceKind::PhaseDistortion { shaper, .. } => {
                *shaper = new_shaper;
                Ok(())
            }
            _ => Err(EngineError::NoSuchVoiceParameter("wave shaper")),
        }
    }
}

#[inline]
fn wrap(phase: f32) -> f32 {
    phase - phase.floor()
}
