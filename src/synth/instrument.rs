use crate::{dsp::AdsrParam, error::Result, synth::voice::Voice};

/*
Instrument
==========

An instrument owns its voices outright and turns them into one stereo
signal:

  voice 0 ─┐
  voice 1 ─┼─→ Σ (sounding voices only) ─→ × volume ─→ pan ─→ (left, right)
  voice n ─┘

Panning is linear and applied once, after the voice sum:

  right = mix * pan
  left  = mix * (1 - pan)

pan = 0.0 is hard left, 0.5 is centre (each side at half level), 1.0 is
hard right.

Polyphony is explicit. The instrument never picks a voice on its own; the
command layer says which voice index a note goes to. A mono instrument
routes every index to its single voice, a poly instrument ignores indices
it does not have.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polyphony {
    Mono,
    Poly,
}

#[derive(Debug, Clone)]
pub struct Instrument {
    voices: Vec<Voice>,
    polyphony: Polyphony,
    volume: f32,
    pan: f32,
}

impl Instrument {
    /// A single-voice instrument.
    pub fn mono(voice: Voice) -> Self {
        Self {
            voices: vec![voice],
            polyphony: Polyphony::Mono,
            volume: 1.0,
            pan: 0.5,
        }
    }

    /// A fixed pool of `count` independent copies of `prototype`.
    pub fn poly(prototype: &Voice, count: usize) -> Self {
        Self {
            voices: vec![prototype.clone(); count],
            polyphony: Polyphony::Poly,
            volume: 1.0,
            pan: 0.5,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_pan(mut self, pan: f32) -> Self {
        self.set_pan(pan);
        self
    }

    /// Render one stereo sample.
    #[inline]
    pub fn process(&mut self, sample_duration: f32) -> (f32, f32) {
        let mut mix = 0.0;
        for voice in self.voices.iter_mut().filter(|v| v.is_on()) {
            mix += voice.process(sample_duration);
        }
        mix *= self.volume;

        (mix * (1.0 - self.pan), mix * self.pan)
    }

    /// Start a note on `voice`. A frequency of zero is a rest and releases
    /// the voice instead.
    pub fn note_on(&mut self, voice: usize, frequency: f32) {
        let Some(slot) = self.slot(voice) else {
            return;
        };
        if frequency == 0.0 {
            self.voices[slot].note_off();
        } else {
            self.voices[slot].note_on(frequency);
        }
    }

    pub fn note_off(&mut self, voice: usize) {
        if let Some(slot) = self.slot(voice) {
            self.voices[slot].note_off();
        }
    }

    /// Release every voice.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.note_off();
        }
    }

    fn slot(&self, voice: usize) -> Option<usize> {
        match self.polyphony {
            Polyphony::Mono => Some(0),
            Polyphony::Poly => (voice < self.voices.len()).then_some(voice),
        }
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.slot(index).map(|slot| &self.voices[slot])
    }

    pub fn voice_mut(&mut self, index: usize) -> Option<&mut Voice> {
        self.slot(index).map(|slot| &mut self.voices[slot])
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Apply a live change to every voice.
    pub fn for_each_voice(&mut self, mut f: impl FnMut(&mut Voice)) {
        for voice in &mut self.voices {
            f(voice);
        }
    }

    /// Change one envelope setting on every voice. Gate envelopes have no
    /// settings and are left alone.
    pub fn set_adsr(&mut self, param: AdsrParam, value: f32) {
        self.for_each_voice(|voice| {
            if let Some(adsr) = voice.envelope_mut().as_adsr_mut() {
                adsr.set(param, value);
            }
        });
    }

    /// Select a switch-oscillator child on every voice. Stops at the first
    /// voice that rejects the index.
    pub fn select_waveform(&mut self, index: usize) -> Result<()> {
        for voice in &mut self.voices {
            voice.oscillator_mut().select(index)?;
        }
        Ok(())
    }

    pub fn set_retrigger(&mut self, retrigger: bool) {
        self.for_each_voice(|voice| voice.set_retrigger(retrigger));
    }

    pub fn is_on(&self) -> bool {
        self.voices.iter().any(Voice::is_on)
    }

    pub fn polyphony(&self) -> Polyphony {
        self.polyphony
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(0.0, 1.0);
    }
}
