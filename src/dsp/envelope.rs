use crate::MIN_TIME;

/*
ADSR Envelope
=============

An envelope turns a note's on/off gate into an amplitude trajectory. The
voice multiplies every oscillator sample by the envelope level, so the
envelope decides when a note is audible and how it fades.

Vocabulary
----------

  level             Current output value (0.0 to 1.0).

  stage             Where the state machine is: Off, Attack, Decay,
                    Sustain or Release.

  sample_duration   Length of one sample in seconds (1 / sample_rate).
                    Every stage advances by `sample_duration / stage_time`
                    per call, so the envelope never needs to know the
                    sample rate itself.

  retrigger         Whether note-on restarts the attack from zero. With
                    retrigger off, a note-on during a sounding note
                    continues the attack from the current level (legato).


The State Machine
-----------------

                trig(true)
      ┌─────┐ ────────────→ ┌────────┐  level=1   ┌───────┐
      │ Off │               │ Attack │ ─────────→ │ Decay │
      └─────┘               └────────┘            └───────┘
         ↑                       │                    │ level=S
         │ level=0               │ trig(false)        ↓
      ┌─────────┐ ←──────────────┘               ┌─────────┐
      │ Release │ ←───────────────────────────── │ Sustain │
      └─────────┘           trig(false)          └─────────┘

trig(false) moves any sounding stage to Release and starts the ramp from
the current level. trig(false) while Off does nothing.

A stage time at or below MIN_TIME is treated as instantaneous: the stage
completes on the next `process` call instead of dividing by zero.


Zero Envelope
-------------

Percussive and gate-style instruments do not need a shape at all. The
`Zero` envelope is 1.0 while the gate is high and 0.0 otherwise.
*/

/// Levels within this distance of a stage target snap onto it. Keeps f32
/// accumulation error from delaying a transition by a whole sample.
const SNAP: f32 = 1e-4;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Off,     // Gate low, level forced to 0
    Attack,  // Ramping up to 1.0
    Decay,   // Ramping down to the sustain level
    Sustain, // Holding while the gate is high
    Release, // Ramping down to 0
}

/// One of the four ADSR settings, for live changes addressed by name.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdsrParam {
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Linear attack/decay/sustain/release generator.
#[derive(Debug, Clone)]
pub struct Adsr {
    attack: f32,  // seconds 0 → 1
    decay: f32,   // seconds 1 → sustain
    sustain: f32, // level held while the gate is high
    release: f32, // seconds level → 0

    stage: EnvelopeStage,
    level: f32,
    retrigger: bool,
}

impl Adsr {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.max(0.0),
            decay: decay.max(0.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(0.0),
            stage: EnvelopeStage::Off,
            level: 0.0,
            retrigger: true,
        }
    }

    pub fn with_retrigger(mut self, retrigger: bool) -> Self {
        self.retrigger = retrigger;
        self
    }

    pub fn trig(&mut self, on: bool) {
        if on {
            if self.retrigger {
                self.level = 0.0;
            }
            self.stage = EnvelopeStage::Attack;
        } else if self.stage != EnvelopeStage::Off {
            self.stage = EnvelopeStage::Release;
        }
    }

    /// Advance by one sample and return the new level.
    pub fn process(&mut self, sample_duration: f32) -> f32 {
        match self.stage {
            EnvelopeStage::Off => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                self.level += increment(sample_duration, self.attack);

                if self.level >= 1.0 - SNAP {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                self.level -= increment(sample_duration, self.decay);

                if self.level <= self.sustain + SNAP {
                    self.level = self.sustain;
                    self.stage = EnvelopeStage::Sustain;
                }
            }

            EnvelopeStage::Sustain => {}

            EnvelopeStage::Release => {
                self.level -= increment(sample_duration, self.release);

                if self.level <= SNAP {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Off;
                }
            }
        }

        self.level = self.level.clamp(0.0, 1.0);
        self.level
    }

    pub fn is_on(&self) -> bool {
        self.stage != EnvelopeStage::Off
    }

    pub fn set_retrigger(&mut self, retrigger: bool) {
        self.retrigger = retrigger;
    }

    pub fn retrigger(&self) -> bool {
        self.retrigger
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Off;
        self.level = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn attack(&self) -> f32 {
        self.attack
    }

    pub fn set_attack(&mut self, seconds: f32) {
        self.attack = seconds.max(0.0);
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    pub fn set_decay(&mut self, seconds: f32) {
        self.decay = seconds.max(0.0);
    }

    pub fn sustain(&self) -> f32 {
        self.sustain
    }

    /// Takes effect on the next sample; a held note jumps to the new level.
    pub fn set_sustain(&mut self, level: f32) {
        self.sustain = level.clamp(0.0, 1.0);
        if self.stage == EnvelopeStage::Sustain {
            self.level = self.sustain;
        }
    }

    pub fn release(&self) -> f32 {
        self.release
    }

    pub fn set_release(&mut self, seconds: f32) {
        self.release = seconds.max(0.0);
    }

    pub fn set(&mut self, param: AdsrParam, value: f32) {
        match param {
            AdsrParam::Attack => self.set_attack(value),
            AdsrParam::Decay => self.set_decay(value),
            AdsrParam::Sustain => self.set_sustain(value),
            AdsrParam::Release => self.set_release(value),
        }
    }
}

impl Default for Adsr {
    fn default() -> Self {
        Self::new(0.01, 1.0, 1.0, 0.01)
    }
}

#[inline]
fn increment(sample_duration: f32, stage_time: f32) -> f32 {
    if stage_time <= MIN_TIME {
        1.0
    } else {
        sample_duration / stage_time
    }
}

/// Amplitude envelope owned by a voice.
///
/// The variant set is closed, so cloning a prototype is a plain `Clone`.
#[derive(Debug, Clone)]
pub enum Envelope {
    Adsr(Adsr),
    /// Binary gate: 1.0 while on, 0.0 while off.
    Zero { on: bool },
}

impl Envelope {
    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Envelope::Adsr(Adsr::new(attack, decay, sustain, release))
    }

    pub fn zero() -> Self {
        Envelope::Zero { on: false }
    }

    pub fn trig(&mut self, on: bool) {
        match self {
            Envelope::Adsr(adsr) => adsr.trig(on),
            Envelope::Zero { on: gate } => *gate = on,
        }
    }

    pub fn process(&mut self, sample_duration: f32) -> f32 {
        match self {
            Envelope::Adsr(adsr) => adsr.process(sample_duration),
            Envelope::Zero { on } => {
                if *on {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn is_on(&self) -> bool {
        match self {
            Envelope::Adsr(adsr) => adsr.is_on(),
            Envelope::Zero { on } => *on,
        }
    }

    /// No effect on the zero envelope, which has no level to reset.
    pub fn set_retrigger(&mut self, retrigger: bool) {
        if let Envelope::Adsr(adsr) = self {
            adsr.set_retrigger(retrigger);
        }
    }

    pub fn stage(&self) -> EnvelopeStage {
        match self {
            Envelope::Adsr(adsr) => adsr.stage(),
            Envelope::Zero { on: true } => EnvelopeStage::Sustain,
            Envelope::Zero { on: false } => EnvelopeStage::Off,
        }
    }

    pub fn level(&self) -> f32 {
        match self {
            Envelope::Adsr(adsr) => adsr.level(),
            Envelope::Zero { on } => f32::from(u8::from(*on)),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Envelope::Adsr(adsr) => adsr.reset(),
            Envelope::Zero { on } => *on = false,
        }
    }

    pub fn as_adsr_mut(&mut self) -> Option<&mut Adsr> {
        match self {
            Envelope::Adsr(adsr) => Some(adsr),
            Envelope::Zero { .. } => None,
        }
    }
}

impl From<Adsr> for Envelope {
    fn from(adsr: Adsr) -> Self {
        Envelope::Adsr(adsr)
    }
}
