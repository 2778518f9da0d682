use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::debug;

use crate::error::{EngineError, Result};

/*
Time Managers
=============

A time manager answers one question per rendered sample: "is a step due
now?". The sequencer calls `count_sample()` exactly once per sample while
playing and dispatches a command whenever it returns true.

Two strategies:

  Event-based   A one-shot countdown armed from outside, usually by the
                command that was just dispatched ("this note lasts 0.25 s,
                wake me in 11025 samples"). Once the counter hits zero it
                stays due on every call until it is armed again, so a run
                of commands without durations executes on consecutive
                samples.

  Tempo         A free-running down-counter reloaded from the tempo:

                  samples_per_step = floor(sample_rate * 60 / (bpm * steps_per_beat))

                At 44.1 kHz, 120 bpm, 4 steps per beat: 5512 samples.

                Shuffle skews alternating steps. With shuffle s, the first
                step of each pair lasts 2s * samples_per_step and the
                second 2(1 - s) * samples_per_step; 0.5 is straight time.

    counter:  5512 5511 ... 2 1 0→reload 5512 ...
    due:                         ▲ true for this one sample only


Play State
----------

`playing` is shared with control threads through an `Arc<AtomicBool>`
(`PlayFlag`). The render thread reads it once per tick, a UI thread may
flip it at any time; each tick observes one consistent value.
*/

/// Shared play/pause flag.
#[derive(Debug, Clone, Default)]
pub struct PlayFlag(Arc<AtomicBool>);

impl PlayFlag {
    pub fn new(playing: bool) -> Self {
        Self(Arc::new(AtomicBool::new(playing)))
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, playing: bool) {
        self.0.store(playing, Ordering::Release);
    }

    /// Flip the flag and return the new value.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::AcqRel)
    }
}

/// Fixed-tempo step clock.
#[derive(Debug, Clone)]
pub struct TempoClock {
    sample_rate: u32,
    bpm: f32,
    steps_per_beat: u32,
    shuffle: f32,
    samples_per_step: u64,
    counter: u64,
    /// True while counting down the second step of a shuffle pair.
    offbeat: bool,
}

impl TempoClock {
    pub fn new(sample_rate: u32, bpm: f32, steps_per_beat: u32, shuffle: f32) -> Result<Self> {
        validate_tempo(sample_rate, bpm, steps_per_beat)?;

        let mut clock = Self {
            sample_rate,
            bpm,
            steps_per_beat,
            shuffle: shuffle.clamp(0.0, 1.0),
            samples_per_step: 0,
            counter: 0,
            offbeat: false,
        };
        clock.recompute();
        clock.rewind();
        Ok(clock)
    }

    fn recompute(&mut self) {
        let step_seconds = 60.0 / (f64::from(self.bpm) * f64::from(self.steps_per_beat));
        self.samples_per_step = (f64::from(self.sample_rate) * step_seconds).floor().max(1.0) as u64;
    }

    /// Length in samples of the next step to count down.
    fn next_step_len(&self) -> u64 {
        let pair = 2 * self.samples_per_step;
        let first = (pair as f64 * f64::from(self.shuffle)).round() as u64;
        let len = if self.offbeat { pair - first } else { first };
        len.max(1)
    }

    /// Restart from the beginning of a step pair.
    pub fn rewind(&mut self) {
        self.offbeat = false;
        self.counter = self.next_step_len();
    }

    #[inline]
    pub fn count_sample(&mut self) -> bool {
        if self.counter > 0 {
            self.counter -= 1;
        }

        if self.counter == 0 {
            self.offbeat = !self.offbeat;
            self.counter = self.next_step_len();
            return true;
        }

        false
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Takes effect from the next reload; the step in progress keeps its length.
    pub fn set_bpm(&mut self, bpm: f32) -> Result<()> {
        validate_tempo(self.sample_rate, bpm, self.steps_per_beat)?;
        self.bpm = bpm;
        self.recompute();
        Ok(())
    }

    pub fn steps_per_beat(&self) -> u32 {
        self.steps_per_beat
    }

    pub fn set_steps_per_beat(&mut self, steps_per_beat: u32) -> Result<()> {
        validate_tempo(self.sample_rate, self.bpm, steps_per_beat)?;
        self.steps_per_beat = steps_per_beat;
        self.recompute();
        Ok(())
    }

    pub fn shuffle(&self) -> f32 {
        self.shuffle
    }

    pub fn set_shuffle(&mut self, shuffle: f32) {
        self.shuffle = shuffle.clamp(0.0, 1.0);
    }

    /// Seconds per step, ignoring shuffle.
    pub fn step_duration(&self) -> f32 {
        60.0 / (self.bpm * self.steps_per_beat as f32)
    }

    pub fn samples_per_step(&self) -> u64 {
        self.samples_per_step
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

fn validate_tempo(sample_rate: u32, bpm: f32, steps_per_beat: u32) -> Result<()> {
    if sample_rate == 0 {
        return Err(EngineError::InvalidConfig("sample rate must be positive".into()));
    }
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(EngineError::InvalidTempo { bpm });
    }
    if steps_per_beat == 0 {
        return Err(EngineError::InvalidConfig("steps per beat must be positive".into()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub enum Clock {
    /// One-shot countdown armed with `reset_counter`.
    EventBased { counter: u64 },
    Tempo(TempoClock),
}

/// Decides, sample by sample, when the next step is due.
#[derive(Debug, Clone)]
pub struct TimeManager {
    playing: PlayFlag,
    clock: Clock,
}

impl TimeManager {
    /// Starts paused with the counter at zero, so the first sample after
    /// `play` dispatches immediately.
    pub fn event_based() -> Self {
        Self {
            playing: PlayFlag::new(false),
            clock: Clock::EventBased { counter: 0 },
        }
    }

    pub fn tempo(sample_rate: u32, bpm: f32, steps_per_beat: u32, shuffle: f32) -> Result<Self> {
        let clock = TempoClock::new(sample_rate, bpm, steps_per_beat, shuffle)?;
        debug!(
            bpm,
            steps_per_beat,
            samples_per_step = clock.samples_per_step(),
            "tempo clock ready"
        );
        Ok(Self {
            playing: PlayFlag::new(false),
            clock: Clock::Tempo(clock),
        })
    }

    #[inline]
    pub fn playing(&self) -> bool {
        self.playing.get()
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.set(playing);
    }

    /// A handle to the play flag that can be moved to another thread.
    pub fn play_flag(&self) -> PlayFlag {
        self.playing.clone()
    }

    /// Count one rendered sample; true exactly when a step is due.
    #[inline]
    pub fn count_sample(&mut self) -> bool {
        match &mut self.clock {
            Clock::EventBased { counter } => {
                if *counter > 0 {
                    *counter -= 1;
                }
                *counter == 0
            }
            Clock::Tempo(clock) => clock.count_sample(),
        }
    }

    /// Arm the countdown: the next step becomes due after `samples` more
    /// calls to `count_sample`. On a tempo clock this shortens or stretches
    /// the current step only.
    pub fn reset_counter(&mut self, samples: u64) {
        match &mut self.clock {
            Clock::EventBased { counter } => *counter = samples,
            Clock::Tempo(clock) => clock.counter = samples,
        }
    }

    /// Return the clock to its initial position.
    pub fn rewind(&mut self) {
        match &mut self.clock {
            Clock::EventBased { counter } => *counter = 0,
            Clock::Tempo(clock) => clock.rewind(),
        }
    }

    pub fn is_event_based(&self) -> bool {
        matches!(self.clock, Clock::EventBased { .. })
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn tempo_clock_mut(&mut self) -> Option<&mut TempoClock> {
        match &mut self.clock {
            Clock::Tempo(clock) => Some(clock),
            Clock::EventBased { .. } => None,
        }
    }

    /// Change the tempo of a tempo clock. Event-based managers have no tempo.
    pub fn set_bpm(&mut self, bpm: f32) -> Result<()> {
        match &mut self.clock {
            Clock::Tempo(clock) => clock.set_bpm(bpm),
            Clock::EventBased { .. } => Err(EngineError::NoTempo),
        }
    }
}
