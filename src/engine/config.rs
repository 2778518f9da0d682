use tracing::warn;

use crate::{
    error::{EngineError, Result},
    sequencing::time::TimeManager,
    MAX_BLOCK_SIZE,
};

/// Construction-time settings for an [`Engine`](super::Engine).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// Frames per audio callback; at most [`MAX_BLOCK_SIZE`].
    pub buffer_size: usize,
    pub bpm: f32,
    pub steps_per_beat: u32,
    /// 0.5 is straight time.
    pub shuffle: f32,
    pub looping: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            buffer_size: 512,
            bpm: 120.0,
            steps_per_beat: 4,
            shuffle: 0.5,
            looping: true,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_bpm(mut self, bpm: f32) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn with_steps_per_beat(mut self, steps_per_beat: u32) -> Self {
        self.steps_per_beat = steps_per_beat;
        self
    }

    pub fn with_shuffle(mut self, shuffle: f32) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let problem = if self.sample_rate == 0 {
            Some("sample rate must be positive".to_string())
        } else if self.buffer_size == 0 || self.buffer_size > MAX_BLOCK_SIZE {
            Some(format!(
                "buffer size must be in 1..={MAX_BLOCK_SIZE}, got {}",
                self.buffer_size
            ))
        } else if !self.bpm.is_finite() || self.bpm <= 0.0 {
            Some(format!("bpm must be positive, got {}", self.bpm))
        } else if self.steps_per_beat == 0 {
            Some("steps per beat must be positive".to_string())
        } else if !(0.0..=1.0).contains(&self.shuffle) {
            Some(format!("shuffle must be in 0..=1, got {}", self.shuffle))
        } else {
            None
        };

        match problem {
            Some(reason) => {
                warn!(%reason, "rejected engine config");
                Err(EngineError::InvalidConfig(reason))
            }
            None => Ok(()),
        }
    }

    /// Seconds per sample.
    pub fn sample_duration(&self) -> f32 {
        1.0 / self.sample_rate as f32
    }

    /// A tempo clock running at this config's rate and tempo.
    pub fn tempo_clock(&self) -> Result<TimeManager> {
        self.validate()?;
        TimeManager::tempo(self.sample_rate, self.bpm, self.steps_per_beat, self.shuffle)
    }
}
