//! Error types for the engine

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("oscillator index {index} is out of bounds (switch holds {len})")]
    InvalidOscillatorIndex { index: usize, len: usize },
    #[error("instrument index {index} is out of bounds (manager holds {len})")]
    InstrumentOutOfRange { index: usize, len: usize },
    #[error("wavetable must contain at least one sample")]
    EmptyWavetable,
    #[error("voice has no parameter `{0}`")]
    NoSuchVoiceParameter(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("bpm must be positive, got {bpm}")]
    InvalidTempo { bpm: f32 },
    #[error("event-based time manager has no tempo")]
    NoTempo,
    #[error("control queue is full")]
    QueueFull,
}

pub type Result<T> = std::result::Result<T, EngineError>;
