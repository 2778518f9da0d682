/// Anything a [`CommandStream`](super::CommandStream) can schedule.
///
/// The only capability the core needs is an independent copy, so that a
/// stream can be duplicated for another channel. What a command *means* is
/// decided by the [`CommandProcessor`](super::CommandProcessor) installed
/// next to it.
pub trait Command: Clone + Send + 'static {}

impl<T: Clone + Send + 'static> Command for T {}

/// The command set understood by [`SynthProcessor`](super::SynthProcessor).
///
/// Instrument-addressed variants take `instrument: None` to mean "the
/// instrument bound to the stream", so a channel playing one part can omit
/// the index on every line. Durations are in seconds.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthCommand {
    /// Start `voice` at MIDI `pitch`; pitch 0 is a rest and releases the
    /// voice instead. `duration` arms an event-based clock.
    Note {
        instrument: Option<usize>,
        voice: usize,
        pitch: u8,
        duration: f32,
    },
    NoteOff {
        instrument: Option<usize>,
        voice: usize,
    },
    Volume {
        instrument: Option<usize>,
        volume: f32,
    },
    Pan {
        instrument: Option<usize>,
        pan: f32,
    },
    /// Select oscillator `index` on a switch oscillator.
    Waveshape {
        instrument: Option<usize>,
        index: usize,
    },
    Attack {
        instrument: Option<usize>,
        seconds: f32,
    },
    Decay {
        instrument: Option<usize>,
        seconds: f32,
    },
    Sustain {
        instrument: Option<usize>,
        level: f32,
    },
    Release {
        instrument: Option<usize>,
        seconds: f32,
    },
    Retrigger {
        instrument: Option<usize>,
        enabled: bool,
    },
    Tempo {
        bpm: f32,
    },
    /// Do nothing for `duration` seconds.
    Wait {
        duration: f32,
    },
    /// Continue playback from command `cursor`.
    Jump {
        cursor: usize,
    },
}

impl SynthCommand {
    /// The explicitly addressed instrument, if this command targets one.
    pub fn instrument(&self) -> Option<usize> {
        match *self {
            SynthCommand::Note { instrument, .. }
            | SynthCommand::NoteOff { instrument, .. }
            | SynthCommand::Volume { instrument, .. }
            | SynthCommand::Pan { instrument, .. }
            | SynthCommand::Waveshape { instrument, .. }
            | SynthCommand::Attack { instrument, .. }
            | SynthCommand::Decay { instrument, .. }
            | SynthCommand::Sustain { instrument, .. }
            | SynthCommand::Release { instrument, .. }
            | SynthCommand::Retrigger { instrument, .. } => instrument,
            SynthCommand::Tempo { .. } | SynthCommand::Wait { .. } | SynthCommand::Jump { .. } => {
                None
            }
        }
    }

    /// Seconds the command occupies on an event-based clock.
    pub fn duration(&self) -> Option<f32> {
        match *self {
            SynthCommand::Note { duration, .. } | SynthCommand::Wait { duration } => Some(duration),
            _ => None,
        }
    }
}
