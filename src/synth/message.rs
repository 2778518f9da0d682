#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::dsp::AdsrParam;

/// Live changes sent from a control thread to the render thread.
///
/// Everything here is `Copy` so it can travel through a lock-free ring
/// buffer and be applied between samples without allocating.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ControlMessage {
    /// Pause and return every stream to its first command.
    Stop,
    /// Move every stream's playhead.
    Seek { cursor: usize },
    NoteOn {
        instrument: usize,
        voice: usize,
        frequency: f32,
    },
    NoteOff { instrument: usize, voice: usize },
    AllNotesOff,
    SetVolume { instrument: usize, volume: f32 },
    SetPan { instrument: usize, pan: f32 },
    SelectWaveform { instrument: usize, index: usize },
    SetAdsr {
        instrument: usize,
        param: AdsrParam,
        value: f32,
    },
    SetMasterVolume(f32),
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<ControlMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        Consumer::pop(self).ok()
    }
}

/// Drains a plain queue; used by tests and offline rendering.
impl MessageReceiver for std::collections::VecDeque<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        self.pop_front()
    }
}
