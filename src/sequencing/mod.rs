pub mod command;
pub mod pitch;
pub mod processor;
pub mod sequencer;
pub mod stream;
pub mod time;

pub use command::{Command, SynthCommand};
pub use pitch::midi_note_to_freq;
pub use processor::{CommandProcessor, FnProcessor, SynthProcessor};
pub use sequencer::{MultiSequencer, Playback, Sequencer};
pub use stream::{CommandStream, Playhead};
pub use time::{Clock, PlayFlag, TempoClock, TimeManager};
