// Purpose: voices, instruments and the device graph they are mixed through
// This layer sits on top of the dsp primitives and below the sequencer

pub mod device;
pub mod instrument;
pub mod manager;
pub mod message;
pub mod voice;

pub use device::{Device, Gain, InputKind, OutputKind};
pub use instrument::{Instrument, Polyphony};
pub use manager::DeviceManager;
pub use message::{ControlMessage, MessageReceiver};
pub use voice::{Voice, VoiceKind};
