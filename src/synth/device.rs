use crate::synth::instrument::Instrument;

/// What a device consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    None,
    Mono,
    Stereo,
}

/// What a device produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Mono,
    Stereo,
}

/// Stereo gain and balance stage.
///
/// Balance keeps unity at the centre and only attenuates the far side:
/// left gain is `min(1, 2 * (1 - pan))`, right gain is `min(1, 2 * pan)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain {
    volume: f32,
    pan: f32,
}

impl Gain {
    pub fn new(volume: f32) -> Self {
        Self { volume, pan: 0.5 }
    }

    #[inline]
    pub fn process(&self, left: f32, right: f32) -> (f32, f32) {
        let left_gain = (2.0 * (1.0 - self.pan)).min(1.0);
        let right_gain = (2.0 * self.pan).min(1.0);
        (
            left * self.volume * left_gain,
            right * self.volume * right_gain,
        )
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

impl Default for Gain {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Anything that lives in the device graph.
///
/// The capability of each variant is fixed and reported by [`Device::io`];
/// the manager routes audio by that tag instead of by type.
#[derive(Debug, Clone)]
pub enum Device {
    /// Generates sound from notes. No input, stereo output.
    Instrument(Instrument),
    /// Transforms the bus it is inserted on. Stereo in, stereo out.
    Gain(Gain),
}

impl Device {
    pub fn io(&self) -> (InputKind, OutputKind) {
        match self {
            Device::Instrument(_) => (InputKind::None, OutputKind::Stereo),
            Device::Gain(_) => (InputKind::Stereo, OutputKind::Stereo),
        }
    }

    /// Render one stereo sample. Generators ignore `input`.
    #[inline]
    pub fn process(&mut self, sample_duration: f32, input: (f32, f32)) -> (f32, f32) {
        match self {
            Device::Instrument(ins) => ins.process(sample_duration),
            Device::Gain(gain) => gain.process(input.0, input.1),
        }
    }

    pub fn volume(&self) -> f32 {
        match self {
            Device::Instrument(ins) => ins.volume(),
            Device::Gain(gain) => gain.volume(),
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        match self {
            Device::Instrument(ins) => ins.set_volume(volume),
            Device::Gain(gain) => gain.set_volume(volume),
        }
    }

    pub fn pan(&self) -> f32 {
        match self {
            Device::Instrument(ins) => ins.pan(),
            Device::Gain(gain) => gain.pan(),
        }
    }

    pub fn set_pan(&mut self, pan: f32) {
        match self {
            Device::Instrument(ins) => ins.set_pan(pan),
            Device::Gain(gain) => gain.set_pan(pan),
        }
    }

    pub fn as_instrument(&self) -> Option<&Instrument> {
        match self {
            Device::Instrument(ins) => Some(ins),
            Device::Gain(_) => None,
        }
    }

    pub fn as_instrument_mut(&mut self) -> Option<&mut Instrument> {
        match self {
            Device::Instrument(ins) => Some(ins),
            Device::Gain(_) => None,
        }
    }
}

impl From<Instrument> for Device {
    fn from(ins: Instrument) -> Self {
        Device::Instrument(ins)
    }
}

impl From<Gain> for Device {
    fn from(gain: Gain) -> Self {
        Device::Gain(gain)
    }
}
