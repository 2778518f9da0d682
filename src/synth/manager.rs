use tracing::debug;

use crate::{
    error::{EngineError, Result},
    synth::{
        device::{Device, Gain, InputKind},
        instrument::Instrument,
    },
};

/// Owns every device in the graph and mixes them onto one stereo bus.
///
/// Devices are addressed by the index they were given on insertion. The
/// collection is append-only, so an index stays valid for the manager's
/// whole life. Commands refer to instruments by this index instead of
/// holding references.
///
/// Per sample, devices run in insertion order: generators add onto the bus,
/// stereo-input devices transform the bus built so far. The master gain is
/// applied last. Nothing is carried between calls except device state.
#[derive(Debug, Clone, Default)]
pub struct DeviceManager {
    devices: Vec<Device>,
    master: Gain,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an independent deep copy of `prototype` and return its index.
    pub fn clone_instrument(&mut self, prototype: &Instrument) -> usize {
        self.add_device(Device::Instrument(prototype.clone()))
    }

    pub fn add_device(&mut self, device: Device) -> usize {
        let index = self.devices.len();
        debug!(index, io = ?device.io(), "adding device");
        self.devices.push(device);
        index
    }

    /// The instrument at `index`, or `None` when the index is out of range or
    /// names a non-instrument device.
    pub fn instrument(&self, index: usize) -> Option<&Instrument> {
        self.devices.get(index).and_then(Device::as_instrument)
    }

    pub fn instrument_mut(&mut self, index: usize) -> Option<&mut Instrument> {
        self.devices.get_mut(index).and_then(Device::as_instrument_mut)
    }

    /// Like [`DeviceManager::instrument_mut`] but reports why the lookup failed.
    /// Meant for control surfaces, not the render path.
    pub fn try_instrument_mut(&mut self, index: usize) -> Result<&mut Instrument> {
        let len = self.devices.len();
        self.instrument_mut(index)
            .ok_or(EngineError::InstrumentOutOfRange { index, len })
    }

    pub fn device(&self, index: usize) -> Option<&Device> {
        self.devices.get(index)
    }

    pub fn device_mut(&mut self, index: usize) -> Option<&mut Device> {
        self.devices.get_mut(index)
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn master(&self) -> &Gain {
        &self.master
    }

    pub fn master_mut(&mut self) -> &mut Gain {
        &mut self.master
    }

    /// Release every note on every instrument.
    pub fn all_notes_off(&mut self) {
        for ins in self.devices.iter_mut().filter_map(Device::as_instrument_mut) {
            ins.all_notes_off();
        }
    }

    /// Render one stereo sample of the whole graph.
    #[inline]
    pub fn process(&mut self, sample_duration: f32) -> (f32, f32) {
        let mut bus = (0.0, 0.0);

        for device in &mut self.devices {
            match device.io().0 {
                InputKind::None => {
                    let (left, right) = device.process(sample_duration, (0.0, 0.0));
                    bus.0 += left;
                    bus.1 += right;
                }
                InputKind::Mono => {
                    let mono = 0.5 * (bus.0 + bus.1);
                    bus = device.process(sample_duration, (mono, mono));
                }
                InputKind::Stereo => {
                    bus = device.process(sample_duration, bus);
                }
            }
        }

        self.master.process(bus.0, bus.1)
    }
}
