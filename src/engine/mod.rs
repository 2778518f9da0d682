pub mod config;

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::debug;

use self::config::EngineConfig;
#[cfg(feature = "rtrb")]
use crate::error::EngineError;
use crate::{
    error::Result,
    sequencing::{sequencer::Playback, time::PlayFlag},
    synth::{
        manager::DeviceManager,
        message::{ControlMessage, MessageReceiver},
    },
};

/*
Engine
======

The engine is what the audio callback owns. Per output sample:

    render()
      ├─ sequencer.tick(devices)     maybe dispatch a command
      └─ devices.process(dt)         sum the graph → (left, right)

Threads
-------

  render thread   owns the Engine; calls drain_messages() once per
                  block, then render_block()
  control thread  owns a Transport (play / pause) and, with the rtrb
                  feature, a Controller that queues ControlMessages

    control ──► PlayFlag (atomic) ─────────────────► tick() reads it
    control ──► rtrb ring ──► drain_messages() ────► apply() between blocks

Stop, seek and live parameter changes are therefore applied on the render
thread, between blocks, and never race a running process() call.
*/

/// Play/pause handle safe to move to any thread.
#[derive(Debug, Clone)]
pub struct Transport {
    playing: PlayFlag,
}

impl Transport {
    pub fn play(&self) {
        debug!("transport: play");
        self.playing.set(true);
    }

    pub fn pause(&self) {
        debug!("transport: pause");
        self.playing.set(false);
    }

    /// Returns the new state.
    pub fn toggle(&self) -> bool {
        let playing = self.playing.toggle();
        debug!(playing, "transport: toggle");
        playing
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }
}

/// Control-thread end of the message queue.
#[cfg(feature = "rtrb")]
pub struct Controller {
    transport: Transport,
    tx: Producer<ControlMessage>,
}

#[cfg(feature = "rtrb")]
impl Controller {
    pub fn send(&mut self, message: ControlMessage) -> Result<()> {
        self.tx.push(message).map_err(|_| EngineError::QueueFull)
    }

    /// Pause now, then have the render thread rewind and release notes.
    pub fn stop(&mut self) -> Result<()> {
        self.transport.pause();
        self.send(ControlMessage::Stop)
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

pub struct Engine<S> {
    sequencer: S,
    devices: DeviceManager,
    sample_duration: f32,
}

impl<S: Playback> Engine<S> {
    pub fn new(config: &EngineConfig, sequencer: S, devices: DeviceManager) -> Result<Self> {
        config.validate()?;
        debug!(
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            devices = devices.len(),
            "engine ready"
        );
        Ok(Self {
            sequencer,
            devices,
            sample_duration: config.sample_duration(),
        })
    }

    /// Render one stereo sample.
    #[inline]
    pub fn render(&mut self) -> (f32, f32) {
        self.sequencer.tick(&mut self.devices);
        self.devices.process(self.sample_duration)
    }

    /// Fill an interleaved stereo buffer.
    pub fn render_block(&mut self, out: &mut [f32]) {
        self.render_interleaved(out, 2);
    }

    /// Fill an interleaved buffer with `channels` channels. Mono outputs get
    /// the average of both sides; channels past the second are silent.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        for frame in out.chunks_mut(channels) {
            let (left, right) = self.render();
            match frame {
                [mono] => *mono = 0.5 * (left + right),
                [l, r, rest @ ..] => {
                    *l = left;
                    *r = right;
                    rest.fill(0.0);
                }
                [] => {}
            }
        }
    }

    /// Apply every queued control message. Call once per block, before rendering.
    pub fn drain_messages<R: MessageReceiver + ?Sized>(&mut self, rx: &mut R) {
        while let Some(message) = rx.pop() {
            self.apply(message);
        }
    }

    pub fn apply(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::Stop => self.stop(),
            ControlMessage::Seek { cursor } => self.sequencer.seek(cursor),
            ControlMessage::NoteOn {
                instrument,
                voice,
                frequency,
            } => {
                if let Some(ins) = self.devices.instrument_mut(instrument) {
                    ins.note_on(voice, frequency);
                }
            }
            ControlMessage::NoteOff { instrument, voice } => {
                if let Some(ins) = self.devices.instrument_mut(instrument) {
                    ins.note_off(voice);
                }
            }
            ControlMessage::AllNotesOff => self.devices.all_notes_off(),
            ControlMessage::SetVolume { instrument, volume } => {
                if let Some(device) = self.devices.device_mut(instrument) {
                    device.set_volume(volume);
                }
            }
            ControlMessage::SetPan { instrument, pan } => {
                if let Some(device) = self.devices.device_mut(instrument) {
                    device.set_pan(pan);
                }
            }
            ControlMessage::SelectWaveform { instrument, index } => {
                // An out-of-range selection keeps the current waveform.
                if let Some(ins) = self.devices.instrument_mut(instrument) {
                    ins.select_waveform(index).ok();
                }
            }
            ControlMessage::SetAdsr {
                instrument,
                param,
                value,
            } => {
                if let Some(ins) = self.devices.instrument_mut(instrument) {
                    ins.set_adsr(param, value);
                }
            }
            ControlMessage::SetMasterVolume(volume) => self.devices.master_mut().set_volume(volume),
        }
    }

    /// A play/pause handle sharing this engine's play flag.
    pub fn transport(&self) -> Transport {
        Transport {
            playing: self.sequencer.play_flag(),
        }
    }

    /// Build the control queue. The controller goes to the control thread,
    /// the consumer travels with the engine into the audio callback.
    #[cfg(feature = "rtrb")]
    pub fn controller(&self, capacity: usize) -> (Controller, Consumer<ControlMessage>) {
        let (tx, rx) = RingBuffer::new(capacity);
        let controller = Controller {
            transport: self.transport(),
            tx,
        };
        (controller, rx)
    }

    pub fn play(&mut self) {
        self.sequencer.time_manager().set_playing(true);
    }

    pub fn pause(&mut self) {
        self.sequencer.time_manager().set_playing(false);
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    /// Pause, rewind every stream and the clock, and release held notes.
    pub fn stop(&mut self) {
        self.pause();
        self.sequencer.reset();
        self.sequencer.time_manager_mut().rewind();
        self.devices.all_notes_off();
    }

    pub fn sample_duration(&self) -> f32 {
        self.sample_duration
    }

    pub fn devices(&self) -> &DeviceManager {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut DeviceManager {
        &mut self.devices
    }

    pub fn sequencer(&self) -> &S {
        &self.sequencer
    }

    pub fn sequencer_mut(&mut self) -> &mut S {
        &mut self.sequencer
    }
}
