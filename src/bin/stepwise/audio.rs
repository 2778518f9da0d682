//! cpal output stream driving the engine

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait};
use rtrb::Consumer;
use stepwise::{sequencing::Playback, synth::ControlMessage, Engine, EngineConfig};
use tracing::{error, info};

/// The default output device and the stream settings to open it with.
pub struct Output {
    device: cpal::Device,
    config: cpal::StreamConfig,
}

impl Output {
    /// Use the device's preferred rate unless one is requested.
    pub fn open(sample_rate: Option<u32>, buffer_size: Option<usize>) -> EyreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let default = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let mut config: cpal::StreamConfig = default.into();
        if let Some(rate) = sample_rate {
            config.sample_rate = cpal::SampleRate(rate);
        }
        if let Some(frames) = buffer_size {
            config.buffer_size = cpal::BufferSize::Fixed(frames as u32);
        }

        let name = device.name().unwrap_or_else(|_| "unknown".into());
        info!(
            device = %name,
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "audio output"
        );
        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Move the engine into the audio callback. Control messages are
    /// applied at the start of every callback.
    pub fn start<S>(
        &self,
        engine_config: &EngineConfig,
        mut engine: Engine<S>,
        mut rx: Consumer<ControlMessage>,
    ) -> EyreResult<cpal::Stream>
    where
        S: Playback + Send + 'static,
    {
        if engine_config.sample_rate != self.sample_rate() {
            return Err(eyre!(
                "engine runs at {} Hz but the device at {} Hz",
                engine_config.sample_rate,
                self.sample_rate()
            ));
        }
        let channels = usize::from(self.config.channels);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    engine.drain_messages(&mut rx);
                    engine.render_interleaved(data, channels);
                },
                |err| error!(%err, "audio stream error"),
                None,
            )
            .wrap_err("failed to build output stream")?;

        Ok(stream)
    }
}
