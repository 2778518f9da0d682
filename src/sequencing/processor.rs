use super::{
    command::{Command, SynthCommand},
    pitch::midi_note_to_freq,
    stream::Playhead,
    time::TimeManager,
};
use crate::{dsp::AdsrParam, synth::manager::DeviceManager};

/*
Command Processors
==================

A processor gives commands their meaning. On every due step the sequencer
hands the current command to three handlers, always in this order:

    ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
    │  stream      │──▶│  device      │──▶│  time        │──▶ stream.step()
    │  (playhead)  │   │  (instrument)│   │  (next due)  │
    └──────────────┘   └──────────────┘   └──────────────┘

The device handler therefore sees the command before the playhead moves
and before the clock is reprogrammed for the following step.

`SynthProcessor` handles the built-in `SynthCommand` set by matching on the
variant. `FnProcessor` carries three plain function pointers for command
types defined by the application; installing it allocates nothing and the
handlers are fixed for the life of the sequencer.
*/

pub trait CommandProcessor<C: Command> {
    /// Reposition the playhead (jumps, repeats).
    fn handle_command_stream(&mut self, _command: &C, _playhead: &mut Playhead) {}

    /// Apply the command to the device graph.
    fn handle_device(&mut self, _command: &C, _playhead: &Playhead, _devices: &mut DeviceManager) {}

    /// Program when the next step is due.
    fn handle_time_manager(&mut self, _command: &C, _time: &mut TimeManager) {}
}

pub type StreamHandler<C> = fn(&C, &mut Playhead);
pub type DeviceHandler<C> = fn(&C, &Playhead, &mut DeviceManager);
pub type TimeHandler<C> = fn(&C, &mut TimeManager);

/// Processor built from three function pointers. Unset slots do nothing.
pub struct FnProcessor<C> {
    stream: StreamHandler<C>,
    device: DeviceHandler<C>,
    time: TimeHandler<C>,
}

fn ignore_stream<C>(_: &C, _: &mut Playhead) {}
fn ignore_device<C>(_: &C, _: &Playhead, _: &mut DeviceManager) {}
fn ignore_time<C>(_: &C, _: &mut TimeManager) {}

impl<C> FnProcessor<C> {
    pub fn new() -> Self {
        Self {
            stream: ignore_stream::<C>,
            device: ignore_device::<C>,
            time: ignore_time::<C>,
        }
    }

    pub fn on_stream(mut self, handler: StreamHandler<C>) -> Self {
        self.stream = handler;
        self
    }

    pub fn on_device(mut self, handler: DeviceHandler<C>) -> Self {
        self.device = handler;
        self
    }

    pub fn on_time(mut self, handler: TimeHandler<C>) -> Self {
        self.time = handler;
        self
    }
}

impl<C> Default for FnProcessor<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for FnProcessor<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for FnProcessor<C> {}

impl<C: Command> CommandProcessor<C> for FnProcessor<C> {
    fn handle_command_stream(&mut self, command: &C, playhead: &mut Playhead) {
        (self.stream)(command, playhead);
    }

    fn handle_device(&mut self, command: &C, playhead: &Playhead, devices: &mut DeviceManager) {
        (self.device)(command, playhead, devices);
    }

    fn handle_time_manager(&mut self, command: &C, time: &mut TimeManager) {
        (self.time)(command, time);
    }
}

/// Dispatches [`SynthCommand`]s onto instruments and the clock.
#[derive(Debug, Clone, Copy)]
pub struct SynthProcessor {
    sample_rate: u32,
}

impl SynthProcessor {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn seconds_to_samples(&self, seconds: f32) -> u64 {
        (f64::from(seconds.max(0.0)) * f64::from(self.sample_rate)).round() as u64
    }
}

impl CommandProcessor<SynthCommand> for SynthProcessor {
    fn handle_command_stream(&mut self, command: &SynthCommand, playhead: &mut Playhead) {
        if let SynthCommand::Jump { cursor } = *command {
            playhead.jump(cursor);
        }
    }

    fn handle_device(
        &mut self,
        command: &SynthCommand,
        playhead: &Playhead,
        devices: &mut DeviceManager,
    ) {
        let index = match command {
            SynthCommand::Tempo { .. } | SynthCommand::Wait { .. } | SynthCommand::Jump { .. } => {
                return
            }
            _ => match command.instrument().or(playhead.bound_instrument()) {
                Some(index) => index,
                None => return,
            },
        };
        // Missing instruments are skipped; the render path never panics.
        let Some(ins) = devices.instrument_mut(index) else {
            return;
        };

        match *command {
            SynthCommand::Note { voice, pitch: 0, .. } => ins.note_off(voice),
            SynthCommand::Note { voice, pitch, .. } => ins.note_on(voice, midi_note_to_freq(pitch)),
            SynthCommand::NoteOff { voice, .. } => ins.note_off(voice),
            SynthCommand::Volume { volume, .. } => ins.set_volume(volume),
            SynthCommand::Pan { pan, .. } => ins.set_pan(pan),
            // An out-of-range selection keeps the current waveform.
            SynthCommand::Waveshape { index, .. } => {
                ins.select_waveform(index).ok();
            }
            SynthCommand::Attack { seconds, .. } => ins.set_adsr(AdsrParam::Attack, seconds),
            SynthCommand::Decay { seconds, .. } => ins.set_adsr(AdsrParam::Decay, seconds),
            SynthCommand::Sustain { level, .. } => ins.set_adsr(AdsrParam::Sustain, level),
            SynthCommand::Release { seconds, .. } => ins.set_adsr(AdsrParam::Release, seconds),
            SynthCommand::Retrigger { enabled, .. } => ins.set_retrigger(enabled),
            SynthCommand::Tempo { .. } | SynthCommand::Wait { .. } | SynthCommand::Jump { .. } => {}
        }
    }

    fn handle_time_manager(&mut self, command: &SynthCommand, time: &mut TimeManager) {
        if let SynthCommand::Tempo { bpm } = *command {
            // Event-based clocks have no tempo. A rejected bpm leaves the
            // clock as it was.
            if let Some(clock) = time.tempo_clock_mut() {
                clock.set_bpm(bpm).ok();
            }
            return;
        }

        if time.is_event_based() {
            if let Some(seconds) = command.duration() {
                time.reset_counter(self.seconds_to_samples(seconds));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsp::{Envelope, EnvelopeStage, Oscillator, OscillatorSwitch},
        sequencing::stream::CommandStream,
        synth::{instrument::Instrument, voice::Voice},
    };

    fn switch_instrument() -> Instrument {
        let switch = OscillatorSwitch::new()
            .with(Oscillator::triangle())
            .with(Oscillator::saw())
            .with(Oscillator::pulse(0.25));
        Instrument::mono(Voice::new(
            switch.into(),
            Envelope::adsr(0.01, 2.0, 0.2, 0.5),
        ))
    }

    fn devices() -> DeviceManager {
        let mut devices = DeviceManager::new();
        devices.clone_instrument(&switch_instrument());
        devices.clone_instrument(&switch_instrument());
        devices
    }

    fn selected(devices: &DeviceManager, index: usize) -> usize {
        match devices.instrument(index).unwrap().voices()[0].oscillator() {
            Oscillator::Switch(switch) => switch.selected(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn note_plays_the_midi_pitch() {
        let mut devices = devices();
        let mut processor = SynthProcessor::new(44_100);
        let playhead = Playhead::default();

        let note = SynthCommand::Note {
            instrument: Some(1),
            voice: 0,
            pitch: 69,
            duration: 0.25,
        };
        processor.handle_device(&note, &playhead, &mut devices);

        let voice = &devices.instrument(1).unwrap().voices()[0];
        assert!(voice.is_on());
        assert!((voice.frequency() - 440.0).abs() < 1e-3);
        assert!(!devices.instrument(0).unwrap().is_on());
    }

    #[test]
    fn pitch_zero_is_a_rest() {
        let mut devices = devices();
        let mut processor = SynthProcessor::new(44_100);
        let playhead = Playhead::default();
        devices.instrument_mut(0).unwrap().note_on(0, 220.0);

        let rest = SynthCommand::Note {
            instrument: Some(0),
            voice: 0,
            pitch: 0,
            duration: 0.25,
        };
        processor.handle_device(&rest, &playhead, &mut devices);
        assert_eq!(
            devices.instrument(0).unwrap().voices()[0].envelope().stage(),
            EnvelopeStage::Release
        );
    }

    #[test]
    fn unaddressed_commands_use_the_bound_instrument() {
        let mut devices = devices();
        let mut processor = SynthProcessor::new(44_100);
        let mut stream = CommandStream::with_commands(
            vec![SynthCommand::Volume {
                instrument: None,
                volume: 0.25,
            }],
            false,
        )
        .bound_to(1);

        let (cmd, playhead) = stream.split_current();
        processor.handle_device(cmd.unwrap(), playhead, &mut devices);

        assert_eq!(devices.instrument(1).unwrap().volume(), 0.25);
        assert_eq!(devices.instrument(0).unwrap().volume(), 1.0);
    }

    #[test]
    fn bad_waveform_selection_keeps_previous() {
        let mut devices = devices();
        let mut processor = SynthProcessor::new(44_100);
        let playhead = Playhead::default();

        let select = |index| SynthCommand::Waveshape {
            instrument: Some(0),
            index,
        };
        processor.handle_device(&select(2), &playhead, &mut devices);
        assert_eq!(selected(&devices, 0), 2);

        processor.handle_device(&select(7), &playhead, &mut devices);
        assert_eq!(selected(&devices, 0), 2);
    }

    #[test]
    fn envelope_parameters_reach_every_voice() {
        let mut devices = DeviceManager::new();
        let poly = Instrument::poly(
            &Voice::new(Oscillator::sine(), Envelope::adsr(0.01, 0.1, 0.5, 0.1)),
            4,
        );
        devices.clone_instrument(&poly);
        let mut processor = SynthProcessor::new(44_100);
        let playhead = Playhead::default();

        let sustain = SynthCommand::Sustain {
            instrument: Some(0),
            level: 0.8,
        };
        processor.handle_device(&sustain, &playhead, &mut devices);

        for voice in devices.instrument(0).unwrap().voices() {
            match voice.envelope() {
                Envelope::Adsr(adsr) => assert_eq!(adsr.sustain(), 0.8),
                other => panic!("unexpected envelope {other:?}"),
            }
        }
    }

    #[test]
    fn missing_instrument_is_skipped() {
        let mut devices = devices();
        let mut processor = SynthProcessor::new(44_100);
        let playhead = Playhead::default();
        let note = SynthCommand::Note {
            instrument: Some(9),
            voice: 0,
            pitch: 60,
            duration: 1.0,
        };
        processor.handle_device(&note, &playhead, &mut devices);
        assert!(!devices.instrument(0).unwrap().is_on());
    }

    #[test]
    fn durations_arm_the_event_clock() {
        let mut processor = SynthProcessor::new(1_000);
        let mut time = TimeManager::event_based();
        processor.handle_time_manager(&SynthCommand::Wait { duration: 0.003 }, &mut time);

        assert!(!time.count_sample());
        assert!(!time.count_sample());
        assert!(time.count_sample());
    }

    #[test]
    fn tempo_command_changes_bpm() {
        let mut processor = SynthProcessor::new(44_100);
        let mut time = TimeManager::tempo(44_100, 120.0, 4, 0.5).unwrap();
        processor.handle_time_manager(&SynthCommand::Tempo { bpm: 90.0 }, &mut time);
        assert_eq!(time.tempo_clock_mut().unwrap().bpm(), 90.0);

        processor.handle_time_manager(&SynthCommand::Tempo { bpm: 0.0 }, &mut time);
        assert_eq!(time.tempo_clock_mut().unwrap().bpm(), 90.0);
    }

    #[test]
    fn tempo_command_on_event_clock_leaves_countdown_alone() {
        let mut processor = SynthProcessor::new(1_000);
        let mut time = TimeManager::event_based();
        time.reset_counter(3);

        processor.handle_time_manager(&SynthCommand::Tempo { bpm: 90.0 }, &mut time);
        assert!(!time.count_sample());
        assert!(!time.count_sample());
        assert!(time.count_sample());
    }

    #[test]
    fn fn_processor_calls_installed_handlers() {
        fn count_volume(cmd: &u8, _: &Playhead, devices: &mut DeviceManager) {
            if let Some(ins) = devices.instrument_mut(0) {
                ins.set_volume(f32::from(*cmd) / 10.0);
            }
        }

        let mut devices = devices();
        let mut processor = FnProcessor::<u8>::new().on_device(count_volume);
        let mut playhead = Playhead::default();

        processor.handle_command_stream(&5, &mut playhead);
        processor.handle_device(&5, &playhead, &mut devices);
        assert_eq!(devices.instrument(0).unwrap().volume(), 0.5);
    }
}
