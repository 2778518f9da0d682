use tracing::debug;

use super::{
    command::Command,
    processor::CommandProcessor,
    stream::CommandStream,
    time::{PlayFlag, TimeManager},
};
use crate::synth::manager::DeviceManager;

/*
Sequencers
==========

Called once per rendered sample from the audio callback:

    tick()
      │  paused? ─────────────────────────────▶ return
      │  time.count_sample() false? ──────────▶ return
      ▼
    step()
      │  no current command? ── pause ────────▶ return
      ▼
    stream handler → device handler → time handler
      ▼
    stream.step(); pause if the stream is finished

A non-looping stream pauses once its playhead reaches the last command;
that command is the end marker and is not dispatched. Pressing play again
dispatches it, after which the sequencer pauses on the same index until
the stream is reset.

`MultiSequencer` drives several streams (channels) from one clock. On a
due sample every channel that still has commands dispatches one, in
channel order. A channel whose stream finishes drops out, and the
sequencer pauses once every channel has, which never happens while any
channel loops.
*/

/// Shared surface of the single- and multi-stream sequencers.
pub trait Playback {
    /// Per-sample entry point.
    fn tick(&mut self, devices: &mut DeviceManager);

    /// Dispatch the current command(s) now.
    fn step(&mut self, devices: &mut DeviceManager);

    /// Return every playhead to its first command.
    fn reset(&mut self);

    /// Move every playhead; out-of-range positions are ignored per stream.
    fn seek(&mut self, cursor: usize);

    fn time_manager(&self) -> &TimeManager;

    fn time_manager_mut(&mut self) -> &mut TimeManager;

    fn play_flag(&self) -> PlayFlag {
        self.time_manager().play_flag()
    }

    fn is_playing(&self) -> bool {
        self.time_manager().playing()
    }
}

pub struct Sequencer<C, P> {
    time: TimeManager,
    stream: CommandStream<C>,
    processor: P,
}

impl<C: Command, P: CommandProcessor<C>> Sequencer<C, P> {
    /// Starts paused.
    pub fn new(time: TimeManager, stream: CommandStream<C>, processor: P) -> Self {
        time.set_playing(false);
        debug!(
            commands = stream.len(),
            looping = stream.is_looping(),
            event_based = time.is_event_based(),
            "sequencer ready"
        );
        Self {
            time,
            stream,
            processor,
        }
    }

    pub fn stream(&self) -> &CommandStream<C> {
        &self.stream
    }

    /// Editing the stream allocates; do it before handing the sequencer to
    /// the render thread.
    pub fn stream_mut(&mut self) -> &mut CommandStream<C> {
        &mut self.stream
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }
}

impl<C: Command, P: CommandProcessor<C>> Playback for Sequencer<C, P> {
    #[inline]
    fn tick(&mut self, devices: &mut DeviceManager) {
        if self.time.playing() && self.time.count_sample() {
            self.step(devices);
        }
    }

    fn step(&mut self, devices: &mut DeviceManager) {
        let (current, playhead) = self.stream.split_current();
        let Some(command) = current else {
            self.time.set_playing(false);
            return;
        };

        self.processor.handle_command_stream(command, playhead);
        self.processor.handle_device(command, playhead, devices);
        self.processor.handle_time_manager(command, &mut self.time);

        self.stream.step();
        if self.stream.finished() {
            self.time.set_playing(false);
        }
    }

    fn reset(&mut self) {
        self.stream.reset();
    }

    fn seek(&mut self, cursor: usize) {
        self.stream.set_cursor(cursor);
    }

    fn time_manager(&self) -> &TimeManager {
        &self.time
    }

    fn time_manager_mut(&mut self) -> &mut TimeManager {
        &mut self.time
    }
}

#[derive(Debug, Clone)]
struct Channel<C> {
    stream: CommandStream<C>,
    exhausted: bool,
}

/// Several command streams sharing one clock and one processor.
pub struct MultiSequencer<C, P> {
    time: TimeManager,
    channels: Vec<Channel<C>>,
    processor: P,
}

impl<C: Command, P: CommandProcessor<C>> MultiSequencer<C, P> {
    /// Starts paused.
    pub fn new(time: TimeManager, streams: Vec<CommandStream<C>>, processor: P) -> Self {
        time.set_playing(false);
        debug!(channels = streams.len(), "multi-sequencer ready");
        let channels = streams
            .into_iter()
            .map(|stream| Channel {
                stream,
                exhausted: false,
            })
            .collect();
        Self {
            time,
            channels,
            processor,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn stream(&self, channel: usize) -> Option<&CommandStream<C>> {
        self.channels.get(channel).map(|c| &c.stream)
    }

    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }
}

impl<C: Command, P: CommandProcessor<C>> Playback for MultiSequencer<C, P> {
    #[inline]
    fn tick(&mut self, devices: &mut DeviceManager) {
        if self.time.playing() && self.time.count_sample() {
            self.step(devices);
        }
    }

    fn step(&mut self, devices: &mut DeviceManager) {
        let mut active = false;

        for channel in self.channels.iter_mut().filter(|c| !c.exhausted) {
            let (current, playhead) = channel.stream.split_current();
            let Some(command) = current else {
                channel.exhausted = true;
                continue;
            };

            self.processor.handle_command_stream(command, playhead);
            self.processor.handle_device(command, playhead, devices);
            self.processor.handle_time_manager(command, &mut self.time);

            channel.stream.step();
            channel.exhausted = channel.stream.finished();
            active |= !channel.exhausted;
        }

        if !active {
            self.time.set_playing(false);
        }
    }

    fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.stream.reset();
            channel.exhausted = false;
        }
    }

    fn seek(&mut self, cursor: usize) {
        for channel in &mut self.channels {
            channel.stream.set_cursor(cursor);
            channel.exhausted = false;
        }
    }

    fn time_manager(&self) -> &TimeManager {
        &self.time
    }

    fn time_manager_mut(&mut self) -> &mut TimeManager {
        &mut self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsp::{Envelope, Oscillator},
        sequencing::{command::SynthCommand, pitch::midi_note_to_freq, processor::SynthProcessor},
        synth::{instrument::Instrument, voice::Voice},
    };

    fn note(instrument: usize, pitch: u8) -> SynthCommand {
        SynthCommand::Note {
            instrument: Some(instrument),
            voice: 0,
            pitch,
            duration: 0.001,
        }
    }

    fn devices(count: usize) -> DeviceManager {
        let proto = Instrument::mono(Voice::new(Oscillator::saw(), Envelope::zero()));
        let mut devices = DeviceManager::new();
        for _ in 0..count {
            devices.clone_instrument(&proto);
        }
        devices
    }

    fn frequency(devices: &DeviceManager, index: usize) -> f32 {
        devices.instrument(index).unwrap().voices()[0].frequency()
    }

    #[test]
    fn paused_sequencer_does_nothing() {
        let mut devices = devices(1);
        let stream = CommandStream::with_commands(vec![note(0, 69)], false);
        let mut seq = Sequencer::new(TimeManager::event_based(), stream, SynthProcessor::new(1_000));

        for _ in 0..10 {
            seq.tick(&mut devices);
        }
        assert!(!devices.instrument(0).unwrap().is_on());
        assert_eq!(seq.stream().cursor_position(), 0);
    }

    #[test]
    fn event_based_sequence_follows_durations() {
        let mut devices = devices(1);
        let stream =
            CommandStream::with_commands(vec![note(0, 69), note(0, 81), note(0, 93)], false);
        let mut seq = Sequencer::new(TimeManager::event_based(), stream, SynthProcessor::new(1_000));
        seq.time_manager().set_playing(true);

        seq.tick(&mut devices);
        assert!((frequency(&devices, 0) - 440.0).abs() < 1e-3);
        assert!(seq.is_playing());

        // 0.001 s at 1 kHz: the next note is due one sample later
        seq.tick(&mut devices);
        assert!((frequency(&devices, 0) - 880.0).abs() < 1e-3);
        assert!(seq.stream().finished());
        assert!(!seq.is_playing(), "playhead reached the last command");
    }

    #[test]
    fn exhausted_stream_pauses_and_reset_rewinds() {
        let mut devices = devices(1);
        let stream = CommandStream::with_commands(vec![note(0, 60), note(0, 62), note(0, 64)], false);
        let mut seq = Sequencer::new(TimeManager::event_based(), stream, SynthProcessor::new(1_000));
        seq.time_manager().set_playing(true);

        let mut dispatched = Vec::new();
        for _ in 0..10 {
            seq.tick(&mut devices);
            let freq = frequency(&devices, 0);
            if dispatched.last() != Some(&freq) {
                dispatched.push(freq);
            }
        }
        assert!(!seq.is_playing());
        assert_eq!(seq.stream().cursor_position(), 2);
        assert!(seq.stream().finished());
        assert_eq!(dispatched.len(), 2, "the last command only marks the end");
        assert!((frequency(&devices, 0) - midi_note_to_freq(62)).abs() < 1e-3);

        // play after the end dispatches the marker and pauses again
        seq.time_manager().set_playing(true);
        seq.tick(&mut devices);
        assert!((frequency(&devices, 0) - midi_note_to_freq(64)).abs() < 1e-3);
        assert!(!seq.is_playing());

        seq.reset();
        assert_eq!(seq.stream().cursor_position(), 0);
    }

    #[test]
    fn empty_stream_stops_cleanly() {
        let mut devices = devices(1);
        let mut seq = Sequencer::new(
            TimeManager::event_based(),
            CommandStream::<SynthCommand>::new(true),
            SynthProcessor::new(1_000),
        );
        seq.time_manager().set_playing(true);
        seq.tick(&mut devices);
        assert!(!seq.is_playing());
    }

    #[test]
    fn looping_stream_keeps_playing() {
        let mut devices = devices(1);
        let stream = CommandStream::with_commands(vec![note(0, 60), note(0, 62)], true);
        let mut seq = Sequencer::new(TimeManager::event_based(), stream, SynthProcessor::new(1_000));
        seq.time_manager().set_playing(true);

        for _ in 0..5 {
            seq.tick(&mut devices);
        }
        assert!(seq.is_playing());
        assert_eq!(seq.stream().cursor_position(), 1);
    }

    #[test]
    fn jump_repeats_a_section() {
        let mut devices = devices(1);
        let stream = CommandStream::with_commands(
            vec![
                note(0, 60),
                note(0, 62),
                SynthCommand::Jump { cursor: 1 },
                note(0, 64),
            ],
            false,
        );
        let mut seq = Sequencer::new(TimeManager::event_based(), stream, SynthProcessor::new(1_000));
        seq.time_manager().set_playing(true);

        for _ in 0..6 {
            seq.tick(&mut devices);
        }
        assert!(seq.is_playing(), "jump keeps a one-shot stream alive");
        assert!(seq.stream().cursor_position() < 3);
    }

    #[test]
    fn tempo_sequencer_steps_on_the_grid() {
        let mut devices = devices(1);
        let stream = CommandStream::with_commands(vec![note(0, 60), note(0, 72)], true);
        let time = TimeManager::tempo(1_000, 60.0, 1, 0.5).unwrap();
        let mut seq = Sequencer::new(time, stream, SynthProcessor::new(1_000));
        seq.time_manager().set_playing(true);

        for _ in 0..999 {
            seq.tick(&mut devices);
        }
        assert!(!devices.instrument(0).unwrap().is_on());

        seq.tick(&mut devices);
        assert!(devices.instrument(0).unwrap().is_on());
        assert_eq!(seq.stream().cursor_position(), 1);
    }

    #[test]
    fn multi_sequencer_steps_every_channel() {
        let mut devices = devices(2);
        let streams = vec![
            CommandStream::with_commands(vec![note(0, 69)], false),
            CommandStream::with_commands(vec![note(1, 57), note(1, 81), note(1, 93)], false),
        ];
        let mut seq =
            MultiSequencer::new(TimeManager::event_based(), streams, SynthProcessor::new(1_000));
        seq.time_manager().set_playing(true);

        seq.tick(&mut devices);
        assert!((frequency(&devices, 0) - 440.0).abs() < 1e-3);
        assert!((frequency(&devices, 1) - 220.0).abs() < 1e-3);
        assert!(seq.is_playing());

        seq.tick(&mut devices);
        assert!((frequency(&devices, 1) - 880.0).abs() < 1e-3);
        assert!(!seq.is_playing());

        seq.reset();
        assert_eq!(seq.stream(1).unwrap().cursor_position(), 0);
    }

    #[test]
    fn multi_sequencer_with_a_looping_channel_never_stops() {
        let mut devices = devices(2);
        let streams = vec![
            CommandStream::with_commands(vec![note(0, 69)], false),
            CommandStream::with_commands(vec![note(1, 57)], true),
        ];
        let mut seq =
            MultiSequencer::new(TimeManager::event_based(), streams, SynthProcessor::new(1_000));
        seq.time_manager().set_playing(true);

        for _ in 0..20 {
            seq.tick(&mut devices);
        }
        assert!(seq.is_playing());
    }
}
