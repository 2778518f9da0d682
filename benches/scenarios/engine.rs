//! Benchmarks for the sequenced render path.
//!
//! A four-part looping song on the player's switch-oscillator prototype,
//! rendered block by block as the audio callback would.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use stepwise::{
    dsp::{Envelope, Oscillator, OscillatorSwitch},
    sequencing::{CommandStream, Sequencer, SynthCommand, SynthProcessor, TimeManager},
    synth::{DeviceManager, Instrument, Voice},
    Engine, EngineConfig,
};

use crate::BLOCK_SIZES;

const PARTS: usize = 4;

fn song() -> Vec<SynthCommand> {
    let pitches = [48u8, 55, 60, 64, 67, 72, 0, 60];
    let mut commands = Vec::new();
    for (step, &pitch) in pitches.iter().enumerate() {
        for part in 0..PARTS {
            commands.push(SynthCommand::Note {
                instrument: Some(part),
                voice: 0,
                pitch: if pitch == 0 { 0 } else { pitch + (part as u8) * 3 },
                duration: if part == PARTS - 1 { 0.05 } else { 0.0 },
            });
        }
        if step % 4 == 3 {
            commands.push(SynthCommand::Waveshape {
                instrument: Some(step % PARTS),
                index: step % 3,
            });
        }
    }
    commands
}

fn build(config: &EngineConfig) -> Engine<Sequencer<SynthCommand, SynthProcessor>> {
    let switch = OscillatorSwitch::new()
        .with(Oscillator::triangle())
        .with(Oscillator::saw())
        .with(Oscillator::pulse(0.5));
    let proto = Instrument::mono(Voice::new(
        switch.into(),
        Envelope::adsr(0.01, 2.0, 0.2, 0.5),
    ));

    let mut devices = DeviceManager::new();
    for _ in 0..PARTS {
        devices.clone_instrument(&proto);
    }

    let sequencer = Sequencer::new(
        TimeManager::event_based(),
        CommandStream::with_commands(song(), true),
        SynthProcessor::new(config.sample_rate),
    );
    let mut engine = match Engine::new(config, sequencer, devices) {
        Ok(engine) => engine,
        Err(err) => panic!("bench engine config rejected: {err}"),
    };
    engine.play();
    engine
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let config = EngineConfig::default().with_buffer_size(size);
        let mut engine = build(&config);
        let mut block = vec![0.0f32; size * 2];

        group.bench_with_input(BenchmarkId::new("song_4_parts", size), &size, |b, _| {
            b.iter(|| engine.render_block(black_box(&mut block)))
        });

        let mut idle = build(&config);
        idle.pause();
        group.bench_with_input(BenchmarkId::new("paused", size), &size, |b, _| {
            b.iter(|| idle.render_block(black_box(&mut block)))
        });
    }

    group.finish();
}
