//! Benchmarks for oscillator shapes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use stepwise::dsp::{Oscillator, OscillatorSwitch, Waveform, Wavetable};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn sweep(osc: &Oscillator, samples: usize) -> f32 {
    let step = 440.0 / SAMPLE_RATE;
    let mut phase = 0.0f32;
    let mut acc = 0.0;
    for _ in 0..samples {
        acc += osc.value(black_box(phase));
        phase += step;
        phase -= phase.floor();
    }
    acc
}

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    let switch = OscillatorSwitch::new()
        .with(Oscillator::triangle())
        .with(Oscillator::saw())
        .with(Oscillator::pulse(0.5));
    let shapes = [
        ("sine", Oscillator::sine()),
        ("saw", Oscillator::saw()),
        ("triangle", Oscillator::triangle()),
        ("pulse", Oscillator::pulse(0.25)),
        ("switch", switch.into()),
    ];

    for &size in BLOCK_SIZES {
        for (name, osc) in &shapes {
            group.bench_with_input(BenchmarkId::new(*name, size), &size, |b, &n| {
                b.iter(|| sweep(osc, n))
            });
        }

        for interpolate in [false, true] {
            let name = if interpolate { "wavetable_lerp" } else { "wavetable" };
            if let Ok(table) = Wavetable::from_waveform(Waveform::Sine, 2048, interpolate) {
                let osc = Oscillator::from(table);
                group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &n| {
                    b.iter(|| sweep(&osc, n))
                });
            }
        }
    }

    group.finish();
}
