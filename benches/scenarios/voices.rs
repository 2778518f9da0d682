//! Benchmarks for complete voices and instruments.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use stepwise::{
    dsp::{Envelope, Oscillator, WaveShaper},
    synth::{Instrument, Voice},
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn envelope() -> Envelope {
    Envelope::adsr(0.01, 0.1, 0.6, 0.2)
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let dt = 1.0 / SAMPLE_RATE;

    let mut voices = [
        ("osc", Voice::new(Oscillator::saw(), envelope())),
        (
            "fm",
            Voice::fm(Oscillator::sine(), Oscillator::sine(), envelope(), 2.0, 1.5),
        ),
        (
            "phase_distortion",
            Voice::phase_distortion(
                Oscillator::sine(),
                WaveShaper::HardSync { ratio: 2.5 },
                envelope(),
            ),
        ),
        (
            "unison",
            Voice::unison(Oscillator::saw(), envelope(), &[-12.0, -5.0, 0.0, 5.0, 12.0]),
        ),
    ];
    for (_, voice) in &mut voices {
        voice.note_on(110.0);
    }

    for &size in BLOCK_SIZES {
        for (name, voice) in &mut voices {
            group.bench_with_input(BenchmarkId::new(*name, size), &size, |b, &n| {
                b.iter(|| {
                    let mut acc = 0.0;
                    for _ in 0..n {
                        acc += voice.process(black_box(dt));
                    }
                    acc
                })
            });
        }

        // Eight-voice pad with every voice sounding
        let mut pad = Instrument::poly(&Voice::new(Oscillator::saw(), envelope()), 8);
        for (i, freq) in [110.0, 138.6, 164.8, 220.0, 277.2, 329.6, 440.0, 554.4]
            .into_iter()
            .enumerate()
        {
            pad.note_on(i, freq);
        }
        group.bench_with_input(BenchmarkId::new("poly_pad_8", size), &size, |b, &n| {
            b.iter(|| {
                let mut acc = (0.0, 0.0);
                for _ in 0..n {
                    let (l, r) = pad.process(black_box(dt));
                    acc.0 += l;
                    acc.1 += r;
                }
                acc
            })
        });
    }

    group.finish();
}
