//! Benchmarks for the ADSR envelope generator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use stepwise::dsp::Envelope;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn run(env: &mut Envelope, samples: usize) -> f32 {
    let dt = 1.0 / SAMPLE_RATE;
    let mut acc = 0.0;
    for _ in 0..samples {
        acc += env.process(black_box(dt));
    }
    acc
}

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let dt = 1.0 / SAMPLE_RATE;

    for &size in BLOCK_SIZES {
        // Attack phase (ramping up)
        let mut env = Envelope::adsr(10.0, 0.1, 0.7, 0.3);
        env.trig(true);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, &n| {
            b.iter(|| run(&mut env, n))
        });

        // Sustain phase (holding steady)
        let mut env = Envelope::adsr(0.001, 0.001, 0.7, 0.3);
        env.trig(true);
        for _ in 0..200 {
            env.process(dt);
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, &n| {
            b.iter(|| run(&mut env, n))
        });

        // Gate envelope, no time dependency
        let mut env = Envelope::zero();
        env.trig(true);
        group.bench_with_input(BenchmarkId::new("zero", size), &size, |b, &n| {
            b.iter(|| run(&mut env, n))
        });
    }

    group.finish();
}
