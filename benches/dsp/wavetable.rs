//! Benchmarks for additive table construction (runs off the audio thread).

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_wavetable::dsp::{HarmonicPreset, Wavetable};

pub fn bench_wavetable(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/wavetable");

    for &size in &[128usize, 2048] {
        let harmonics = HarmonicPreset::Sawtooth.harmonics(size, 64);
        group.bench_with_input(BenchmarkId::new("sawtooth_64", size), &size, |b, &size| {
            b.iter(|| Wavetable::build(black_box(size), black_box(&harmonics)).unwrap())
        });
    }

    group.finish();
}
