//! Benchmarks for wavetable oscillator reads.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use saavy_wavetable::dsp::{HarmonicPreset, Wavetable, WavetableOscillator};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let table = Arc::new(Wavetable::from_preset(128, HarmonicPreset::Sawtooth, 32).unwrap());

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // One phase update and wrap per sample
        let mut osc = WavetableOscillator::new(table.clone());
        osc.set_frequency(440.0, 48_000.0).unwrap();
        group.bench_with_input(BenchmarkId::new("next_sample", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = osc.next_sample();
                }
                black_box(&buffer);
            })
        });

        // Closed-form positions for the whole block
        let mut osc = WavetableOscillator::new(table.clone());
        osc.set_frequency(440.0, 48_000.0).unwrap();
        group.bench_with_input(BenchmarkId::new("next_block", size), &size, |b, _| {
            b.iter(|| {
                osc.next_block(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
