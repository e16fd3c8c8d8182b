//! Benchmarks for full engine blocks.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_wavetable::{synth::message::NoteEvent, SynthConfig, SynthEngine};

use crate::BLOCK_SIZES;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        // === FULL POOL, HELD ===
        // All eight voices active for the whole block
        let (mut engine, _handle) = SynthEngine::new(SynthConfig::default()).unwrap();
        engine.prepare_to_play(size, 48_000.0).unwrap();
        let mut buffer = engine.create_buffer();
        let chord: Vec<NoteEvent> = (0..8)
            .map(|i| NoteEvent::note_on(0, 48 + i * 3, 0.8, 0))
            .collect();
        engine.render_block(&mut buffer, 0, size, &chord);

        group.bench_with_input(BenchmarkId::new("held_8", size), &size, |b, &size| {
            b.iter(|| {
                engine.render_block(black_box(&mut buffer), 0, size, &[]);
            })
        });

        // === SPLIT BLOCK ===
        // Eight note events spread across the block force eight sub-ranges
        let (mut engine, _handle) = SynthEngine::new(SynthConfig::default()).unwrap();
        engine.prepare_to_play(size, 48_000.0).unwrap();
        let mut buffer = engine.create_buffer();
        let step = (size / 8) as u32;
        let mut toggle = false;

        group.bench_with_input(BenchmarkId::new("split_8", size), &size, |b, &size| {
            b.iter(|| {
                toggle = !toggle;
                let events: [NoteEvent; 8] = std::array::from_fn(|i| {
                    let note = 60 + i as u8;
                    let offset = i as u32 * step;
                    if toggle {
                        NoteEvent::note_on(0, note, 0.8, offset)
                    } else {
                        NoteEvent::note_off(0, note, 0.0, offset)
                    }
                });
                engine.render_block(black_box(&mut buffer), 0, size, &events);
            })
        });
    }

    group.finish();
}
