//! Benchmarks for low-level DSP primitives.

mod oscillator;
mod wavetable;

pub use oscillator::bench_oscillator;
pub use wavetable::bench_wavetable;
