//! Real-world scenario benchmarks.
//!
//! These benchmarks model the worst case the callback has to survive:
//! every voice in the pool sounding at once.

mod voices;

pub use voices::bench_voices;
