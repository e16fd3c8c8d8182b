//! Low-level DSP primitives used by the voice layer.
//!
//! These components are allocation-free once constructed and realtime-safe,
//! making them safe to embed directly inside voice structs. They stay focused
//! on the signal-processing math; note handling and mixing live in `synth`.

/// Phase-accumulating oscillator with linear interpolation.
pub mod oscillator;
/// Additive construction of band-limited single-cycle tables.
pub mod wavetable;

pub use oscillator::WavetableOscillator;
pub use wavetable::{Harmonic, HarmonicPreset, Wavetable};
