pub mod config;
pub mod dsp; // Wavetables and the oscillator that reads them
pub mod engine; // Block rendering, control handle, diagnostics
pub mod error;
pub mod io;
pub mod synth; // Voice management and polyphony

pub use config::SynthConfig;
pub use engine::{
    diagnostics::{Diagnostics, DiagnosticsSnapshot},
    handle::SynthHandle,
    SynthEngine,
};
pub use error::{SynthError, SynthResult};

pub const MAX_BLOCK_SIZE: usize = 2048;
