//! saavy - wavetable synth demo
//!
//! Run with: cargo run
//! Set RUST_LOG=saavy_wavetable=debug to see table swaps and voice traffic.

mod app;

use app::Demo;
use saavy_wavetable::dsp::HarmonicPreset;
use tracing_subscriber::EnvFilter;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // A minor arpeggio, then the table is rebuilt as a sawtooth while notes ring
    Demo::new()
        .bpm(132.0)
        .notes(&[57, 60, 64, 69, 72, 69, 64, 60])
        .repeats(4)
        .swap_to(HarmonicPreset::Sawtooth, 24)
        .run()
}
