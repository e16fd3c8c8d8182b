//! Engine configuration.
//!
//! Everything the engine allocates is sized from here, once, before the
//! audio thread starts.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::wavetable::{Harmonic, HarmonicPreset},
    error::{SynthError, SynthResult},
    synth::voice::VoiceEnvelope,
    MAX_BLOCK_SIZE,
};

pub const DEFAULT_TABLE_SIZE: usize = 128;
pub const DEFAULT_VOICE_COUNT: usize = 8;
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    /// Samples per wavetable cycle (excluding the guard point).
    pub table_size: usize,
    /// Partials of the default sound's table.
    pub harmonics: Vec<Harmonic>,
    /// Size of the fixed voice pool.
    pub voice_count: usize,
    /// Upper bound on sounds added to the engine.
    pub max_sounds: usize,
    /// Output channels; every voice is written to all of them.
    pub num_channels: usize,
    /// Level scale and tail-off constants.
    pub envelope: VoiceEnvelope,
    /// Largest block the transport may request.
    pub max_block_size: usize,
    /// Capacity of the producer → audio thread message ring.
    pub queue_capacity: usize,
    /// Sample-offset events accepted per block. Handle messages are applied
    /// as they are drained and do not count against it.
    pub max_events_per_block: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            table_size: DEFAULT_TABLE_SIZE,
            harmonics: HarmonicPreset::Organ.harmonics(DEFAULT_TABLE_SIZE, usize::MAX),
            voice_count: DEFAULT_VOICE_COUNT,
            max_sounds: 4,
            num_channels: 2,
            envelope: VoiceEnvelope::default(),
            max_block_size: MAX_BLOCK_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_events_per_block: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> SynthResult<()> {
        if self.table_size < 2 {
            return Err(SynthError::Configuration("table size must be at least 2"));
        }
        if !self.table_size.is_power_of_two() {
            tracing::warn!(
                table_size = self.table_size,
                "table size is not a power of two"
            );
        }
        if self.voice_count == 0 {
            return Err(SynthError::Configuration("voice pool must hold at least one voice"));
        }
        if self.max_sounds == 0 {
            return Err(SynthError::Configuration("at least one sound is required"));
        }
        if self.num_channels == 0 {
            return Err(SynthError::Configuration("at least one output channel is required"));
        }
        if self.max_block_size == 0 {
            return Err(SynthError::Configuration("block size must be positive"));
        }
        if self.queue_capacity == 0 || self.max_events_per_block == 0 {
            return Err(SynthError::Configuration("event capacities must be positive"));
        }
        self.envelope.validate()
    }
}
