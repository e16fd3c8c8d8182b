use std::sync::Arc;

use crate::dsp::wavetable::Wavetable;
use crate::error::{SynthError, SynthResult};

/*
Phase-Accumulating Wavetable Oscillator
=======================================

The oscillator keeps a read position (`current_index`) into a shared
single-cycle table and advances it by `table_delta` table samples per output
sample:

    table_delta = frequency * table_size / sample_rate

Example: 440 Hz through a 128-sample table at 48 kHz
  - table_delta = 440 * 128 / 48000 ≈ 1.173 table samples per output sample
  - one cycle takes 128 / 1.173 ≈ 109 output samples = 440 cycles per second ✓

Wrapping
--------

After every step the position is folded back into [0, table_size) with a
floating modulo. A single `if index >= size { index -= size }` only works
while table_delta < table_size; at very high pitches or tiny tables the
position would run past the guard point. The modulo handles any delta.

Block Rendering
---------------

`next_block` computes each position in closed form from the block's start,

    position_k = (start + k * table_delta) mod table_size

instead of accumulating `k` additions. The two paths agree to within
floating-point rounding of the summation order, not bit for bit.
*/

pub struct WavetableOscillator {
    table: Arc<Wavetable>,
    current_index: f64,
    table_delta: f64,
}

impl WavetableOscillator {
    pub fn new(table: Arc<Wavetable>) -> Self {
        Self {
            table,
            current_index: 0.0,
            table_delta: 0.0,
        }
    }

    /// Set the playback pitch. Must be called again whenever the sample rate
    /// changes so the delta never goes stale.
    pub fn set_frequency(&mut self, hz: f64, sample_rate: f64) -> SynthResult<()> {
        if !(sample_rate > 0.0) || !sample_rate.is_finite() {
            return Err(SynthError::Configuration("sample rate must be positive"));
        }
        if !(hz >= 0.0) || !hz.is_finite() {
            return Err(SynthError::InvalidArgument(
                "frequency must be finite and non-negative",
            ));
        }
        self.table_delta = hz * (self.table.size() as f64 / sample_rate);
        Ok(())
    }

    /// Restart the cycle at the first table sample.
    pub fn reset(&mut self) {
        self.current_index = 0.0;
    }

    /// Stop advancing. Subsequent reads hold the current table position.
    pub fn clear_delta(&mut self) {
        self.table_delta = 0.0;
    }

    /// Swap in a different table, keeping the same position within the cycle
    /// and the same pitch.
    pub fn set_table(&mut self, table: Arc<Wavetable>) {
        let ratio = table.size() as f64 / self.table.size() as f64;
        self.current_index = (self.current_index * ratio) % table.size() as f64;
        self.table_delta *= ratio;
        self.table = table;
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let value = self.table.read(self.current_index);
        self.current_index = (self.current_index + self.table_delta) % self.table.size() as f64;
        value
    }

    /// Fill `out` with the next `out.len()` samples.
    pub fn next_block(&mut self, out: &mut [f32]) {
        let size = self.table.size() as f64;
        let start = self.current_index;
        let delta = self.table_delta;

        for (k, sample) in out.iter_mut().enumerate() {
            let position = (start + delta * k as f64) % size;
            *sample = self.table.read(position);
        }

        self.current_index = (start + delta * out.len() as f64) % size;
    }

    pub fn current_index(&self) -> f64 {
        self.current_index
    }

    pub fn table_delta(&self) -> f64 {
        self.table_delta
    }

    pub fn table(&self) -> &Arc<Wavetable> {
        &self.table
    }
}
