#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f64::consts::{PI, TAU};

use crate::error::{SynthError, SynthResult};

/*
Wavetable Construction
======================

A wavetable holds exactly one cycle of a waveform. Instead of evaluating
sin() for every output sample, an oscillator walks through the table at a
speed proportional to the pitch it wants to play and interpolates between
neighbouring entries.

Additive Build
--------------

Each table is a weighted sum of sine partials:

    table[i] = Σ weight_h · sin(2π · multiple_h · i / size)      i in [0, size)

  multiple  Which harmonic of the fundamental (1 = fundamental, 2 = octave,
            3 = octave + fifth, ...).
  weight    Linear amplitude of that partial. Weights are NOT normalised:
            keeping the sum inside [-1, 1] is the caller's job.

Because the table only ever contains partials we explicitly put there, it is
band-limited at the table level: a table of `size` samples can represent
partials up to `size / 2 - 1` without folding them back.

The Guard Point
---------------

    index:   0    1    2   ...  size-1 | size
    value:   s0   s1   s2  ...  sN-1   | s0   <- copy of the first sample

Linear interpolation reads table[i] and table[i + 1]. When i = size - 1 the
second read lands on the guard point, which closes the cycle without a
branch or a modulo in the hot loop. The table is therefore `size + 1`
samples long.

Determinism
-----------

Partials are accumulated in f64 in a fixed order and rounded to f32 once, so
identical arguments always yield bit-identical tables.
*/

/// One sine partial of a wavetable: `weight · sin(multiple · θ)`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    /// Harmonic number relative to the fundamental (1 = fundamental).
    pub multiple: u32,
    /// Linear amplitude of the partial.
    pub weight: f32,
}

impl Harmonic {
    pub const fn new(multiple: u32, weight: f32) -> Self {
        Self { multiple, weight }
    }
}

/// Classic waveforms expressed as truncated Fourier series.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarmonicPreset {
    /// Fundamental only.
    Sine,
    /// All harmonics, amplitude 1/n.
    Sawtooth,
    /// Odd harmonics, amplitude 1/n.
    Square,
    /// Odd harmonics, alternating sign, amplitude 1/n².
    Triangle,
    /// First four harmonics at halving weights (drawbar-style).
    Organ,
}

impl HarmonicPreset {
    /// Partials for this preset that fit a table of `table_size` samples,
    /// capped at `limit` partials.
    pub fn harmonics(self, table_size: usize, limit: usize) -> Vec<Harmonic> {
        let highest = max_multiple(table_size);
        let odd = |n: &u32| n % 2 == 1;

        match self {
            HarmonicPreset::Sine => vec![Harmonic::new(1, 1.0)].into_iter().take(limit).collect(),
            HarmonicPreset::Sawtooth => (1..=highest)
                .take(limit)
                .map(|n| {
                    let sign = if n % 2 == 1 { 1.0 } else { -1.0 };
                    Harmonic::new(n, (sign * 2.0 / (PI * n as f64)) as f32)
                })
                .collect(),
            HarmonicPreset::Square => (1..=highest)
                .filter(odd)
                .take(limit)
                .map(|n| Harmonic::new(n, (4.0 / (PI * n as f64)) as f32))
                .collect(),
            HarmonicPreset::Triangle => (1..=highest)
                .filter(odd)
                .take(limit)
                .map(|n| {
                    let sign = if (n / 2) % 2 == 0 { 1.0 } else { -1.0 };
                    Harmonic::new(n, (sign * 8.0 / (PI * PI * (n as f64).powi(2))) as f32)
                })
                .collect(),
            HarmonicPreset::Organ => [0.5, 0.25, 0.125, 0.0625]
                .iter()
                .zip(1..=highest)
                .take(limit)
                .map(|(&w, n)| Harmonic::new(n, w))
                .collect(),
        }
    }
}

/// Highest partial a table of `size` samples can hold below its Nyquist bin.
fn max_multiple(size: usize) -> u32 {
    let highest = size.saturating_sub(1) / 2;
    u32::try_from(highest).unwrap_or(u32::MAX)
}

/// An immutable single-cycle waveform with a trailing guard sample.
///
/// Built once off the audio thread and shared read-only (usually through an
/// `Arc`) by every oscillator that plays it.
#[derive(Debug, Clone, PartialEq)]
pub struct Wavetable {
    samples: Box<[f32]>,
}

impl Wavetable {
    /// Synthesize a table of `size` samples (plus guard) from `harmonics`.
    ///
    /// Fails with [`SynthError::InvalidArgument`] if `size < 2`, if
    /// `harmonics` is empty, or if a partial is zero, above the table's
    /// Nyquist bin, or carries a non-finite weight, or if the weights sum
    /// past the range of an `f32` sample.
    pub fn build(size: usize, harmonics: &[Harmonic]) -> SynthResult<Self> {
        if size < 2 {
            return Err(SynthError::InvalidArgument(
                "table size must be at least 2",
            ));
        }
        if harmonics.is_empty() {
            return Err(SynthError::InvalidArgument("harmonic list is empty"));
        }

        let highest = max_multiple(size);
        for h in harmonics {
            if h.multiple == 0 {
                return Err(SynthError::InvalidArgument(
                    "harmonic multiple must be at least 1",
                ));
            }
            if h.multiple > highest {
                return Err(SynthError::InvalidArgument(
                    "harmonic multiple exceeds what the table can represent",
                ));
            }
            if !h.weight.is_finite() {
                return Err(SynthError::InvalidArgument(
                    "harmonic weight must be finite",
                ));
            }
        }

        let mut samples = vec![0.0f32; size + 1].into_boxed_slice();
        for (i, sample) in samples.iter_mut().take(size).enumerate() {
            let theta = TAU * i as f64 / size as f64;
            let value: f64 = harmonics
                .iter()
                .map(|h| h.weight as f64 * (h.multiple as f64 * theta).sin())
                .sum();
            *sample = value as f32;
            if !sample.is_finite() {
                return Err(SynthError::InvalidArgument(
                    "harmonic weights overflow the table's sample range",
                ));
            }
        }
        samples[size] = samples[0];
        debug_assert_eq!(samples[size].to_bits(), samples[0].to_bits());

        tracing::debug!(size, partials = harmonics.len(), "wavetable built");

        Ok(Self { samples })
    }

    /// Build a table from one of the [`HarmonicPreset`] series.
    pub fn from_preset(size: usize, preset: HarmonicPreset, limit: usize) -> SynthResult<Self> {
        Self::build(size, &preset.harmonics(size, limit))
    }

    /// Number of samples in one cycle (excluding the guard point).
    #[inline]
    pub fn size(&self) -> usize {
        self.samples.len() - 1
    }

    /// All samples including the trailing guard point.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Linearly interpolated read at `position`, which must lie in `[0, size)`.
    #[inline]
    pub fn read(&self, position: f64) -> f32 {
        debug_assert!(position >= 0.0 && position < self.size() as f64);
        let index = position as usize;
        let frac = (position - index as f64) as f32;
        let a = self.samples[index];
        let b = self.samples[index + 1];
        a + frac * (b - a)
    }
}
