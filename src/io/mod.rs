// Purpose - external interfaces, format conversions

pub mod converter;
pub mod midi;

/// Non-interleaved output buffer: one contiguous `Vec<f32>` per channel.
///
/// Allocated once at setup with the largest block the transport will ask
/// for; the audio thread only ever writes into it.
#[derive(Debug, Default, Clone)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            channels: vec![vec![0.0; num_samples]; num_channels],
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_samples(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    /// Zero `len` samples starting at `start` in every channel.
    pub fn clear_range(&mut self, start: usize, len: usize) {
        for channel in &mut self.channels {
            channel[start..start + len].fill(0.0);
        }
    }

    /// Add `src` to every channel starting at `start`, scaled by `gain`.
    #[inline]
    pub fn add_to_all(&mut self, start: usize, src: &[f32], gain: f32) {
        for channel in &mut self.channels {
            for (o, s) in channel[start..start + src.len()].iter_mut().zip(src) {
                *o += s * gain;
            }
        }
    }

    #[inline]
    pub fn add_sample(&mut self, index: usize, value: f32) {
        for channel in &mut self.channels {
            channel[index] += value;
        }
    }

    /// True if every sample in `start..start + len` is finite.
    pub fn is_finite_range(&self, start: usize, len: usize) -> bool {
        self.channels
            .iter()
            .all(|c| c[start..start + len].iter().all(|s| s.is_finite()))
    }

    /// Copy the first `frames` frames into an interleaved slice with
    /// `out_channels` channels. Missing source channels repeat the last one.
    pub fn write_interleaved(&self, out: &mut [f32], out_channels: usize, frames: usize) {
        if self.channels.is_empty() {
            out[..frames * out_channels].fill(0.0);
            return;
        }
        let last = self.channels.len() - 1;
        for (i, frame) in out.chunks_mut(out_channels).take(frames).enumerate() {
            for (ch, slot) in frame.iter_mut().enumerate() {
                *slot = self.channels[ch.min(last)][i];
            }
        }
    }
}
