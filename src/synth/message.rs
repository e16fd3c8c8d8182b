use crate::error::{SynthError, SynthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEventKind {
    NoteOn,
    NoteOff,
}

/// A note event scheduled inside the block it is delivered with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub kind: NoteEventKind,
    /// MIDI note number, 0-127.
    pub note: u8,
    /// Normalised velocity, 0.0-1.0.
    pub velocity: f32,
    /// Frame within the current block at which the event takes effect.
    pub sample_offset: u32,
    pub channel: u8,
}

impl NoteEvent {
    pub fn note_on(channel: u8, note: u8, velocity: f32, sample_offset: u32) -> Self {
        Self {
            kind: NoteEventKind::NoteOn,
            note,
            velocity,
            sample_offset,
            channel,
        }
    }

    pub fn note_off(channel: u8, note: u8, velocity: f32, sample_offset: u32) -> Self {
        Self {
            kind: NoteEventKind::NoteOff,
            note,
            velocity,
            sample_offset,
            channel,
        }
    }

    /// Check the event against a block of `num_samples` frames.
    pub fn validate(&self, num_samples: usize) -> SynthResult<()> {
        if self.note > 127 {
            return Err(SynthError::InvalidArgument("note number above 127"));
        }
        if !self.velocity.is_finite() {
            return Err(SynthError::InvalidArgument("velocity must be finite"));
        }
        if self.sample_offset as usize >= num_samples {
            return Err(SynthError::OutOfRange {
                offset: self.sample_offset,
                num_samples,
            });
        }
        Ok(())
    }
}

/// Control messages sent from a producer thread to the audio thread.
///
/// Messages are drained at the top of each block and take effect at its
/// first frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn {
        channel: u8,
        note: u8,
        velocity: f32,
    },
    NoteOff {
        channel: u8,
        note: u8,
        velocity: f32,
        allow_tail_off: bool,
    },
    /// Release every sounding voice, optionally restricted to one channel.
    AllNotesOff {
        channel: Option<u8>,
        allow_tail_off: bool,
    },
}
