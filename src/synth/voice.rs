use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{oscillator::WavetableOscillator, wavetable::Wavetable},
    error::{SynthError, SynthResult},
    io::{midi::midi_note_to_freq, AudioBuffer},
    synth::sound::{Sound, SoundId, VoiceKind},
};

/*
Voice Lifecycle
===============

    ┌──────┐  start_note   ┌────────┐  stop_note(tail)  ┌────────────┐
    │ Idle │ ────────────→ │ Active │ ────────────────→ │ TailingOff │
    └──────┘               └────────┘                   └────────────┘
       ↑                       │                              │
       │   stop_note(no tail)  │        tail_off ≤ threshold  │
       └───────────────────────┴──────────────────────────────┘

  level     velocity · level_scale, fixed for the life of the note.

  tail_off  Release multiplier. Starts at 1.0 on stop_note and is multiplied
            by tail_off_rate after every rendered sample. With the default
            0.99 / 0.005 the voice is silent after
            ceil(ln 0.005 / ln 0.99) = 528 samples.

A voice whose oscillator delta is zero renders nothing and reads no table.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,       // Available for allocation
    Active,     // Note held
    TailingOff, // Note released, exponential decay in progress
}

/// Amplitude shaping constants shared by every voice of a synth.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceEnvelope {
    /// Velocity (0-1) to peak amplitude.
    pub level_scale: f32,
    /// Per-sample decay multiplier while tailing off.
    pub tail_off_rate: f32,
    /// Tail-off multiplier below which the voice goes idle.
    pub tail_off_threshold: f32,
}

pub const DEFAULT_LEVEL_SCALE: f32 = 0.15;
pub const DEFAULT_TAIL_OFF_RATE: f32 = 0.99;
pub const DEFAULT_TAIL_OFF_THRESHOLD: f32 = 0.005;

impl Default for VoiceEnvelope {
    fn default() -> Self {
        Self {
            level_scale: DEFAULT_LEVEL_SCALE,
            tail_off_rate: DEFAULT_TAIL_OFF_RATE,
            tail_off_threshold: DEFAULT_TAIL_OFF_THRESHOLD,
        }
    }
}

impl VoiceEnvelope {
    pub fn validate(&self) -> SynthResult<()> {
        if !self.level_scale.is_finite() || self.level_scale < 0.0 {
            return Err(SynthError::Configuration(
                "level scale must be finite and non-negative",
            ));
        }
        if !(self.tail_off_rate > 0.0 && self.tail_off_rate < 1.0) {
            return Err(SynthError::Configuration(
                "tail-off rate must lie strictly between 0 and 1",
            ));
        }
        if !(self.tail_off_threshold > 0.0 && self.tail_off_threshold < 1.0) {
            return Err(SynthError::Configuration(
                "tail-off threshold must lie strictly between 0 and 1",
            ));
        }
        Ok(())
    }
}

/// One monophonic wavetable voice.
pub struct Voice {
    kind: VoiceKind,
    envelope: VoiceEnvelope,
    state: VoiceState,
    note: Option<u8>,
    channel: u8,
    sound: Option<SoundId>,
    frequency: f64,
    level: f32,
    tail_off: f32,
    sample_rate: f64,
    oscillator: Option<WavetableOscillator>,
}

impl Voice {
    pub fn new(kind: VoiceKind, envelope: VoiceEnvelope) -> Self {
        Self {
            kind,
            envelope,
            state: VoiceState::Idle,
            note: None,
            channel: 0,
            sound: None,
            frequency: 0.0,
            level: 0.0,
            tail_off: 0.0,
            sample_rate: 0.0,
            oscillator: None,
        }
    }

    pub fn can_play_sound(&self, sound: &Sound) -> bool {
        sound.voice_kinds().contains(self.kind)
    }

    /// Store the device rate and recompute the delta of a sounding note.
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> SynthResult<()> {
        if !(sample_rate > 0.0) || !sample_rate.is_finite() {
            return Err(SynthError::Configuration("sample rate must be positive"));
        }
        self.sample_rate = sample_rate;
        if self.state != VoiceState::Idle {
            if let Some(osc) = self.oscillator.as_mut() {
                osc.set_frequency(self.frequency, sample_rate)?;
            }
        }
        Ok(())
    }

    pub fn start_note(
        &mut self,
        channel: u8,
        note: u8,
        velocity: f32,
        sound_id: SoundId,
        sound: &Sound,
    ) -> SynthResult<()> {
        if self.state != VoiceState::Idle {
            return Err(SynthError::InvalidArgument("voice is already sounding"));
        }

        let frequency = midi_note_to_freq(note);
        let mut osc = WavetableOscillator::new(Arc::clone(sound.table()));
        osc.set_frequency(frequency, self.sample_rate)?;

        self.oscillator = Some(osc);
        self.frequency = frequency;
        self.note = Some(note);
        self.channel = channel;
        self.sound = Some(sound_id);
        self.level = velocity.clamp(0.0, 1.0) * self.envelope.level_scale;
        self.tail_off = 0.0;
        self.state = VoiceState::Active;
        Ok(())
    }

    pub fn stop_note(&mut self, allow_tail_off: bool) {
        match (self.state, allow_tail_off) {
            (VoiceState::Idle, _) => {}
            (VoiceState::Active, true) => {
                self.tail_off = 1.0;
                self.state = VoiceState::TailingOff;
            }
            // Already decaying: keep the current multiplier.
            (VoiceState::TailingOff, true) => {}
            (_, false) => self.clear_current_note(),
        }
    }

    fn clear_current_note(&mut self) {
        self.state = VoiceState::Idle;
        self.note = None;
        self.sound = None;
        self.tail_off = 0.0;
        if let Some(osc) = self.oscillator.as_mut() {
            osc.clear_delta();
        }
    }

    /// Point the oscillator at a newly published table for the same sound.
    pub fn retarget_table(&mut self, table: &Arc<Wavetable>) {
        if let Some(osc) = self.oscillator.as_mut() {
            osc.set_table(Arc::clone(table));
        }
    }

    /// Add `num_samples` of output into every channel of `output` at `start`.
    ///
    /// `scratch` is caller-owned workspace for block rendering; its length
    /// bounds the chunk size, not the number of samples rendered.
    pub fn render_next_block(
        &mut self,
        output: &mut AudioBuffer,
        start: usize,
        num_samples: usize,
        scratch: &mut [f32],
    ) {
        let Some(osc) = self.oscillator.as_mut() else {
            return;
        };
        if osc.table_delta() == 0.0 {
            return;
        }

        match self.state {
            VoiceState::Idle => {}
            VoiceState::Active if !scratch.is_empty() => {
                let mut offset = 0;
                while offset < num_samples {
                    let len = (num_samples - offset).min(scratch.len());
                    let chunk = &mut scratch[..len];
                    osc.next_block(chunk);
                    output.add_to_all(start + offset, chunk, self.level);
                    offset += chunk.len();
                }
            }
            VoiceState::Active => {
                for i in 0..num_samples {
                    let sample = osc.next_sample() * self.level;
                    output.add_sample(start + i, sample);
                }
            }
            VoiceState::TailingOff => {
                let mut finished = false;
                for i in 0..num_samples {
                    let sample = osc.next_sample() * self.level * self.tail_off;
                    output.add_sample(start + i, sample);

                    self.tail_off *= self.envelope.tail_off_rate;
                    if self.tail_off <= self.envelope.tail_off_threshold {
                        finished = true;
                        break;
                    }
                }
                if finished {
                    self.clear_current_note();
                }
            }
        }
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == VoiceState::Idle
    }

    pub fn is_playing(&self, channel: u8, note: u8) -> bool {
        self.state != VoiceState::Idle && self.channel == channel && self.note == Some(note)
    }

    pub fn note(&self) -> Option<u8> {
        self.note
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn sound(&self) -> Option<SoundId> {
        self.sound
    }

    pub fn kind(&self) -> VoiceKind {
        self.kind
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn tail_off(&self) -> f32 {
        self.tail_off
    }

    /// Table samples advanced per output sample; zero when silent.
    pub fn angle_delta(&self) -> f64 {
        self.oscillator.as_ref().map_or(0.0, WavetableOscillator::table_delta)
    }

    pub fn phase(&self) -> f64 {
        self.oscillator
            .as_ref()
            .map_or(0.0, WavetableOscillator::current_index)
    }
}
