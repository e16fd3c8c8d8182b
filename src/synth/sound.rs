use std::ops::RangeInclusive;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::dsp::wavetable::Wavetable;
use crate::error::{SynthError, SynthResult};

/// Timbral family a voice is built for. At most 32 kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceKind(u8);

impl VoiceKind {
    pub const DEFAULT: VoiceKind = VoiceKind(0);

    pub fn new(index: u8) -> SynthResult<Self> {
        if index >= 32 {
            return Err(SynthError::InvalidArgument("voice kind index must be below 32"));
        }
        Ok(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

impl Default for VoiceKind {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Bitmask of voice kinds a sound may be played by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceKinds(u32);

impl VoiceKinds {
    pub const ALL: VoiceKinds = VoiceKinds(u32::MAX);
    pub const NONE: VoiceKinds = VoiceKinds(0);

    pub fn only(kind: VoiceKind) -> Self {
        Self(1 << kind.0)
    }

    pub fn with(self, kind: VoiceKind) -> Self {
        Self(self.0 | 1 << kind.0)
    }

    #[inline]
    pub fn contains(self, kind: VoiceKind) -> bool {
        self.0 & (1 << kind.0) != 0
    }
}

/// Index of a sound inside a [`PolySynth`](crate::synth::poly::PolySynth).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(pub usize);

/// Writer side of a sound's wavetable.
///
/// Lives off the audio thread. A store is a single atomic pointer swap, so
/// the audio thread sees either the old table or the new one, never a
/// partially written one.
#[derive(Clone)]
pub struct TableSlot {
    slot: Arc<ArcSwap<Wavetable>>,
}

impl TableSlot {
    /// Publish `table` and hand back the table it replaced.
    pub fn replace(&self, table: Wavetable) -> Arc<Wavetable> {
        self.slot.swap(Arc::new(table))
    }

    pub fn current(&self) -> Arc<Wavetable> {
        self.slot.load_full()
    }
}

/// A playable timbre: a wavetable plus the rules for which notes, channels
/// and voice kinds it applies to.
pub struct Sound {
    slot: Arc<ArcSwap<Wavetable>>,
    table: Arc<Wavetable>,
    voice_kinds: VoiceKinds,
    notes: RangeInclusive<u8>,
    channels: u16,
}

impl Sound {
    pub fn new(table: Wavetable) -> Self {
        let table = Arc::new(table);
        Self {
            slot: Arc::new(ArcSwap::new(Arc::clone(&table))),
            table,
            voice_kinds: VoiceKinds::ALL,
            notes: 0..=127,
            channels: u16::MAX,
        }
    }

    pub fn with_voice_kinds(mut self, kinds: VoiceKinds) -> Self {
        self.voice_kinds = kinds;
        self
    }

    pub fn with_note_range(mut self, notes: RangeInclusive<u8>) -> Self {
        self.notes = notes;
        self
    }

    /// Restrict the sound to the MIDI channels set in `mask` (bit n = channel n).
    pub fn with_channel_mask(mut self, mask: u16) -> Self {
        self.channels = mask;
        self
    }

    pub fn applies_to_note(&self, note: u8) -> bool {
        self.notes.contains(&note)
    }

    pub fn applies_to_channel(&self, channel: u8) -> bool {
        channel < 16 && self.channels & (1 << channel) != 0
    }

    pub fn voice_kinds(&self) -> VoiceKinds {
        self.voice_kinds
    }

    /// Table the audio thread is currently playing.
    pub fn table(&self) -> &Arc<Wavetable> {
        &self.table
    }

    pub fn table_slot(&self) -> TableSlot {
        TableSlot {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Pick up a table published through the slot since the last call.
    ///
    /// Returns the new table if it changed. Never drops the last reference to
    /// the previous table: the writer keeps it until it is collected.
    pub fn refresh(&mut self) -> Option<&Arc<Wavetable>> {
        let published = self.slot.load();
        if Arc::ptr_eq(&published, &self.table) {
            return None;
        }
        self.table = arc_swap::Guard::into_inner(published);
        Some(&self.table)
    }
}
