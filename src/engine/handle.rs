use std::sync::Arc;

use rtrb::Producer;

use crate::{
    dsp::wavetable::{Harmonic, Wavetable},
    engine::diagnostics::{Diagnostics, DiagnosticsSnapshot},
    error::{SynthError, SynthResult},
    synth::{
        message::SynthMessage,
        sound::{SoundId, TableSlot},
    },
};

/// Control side of a [`SynthEngine`](crate::engine::SynthEngine).
///
/// Owned by the UI or MIDI thread. Notes travel through a bounded SPSC ring
/// and are applied at the start of the next rendered block; tables are
/// rebuilt here and published with an atomic swap.
pub struct SynthHandle {
    tx: Producer<SynthMessage>,
    slots: Vec<TableSlot>,
    retired: Vec<Arc<Wavetable>>,
    diagnostics: Arc<Diagnostics>,
    last_report: DiagnosticsSnapshot,
}

impl SynthHandle {
    pub(crate) fn new(
        tx: Producer<SynthMessage>,
        slots: Vec<TableSlot>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            tx,
            slots,
            retired: Vec::new(),
            diagnostics,
            last_report: DiagnosticsSnapshot::default(),
        }
    }

    pub fn send(&mut self, message: SynthMessage) -> SynthResult<()> {
        self.tx
            .push(message)
            .map_err(|_| SynthError::ResourceExhausted("message queue full"))
    }

    pub fn note_on(&mut self, channel: u8, note: u8, velocity: f32) -> SynthResult<()> {
        self.send(SynthMessage::NoteOn {
            channel,
            note,
            velocity,
        })
    }

    pub fn note_off(
        &mut self,
        channel: u8,
        note: u8,
        velocity: f32,
        allow_tail_off: bool,
    ) -> SynthResult<()> {
        self.send(SynthMessage::NoteOff {
            channel,
            note,
            velocity,
            allow_tail_off,
        })
    }

    pub fn all_notes_off(&mut self, channel: Option<u8>, allow_tail_off: bool) -> SynthResult<()> {
        self.send(SynthMessage::AllNotesOff {
            channel,
            allow_tail_off,
        })
    }

    /// Free slots left in the message ring.
    pub fn available(&self) -> usize {
        self.tx.slots()
    }

    /// Build a new table for `sound` on this thread and publish it.
    ///
    /// The audio thread switches over at its next block boundary. The
    /// replaced table is kept here until [`collect_retired`](Self::collect_retired)
    /// finds it unused.
    pub fn replace_table(
        &mut self,
        sound: SoundId,
        size: usize,
        harmonics: &[Harmonic],
    ) -> SynthResult<()> {
        let slot = self
            .slots
            .get(sound.0)
            .ok_or(SynthError::InvalidArgument("unknown sound"))?;
        let table = Wavetable::build(size, harmonics)?;
        let previous = slot.replace(table);
        self.retired.push(previous);
        tracing::debug!(sound = sound.0, size, "published replacement wavetable");
        Ok(())
    }

    /// Table currently published for `sound`.
    pub fn table(&self, sound: SoundId) -> Option<Arc<Wavetable>> {
        self.slots.get(sound.0).map(TableSlot::current)
    }

    /// Drop retired tables the audio thread no longer references.
    /// Returns how many are still pending.
    pub fn collect_retired(&mut self) -> usize {
        self.retired.retain(|table| Arc::strong_count(table) > 1);
        self.retired.len()
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// Log faults counted since the previous report and return the totals.
    pub fn report_diagnostics(&mut self) -> DiagnosticsSnapshot {
        let current = self.diagnostics.snapshot();
        let delta = current.since(&self.last_report);
        if delta.total_faults() > 0 {
            tracing::warn!(
                out_of_range = delta.out_of_range_events,
                invalid = delta.invalid_events,
                dropped_notes = delta.dropped_notes,
                dropped_events = delta.dropped_events,
                silenced = delta.silenced_ranges,
                "audio thread faults"
            );
        }
        if delta.table_swaps > 0 {
            tracing::debug!(swaps = delta.table_swaps, "wavetables swapped");
        }
        self.last_report = current;
        current
    }
}
