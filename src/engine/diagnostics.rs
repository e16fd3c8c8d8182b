use std::sync::atomic::{AtomicU64, Ordering};

/// Faults the audio thread absorbs instead of propagating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Event offset outside its block, or a render request past the buffer.
    OutOfRange,
    /// Malformed event (note above 127, non-finite velocity).
    InvalidEvent,
    /// Note-on with no free voice.
    DroppedNote,
    /// Block event buffer full.
    DroppedEvent,
    /// Sub-range replaced by silence (non-finite output, engine not prepared).
    SilencedRange,
}

/// Fault counters written by the audio thread and polled from elsewhere.
#[derive(Debug, Default)]
pub struct Diagnostics {
    out_of_range_events: AtomicU64,
    invalid_events: AtomicU64,
    dropped_notes: AtomicU64,
    dropped_events: AtomicU64,
    silenced_ranges: AtomicU64,
    table_swaps: AtomicU64,
}

impl Diagnostics {
    pub fn record(&self, fault: Fault) {
        let counter = match fault {
            Fault::OutOfRange => &self.out_of_range_events,
            Fault::InvalidEvent => &self.invalid_events,
            Fault::DroppedNote => &self.dropped_notes,
            Fault::DroppedEvent => &self.dropped_events,
            Fault::SilencedRange => &self.silenced_ranges,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_table_swaps(&self, count: u64) {
        if count > 0 {
            self.table_swaps.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            out_of_range_events: self.out_of_range_events.load(Ordering::Relaxed),
            invalid_events: self.invalid_events.load(Ordering::Relaxed),
            dropped_notes: self.dropped_notes.load(Ordering::Relaxed),
            dropped_events: self.dropped_events.load(Ordering::Relaxed),
            silenced_ranges: self.silenced_ranges.load(Ordering::Relaxed),
            table_swaps: self.table_swaps.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`Diagnostics`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub out_of_range_events: u64,
    pub invalid_events: u64,
    pub dropped_notes: u64,
    pub dropped_events: u64,
    pub silenced_ranges: u64,
    pub table_swaps: u64,
}

impl DiagnosticsSnapshot {
    /// Faults counted so far (table swaps are not faults).
    pub fn total_faults(&self) -> u64 {
        self.out_of_range_events
            + self.invalid_events
            + self.dropped_notes
            + self.dropped_events
            + self.silenced_ranges
    }

    /// Counters accumulated since `earlier`.
    pub fn since(&self, earlier: &DiagnosticsSnapshot) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            out_of_range_events: self.out_of_range_events - earlier.out_of_range_events,
            invalid_events: self.invalid_events - earlier.invalid_events,
            dropped_notes: self.dropped_notes - earlier.dropped_notes,
            dropped_events: self.dropped_events - earlier.dropped_events,
            silenced_ranges: self.silenced_ranges - earlier.silenced_ranges,
            table_swaps: self.table_swaps - earlier.table_swaps,
        }
    }
}
