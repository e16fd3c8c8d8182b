use crate::{
    error::{SynthError, SynthResult},
    synth::message::NoteEvent,
};

/// Per-block event buffer with a fixed capacity.
///
/// Events are collected, ordered by sample offset and then replayed by the
/// engine at their sub-block boundaries. Sorting is an in-place insertion
/// sort: stable (ties keep queue order) and allocation-free, which
/// `slice::sort_by_key` does not guarantee.
pub struct BlockScheduler {
    events: Vec<NoteEvent>,
    capacity: usize,
}

impl BlockScheduler {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn push(&mut self, event: NoteEvent) -> SynthResult<()> {
        if self.events.len() >= self.capacity {
            return Err(SynthError::ResourceExhausted("block event buffer is full"));
        }
        self.events.push(event);
        Ok(())
    }

    /// Order events by ascending sample offset, preserving arrival order
    /// between events that share an offset.
    pub fn sort(&mut self) {
        for i in 1..self.events.len() {
            let mut j = i;
            while j > 0 && self.events[j - 1].sample_offset > self.events[j].sample_offset {
                self.events.swap(j - 1, j);
                j -= 1;
            }
        }
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
