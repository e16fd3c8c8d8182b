use crate::{
    io::midi::MidiEvent,
    synth::message::{NoteEvent, NoteEventKind},
};

/// Map a raw MIDI message to a note event scheduled at `sample_offset`.
///
/// Note-on with velocity 0 is a note-off (running-status convention).
/// Non-note messages yield `None`.
pub fn midi_to_event(midi: MidiEvent, sample_offset: u32) -> Option<NoteEvent> {
    let (kind, channel, key, velocity) = match midi {
        MidiEvent::NoteOn {
            channel,
            key,
            velocity: 0,
        } => (NoteEventKind::NoteOff, channel, key, 0),
        MidiEvent::NoteOn {
            channel,
            key,
            velocity,
        } => (NoteEventKind::NoteOn, channel, key, velocity),
        MidiEvent::NoteOff {
            channel,
            key,
            velocity,
        } => (NoteEventKind::NoteOff, channel, key, velocity),
        _ => return None,
    };

    Some(NoteEvent {
        kind,
        note: key,
        velocity: velocity.min(127) as f32 / 127.0,
        sample_offset,
        channel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_scales_velocity() {
        let event = midi_to_event(
            MidiEvent::NoteOn {
                channel: 2,
                key: 60,
                velocity: 127,
            },
            17,
        )
        .unwrap();
        assert_eq!(event.kind, NoteEventKind::NoteOn);
        assert_eq!(event.channel, 2);
        assert_eq!(event.sample_offset, 17);
        assert_eq!(event.velocity, 1.0);
    }

    #[test]
    fn zero_velocity_note_on_is_note_off() {
        let event = midi_to_event(
            MidiEvent::NoteOn {
                channel: 0,
                key: 64,
                velocity: 0,
            },
            0,
        )
        .unwrap();
        assert_eq!(event.kind, NoteEventKind::NoteOff);
    }

    #[test]
    fn ignores_controllers() {
        assert!(midi_to_event(
            MidiEvent::ControlChange {
                channel: 0,
                controller: 64,
                value: 127
            },
            0
        )
        .is_none());
    }
}
