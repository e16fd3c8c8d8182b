use crate::{
    error::{SynthError, SynthResult},
    io::AudioBuffer,
    synth::{
        message::{NoteEvent, NoteEventKind, SynthMessage},
        sound::{Sound, SoundId},
        voice::{Voice, VoiceState},
    },
};

/// Fixed pool of voices plus the sounds they can play.
///
/// Voices and sounds are added before streaming; the pool never grows past
/// the capacities given to [`PolySynth::new`], so nothing here reallocates on
/// the audio thread.
pub struct PolySynth {
    voices: Vec<Voice>,
    sounds: Vec<Sound>,
    max_voices: usize,
    max_sounds: usize,
    scratch: Vec<f32>,
    sample_rate: f64,
}

impl PolySynth {
    pub fn new(max_voices: usize, max_sounds: usize, max_block_size: usize) -> Self {
        Self {
            voices: Vec::with_capacity(max_voices),
            sounds: Vec::with_capacity(max_sounds),
            max_voices,
            max_sounds,
            scratch: vec![0.0; max_block_size],
            sample_rate: 0.0,
        }
    }

    pub fn add_voice(&mut self, mut voice: Voice) -> SynthResult<()> {
        if self.voices.len() >= self.max_voices {
            return Err(SynthError::ResourceExhausted("voice pool is full"));
        }
        if self.sample_rate > 0.0 {
            voice.set_sample_rate(self.sample_rate)?;
        }
        self.voices.push(voice);
        Ok(())
    }

    pub fn add_sound(&mut self, sound: Sound) -> SynthResult<SoundId> {
        if self.sounds.len() >= self.max_sounds {
            return Err(SynthError::ResourceExhausted("sound list is full"));
        }
        self.sounds.push(sound);
        Ok(SoundId(self.sounds.len() - 1))
    }

    /// Propagate a new device rate to every voice, sounding or not.
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> SynthResult<()> {
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate)?;
        }
        self.sample_rate = sample_rate;
        Ok(())
    }

    /// Start `note` on the first idle voice able to play the first sound that
    /// applies to it.
    ///
    /// A pair already held by an active voice is left alone; one that is
    /// tailing off is cut before reallocating. Busy pools drop the note.
    pub fn note_on(&mut self, channel: u8, note: u8, velocity: f32) -> SynthResult<()> {
        if self.sample_rate <= 0.0 {
            return Err(SynthError::Configuration("sample rate not set"));
        }
        if note > 127 {
            return Err(SynthError::InvalidArgument("note number above 127"));
        }
        if !velocity.is_finite() {
            return Err(SynthError::InvalidArgument("velocity must be finite"));
        }

        if let Some(voice) = self.find_voice(channel, note) {
            if voice.state() == VoiceState::Active {
                return Ok(());
            }
            voice.stop_note(false);
        }

        let mut matched = false;
        for (index, sound) in self.sounds.iter().enumerate() {
            if !sound.applies_to_note(note) || !sound.applies_to_channel(channel) {
                continue;
            }
            matched = true;

            let free = self
                .voices
                .iter_mut()
                .find(|v| v.is_idle() && v.can_play_sound(sound));
            if let Some(voice) = free {
                return voice.start_note(channel, note, velocity, SoundId(index), sound);
            }
        }

        if matched {
            Err(SynthError::ResourceExhausted("no free voice"))
        } else {
            Ok(())
        }
    }

    pub fn note_off(&mut self, channel: u8, note: u8, _velocity: f32, allow_tail_off: bool) {
        if let Some(voice) = self.find_voice(channel, note) {
            voice.stop_note(allow_tail_off);
        }
    }

    pub fn all_notes_off(&mut self, channel: Option<u8>, allow_tail_off: bool) {
        for voice in &mut self.voices {
            if channel.map_or(true, |c| c == voice.channel()) {
                voice.stop_note(allow_tail_off);
            }
        }
    }

    pub fn handle_event(&mut self, event: &NoteEvent) -> SynthResult<()> {
        match event.kind {
            NoteEventKind::NoteOn => self.note_on(event.channel, event.note, event.velocity),
            NoteEventKind::NoteOff => {
                self.note_off(event.channel, event.note, event.velocity, true);
                Ok(())
            }
        }
    }

    pub fn handle_message(&mut self, message: SynthMessage) -> SynthResult<()> {
        match message {
            SynthMessage::NoteOn {
                channel,
                note,
                velocity,
            } => self.note_on(channel, note, velocity),
            SynthMessage::NoteOff {
                channel,
                note,
                velocity,
                allow_tail_off,
            } => {
                self.note_off(channel, note, velocity, allow_tail_off);
                Ok(())
            }
            SynthMessage::AllNotesOff {
                channel,
                allow_tail_off,
            } => {
                self.all_notes_off(channel, allow_tail_off);
                Ok(())
            }
        }
    }

    /// Mix every sounding voice into `output[start..start + num_samples]`.
    ///
    /// Additive: the caller clears the range first. No polyphony gain
    /// compensation is applied.
    pub fn render_block(&mut self, output: &mut AudioBuffer, start: usize, num_samples: usize) {
        for voice in self.voices.iter_mut().filter(|v| !v.is_idle()) {
            voice.render_next_block(output, start, num_samples, &mut self.scratch);
        }
    }

    /// Pick up tables published since the last block and move the voices
    /// playing those sounds onto them. Returns the number of swapped tables.
    pub fn refresh_tables(&mut self) -> u64 {
        let mut swaps = 0;
        for (index, sound) in self.sounds.iter_mut().enumerate() {
            if let Some(table) = sound.refresh() {
                let id = SoundId(index);
                for voice in self.voices.iter_mut().filter(|v| v.sound() == Some(id)) {
                    voice.retarget_table(table);
                }
                swaps += 1;
            }
        }
        swaps
    }

    fn find_voice(&mut self, channel: u8, note: u8) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|v| v.is_playing(channel, note))
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn sounds(&self) -> &[Sound] {
        &self.sounds
    }

    pub fn sound(&self, id: SoundId) -> Option<&Sound> {
        self.sounds.get(id.0)
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_idle()).count()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::wavetable::{HarmonicPreset, Wavetable};
    use crate::synth::sound::{VoiceKind, VoiceKinds};
    use crate::synth::voice::VoiceEnvelope;

    fn table() -> Wavetable {
        Wavetable::from_preset(128, HarmonicPreset::Organ, 4).unwrap()
    }

    fn synth(voices: usize) -> PolySynth {
        let mut synth = PolySynth::new(voices, 4, 256);
        for _ in 0..voices {
            synth
                .add_voice(Voice::new(VoiceKind::DEFAULT, VoiceEnvelope::default()))
                .unwrap();
        }
        synth.add_sound(Sound::new(table())).unwrap();
        synth.set_sample_rate(48_000.0).unwrap();
        synth
    }

    #[test]
    fn full_pool_drops_new_notes() {
        let mut synth = synth(4);
        for note in 60..64 {
            synth.note_on(0, note, 1.0).unwrap();
        }
        let mut buffer = AudioBuffer::new(1, 100);
        synth.render_block(&mut buffer, 0, 100);

        let before: Vec<_> = synth
            .voices()
            .iter()
            .map(|v| (v.note(), v.phase(), v.angle_delta()))
            .collect();

        assert_eq!(
            synth.note_on(0, 72, 1.0),
            Err(SynthError::ResourceExhausted("no free voice"))
        );

        let after: Vec<_> = synth
            .voices()
            .iter()
            .map(|v| (v.note(), v.phase(), v.angle_delta()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(synth.active_voice_count(), 4);
    }

    #[test]
    fn one_voice_per_note_and_channel() {
        let mut synth = synth(4);
        synth.note_on(0, 60, 1.0).unwrap();
        synth.note_on(0, 60, 0.5).unwrap();
        assert_eq!(synth.active_voice_count(), 1);

        // same note on another channel is a different pair
        synth.note_on(1, 60, 1.0).unwrap();
        assert_eq!(synth.active_voice_count(), 2);

        // retrigger while tailing off replaces the decaying voice
        synth.note_off(0, 60, 0.0, true);
        synth.note_on(0, 60, 1.0).unwrap();
        let holders = synth
            .voices()
            .iter()
            .filter(|v| v.is_playing(0, 60))
            .count();
        assert_eq!(holders, 1);
        assert!(synth
            .voices()
            .iter()
            .filter(|v| v.is_playing(0, 60))
            .all(|v| v.state() == VoiceState::Active));
    }

    #[test]
    fn note_off_targets_matching_pair() {
        let mut synth = synth(4);
        synth.note_on(0, 60, 1.0).unwrap();
        synth.note_on(0, 64, 1.0).unwrap();
        synth.note_off(0, 60, 0.0, true);
        synth.note_off(3, 64, 0.0, true);

        let states: Vec<_> = synth
            .voices()
            .iter()
            .filter_map(|v| v.note().map(|n| (n, v.state())))
            .collect();
        assert!(states.contains(&(60, VoiceState::TailingOff)));
        assert!(states.contains(&(64, VoiceState::Active)));
    }

    #[test]
    fn all_notes_off_respects_channel() {
        let mut synth = synth(4);
        synth.note_on(0, 60, 1.0).unwrap();
        synth.note_on(1, 62, 1.0).unwrap();
        synth.all_notes_off(Some(1), false);
        assert_eq!(synth.active_voice_count(), 1);
        synth.all_notes_off(None, false);
        assert_eq!(synth.active_voice_count(), 0);
    }

    #[test]
    fn voices_mix_additively() {
        let mut solo = synth(2);
        solo.note_on(0, 60, 1.0).unwrap();
        let mut single = AudioBuffer::new(1, 64);
        solo.render_block(&mut single, 0, 64);

        let mut duo = synth(2);
        duo.note_on(0, 60, 1.0).unwrap();
        duo.note_on(1, 60, 1.0).unwrap();
        let mut double = AudioBuffer::new(1, 64);
        duo.render_block(&mut double, 0, 64);

        for (s, d) in single.channel(0).iter().zip(double.channel(0)) {
            assert!((2.0 * s - d).abs() < 1e-6);
        }
    }

    #[test]
    fn sound_filters_route_to_matching_kind() {
        let lead = VoiceKind::new(1).unwrap();
        let bass = VoiceKind::new(2).unwrap();
        let mut synth = PolySynth::new(2, 2, 64);
        synth
            .add_voice(Voice::new(lead, VoiceEnvelope::default()))
            .unwrap();
        synth
            .add_voice(Voice::new(bass, VoiceEnvelope::default()))
            .unwrap();
        synth
            .add_sound(
                Sound::new(table())
                    .with_note_range(0..=47)
                    .with_voice_kinds(VoiceKinds::only(bass)),
            )
            .unwrap();
        synth
            .add_sound(
                Sound::new(table())
                    .with_note_range(48..=127)
                    .with_voice_kinds(VoiceKinds::only(lead)),
            )
            .unwrap();
        synth.set_sample_rate(44_100.0).unwrap();

        synth.note_on(0, 36, 1.0).unwrap();
        synth.note_on(0, 72, 1.0).unwrap();
        let bass_voice = &synth.voices()[1];
        assert_eq!(bass_voice.note(), Some(36));
        assert_eq!(bass_voice.sound(), Some(SoundId(0)));
        assert_eq!(synth.voices()[0].note(), Some(72));

        // no bass voice left for a second low note
        assert!(synth.note_on(0, 40, 1.0).is_err());
    }

    #[test]
    fn unmatched_note_is_ignored() {
        let mut synth = PolySynth::new(1, 1, 64);
        synth
            .add_voice(Voice::new(VoiceKind::DEFAULT, VoiceEnvelope::default()))
            .unwrap();
        synth
            .add_sound(Sound::new(table()).with_channel_mask(0b1))
            .unwrap();
        synth.set_sample_rate(48_000.0).unwrap();
        assert!(synth.note_on(5, 60, 1.0).is_ok());
        assert_eq!(synth.active_voice_count(), 0);
    }

    #[test]
    fn capacities_are_fixed() {
        let mut synth = PolySynth::new(1, 1, 64);
        synth
            .add_voice(Voice::new(VoiceKind::DEFAULT, VoiceEnvelope::default()))
            .unwrap();
        assert!(matches!(
            synth.add_voice(Voice::new(VoiceKind::DEFAULT, VoiceEnvelope::default())),
            Err(SynthError::ResourceExhausted(_))
        ));
        synth.add_sound(Sound::new(table())).unwrap();
        assert!(synth.add_sound(Sound::new(table())).is_err());
    }

    #[test]
    fn note_on_before_sample_rate_fails() {
        let mut synth = PolySynth::new(1, 1, 64);
        synth
            .add_voice(Voice::new(VoiceKind::DEFAULT, VoiceEnvelope::default()))
            .unwrap();
        synth.add_sound(Sound::new(table())).unwrap();
        assert!(matches!(
            synth.note_on(0, 60, 1.0),
            Err(SynthError::Configuration(_))
        ));
    }

    #[test]
    fn malformed_note_on_leaves_pool_untouched() {
        let mut synth = synth(2);
        synth.note_on(0, 60, 1.0).unwrap();

        assert!(matches!(
            synth.note_on(0, 64, f32::NAN),
            Err(SynthError::InvalidArgument(_))
        ));
        assert!(matches!(
            synth.note_on(0, 64, f32::INFINITY),
            Err(SynthError::InvalidArgument(_))
        ));
        assert!(matches!(
            synth.note_on(0, 128, 1.0),
            Err(SynthError::InvalidArgument(_))
        ));
        assert_eq!(synth.active_voice_count(), 1);

        let mut buffer = AudioBuffer::new(1, 64);
        synth.render_block(&mut buffer, 0, 64);
        assert!(buffer.is_finite_range(0, 64));
    }

    #[test]
    fn published_table_reaches_sounding_voices() {
        let mut synth = synth(2);
        synth.note_on(0, 69, 1.0).unwrap();
        let slot = synth.sound(SoundId(0)).unwrap().table_slot();
        let _old = slot.replace(Wavetable::from_preset(512, HarmonicPreset::Sine, 1).unwrap());

        assert_eq!(synth.refresh_tables(), 1);
        assert_eq!(synth.refresh_tables(), 0);
        let voice = synth.voices().iter().find(|v| v.note() == Some(69)).unwrap();
        assert!((voice.angle_delta() - 440.0 * 512.0 / 48_000.0).abs() < 1e-9);
    }
}
