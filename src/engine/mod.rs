//! Block rendering and the audio/control thread boundary.
//!
//! [`SynthEngine`] is what the audio transport drives: `prepare_to_play`
//! once, `render_block` per callback, `release_resources` on stop. Each
//! block is split at its note events so every note starts and stops on the
//! exact frame it was scheduled for, without a per-sample branch in the
//! voice loop.
//!
//! Nothing in `render_block` allocates, blocks or returns an error. Faults
//! are absorbed, the affected range is silenced where needed, and the
//! [`Diagnostics`] counters are bumped for a control thread to poll.

pub mod diagnostics;
pub mod handle;
pub mod scheduler;

use std::sync::Arc;

use rtrb::{Consumer, RingBuffer};

use self::{
    diagnostics::{Diagnostics, Fault},
    handle::SynthHandle,
    scheduler::BlockScheduler,
};
use crate::{
    config::SynthConfig,
    dsp::wavetable::Wavetable,
    error::{SynthError, SynthResult},
    io::AudioBuffer,
    synth::{
        message::{NoteEvent, SynthMessage},
        poly::PolySynth,
        sound::{Sound, VoiceKind},
        voice::Voice,
    },
};

pub struct SynthEngine {
    synth: PolySynth,
    scheduler: BlockScheduler,
    rx: Consumer<SynthMessage>,
    diagnostics: Arc<Diagnostics>,
    num_channels: usize,
    max_block_size: usize,
    prepared: bool,
}

impl SynthEngine {
    /// Build the default engine: one sound from `config.harmonics` and
    /// `config.voice_count` voices able to play it.
    pub fn new(config: SynthConfig) -> SynthResult<(Self, SynthHandle)> {
        config.validate()?;
        let table = Wavetable::build(config.table_size, &config.harmonics)?;
        let voices = (0..config.voice_count)
            .map(|_| Voice::new(VoiceKind::DEFAULT, config.envelope))
            .collect();
        Self::from_parts(config, voices, vec![Sound::new(table)])
    }

    /// Build an engine around caller-constructed voices and sounds.
    ///
    /// The pool is sized from `voices` and `sounds`; `config.voice_count`
    /// and `config.max_sounds` only bound them.
    pub fn from_parts(
        config: SynthConfig,
        voices: Vec<Voice>,
        sounds: Vec<Sound>,
    ) -> SynthResult<(Self, SynthHandle)> {
        config.validate()?;
        if voices.is_empty() || voices.len() > config.voice_count {
            return Err(SynthError::Configuration(
                "voice list must hold between 1 and voice_count voices",
            ));
        }
        if sounds.is_empty() || sounds.len() > config.max_sounds {
            return Err(SynthError::Configuration(
                "sound list must hold between 1 and max_sounds sounds",
            ));
        }

        let mut synth = PolySynth::new(voices.len(), sounds.len(), config.max_block_size);
        let slots = sounds.iter().map(Sound::table_slot).collect();
        for voice in voices {
            synth.add_voice(voice)?;
        }
        for sound in sounds {
            synth.add_sound(sound)?;
        }

        let (tx, rx) = RingBuffer::<SynthMessage>::new(config.queue_capacity);
        let diagnostics = Arc::new(Diagnostics::default());
        let handle = SynthHandle::new(tx, slots, Arc::clone(&diagnostics));

        tracing::debug!(
            voices = synth.voices().len(),
            sounds = synth.sounds().len(),
            table_size = config.table_size,
            "synth engine constructed"
        );

        let engine = Self {
            synth,
            scheduler: BlockScheduler::new(config.max_events_per_block),
            rx,
            diagnostics,
            num_channels: config.num_channels,
            max_block_size: config.max_block_size,
            prepared: false,
        };
        Ok((engine, handle))
    }

    /// Called once by the transport before streaming, and again whenever the
    /// device rate changes. Sounding voices are retuned to the new rate.
    pub fn prepare_to_play(
        &mut self,
        samples_per_block_expected: usize,
        sample_rate: f64,
    ) -> SynthResult<()> {
        if !(sample_rate > 0.0) || !sample_rate.is_finite() {
            return Err(SynthError::Configuration("sample rate must be positive"));
        }
        if samples_per_block_expected == 0 || samples_per_block_expected > self.max_block_size {
            return Err(SynthError::Configuration(
                "expected block size must be between 1 and max_block_size",
            ));
        }

        self.synth.set_sample_rate(sample_rate)?;
        self.prepared = true;
        tracing::info!(sample_rate, samples_per_block_expected, "prepared to play");
        Ok(())
    }

    /// Called by the transport when streaming stops. Silences every voice.
    pub fn release_resources(&mut self) {
        self.synth.all_notes_off(None, false);
        self.prepared = false;
        tracing::info!("released audio resources");
    }

    /// Render `num_samples` frames into `output` starting at `start_sample`.
    ///
    /// `events` carry offsets relative to `start_sample`. Pending messages
    /// from the [`SynthHandle`] are applied first, at the block's first
    /// frame. The range is overwritten, not mixed into.
    pub fn render_block(
        &mut self,
        output: &mut AudioBuffer,
        start_sample: usize,
        num_samples: usize,
        events: &[NoteEvent],
    ) {
        let available = output.num_samples().saturating_sub(start_sample);
        let num_samples = if num_samples > available {
            self.diagnostics.record(Fault::OutOfRange);
            available
        } else {
            num_samples
        };
        if num_samples == 0 {
            return;
        }
        output.clear_range(start_sample, num_samples);

        if !self.prepared {
            self.diagnostics.record(Fault::SilencedRange);
            return;
        }

        let Self {
            synth,
            scheduler,
            rx,
            diagnostics,
            ..
        } = self;

        diagnostics.record_table_swaps(synth.refresh_tables());

        while let Ok(message) = rx.pop() {
            if let Err(err) = synth.handle_message(message) {
                diagnostics.record(fault_for(err));
            }
        }

        scheduler.clear();
        for event in events {
            match event.validate(num_samples) {
                Ok(()) => {
                    if scheduler.push(*event).is_err() {
                        diagnostics.record(Fault::DroppedEvent);
                    }
                }
                Err(err) => diagnostics.record(fault_for(err)),
            }
        }
        scheduler.sort();

        let mut cursor = 0;
        for event in scheduler.events() {
            let offset = event.sample_offset as usize;
            if offset > cursor {
                render_range(synth, diagnostics, output, start_sample + cursor, offset - cursor);
                cursor = offset;
            }
            if let Err(err) = synth.handle_event(event) {
                diagnostics.record(fault_for(err));
            }
        }
        if cursor < num_samples {
            render_range(
                synth,
                diagnostics,
                output,
                start_sample + cursor,
                num_samples - cursor,
            );
        }
    }

    /// Output buffer sized for this engine's channel count and largest block.
    pub fn create_buffer(&self) -> AudioBuffer {
        AudioBuffer::new(self.num_channels, self.max_block_size)
    }

    pub fn diagnostics(&self) -> Arc<Diagnostics> {
        Arc::clone(&self.diagnostics)
    }

    pub fn synth(&self) -> &PolySynth {
        &self.synth
    }

    pub fn active_voice_count(&self) -> usize {
        self.synth.active_voice_count()
    }

    pub fn sample_rate(&self) -> f64 {
        self.synth.sample_rate()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }
}

fn render_range(
    synth: &mut PolySynth,
    diagnostics: &Diagnostics,
    output: &mut AudioBuffer,
    start: usize,
    len: usize,
) {
    synth.render_block(output, start, len);
    if !output.is_finite_range(start, len) {
        output.clear_range(start, len);
        diagnostics.record(Fault::SilencedRange);
    }
}

fn fault_for(err: SynthError) -> Fault {
    match err {
        SynthError::OutOfRange { .. } => Fault::OutOfRange,
        SynthError::ResourceExhausted(_) => Fault::DroppedNote,
        SynthError::InvalidArgument(_) | SynthError::Configuration(_) => Fault::InvalidEvent,
    }
}
