//! Demo - opens the default output device and plays an arpeggio through the handle

use std::thread;
use std::time::Duration;

use color_eyre::eyre::{bail, eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use saavy_wavetable::{
    dsp::HarmonicPreset, synth::sound::SoundId, SynthConfig, SynthEngine, SynthHandle,
};

/// Demo builder
pub struct Demo {
    bpm: f64,
    notes: Vec<u8>,
    repeats: usize,
    swap: Option<(HarmonicPreset, usize)>,
}

impl Demo {
    pub fn new() -> Self {
        Self {
            bpm: 120.0,
            notes: vec![60, 64, 67],
            repeats: 1,
            swap: None,
        }
    }

    pub fn bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn notes(mut self, notes: &[u8]) -> Self {
        self.notes = notes.to_vec();
        self
    }

    pub fn repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats;
        self
    }

    /// Rebuild the table halfway through playback.
    pub fn swap_to(mut self, preset: HarmonicPreset, harmonic_limit: usize) -> Self {
        self.swap = Some((preset, harmonic_limit));
        self
    }

    /// Run the demo (blocks until the arpeggio has finished)
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let supported = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            bail!("unsupported sample format {:?}", supported.sample_format());
        }

        let sample_rate = supported.sample_rate().0 as f64;
        let channels = supported.channels() as usize;

        let config = SynthConfig {
            num_channels: channels.min(2),
            ..SynthConfig::default()
        };
        let max_block = config.max_block_size;
        let table_size = config.table_size;

        let (mut engine, mut handle) = SynthEngine::new(config)?;
        engine.prepare_to_play(max_block, sample_rate)?;
        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate,
            channels,
            "opened output device"
        );

        let mut render_buf = engine.create_buffer();
        let stream = device.build_output_stream(
            &supported.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(max_block);
                    engine.render_block(&mut render_buf, 0, frames, &[]);

                    let out_off = frames_written * channels;
                    render_buf.write_interleaved(&mut data[out_off..], channels, frames);
                    frames_written += frames;
                }
            },
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )?;
        stream.play()?;

        self.play(&mut handle, table_size)?;

        handle.all_notes_off(None, true)?;
        thread::sleep(Duration::from_millis(500));
        let totals = handle.report_diagnostics();
        tracing::info!(
            faults = totals.total_faults(),
            table_swaps = totals.table_swaps,
            pending_tables = handle.collect_retired(),
            "finished"
        );
        Ok(())
    }

    fn play(&self, handle: &mut SynthHandle, table_size: usize) -> EyreResult<()> {
        // eighth notes
        let step = Duration::from_secs_f64(30.0 / self.bpm);
        let total = self.notes.len() * self.repeats;

        for (i, &note) in self.notes.iter().cycle().take(total).enumerate() {
            if i == total / 2 {
                if let Some((preset, limit)) = self.swap {
                    let harmonics = preset.harmonics(table_size, limit);
                    handle.replace_table(SoundId(0), table_size, &harmonics)?;
                }
            }

            handle.note_on(0, note, 0.8)?;
            thread::sleep(step);
            handle.note_off(0, note, 0.0, true)?;

            handle.report_diagnostics();
            handle.collect_retired();
        }
        Ok(())
    }
}

impl Default for Demo {
    fn default() -> Self {
        Self::new()
    }
}
