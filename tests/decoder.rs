use std::path::Path;

use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use srt_folders::audio_pipeline::TARGET_SAMPLE_RATE;
use srt_folders::decoder::{DecodeOpts, SamplesSink, decode_file, decode_file_to_sink};

fn write_tone(path: &Path, sample_rate: u32, channels: u16, frames: usize) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let v = (t * 440.0 * std::f32::consts::TAU).sin() * 0.5;
        let s = (v * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(s)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

#[test]
fn target_rate_mono_keeps_every_sample() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tone.wav");
    write_tone(&path, TARGET_SAMPLE_RATE, 1, 16_000)?;

    let samples = decode_file(&path)?;
    assert_eq!(samples.len(), 16_000);

    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!((0.45..=0.55).contains(&peak), "peak was {peak}");
    Ok(())
}

#[test]
fn stereo_is_downmixed() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("stereo.wav");
    write_tone(&path, TARGET_SAMPLE_RATE, 2, 8_000)?;

    let samples = decode_file(&path)?;
    assert_eq!(samples.len(), 8_000);
    Ok(())
}

#[test]
fn lower_rates_are_resampled_to_target() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("phone.wav");
    // One second at 8 kHz.
    write_tone(&path, 8_000, 1, 8_000)?;

    let samples = decode_file(&path)?;
    // Roughly one second at 16 kHz; the last resampler block is zero-padded.
    assert!(
        (15_000..=17_500).contains(&samples.len()),
        "got {} samples",
        samples.len()
    );
    Ok(())
}

struct StopAfterFirst {
    calls: usize,
}

impl SamplesSink for StopAfterFirst {
    fn on_samples(&mut self, _samples: &[f32]) -> anyhow::Result<bool> {
        self.calls += 1;
        Ok(false)
    }
}

#[test]
fn sink_can_stop_decoding_early() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("long.wav");
    write_tone(&path, TARGET_SAMPLE_RATE, 1, 64_000)?;

    let mut sink = StopAfterFirst { calls: 0 };
    let opts = DecodeOpts {
        target_chunk_frames: 1_600,
        hint_extension: Some("wav".to_owned()),
    };
    decode_file_to_sink(&path, &opts, &mut sink)?;
    assert_eq!(sink.calls, 1);
    Ok(())
}

#[test]
fn garbage_input_is_an_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.wav");
    std::fs::write(&path, b"RIFF but not really a wave file")?;

    assert!(decode_file(&path).is_err());
    Ok(())
}
