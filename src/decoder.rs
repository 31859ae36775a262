//! Decode media files (audio or video containers) into mono `f32` at
//! [`TARGET_SAMPLE_RATE`](crate::audio_pipeline::TARGET_SAMPLE_RATE).
//!
//! Inputs are files on disk, so the Symphonia source is seekable and containers that keep their
//! index at the end (MP4/MOV with a trailing `moov`) decode fine.
//!
//! Error policy while reading packets:
//! - end of file ends the stream
//! - a corrupt frame is skipped
//! - anything else is fatal and surfaced with context

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use symphonia::core::codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet, Track};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio_pipeline::AudioPipeline;
use crate::media::media_extension;

/// Consumer of decoded samples (mono, target rate).
///
/// Returning `Ok(false)` stops decoding early.
pub trait SamplesSink {
    fn on_samples(&mut self, samples: &[f32]) -> Result<bool>;
}

impl SamplesSink for Vec<f32> {
    fn on_samples(&mut self, samples: &[f32]) -> Result<bool> {
        self.extend_from_slice(samples);
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct DecodeOpts {
    /// Chunk size handed to the sink, in target-rate frames (1600 = 100ms).
    pub target_chunk_frames: usize,

    /// Container hint such as "mp4" or "mkv". Helps the prober on ambiguous files.
    pub hint_extension: Option<String>,
}

impl Default for DecodeOpts {
    fn default() -> Self {
        Self {
            target_chunk_frames: 16_000,
            hint_extension: None,
        }
    }
}

/// Decode the whole file at `path` into one buffer.
///
/// The extension (when it is a known media extension) is passed to the prober as a hint.
pub fn decode_file(path: &Path) -> Result<Vec<f32>> {
    let opts = DecodeOpts {
        hint_extension: media_extension(path),
        ..DecodeOpts::default()
    };

    let mut samples = Vec::new();
    decode_file_to_sink(path, &opts, &mut samples)?;
    Ok(samples)
}

/// Decode the file at `path` and stream normalized chunks into `sink`.
pub fn decode_file_to_sink(
    path: &Path,
    opts: &DecodeOpts,
    sink: &mut dyn SamplesSink,
) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;

    let mss = MediaSourceStream::new(
        Box::new(file),
        // Power of two and above 32KiB, as the prober expects.
        MediaSourceStreamOptions {
            buffer_len: 256 * 1024,
        },
    );

    let (mut format, track) = open_default_audio_track(mss, opts.hint_extension.as_deref())
        .with_context(|| format!("unsupported or unreadable media '{}'", path.display()))?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| anyhow!(e))
        .context("failed to create decoder for audio track")?;

    let chunk = opts.target_chunk_frames;
    let mut pipeline = AudioPipeline::new();
    let mut emit = |samples: &[f32]| sink.on_samples(samples);

    while let Some(packet) = read_packet(&mut format)? {
        if packet.track_id() != track.id {
            continue;
        }

        let keep_going = match decode_packet(&mut decoder, &packet)? {
            Some(decoded) => pipeline
                .push(&decoded, chunk, &mut emit)
                .context("audio pipeline failed while processing decoded samples")?,
            None => true,
        };
        if !keep_going {
            return Ok(());
        }
    }

    pipeline
        .finalize(chunk, &mut emit)
        .context("audio pipeline failed during finalize")
}

/// Probe the container and pick the first decodable track with a known sample rate.
fn open_default_audio_track(
    mss: MediaSourceStream,
    hint_extension: Option<&str>,
) -> Result<(Box<dyn FormatReader>, Track)> {
    let mut hint = Hint::new();
    if let Some(ext) = hint_extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| anyhow!(e))
        .context("failed to probe media stream")?;

    let format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .cloned()
        .ok_or_else(|| anyhow!("no audio track found"))?;

    Ok((format, track))
}

fn read_packet(format: &mut Box<dyn FormatReader>) -> Result<Option<Packet>> {
    match format.next_packet() {
        Ok(packet) => Ok(Some(packet)),
        Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(anyhow!(e)).context("failed reading packet"),
    }
}

fn decode_packet<'a>(
    decoder: &'a mut Box<dyn Decoder>,
    packet: &Packet,
) -> Result<Option<symphonia::core::audio::AudioBufferRef<'a>>> {
    match decoder.decode(packet) {
        Ok(buf) => Ok(Some(buf)),
        Err(SymphoniaError::DecodeError(_)) => Ok(None),
        Err(e) => Err(anyhow!(e)).context("decoder failure"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_collects_everything() -> anyhow::Result<()> {
        let mut sink = Vec::new();
        assert!(sink.on_samples(&[0.5, -0.5])?);
        assert!(sink.on_samples(&[0.25])?);
        assert_eq!(sink, vec![0.5, -0.5, 0.25]);
        Ok(())
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = decode_file(Path::new("/definitely/not/here/clip.wav")).unwrap_err();
        assert!(format!("{err:#}").contains("clip.wav"));
    }

    #[test]
    fn non_media_bytes_fail_to_probe() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"this is not an audio container")?;

        assert!(decode_file(&path).is_err());
        Ok(())
    }
}
