//! PCM normalization for the decoder.
//!
//! Takes Symphonia's decoded buffers and produces mono `f32` at [`TARGET_SAMPLE_RATE`]:
//! interleave → downmix (equal-weight average) → resample with rubato when the source rate
//! differs → hand out fixed-size chunks. Call [`AudioPipeline::finalize`] at end of stream to flush
//! the resampler's partial block.

use anyhow::{Context, Result, anyhow, bail, ensure};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};

/// Whisper's expected mono sample rate (Hz).
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Source frames fed to rubato per `process()` call.
const RESAMPLER_BLOCK_FRAMES: usize = 2048;

/// Chunk consumer. Returning `Ok(false)` asks the pipeline to stop emitting.
pub type Emit<'a> = dyn FnMut(&[f32]) -> Result<bool> + 'a;

#[derive(Default)]
pub struct AudioPipeline {
    // Interleaving scratch buffer and the frame capacity it was built for.
    sample_buf: Option<(SampleBuffer<f32>, usize)>,

    // Built on the first buffer whose rate differs from the target; remembers that source rate.
    resampler: Option<(SincFixedIn<f32>, u32)>,

    // Mono source samples waiting for a full resampler block.
    pending: Vec<f32>,
}

impl AudioPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one decoded buffer through the pipeline. Returns `Ok(false)` once `emit` asked to stop.
    pub fn push(
        &mut self,
        decoded: &AudioBufferRef<'_>,
        chunk_frames: usize,
        emit: &mut Emit<'_>,
    ) -> Result<bool> {
        let spec = *decoded.spec();
        let channels = spec.channels.count();
        ensure!(channels > 0, "decoded audio had zero channels");

        let interleaved = self.interleave(decoded);
        let mono = downmix_to_mono(interleaved, channels);

        if spec.rate == TARGET_SAMPLE_RATE && self.resampler.is_none() {
            return emit_chunks(&mono, chunk_frames, emit);
        }

        self.ensure_resampler(spec.rate)?;
        self.pending.extend_from_slice(&mono);
        self.drain_full_blocks(chunk_frames, emit)
    }

    /// Flush the resampler's partial block, zero-padded. No-op when no resampling happened.
    pub fn finalize(&mut self, chunk_frames: usize, emit: &mut Emit<'_>) -> Result<()> {
        let Some((rs, _)) = self.resampler.as_ref() else {
            return Ok(());
        };
        if self.pending.is_empty() {
            return Ok(());
        }

        let block = rs.input_frames_max();
        let padded = self.pending.len().div_ceil(block) * block;
        self.pending.resize(padded, 0.0);

        self.drain_full_blocks(chunk_frames, emit)?;
        Ok(())
    }

    fn interleave(&mut self, decoded: &AudioBufferRef<'_>) -> &[f32] {
        let frames = decoded.capacity();
        let rebuild = match &self.sample_buf {
            Some((_, cap)) => *cap < frames,
            None => true,
        };
        if rebuild {
            self.sample_buf = Some((SampleBuffer::<f32>::new(frames as u64, *decoded.spec()), frames));
        }

        match self.sample_buf.as_mut() {
            Some((buf, _)) => {
                buf.copy_interleaved_ref(decoded.clone());
                buf.samples()
            }
            None => &[],
        }
    }

    fn ensure_resampler(&mut self, src_rate: u32) -> Result<()> {
        if let Some((_, rate)) = &self.resampler {
            if *rate != src_rate {
                bail!("sample rate changed mid-stream ({rate} Hz -> {src_rate} Hz)");
            }
            return Ok(());
        }
        ensure!(src_rate > 0, "decoded audio reported a 0 Hz sample rate");

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };
        let rs = SincFixedIn::<f32>::new(
            TARGET_SAMPLE_RATE as f64 / src_rate as f64,
            2.0,
            params,
            RESAMPLER_BLOCK_FRAMES,
            1,
        )
        .map_err(|e| anyhow!(e))
        .context("failed to init resampler")?;

        self.resampler = Some((rs, src_rate));
        Ok(())
    }

    fn drain_full_blocks(&mut self, chunk_frames: usize, emit: &mut Emit<'_>) -> Result<bool> {
        let Some((rs, _)) = self.resampler.as_mut() else {
            bail!("resampler not initialized");
        };
        let block = rs.input_frames_max();

        let mut offset = 0;
        while self.pending.len() - offset >= block {
            let input = &self.pending[offset..offset + block];
            offset += block;

            let out = rs
                .process(&[input], None)
                .map_err(|e| anyhow!(e))
                .context("resampler process failed")?;
            let Some(mono) = out.first() else {
                bail!("expected mono output from resampler");
            };

            if !emit_chunks(mono, chunk_frames, emit)? {
                self.pending.drain(..offset);
                return Ok(false);
            }
        }

        self.pending.drain(..offset);
        Ok(true)
    }
}

/// Equal-weight average across channels.
fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn emit_chunks(mono: &[f32], chunk_frames: usize, emit: &mut Emit<'_>) -> Result<bool> {
    for chunk in mono.chunks(chunk_frames.max(1)) {
        if !emit(chunk)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_is_noop_without_resampler() -> anyhow::Result<()> {
        let mut pipeline = AudioPipeline::new();
        pipeline.finalize(256, &mut |_| Ok(true))?;
        Ok(())
    }

    #[test]
    fn downmix_averages_channels() {
        assert_eq!(downmix_to_mono(&[0.0, 1.0, -1.0], 1), vec![0.0, 1.0, -1.0]);
        // (L=1, R=3), (L=-1, R=1) => 2, 0
        assert_eq!(downmix_to_mono(&[1.0, 3.0, -1.0, 1.0], 2), vec![2.0, 0.0]);
    }

    #[test]
    fn emit_chunks_respects_early_stop() -> anyhow::Result<()> {
        let mut seen = Vec::new();
        let keep_going = emit_chunks(&[1.0; 10], 4, &mut |chunk| {
            seen.push(chunk.len());
            Ok(false)
        })?;

        assert!(!keep_going);
        assert_eq!(seen, vec![4]);
        Ok(())
    }

    #[test]
    fn drain_errors_when_resampler_is_missing() {
        let mut pipeline = AudioPipeline::new();
        pipeline.pending.extend_from_slice(&[0.0; 16]);
        let err = pipeline.drain_full_blocks(256, &mut |_| Ok(true)).unwrap_err();
        assert!(err.to_string().contains("resampler not initialized"));
    }

    #[test]
    fn resampler_rejects_rate_change() -> anyhow::Result<()> {
        let mut pipeline = AudioPipeline::new();
        pipeline.ensure_resampler(8_000)?;
        pipeline.ensure_resampler(8_000)?;
        let err = pipeline.ensure_resampler(44_100).unwrap_err();
        assert!(err.to_string().contains("sample rate changed"));
        Ok(())
    }

    #[test]
    fn resample_path_emits_and_finalize_flushes_remainder() -> anyhow::Result<()> {
        let mut pipeline = AudioPipeline::new();
        pipeline.ensure_resampler(8_000)?;

        let block = RESAMPLER_BLOCK_FRAMES;
        pipeline.pending.extend(std::iter::repeat_n(0.0, block * 2 + 7));

        let mut emitted = 0usize;
        pipeline.drain_full_blocks(256, &mut |chunk| {
            emitted += chunk.len();
            Ok(true)
        })?;
        assert_eq!(pipeline.pending.len(), 7);
        let after_full_blocks = emitted;
        assert!(after_full_blocks > 0);

        pipeline.finalize(256, &mut |chunk| {
            emitted += chunk.len();
            Ok(true)
        })?;
        assert!(pipeline.pending.is_empty());
        assert!(emitted > after_full_blocks);
        Ok(())
    }
}
