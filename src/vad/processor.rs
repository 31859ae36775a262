use std::path::Path;

use anyhow::{Context, Result, anyhow};
use whisper_rs::{WhisperVadContext, WhisperVadContextParams, WhisperVadParams};

use super::policy::{DEFAULT_VAD_POLICY, VadPolicy, attenuate_non_speech, speech_ranges};
use crate::audio_pipeline::TARGET_SAMPLE_RATE;

/// Voice activity detection backed by whisper.cpp's Silero VAD.
///
/// The model is loaded once and reused for every buffer passed to [`VadProcessor::apply`].
pub struct VadProcessor {
    ctx: WhisperVadContext,
    policy: VadPolicy,
}

impl VadProcessor {
    pub fn new(model_path: &Path) -> Result<Self> {
        Self::with_policy(model_path, DEFAULT_VAD_POLICY)
    }

    pub fn with_policy(model_path: &Path, policy: VadPolicy) -> Result<Self> {
        let path = model_path
            .to_str()
            .ok_or_else(|| anyhow!("VAD model path is not valid UTF-8: {}", model_path.display()))?;

        let ctx = WhisperVadContext::new(path, WhisperVadContextParams::default())
            .with_context(|| format!("failed to load VAD model from '{path}'"))?;

        Ok(Self { ctx, policy })
    }

    pub fn policy(&self) -> &VadPolicy {
        &self.policy
    }

    /// Attenuate non-speech regions of a mono 16 kHz buffer in place.
    ///
    /// Returns `Ok(false)` when no speech survives the policy; the buffer is then left untouched.
    pub fn apply(&mut self, samples: &mut [f32]) -> Result<bool> {
        let mut params = WhisperVadParams::default();
        params.set_threshold(self.policy.threshold);
        params.set_min_speech_duration(self.policy.min_speech_ms as i32);
        params.set_max_speech_duration(self.policy.max_speech_s);

        let segments = self
            .ctx
            .segments_from_samples(params, samples)
            .context("VAD inference failed")?;

        let mut spans = Vec::with_capacity(segments.num_segments().max(0) as usize);
        for i in 0..segments.num_segments() {
            let start = segments
                .get_segment_start_timestamp(i)
                .ok_or_else(|| anyhow!("missing start timestamp for VAD segment {i}"))?;
            let end = segments
                .get_segment_end_timestamp(i)
                .ok_or_else(|| anyhow!("missing end timestamp for VAD segment {i}"))?;
            spans.push((start, end));
        }

        let ranges = speech_ranges(TARGET_SAMPLE_RATE, &spans, samples.len(), &self.policy);
        if ranges.is_empty() {
            return Ok(false);
        }

        attenuate_non_speech(samples, &ranges, self.policy.non_speech_gain);
        Ok(true)
    }
}
