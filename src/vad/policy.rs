//! Speech range selection and non-speech attenuation.
//!
//! The detector reports speech spans in centiseconds. They are turned into sample ranges with
//! padding, short spans are dropped, and near neighbours are merged. Everything outside the
//! selected ranges is then scaled by [`VadPolicy::non_speech_gain`]. The buffer length never
//! changes, so transcript timestamps stay aligned with the source media.

/// Range selection knobs, in milliseconds where they are durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadPolicy {
    /// Detector confidence threshold (higher = more conservative).
    pub threshold: f32,

    pub pre_pad_ms: u32,
    pub post_pad_ms: u32,

    /// Spans shorter than this are dropped.
    pub min_speech_ms: u32,

    /// Spans separated by no more than this are merged.
    pub gap_merge_ms: u32,

    /// Applied to non-speech samples: 0.0 mutes, 1.0 leaves them unchanged.
    pub non_speech_gain: f32,

    /// Upper bound for a single detected span, in seconds.
    pub max_speech_s: f32,
}

pub const DEFAULT_VAD_POLICY: VadPolicy = VadPolicy {
    threshold: 0.5,
    pre_pad_ms: 250,
    post_pad_ms: 250,
    min_speech_ms: 250,
    gap_merge_ms: 300,
    non_speech_gain: 0.0,
    max_speech_s: 15.0,
};

impl Default for VadPolicy {
    fn default() -> Self {
        DEFAULT_VAD_POLICY
    }
}

/// Map detector spans `(start_cs, end_cs)` onto sorted, non-overlapping sample ranges.
///
/// Returns an empty vector when nothing survives the policy.
pub fn speech_ranges(
    sample_rate_hz: u32,
    spans_cs: &[(f32, f32)],
    samples_len: usize,
    policy: &VadPolicy,
) -> Vec<(usize, usize)> {
    let rate = sample_rate_hz as f32;
    let pre_pad = ms_to_samples(policy.pre_pad_ms, rate);
    let post_pad = ms_to_samples(policy.post_pad_ms, rate);
    let min_speech = ms_to_samples(policy.min_speech_ms, rate);
    let gap_merge = ms_to_samples(policy.gap_merge_ms, rate);

    let mut ranges: Vec<(usize, usize)> = Vec::new();

    for &(start_cs, end_cs) in spans_cs {
        let (start, end) = span_to_samples(start_cs, end_cs, rate, samples_len);
        if end - start < min_speech {
            continue;
        }

        let start = start.saturating_sub(pre_pad);
        let end = (end + post_pad).min(samples_len);
        if start >= end {
            continue;
        }

        if let Some((_, prev_end)) = ranges.last_mut() {
            if start <= *prev_end + gap_merge {
                *prev_end = (*prev_end).max(end);
                continue;
            }
        }

        ranges.push((start, end));
    }

    ranges
}

/// Scale every sample outside `ranges` by `gain` (clamped to `0.0..=1.0`).
///
/// `ranges` must be sorted and non-overlapping, as [`speech_ranges`] returns them.
pub fn attenuate_non_speech(samples: &mut [f32], ranges: &[(usize, usize)], gain: f32) {
    let gain = gain.clamp(0.0, 1.0);
    if gain == 1.0 {
        return;
    }

    let mut cursor = 0usize;
    for &(start, end) in ranges {
        let start = start.min(samples.len());
        if start > cursor {
            scale(&mut samples[cursor..start], gain);
        }
        cursor = cursor.max(end.min(samples.len()));
    }

    if cursor < samples.len() {
        scale(&mut samples[cursor..], gain);
    }
}

fn scale(buf: &mut [f32], gain: f32) {
    if gain == 0.0 {
        buf.fill(0.0);
    } else {
        buf.iter_mut().for_each(|s| *s *= gain);
    }
}

fn ms_to_samples(ms: u32, rate: f32) -> usize {
    (ms as f32 / 1000.0 * rate).round() as usize
}

// Start is floored and end ceiled so the first and last speech samples are kept.
fn span_to_samples(start_cs: f32, end_cs: f32, rate: f32, samples_len: usize) -> (usize, usize) {
    let start = ((start_cs.max(0.0) / 100.0) * rate).floor() as usize;
    let end = ((end_cs.max(0.0) / 100.0) * rate).ceil() as usize;

    let start = start.min(samples_len);
    let end = end.min(samples_len).max(start);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;

    fn no_padding() -> VadPolicy {
        VadPolicy {
            pre_pad_ms: 0,
            post_pad_ms: 0,
            min_speech_ms: 0,
            gap_merge_ms: 0,
            ..DEFAULT_VAD_POLICY
        }
    }

    #[test]
    fn no_spans_means_no_ranges() {
        assert!(speech_ranges(RATE, &[], 16_000, &DEFAULT_VAD_POLICY).is_empty());
    }

    #[test]
    fn spans_convert_from_centiseconds() {
        // 0.5s..1.0s at 16 kHz.
        let ranges = speech_ranges(RATE, &[(50.0, 100.0)], 32_000, &no_padding());
        assert_eq!(ranges, vec![(8_000, 16_000)]);
    }

    #[test]
    fn padding_is_clamped_to_the_buffer() {
        let ranges = speech_ranges(RATE, &[(0.0, 100.0)], 17_000, &DEFAULT_VAD_POLICY);
        // pre-pad saturates at 0; post-pad (4000 samples) is cut at the buffer end.
        assert_eq!(ranges, vec![(0, 17_000)]);
    }

    #[test]
    fn short_spans_are_dropped() {
        // 100ms of speech, policy minimum is 250ms.
        let ranges = speech_ranges(RATE, &[(100.0, 110.0)], 48_000, &DEFAULT_VAD_POLICY);
        assert!(ranges.is_empty());
    }

    #[test]
    fn close_spans_merge_and_far_spans_do_not() {
        let policy = VadPolicy {
            gap_merge_ms: 300,
            ..no_padding()
        };
        // Gap of 200ms merges, then a gap of 1s stays separate.
        let ranges = speech_ranges(
            RATE,
            &[(0.0, 50.0), (70.0, 100.0), (200.0, 250.0)],
            64_000,
            &policy,
        );
        assert_eq!(ranges, vec![(0, 16_000), (32_000, 40_000)]);
    }

    #[test]
    fn attenuation_keeps_length_and_speech() {
        let mut samples = vec![1.0f32; 10];
        attenuate_non_speech(&mut samples, &[(2, 4), (6, 8)], 0.0);
        assert_eq!(
            samples,
            vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn partial_gain_scales_and_unity_gain_is_a_noop() {
        let mut samples = vec![1.0f32; 4];
        attenuate_non_speech(&mut samples, &[(1, 3)], 0.5);
        assert_eq!(samples, vec![0.5, 1.0, 1.0, 0.5]);

        let mut untouched = vec![0.25f32; 3];
        attenuate_non_speech(&mut untouched, &[], 1.0);
        assert_eq!(untouched, vec![0.25; 3]);
    }
}
