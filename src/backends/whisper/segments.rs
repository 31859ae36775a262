use anyhow::{Context, Result};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperSegment};

use crate::opts::TranscriptionOptions;
use crate::segments::Segment;

/// Run one full Whisper pass over `samples` and collect segments in emission order.
pub(super) fn transcribe_samples(
    ctx: &WhisperContext,
    opts: &TranscriptionOptions,
    samples: &[f32],
) -> Result<Vec<Segment>> {
    let params = build_full_params(opts);

    let mut state = ctx
        .create_state()
        .context("failed to create whisper state")?;
    state
        .full(params, samples)
        .context("failed to run whisper full()")?;

    state.as_iter().map(to_segment).collect()
}

fn to_segment(segment: WhisperSegment) -> Result<Segment> {
    let text = segment.to_str().context("failed to get segment text")?;

    Ok(Segment::new(
        centiseconds_to_seconds(segment.start_timestamp()),
        centiseconds_to_seconds(segment.end_timestamp()),
        text,
    ))
}

fn build_full_params(opts: &TranscriptionOptions) -> FullParams<'_, '_> {
    let beam_size = i32::try_from(opts.beam_width()).unwrap_or(i32::MAX);
    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size,
        patience: 1.0,
    });

    params.set_n_threads(num_cpus::get() as i32);
    params.set_translate(false);
    params.set_language(Some(opts.language_code().unwrap_or("auto")));
    params.set_no_context(true);
    params.set_single_segment(false);

    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    params
}

/// whisper.cpp timestamps are centiseconds; negative values mean "unknown".
fn centiseconds_to_seconds(cs: i64) -> f64 {
    cs.max(0) as f64 / 100.0
}
