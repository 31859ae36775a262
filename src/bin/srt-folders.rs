use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use srt_folders::cli::EngineArgs;
use srt_folders::{BatchOpts, SubtitleGenerator, TranscriptionOutcome, summarize};

#[derive(Parser, Debug)]
#[command(name = "srt-folders")]
#[command(about = "Generate .srt subtitles for every media file in the given directories")]
struct Params {
    /// Directories (or individual media files) to process, in order.
    #[arg(required = true, num_args = 1..)]
    directories: Vec<PathBuf>,

    /// Only process files directly inside each directory.
    #[arg(long)]
    no_recursive: bool,

    /// Replace subtitles that already exist.
    #[arg(long)]
    overwrite: bool,

    /// Print outcomes as a JSON array instead of one line per file.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    engine: EngineArgs,
}

fn main() -> ExitCode {
    srt_folders::logging::init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = ?err, "srt-folders failed");
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns `Ok(false)` when at least one file failed.
fn run() -> Result<bool> {
    let params = Params::parse();

    let opts = params
        .engine
        .into_options()
        .context("invalid engine options")?;
    let batch = BatchOpts {
        recursive: !params.no_recursive,
        overwrite: params.overwrite,
        skip_existing: !params.overwrite,
    };

    let mut generator = SubtitleGenerator::new(opts)?;
    let outcomes = generator.process(&params.directories, &batch);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if params.json {
        serde_json::to_writer_pretty(&mut out, &outcomes).context("failed to encode outcomes")?;
        writeln!(out)?;
    } else {
        for outcome in &outcomes {
            writeln!(out, "{}", format_outcome_line(outcome))?;
        }
    }
    out.flush()?;

    Ok(!summarize(&outcomes).has_failures())
}

fn format_outcome_line(outcome: &TranscriptionOutcome) -> String {
    let output = outcome
        .output()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "n/a".to_owned());

    format!(
        "{} -> {} ({}) {}",
        outcome.source().display(),
        output,
        outcome.status(),
        outcome.message()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_line_shows_output_path() {
        let outcome =
            TranscriptionOutcome::created("/data/show/ep1.mkv".into(), "/data/show/ep1.srt".into());
        assert_eq!(
            format_outcome_line(&outcome),
            "/data/show/ep1.mkv -> /data/show/ep1.srt (created) Subtitle created successfully."
        );
    }

    #[test]
    fn failed_line_shows_na() {
        let outcome = TranscriptionOutcome::failed("/data/a.mp3".into(), "decoder failure");
        assert_eq!(
            format_outcome_line(&outcome),
            "/data/a.mp3 -> n/a (failed) Failed to generate subtitle: decoder failure"
        );
    }

    #[test]
    fn params_map_flags() -> anyhow::Result<()> {
        let params = Params::try_parse_from([
            "srt-folders",
            "/data/a",
            "/data/b",
            "--no-recursive",
            "--overwrite",
            "--json",
            "--model-size",
            "tiny",
        ])?;

        assert_eq!(
            params.directories,
            vec![PathBuf::from("/data/a"), PathBuf::from("/data/b")]
        );
        assert!(params.no_recursive);
        assert!(params.overwrite);
        assert!(params.json);
        assert_eq!(params.engine.model, "tiny");
        Ok(())
    }

    #[test]
    fn directories_are_required() {
        assert!(Params::try_parse_from(["srt-folders"]).is_err());
    }
}
