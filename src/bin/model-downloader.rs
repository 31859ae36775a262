// Fetch whisper.cpp and Silero VAD model files from the built-in catalog into a models directory.

use std::ffi::OsString;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

use srt_folders::models::{ModelSpec, lookup_model, model_list_string};

#[derive(Parser, Debug)]
#[command(name = "model-downloader")]
#[command(about = "Download Whisper and VAD models for srt-folders", long_about = None)]
struct Args {
    /// List supported model names and exit.
    #[arg(long)]
    list: bool,

    /// Model name(s) to fetch (examples: small, large-v3-turbo, silero-v6.2.0).
    #[arg(long, required_unless_present = "list", num_args = 1..)]
    name: Vec<String>,

    /// Target directory (created if missing).
    #[arg(long, env = "SUBTITLE_MODELS_DIR", default_value = "./models")]
    dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list {
        print!("{}", model_list_string());
        return Ok(());
    }

    let specs = resolve_names(&args.name)?;

    fs::create_dir_all(&args.dir)
        .with_context(|| format!("failed to create target dir: {}", args.dir.display()))?;

    let client = Client::builder()
        .user_agent("srt-folders-model-downloader")
        .build()
        .context("failed to build HTTP client")?;

    for spec in specs {
        fetch(&client, spec, &args.dir)?;
    }
    Ok(())
}

/// Every name must be in the catalog; nothing is downloaded otherwise.
fn resolve_names(names: &[String]) -> Result<Vec<&'static ModelSpec>> {
    let mut specs = Vec::with_capacity(names.len());
    for name in names {
        let Some(spec) = lookup_model(name.trim()) else {
            bail!("unknown model '{name}'. Run with --list to see supported models.");
        };
        if !specs.contains(&spec) {
            specs.push(spec);
        }
    }
    Ok(specs)
}

fn fetch(client: &Client, spec: &ModelSpec, dir: &Path) -> Result<()> {
    let dest_path = dir.join(spec.filename);
    if dest_path.exists() {
        println!("already exists: {}", dest_path.display());
        return Ok(());
    }

    println!("downloading {} ({})", spec.filename, spec.kind.as_str());
    println!("    {}", spec.url);

    let resp = client
        .get(spec.url)
        .send()
        .with_context(|| format!("request failed: {}", spec.url))?
        .error_for_status()
        .with_context(|| format!("download failed (bad status): {}", spec.url))?;

    let total = resp.content_length();
    download_to_path_with_reader(resp, total, &dest_path)?;

    println!("saved: {}", dest_path.display());
    Ok(())
}

fn part_path(dest_path: &Path) -> PathBuf {
    let mut name = OsString::from(dest_path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// Stream `reader` into `<dest_path>.part`, fsync, then rename onto `dest_path`.
/// The `.part` file is removed on any failure.
fn download_to_path_with_reader<R: Read>(
    mut reader: R,
    total_bytes: Option<u64>,
    dest_path: &Path,
) -> Result<()> {
    let pb = match total_bytes.filter(|&n| n > 0) {
        Some(total) => ProgressBar::new(total),
        None => ProgressBar::new_spinner(),
    };
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {bytes}/{total_bytes} {bar:40.cyan/blue} {eta}",
        )
        .context("invalid progress template")?
        .progress_chars("#>-"),
    );

    let tmp_path = part_path(dest_path);

    let mut write_all = || -> Result<()> {
        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf).context("download interrupted")?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
            pb.inc(n as u64);
        }
        file.sync_all()?;

        fs::rename(&tmp_path, dest_path)
            .with_context(|| format!("failed to move into place: {}", dest_path.display()))
    };

    let result = write_all();
    pb.finish_and_clear();
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
