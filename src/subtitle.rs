//! Subtitle files on disk.
//!
//! Two rules live here:
//! - where a source's subtitle goes ([`subtitle_path_for`]), which the skip/overwrite policy
//!   relies on
//! - how it gets there ([`write_subtitle`]): encode into a temporary file beside the destination,
//!   then rename over it, so a failed write never leaves a truncated `.srt` behind

use std::fs;
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::Result;
use crate::segment_encoder::SegmentEncoder;
use crate::segments::Segment;
use crate::srt_encoder::SrtEncoder;

/// Extension of every subtitle file we write.
pub const SUBTITLE_EXTENSION: &str = "srt";

/// Same directory, same base name, extension replaced with [`SUBTITLE_EXTENSION`].
pub fn subtitle_path_for(source: &Path) -> PathBuf {
    source.with_extension(SUBTITLE_EXTENSION)
}

/// Serialize `segments` into `destination` as a complete SubRip document.
///
/// Missing parent directories are created first. The document is written to a hidden temporary
/// file in the destination directory and renamed into place only after it is fully flushed and
/// synced; an existing file at `destination` is replaced. Returns the number of cues written.
pub fn write_subtitle(segments: &[Segment], destination: &Path) -> Result<usize> {
    write_subtitle_inner(segments, destination).map_err(|err| err.while_writing(destination))
}

fn write_subtitle_inner(segments: &[Segment], destination: &Path) -> Result<usize> {
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".srt.part")
        .tempfile_in(parent)?;
    set_readable_permissions(tmp.as_file())?;

    let cues = {
        let mut encoder = SrtEncoder::new(BufWriter::new(tmp.as_file()));
        for seg in segments {
            encoder.write_segment(seg)?;
        }
        encoder.close()?;
        encoder.cues_written()
    };
    tmp.as_file().sync_all()?;

    // On failure `persist` hands the temp file back; dropping it removes it.
    tmp.persist(destination).map_err(|err| err.error)?;

    debug!(output = %destination.display(), cues, "subtitle written");
    Ok(cues)
}

/// Create `dir` and any missing ancestors. A concurrent creator winning the race is fine.
fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(err) => Err(err),
    }
}

/// Temp files are created owner-only; subtitles are meant to be read by media servers.
#[cfg(unix)]
fn set_readable_permissions(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_readable_permissions(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}
