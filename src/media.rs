//! Media discovery.
//!
//! Walks a root path and yields the files whose extension (case-insensitive) is one of
//! [`MEDIA_EXTENSIONS`].
//!
//! Traversal order is deterministic for a given filesystem snapshot:
//! - entries of one directory are visited in file-name order (byte-wise on the OS string)
//! - in recursive mode the walk is depth-first: a directory's own media files come first, then
//!   each subdirectory in name order, fully, before the next one
//!
//! Symlinked files are followed; symlinked directories are not descended into, so cycles can't
//! occur.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Audio/video container extensions we hand to the decoder (lowercase, no dot).
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "aac", "aiff", "flac", "m4a", "mkv", "mov", "mp3", "mp4", "ogg", "wav", "webm", "wma",
];

/// One discovered input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    path: PathBuf,
    extension: String,
}

impl MediaFile {
    /// Returns `None` unless `path` carries a known media extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let extension = media_extension(&path)?;
        Some(Self { path, extension })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The matched extension, lowercased.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// The lowercased extension of `path` if it is a known media extension.
pub fn media_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    MEDIA_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

pub fn is_media_path(path: &Path) -> bool {
    media_extension(path).is_some()
}

/// Lazily enumerate the media files under `root`.
///
/// - A root that does not exist yields nothing (not an error).
/// - A root that is itself a media file yields exactly that file.
/// - `recursive == false` lists direct children only; subdirectories are neither descended into
///   nor yielded.
pub fn discover(root: &Path, recursive: bool) -> MediaFiles {
    let mut walk = MediaFiles {
        pending_dirs: Vec::new(),
        ready: VecDeque::new(),
        recursive,
    };

    if root.is_dir() {
        walk.pending_dirs.push(root.to_path_buf());
    } else if root.is_file() {
        walk.ready.extend(MediaFile::from_path(root));
    }

    walk
}

/// Discover every root in argument order and concatenate the results.
pub fn discover_all<P: AsRef<Path>>(roots: &[P], recursive: bool) -> Vec<MediaFile> {
    roots
        .iter()
        .flat_map(|root| discover(root.as_ref(), recursive))
        .collect()
}

/// Iterator returned by [`discover`]. Directories are read one at a time as the iterator advances.
pub struct MediaFiles {
    // Stack of directories still to read; the next one to visit is on top.
    pending_dirs: Vec<PathBuf>,
    ready: VecDeque<MediaFile>,
    recursive: bool,
}

impl Iterator for MediaFiles {
    type Item = MediaFile;

    fn next(&mut self) -> Option<MediaFile> {
        loop {
            if let Some(file) = self.ready.pop_front() {
                return Some(file);
            }

            let dir = self.pending_dirs.pop()?;
            self.scan(&dir);
        }
    }
}

impl MediaFiles {
    fn scan(&mut self, dir: &Path) {
        let entries = match sorted_entries(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "skipping unreadable directory");
                return;
            }
        };

        let mut subdirs = Vec::new();
        for (path, is_dir) in entries {
            if is_dir {
                if self.recursive {
                    subdirs.push(path);
                }
                continue;
            }

            if path.is_file() {
                self.ready.extend(MediaFile::from_path(path));
            }
        }

        // Push in reverse so the first subdirectory by name is popped next.
        self.pending_dirs.extend(subdirs.into_iter().rev());
    }
}

/// Directory entries sorted by file name, each flagged with whether it is a real (non-symlink)
/// directory.
fn sorted_entries(dir: &Path) -> std::io::Result<Vec<(PathBuf, bool)>> {
    let mut entries: Vec<(OsString, PathBuf, bool)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        entries.push((entry.file_name(), entry.path(), is_dir));
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries
        .into_iter()
        .map(|(_, path, is_dir)| (path, is_dir))
        .collect())
}
