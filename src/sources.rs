//! Discovery of the project's known source files.
//!
//! Uses the `ignore` crate so that `.gitignore`d build output (where most
//! coverage tools write their reports) is never indexed. Entries that cannot
//! be walked or read are logged and skipped.
use std::path::Path;

use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::model::InputFile;

/// Walk `root` and collect files whose extension is one of `extensions`.
/// An empty `extensions` list keeps every file.
///
/// Files are returned sorted by relative path, so suffix ties resolve the
/// same way on every run.
pub fn discover(root: &Path, extensions: &[String]) -> Vec<InputFile> {
    let mut files = Vec::new();

    // Follow symlinks (ignore crate detects loops)
    for entry in WalkBuilder::new(root).follow_links(true).build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Walk error: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        if !has_extension(path, extensions) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(err) => {
                warn!("Failed to read {}: {}", path.display(), err);
                continue;
            }
        };
        files.push(InputFile::new(relative_path, count_lines(&content)));
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    debug!("Found {} source files under {}", files.len(), root.display());
    files
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

/// Number of lines as the measurement store counts them: a trailing newline
/// opens one more (empty) line.
pub fn count_lines(content: &[u8]) -> u32 {
    let newlines = content.iter().filter(|&&b| b == b'\n').count();
    u32::try_from(newlines + 1).unwrap_or(u32::MAX)
}
