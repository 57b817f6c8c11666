#![allow(dead_code)]

use std::path::{Path, PathBuf};

use covmap::locator::FileLocator;
use covmap::model::InputFile;
use tempfile::TempDir;

/// Create a temporary project tree from `(relative path, content)` pairs.
/// The caller must hold onto `TempDir` to keep the temp directory alive.
pub fn setup_project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
    dir
}

/// Write a report next to the project and return its path.
pub fn write_report(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Locator over in-memory files, no base directory.
pub fn locator(files: &[(&str, u32)]) -> FileLocator {
    FileLocator::new(files.iter().map(|(p, n)| InputFile::new(*p, *n)))
}

/// Source text with `n` lines.
pub fn source_lines(n: usize) -> String {
    (1..n).map(|i| format!("// line {i}\n")).collect()
}

/// Problems rendered as "report:line: message".
pub fn problems(problems: &[covmap::model::ParseProblem]) -> Vec<String> {
    problems.iter().map(ToString::to_string).collect()
}
