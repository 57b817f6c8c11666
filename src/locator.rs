//! Resolution of report-declared paths to known project files.
//!
//! Coverage tools write paths relative to whatever directory they ran in, so
//! a report may say `/checkout/src/lib.rs`, `build/../src/lib.rs` or just
//! `lib.rs` for the project file `src/lib.rs`. A path whose `..` climbs above
//! its first segment names nothing and never resolves. Absolute paths below the project root
//! match exactly. Otherwise known files are looked up in a tree keyed by path
//! segments read from the file name backwards: a report path resolves to the
//! file whose trailing segments are exactly the report path's segments.
//!
//! When a suffix is shared by several files, the first-indexed branch below
//! it is followed down to a leaf. This is a deterministic approximation, not
//! a best-match search.
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::model::InputFile;

#[derive(Debug, Default)]
struct Node {
    /// Children in insertion order.
    children: Vec<(String, Node)>,
    file: Option<usize>,
}

impl Node {
    fn child(&self, segment: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(s, _)| s == segment)
            .map(|(_, node)| node)
    }

    fn child_or_insert(&mut self, segment: &str) -> &mut Node {
        let pos = match self.children.iter().position(|(s, _)| s == segment) {
            Some(pos) => pos,
            None => {
                self.children.push((segment.to_string(), Node::default()));
                self.children.len() - 1
            }
        };
        &mut self.children[pos].1
    }

    /// The file of the leaf reached by following first children.
    fn first_leaf_file(&self) -> Option<usize> {
        let mut node = self;
        while let Some((_, child)) = node.children.first() {
            node = child;
        }
        node.file
    }
}

/// Index of known files, built once per ingestion pass and read-only after.
#[derive(Debug, Default)]
pub struct FileLocator {
    files: Vec<Arc<InputFile>>,
    by_path: HashMap<String, usize>,
    base_dir: Vec<String>,
    root: Node,
}

impl FileLocator {
    pub fn new<I>(files: I) -> Self
    where
        I: IntoIterator<Item = InputFile>,
    {
        let mut locator = FileLocator::default();
        for file in files {
            locator.index(file);
        }
        locator
    }

    /// Set the project root so that absolute report paths below it match
    /// their project file exactly, before any suffix matching.
    pub fn with_base_dir(mut self, base_dir: impl AsRef<Path>) -> Self {
        let base = base_dir.as_ref().to_string_lossy();
        self.base_dir = segments(&base)
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect();
        self
    }

    fn index(&mut self, file: InputFile) {
        let Some(segs) = segments(&file.relative_path).filter(|s| !s.is_empty()) else {
            return;
        };
        let id = self.files.len();
        self.by_path.insert(segs.join("/"), id);

        let mut node = &mut self.root;
        for seg in segs.iter().rev() {
            node = node.child_or_insert(seg);
        }
        node.file = Some(id);
        self.files.push(Arc::new(file));
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[Arc<InputFile>] {
        &self.files
    }

    /// Resolve a report path: exact match first, then suffix match.
    pub fn resolve(&self, path: &str) -> Option<&Arc<InputFile>> {
        self.find_exact(path).or_else(|| self.find_by_suffix(path))
    }

    /// Match a project-relative path, or an absolute path below the base
    /// directory.
    pub fn find_exact(&self, path: &str) -> Option<&Arc<InputFile>> {
        let segs = segments(path).filter(|s| !s.is_empty())?;
        if let Some(&id) = self.by_path.get(&segs.join("/")) {
            return Some(&self.files[id]);
        }
        let base_len = self.base_dir.len();
        if base_len > 0
            && segs.len() > base_len
            && segs.iter().zip(&self.base_dir).all(|(a, b)| *a == b.as_str())
        {
            let relative = segs[base_len..].join("/");
            return self.by_path.get(&relative).map(|&id| &self.files[id]);
        }
        None
    }

    /// Match on trailing path segments.
    ///
    /// Past the last query segment the search keeps descending through first
    /// children until it reaches a leaf, even when the node it stopped at is
    /// itself a file: with `a/main.rs` indexed before `main.rs`, `main.rs`
    /// finds `a/main.rs` here. [`resolve`](Self::resolve) tries
    /// [`find_exact`](Self::find_exact) first and returns `main.rs`.
    pub fn find_by_suffix(&self, path: &str) -> Option<&Arc<InputFile>> {
        let segs = segments(path).filter(|s| !s.is_empty())?;
        let mut node = &self.root;
        for seg in segs.iter().rev() {
            node = node.child(seg)?;
        }
        node.first_leaf_file().map(|id| &self.files[id])
    }
}

/// Split a path on `/` and `\`, dropping empty and `.` segments and folding
/// `..` into its parent. `None` when a `..` has no parent left to fold into.
fn segments(path: &str) -> Option<Vec<&str>> {
    let mut out: Vec<&str> = Vec::new();
    for seg in path.split(['/', '\\']) {
        match seg {
            "" | "." => {}
            ".." => {
                out.pop()?;
            }
            _ => out.push(seg),
        }
    }
    Some(out)
}
