//! Per-file screenshot folders.
//!
//! Each processed HTML file gets its own directory under the screenshot root.
//! The directory is reset at the start of a run, so it only ever holds the
//! artifacts of one run: numbered PNGs plus the run report.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// File name of the per-file run report
pub const REPORT_FILE_NAME: &str = "strategy_test_report.json";

/// Error types for screenshot folder handling
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        SessionError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Screenshot folder for one processed file
///
/// Cloning shares the capture counter, so the dialog handler task and the
/// step executor number their files from the same sequence.
#[derive(Debug, Clone)]
pub struct ScreenshotSession {
    /// Folder name (sanitized file stem)
    pub id: String,
    /// Folder holding this file's artifacts
    pub dir: PathBuf,
    counter: Arc<AtomicUsize>,
}

impl ScreenshotSession {
    /// Session for `html_file` under `root`; nothing is touched on disk yet
    pub fn for_file(root: &Path, html_file: &str) -> Self {
        Self::with_id(root, &folder_id(html_file))
    }

    /// Session in `root/<id>`
    pub fn with_id(root: &Path, id: &str) -> Self {
        Self {
            dir: root.join(id),
            id: id.to_string(),
            counter: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Remove any previous run's folder and create it empty
    pub fn reset(&self) -> Result<(), SessionError> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).map_err(|e| SessionError::io(&self.dir, e))?;
        }
        fs::create_dir_all(&self.dir).map_err(|e| SessionError::io(&self.dir, e))?;
        self.counter.store(0, Ordering::SeqCst);
        Ok(())
    }

    /// Reserve the next numbered path: `<index:03>_<name>.png`
    pub fn next_path(&self, name: &str) -> PathBuf {
        let index = self.counter.fetch_add(1, Ordering::SeqCst);
        self.dir.join(format!("{:03}_{}.png", index, sanitize_name(name)))
    }

    /// Write PNG bytes under the next numbered name
    pub fn save(&self, name: &str, png: &[u8]) -> Result<PathBuf, SessionError> {
        let path = self.next_path(name);
        fs::write(&path, png).map_err(|e| SessionError::io(&path, e))?;
        Ok(path)
    }

    /// Number of indices handed out so far
    pub fn issued(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }

    /// All PNG files in the folder, sorted by name
    pub fn list_captures(&self) -> Result<Vec<PathBuf>, SessionError> {
        let mut captures = Vec::new();
        if self.dir.exists() {
            let entries = fs::read_dir(&self.dir).map_err(|e| SessionError::io(&self.dir, e))?;
            for entry in entries {
                let path = entry.map_err(|e| SessionError::io(&self.dir, e))?.path();
                if path.extension().map(|e| e == "png").unwrap_or(false) {
                    captures.push(path);
                }
            }
        }
        captures.sort();
        Ok(captures)
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE_NAME)
    }
}

/// Sanitize a name for use in filenames
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

/// Folder name for an HTML file: its sanitized stem
pub fn folder_id(html_file: &str) -> String {
    let stem = Path::new(html_file)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| html_file.to_string());
    sanitize_name(&stem)
}

/// Folder names for a batch, one per file and pairwise distinct.
///
/// Names are compared case-insensitively; a clash gets `_2`, `_3`, ... in
/// file order, so a sorted listing always maps to the same folders.
pub fn unique_folder_ids(files: &[String]) -> Vec<String> {
    let mut taken = HashSet::new();
    files
        .iter()
        .map(|file| {
            let base = folder_id(file);
            let mut id = base.clone();
            let mut n = 2;
            while !taken.insert(id.to_lowercase()) {
                id = format!("{}_{}", base, n);
                n += 1;
            }
            id
        })
        .collect()
}

/// Expand `{value}` and `{index}` in a screenshot name template
pub fn expand_name_template(template: &str, value: &str, index: usize) -> String {
    template
        .replace("{value}", value)
        .replace("{index}", &index.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("hello world"), "hello_world");
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_name("merge-sort_1"), "merge-sort_1");
    }

    #[test]
    fn test_for_file_uses_stem() {
        let session = ScreenshotSession::for_file(Path::new("/tmp/shots"), "Binary Tree.html");
        assert_eq!(session.id, "Binary_Tree");
        assert_eq!(session.dir, PathBuf::from("/tmp/shots/Binary_Tree"));
    }

    #[test]
    fn test_numbered_paths() {
        let session = ScreenshotSession::for_file(Path::new("/tmp/x"), "a.html");
        assert!(session.next_path("initial").ends_with("000_initial.png"));
        assert!(session.next_path("after insert").ends_with("001_after_insert.png"));
        let shared = session.clone();
        assert!(shared.next_path("alert").ends_with("002_alert.png"));
        assert_eq!(session.issued(), 3);
    }

    #[test]
    fn test_reset_clears_previous_run() {
        let root = tempfile::tempdir().unwrap();
        let session = ScreenshotSession::for_file(root.path(), "heap.html");
        session.reset().unwrap();
        session.save("one", b"png").unwrap();
        session.save("two", b"png").unwrap();
        fs::write(session.dir.join("notes.txt"), "x").unwrap();
        assert_eq!(session.list_captures().unwrap().len(), 2);

        session.reset().unwrap();
        assert!(session.list_captures().unwrap().is_empty());
        assert!(session.next_path("again").ends_with("000_again.png"));
    }

    #[test]
    fn test_unique_folder_ids() {
        let files: Vec<String> = ["Heap.HTML", "heap.html", "merge sort.html", "merge_sort.html", "queue.html"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            unique_folder_ids(&files),
            vec!["Heap", "heap_2", "merge_sort", "merge_sort_2", "queue"]
        );
    }

    #[test]
    fn test_expand_name_template() {
        assert_eq!(expand_name_template("insert_{value}_{index}", "42", 3), "insert_42_3");
        assert_eq!(expand_name_template("plain", "1", 0), "plain");
    }
}
