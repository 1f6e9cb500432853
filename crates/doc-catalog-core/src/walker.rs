use std::collections::HashSet;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::warn;
use walkdir::WalkDir;

/// Enumerates candidate files under the configured roots.
///
/// Exclusion applies to directory names at every depth, not just the root.
/// The walk is depth-first and lexicographic within each directory, so the
/// sequence — and therefore the duplicate tie-break downstream — is
/// deterministic for a given tree.
pub struct DirectoryWalker {
    roots: Vec<PathBuf>,
    exclude: HashSet<OsString>,
}

impl DirectoryWalker {
    pub fn new(roots: Vec<PathBuf>, exclude_names: &[String]) -> Self {
        Self {
            roots,
            exclude: exclude_names.iter().map(OsString::from).collect(),
        }
    }

    /// Start the walk. The returned iterator is lazy, finite, and
    /// non-restartable; the tree is never materialized.
    pub fn files(self) -> FileWalk {
        FileWalk {
            roots: self.roots.into_iter(),
            exclude: self.exclude,
            current: None,
            skipped: 0,
        }
    }
}

pub struct FileWalk {
    roots: std::vec::IntoIter<PathBuf>,
    exclude: HashSet<OsString>,
    current: Option<walkdir::IntoIter>,
    skipped: u64,
}

impl FileWalk {
    /// Entries that could not be read and were passed over.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Iterator for FileWalk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.current.as_mut() {
                None => {
                    let root = self.roots.next()?;
                    self.current =
                        Some(WalkDir::new(root).sort_by_file_name().into_iter());
                }
                Some(iter) => match iter.next() {
                    None => {
                        self.current = None;
                    }
                    Some(Err(err)) => {
                        self.skipped += 1;
                        warn!("skipping unreadable entry: {}", err);
                    }
                    Some(Ok(entry)) => {
                        if entry.file_type().is_dir() {
                            if entry.depth() > 0
                                && self.exclude.contains(entry.file_name())
                            {
                                iter.skip_current_dir();
                            }
                        } else if entry.file_type().is_file() {
                            return Some(entry.into_path());
                        }
                        // symlinks and other non-regular entries are not catalogued
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &std::path::Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn walk_is_depth_first_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.txt"));
        touch(&root.join("a.txt"));
        touch(&root.join("sub/c.txt"));

        let walker = DirectoryWalker::new(vec![root.to_path_buf()], &[]);
        let paths: Vec<PathBuf> = walker.files().collect();
        assert_eq!(
            paths,
            vec![
                root.join("a.txt"),
                root.join("b.txt"),
                root.join("sub/c.txt"),
            ]
        );
    }

    #[test]
    fn exclusion_applies_at_every_depth() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("keep.txt"));
        touch(&root.join("tmp/skip.txt"));
        touch(&root.join("nested/tmp/also_skip.txt"));
        touch(&root.join("nested/keep_too.txt"));

        let walker =
            DirectoryWalker::new(vec![root.to_path_buf()], &["tmp".to_string()]);
        let paths: Vec<PathBuf> = walker.files().collect();
        assert_eq!(paths.len(), 2);
        assert!(paths
            .iter()
            .all(|p| !p.components().any(|c| c.as_os_str() == "tmp")));
    }

    #[test]
    fn missing_root_counts_as_skip() {
        let dir = tempfile::tempdir().unwrap();
        let walker = DirectoryWalker::new(vec![dir.path().join("absent")], &[]);
        let mut walk = walker.files();
        assert_eq!(walk.next(), None);
        assert_eq!(walk.skipped(), 1);
    }

    #[test]
    fn multiple_roots_walk_in_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("one/a.txt"));
        touch(&dir.path().join("two/b.txt"));

        let walker = DirectoryWalker::new(
            vec![dir.path().join("one"), dir.path().join("two")],
            &[],
        );
        let paths: Vec<PathBuf> = walker.files().collect();
        assert_eq!(
            paths,
            vec![dir.path().join("one/a.txt"), dir.path().join("two/b.txt")]
        );
    }
}
