//! Polling file watcher for watch mode
//!
//! Takes periodic snapshots of the manifest's directory (gitignore-aware,
//! via the `ignore` walker) and reports a change whenever a file appears,
//! disappears, or its mtime/size moves. Build output is excluded so a
//! completed build does not immediately retrigger itself.

use super::WatchError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Poll interval between directory snapshots
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Per-file fingerprint; any field moving counts as a change
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

/// Snapshot of all watched files
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot(BTreeMap<PathBuf, Fingerprint>);

/// Watches the directory containing the subgraph manifest
#[derive(Debug)]
pub struct ManifestWatcher {
    root: PathBuf,
    output_dir: PathBuf,
}

impl ManifestWatcher {
    /// Creates a watcher rooted at the manifest's parent directory.
    ///
    /// Fails when that directory does not exist; this is the structural
    /// failure that makes a watch session unable to start.
    pub fn new(manifest: &Path, output_dir: &Path) -> Result<Self, WatchError> {
        let root = match manifest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        if !root.is_dir() {
            return Err(WatchError::Setup {
                path: root,
                reason: "directory does not exist".to_string(),
            });
        }

        Ok(Self {
            root,
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// The directory being watched
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Takes a fingerprint snapshot of every relevant file under the root
    pub fn snapshot(&self) -> Snapshot {
        let mut files = BTreeMap::new();
        // Resolved per snapshot; the output directory may not exist until
        // the first build completes.
        let exclude = self.output_dir.canonicalize().ok();

        let walker = ignore::WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }
            if let Some(exclude) = &exclude {
                if path
                    .canonicalize()
                    .map(|p| p.starts_with(exclude))
                    .unwrap_or(false)
                {
                    continue;
                }
            }
            if let Ok(metadata) = entry.metadata() {
                files.insert(
                    path.to_path_buf(),
                    Fingerprint {
                        modified: metadata.modified().ok(),
                        len: metadata.len(),
                    },
                );
            }
        }

        Snapshot(files)
    }

    /// Suspends until the watched directory changes relative to `current`,
    /// then returns the new snapshot. There is no timeout; only dropping
    /// the future stops the wait.
    pub async fn wait_for_change(&self, current: &Snapshot) -> Snapshot {
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            let next = self.snapshot();
            if next != *current {
                return next;
            }
        }
    }
}
