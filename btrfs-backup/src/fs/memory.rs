//! In-memory filesystem for tests.

use super::{EntryMetadata, FileSystem};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: BTreeMap<PathBuf, (Node, SystemTime)>,
    denied: HashSet<PathBuf>,
    stat_denied: HashSet<PathBuf>,
}

/// Shared in-memory tree. Clones see the same state, so fake clients can
/// mutate what the engine later reads.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    tree: Arc<Mutex<Tree>>,
}

/// Timestamp `secs` seconds after the epoch.
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, path: impl Into<PathBuf>, modified: SystemTime) {
        self.lock().nodes.insert(path.into(), (Node::Dir, modified));
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, content: &[u8]) {
        self.lock()
            .nodes
            .insert(path.into(), (Node::File(content.to_vec()), SystemTime::now()));
    }

    /// Remove `path` and everything below it.
    pub fn remove(&self, path: &Path) {
        self.lock().nodes.retain(|p, _| !p.starts_with(path));
    }

    /// Make every read of `path` fail with permission denied.
    pub fn deny(&self, path: impl Into<PathBuf>) {
        self.lock().denied.insert(path.into());
    }

    /// Make `path` fail to stat with permission denied, whether it exists
    /// or not.
    pub fn deny_stat(&self, path: impl Into<PathBuf>) {
        self.lock().stat_denied.insert(path.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tree> {
        self.tree.lock().unwrap()
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, path.display().to_string())
}

fn check_denied(tree: &Tree, path: &Path) -> io::Result<()> {
    if tree.denied.contains(path) {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            path.display().to_string(),
        ));
    }
    Ok(())
}

impl FileSystem for MemoryFs {
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        let tree = self.lock();
        if tree.stat_denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                path.display().to_string(),
            ));
        }
        match tree.nodes.get(path) {
            Some((_, modified)) => Ok(EntryMetadata { modified: *modified }),
            None => Err(not_found(path)),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let tree = self.lock();
        check_denied(&tree, path)?;
        match tree.nodes.get(path) {
            Some((Node::Dir, _)) => {}
            Some((Node::File(_), _)) => {
                return Err(io::Error::new(io::ErrorKind::Other, "not a directory"))
            }
            None => return Err(not_found(path)),
        }

        Ok(tree
            .nodes
            .keys()
            .filter(|p| p.parent() == Some(path))
            .filter_map(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect())
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let tree = self.lock();
        check_denied(&tree, path)?;
        match tree.nodes.get(path) {
            Some((Node::File(content), _)) => Ok(content.clone()),
            Some((Node::Dir, _)) => Err(io::Error::new(io::ErrorKind::Other, "is a directory")),
            None => Err(not_found(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_only_one_level_deep() {
        let fs = MemoryFs::new();
        fs.add_dir("/snapshots", at(1));
        fs.add_dir("/snapshots/a", at(2));
        fs.add_file("/snapshots/a/inner", b"x");

        assert_eq!(fs.read_dir(Path::new("/snapshots")).unwrap(), vec!["a"]);

        fs.remove(Path::new("/snapshots/a"));
        assert!(fs.read_dir(Path::new("/snapshots")).unwrap().is_empty());
        assert!(!fs.exists(Path::new("/snapshots/a/inner")));
    }
}
