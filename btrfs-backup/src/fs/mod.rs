//! Filesystem access used by the engine.
//!
//! Everything the orchestrator reads from disk goes through [`FileSystem`],
//! so tests can swap in an in-memory tree.

pub mod metadata;

#[cfg(test)]
pub mod memory;

pub use metadata::EntryMetadata;

use std::io;
use std::path::Path;

/// Read-only view of the filesystem.
pub trait FileSystem: Send + Sync {
    /// Metadata of `path`, following symlinks.
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata>;

    /// Names of the entries directly inside `path`.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Full contents of the file at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Whether `path` exists. Errors other than "not found" count as existing.
    fn exists(&self, path: &Path) -> bool {
        match self.metadata(path) {
            Ok(_) => true,
            Err(e) => e.kind() != io::ErrorKind::NotFound,
        }
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        EntryMetadata::from_std(&std::fs::metadata(path)?)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_fs_lists_and_reads() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        std::fs::write(temp_dir.path().join("a"), b"alpha")?;
        std::fs::create_dir(temp_dir.path().join("b"))?;

        let fs = LocalFs;
        let mut names = fs.read_dir(temp_dir.path())?;
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);

        assert_eq!(fs.read(&temp_dir.path().join("a"))?, b"alpha");
        assert!(fs.metadata(&temp_dir.path().join("b")).is_ok());
        assert!(fs.exists(&temp_dir.path().join("a")));
        assert!(!fs.exists(&temp_dir.path().join("missing")));

        Ok(())
    }
}
