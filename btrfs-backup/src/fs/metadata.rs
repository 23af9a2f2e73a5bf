//! Entry metadata as seen by the snapshot inventory.
//!
//! Snapshots are read-only once created, so their modification time is a
//! stable recency signal.

use std::fs;
use std::time::SystemTime;

/// Metadata of a single filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Last modified time
    pub modified: SystemTime,
}

impl EntryMetadata {
    /// Extract metadata from a std metadata record
    pub fn from_std(metadata: &fs::Metadata) -> std::io::Result<Self> {
        Ok(Self {
            modified: metadata.modified()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_extract_metadata() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let file_path = temp_dir.path().join("entry");
        let file = File::create(&file_path)?;

        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        file.set_modified(stamp)?;

        let metadata = EntryMetadata::from_std(&fs::metadata(&file_path)?)?;
        assert_eq!(metadata.modified, stamp);

        Ok(())
    }
}
