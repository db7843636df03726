//! Keyed file driver
//!
//! Stores each identity as `{directory}/{key}.json` containing a JSON array of
//! raw records. Writes go to a temporary sibling file that is then renamed
//! over the target, so readers never observe a half-written file.

use super::StorageDriver;
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::record::RawRecord;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-per-key driver
#[derive(Debug, Clone)]
pub struct FileDriver {
    directory: PathBuf,
}

impl FileDriver {
    /// Create a driver rooted at `directory` (created on first write)
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Default storage directory (~/.mneme/storage)
    pub fn default_directory() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Configuration("Could not determine home directory".to_string()))?;
        Ok(home.join(".mneme").join("storage"))
    }

    /// Root directory of this driver
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file holding an identity
    #[must_use]
    pub fn path_for(&self, identity: &Identity) -> PathBuf {
        self.directory
            .join(format!("{}.json", file_stem(&identity.key())))
    }

    async fn try_read(&self, path: &Path) -> std::io::Result<Option<Vec<RawRecord>>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let records = serde_json::from_slice(&bytes)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        Ok(Some(records))
    }

    async fn try_write(&self, path: &Path, records: &[RawRecord]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let data = serde_json::to_vec(records)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, path).await
    }
}

/// Map a storage key to a file-system safe stem
///
/// Bytes outside `[A-Za-z0-9_.-]` are written as `%XX`, so distinct keys
/// always get distinct stems.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.') {
            stem.push(char::from(byte));
        } else {
            let _ = write!(stem, "%{:02X}", byte);
        }
    }
    stem
}

#[async_trait]
impl StorageDriver for FileDriver {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn read(&self, identity: &Identity) -> Option<Vec<RawRecord>> {
        let path = self.path_for(identity);
        match self.try_read(&path).await {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read storage file");
                None
            }
        }
    }

    async fn write(&self, identity: &Identity, records: &[RawRecord]) -> bool {
        let path = self.path_for(identity);
        match self.try_write(&path, records).await {
            Ok(()) => {
                debug!(path = %path.display(), count = records.len(), "Storage file written");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write storage file");
                false
            }
        }
    }

    async fn remove(&self, identity: &Identity) -> bool {
        let path = self.path_for(identity);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove storage file");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{decode, encode, Message};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_driver_basic_operations() {
        let temp = TempDir::new().unwrap();
        let driver = FileDriver::new(temp.path().join("nested"));
        let identity = Identity::new("chatHistory", "helper").with_user_id("u1");

        assert!(driver.read(&identity).await.is_none());

        let raw = encode(&[Message::user("Hello"), Message::assistant("Hi")]).unwrap();
        assert!(driver.write(&identity, &raw).await);
        assert!(driver.path_for(&identity).exists());

        let loaded: Vec<Message> = decode(driver.read(&identity).await.unwrap()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].content, "Hi");

        assert!(driver.remove(&identity).await);
        assert!(driver.read(&identity).await.is_none());
        // Removing again is still a success
        assert!(driver.remove(&identity).await);
    }

    #[tokio::test]
    async fn test_file_driver_corrupt_file_reads_as_missing() {
        let temp = TempDir::new().unwrap();
        let driver = FileDriver::new(temp.path());
        let identity = Identity::new("usage", "helper");

        std::fs::write(driver.path_for(&identity), b"not json").unwrap();
        assert!(driver.read(&identity).await.is_none());
    }

    #[tokio::test]
    async fn test_file_driver_write_failure_returns_false() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        // Directory path is an existing regular file
        let driver = FileDriver::new(&blocker);
        assert!(!driver.write(&Identity::new("usage", "helper"), &[]).await);
    }

    #[test]
    fn test_file_stem_escapes_separators() {
        assert_eq!(file_stem("chatHistory_a/b_default"), "chatHistory_a%2Fb_default");
        assert_eq!(file_stem("usage_helper_u1"), "usage_helper_u1");
        assert_eq!(file_stem("a%2Fb"), "a%252Fb");
        assert_ne!(file_stem("a:b"), file_stem("a/b"));
    }

    #[tokio::test]
    async fn test_file_driver_isolates_non_ascii_users() {
        let temp = TempDir::new().unwrap();
        let driver = FileDriver::new(temp.path());
        let ivan = Identity::new("chatHistory", "helper").with_user_id("Иван");
        let petr = Identity::new("chatHistory", "helper").with_user_id("Петр");
        assert_ne!(driver.path_for(&ivan), driver.path_for(&petr));

        let raw = encode(&[Message::user("ivan's secret")]).unwrap();
        assert!(driver.write(&ivan, &raw).await);
        assert!(driver.read(&petr).await.is_none());

        let raw = encode(&[Message::user("petr's notes")]).unwrap();
        assert!(driver.write(&petr, &raw).await);
        let loaded: Vec<Message> = decode(driver.read(&ivan).await.unwrap()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].content, "ivan's secret");
    }
}
