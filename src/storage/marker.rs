use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("Failed to read marker file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write marker file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File holding the GUID of the newest entry already turned into an issue.
///
/// The file contains only the GUID; surrounding whitespace is ignored on
/// load.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    path: PathBuf,
}

impl MarkerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored GUID, or `None` when the file is missing or blank.
    pub fn load(&self) -> Result<Option<String>, MarkerError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let guid = content.trim();
                Ok((!guid.is_empty()).then(|| guid.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(MarkerError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Replaces the stored GUID, creating parent directories as needed.
    ///
    /// Written to a temporary sibling first and renamed into place, so a
    /// crash never leaves a truncated marker behind.
    pub fn save(&self, guid: &str) -> Result<(), MarkerError> {
        let write_err = |source: std::io::Error| MarkerError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        // SEC-009: Randomized temp filename; create_new refuses to follow a planted file
        use std::time::{SystemTime, UNIX_EPOCH};
        let random_suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let temp_path = self
            .path
            .with_extension(format!("tmp.{:016x}", random_suffix));

        let result = (|| {
            let mut temp_file = std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp_path)?;
            temp_file.write_all(guid.as_bytes())?;
            temp_file.sync_all()?;
            drop(temp_file);

            // On Windows, rename fails if destination exists
            #[cfg(windows)]
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }

            std::fs::rename(&temp_path, &self.path)
        })();

        if let Err(e) = result {
            let _ = std::fs::remove_file(&temp_path);
            return Err(write_err(e));
        }

        tracing::debug!(path = %self.path.display(), guid = %guid, "Saved marker");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "changelog_issues_marker_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_file_is_none() {
        let store = MarkerStore::new(temp_dir("missing").join("guid.txt"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_blank_file_is_none() {
        let dir = temp_dir("blank");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("guid.txt");
        std::fs::write(&path, "  \n").unwrap();

        assert_eq!(MarkerStore::new(&path).load().unwrap(), None);
    }

    #[test]
    fn test_load_trims_whitespace() {
        let dir = temp_dir("trim");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("guid.txt");
        std::fs::write(&path, "entry-2\n").unwrap();

        assert_eq!(
            MarkerStore::new(&path).load().unwrap().as_deref(),
            Some("entry-2")
        );
    }

    #[test]
    fn test_save_creates_directories_and_overwrites() {
        let dir = temp_dir("save");
        let path = dir.join(".github").join("last-changelog-guid.txt");
        let store = MarkerStore::new(&path);

        store.save("entry-1").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "entry-1");

        store.save("entry-0").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("entry-0"));

        // No temp files left behind
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_read_error_on_directory() {
        let dir = temp_dir("is_dir");
        std::fs::create_dir_all(&dir).unwrap();

        let err = MarkerStore::new(&dir).load().unwrap_err();
        assert!(matches!(err, MarkerError::Read { .. }));
    }
}
