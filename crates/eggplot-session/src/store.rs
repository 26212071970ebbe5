//! Instruction file storage.
//!
//! The plotter exposes a flat, name-keyed store of instruction files. The
//! trait models exactly that surface; [`LocalStore`] implements it over a
//! local directory for offline work and tests.

use async_trait::async_trait;
use eggplot_core::{Result, TransportError};
use std::path::PathBuf;
use tracing::info;

/// A name-keyed store of instruction text files, with a way to start
/// printing one.
///
/// Operations that fail must leave the store unchanged; callers keep their
/// local caches untouched on error.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// File names currently in the store.
    async fn list(&self) -> Result<Vec<String>>;

    /// Full instruction text of a stored file.
    async fn load(&self, name: &str) -> Result<String>;

    /// Stores a new file. Fails with [`TransportError::AlreadyExists`] when
    /// the name is taken; collision policy is the caller's to resolve.
    async fn save(&self, name: &str, content: &str) -> Result<()>;

    /// Removes a stored file.
    async fn delete(&self, name: &str) -> Result<()>;

    /// Asks the device to start printing a stored file.
    async fn print(&self, name: &str) -> Result<()>;

    /// Sends a raw control command to the device (stop, pause, continue).
    async fn command(&self, command: &str) -> Result<()>;
}

/// [`FileStore`] over a local directory, one file per stored name.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl FileStore for LocalStore {
    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(TransportError::Io)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(TransportError::Io)? {
            if entry.file_type().await.map_err(TransportError::Io)?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn load(&self, name: &str) -> Result<String> {
        let path = self.path_for(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(TransportError::NotFound {
                    name: name.to_string(),
                }
                .into())
            }
            Err(err) => Err(TransportError::Io(err).into()),
        }
    }

    async fn save(&self, name: &str, content: &str) -> Result<()> {
        let path = self.path_for(name);
        if tokio::fs::try_exists(&path).await.map_err(TransportError::Io)? {
            return Err(TransportError::AlreadyExists {
                name: name.to_string(),
            }
            .into());
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(TransportError::Io)?;
        info!(name, bytes = content.len(), "instruction file saved");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(TransportError::NotFound {
                    name: name.to_string(),
                }
                .into())
            }
            Err(err) => Err(TransportError::Io(err).into()),
        }
    }

    async fn print(&self, name: &str) -> Result<()> {
        Err(TransportError::Other {
            message: format!("local store cannot print '{name}': no device attached"),
        }
        .into())
    }

    async fn command(&self, command: &str) -> Result<()> {
        Err(TransportError::Other {
            message: format!("local store cannot run '{command}': no device attached"),
        }
        .into())
    }
}
