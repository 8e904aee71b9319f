use std::path::PathBuf;

use thiserror::Error;
use wikirag_core::ResourceDescriptor;

use crate::config::TargetSettings;
use crate::persist::{ArtifactDirectory, PersistError};

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("invalid target configuration: {0}")]
    Config(String),
    #[error("target used before it was configured")]
    NotConfigured,
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Sink receiving finished artifacts.
pub trait Target: Send + Sync {
    fn set_config(&mut self, settings: TargetSettings) -> Result<(), TargetError>;

    /// Store the artifact, creating any needed storage location.
    fn write(&self, resource: &ResourceDescriptor) -> Result<(), TargetError>;

    /// Drop the artifact; no-op when it does not exist.
    fn remove(&self, resource: &ResourceDescriptor) -> Result<(), TargetError>;
}

/// Writes `{resource_id}.{extension}` files into the configured `path`.
#[derive(Debug, Default)]
pub struct LocalDirectoryTarget {
    directory: Option<ArtifactDirectory>,
}

impl LocalDirectoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    fn directory(&self) -> Result<&ArtifactDirectory, TargetError> {
        self.directory.as_ref().ok_or(TargetError::NotConfigured)
    }
}

impl Target for LocalDirectoryTarget {
    fn set_config(&mut self, settings: TargetSettings) -> Result<(), TargetError> {
        let path = settings
            .get("path")
            .and_then(|value| value.as_str())
            .filter(|path| !path.trim().is_empty())
            .ok_or_else(|| TargetError::Config("`path` must be a non-empty string".into()))?;
        self.directory = Some(ArtifactDirectory::new(PathBuf::from(path)));
        Ok(())
    }

    fn write(&self, resource: &ResourceDescriptor) -> Result<(), TargetError> {
        self.directory()?
            .write(&resource.file_name(), resource.content())?;
        Ok(())
    }

    fn remove(&self, resource: &ResourceDescriptor) -> Result<(), TargetError> {
        self.directory()?.remove(&resource.file_name())?;
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTarget;

impl Target for NullTarget {
    fn set_config(&mut self, _settings: TargetSettings) -> Result<(), TargetError> {
        Ok(())
    }

    fn write(&self, _resource: &ResourceDescriptor) -> Result<(), TargetError> {
        Ok(())
    }

    fn remove(&self, _resource: &ResourceDescriptor) -> Result<(), TargetError> {
        Ok(())
    }
}
