//! Resolves stored file references to playable resources

use crate::error::{PlaybackError, Result};
use crate::types::AudioResource;
use cadence_core::trim_locator;
use lofty::AudioFile;
use std::path::{Path, PathBuf};

/// Maps a track's stored file reference to an `AudioResource`
pub trait ResourceResolver: Send + Sync {
    fn resolve(&self, locator: &str) -> Result<AudioResource>;
}

/// Clean up `locator` and check that it names an existing file
pub fn locate(locator: &str) -> Result<PathBuf> {
    let trimmed = trim_locator(locator);
    if trimmed.is_empty() {
        return Err(PlaybackError::ResourceNotFound(locator.to_string()));
    }

    let path = Path::new(trimmed);
    if !path.is_file() {
        return Err(PlaybackError::ResourceNotFound(locator.to_string()));
    }

    Ok(path.to_path_buf())
}

/// Resolver that reads duration and sample rate with lofty
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyResolver;

impl LoftyResolver {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceResolver for LoftyResolver {
    fn resolve(&self, locator: &str) -> Result<AudioResource> {
        let path = locate(locator)?;

        let tagged_file = lofty::read_from_path(&path).map_err(|e| PlaybackError::Unreadable {
            locator: locator.to_string(),
            reason: e.to_string(),
        })?;

        let properties = tagged_file.properties();

        Ok(AudioResource {
            duration: properties.duration(),
            sample_rate: properties.sample_rate().unwrap_or(0),
            path,
        })
    }
}
