//! Annotation files, one per source.

use crate::error::{Error, Result};
use crate::source::SourceKey;
use crate::store::Annotations;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct AnnotationStore {
    dir: PathBuf,
}

impl AnnotationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &SourceKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.file_stem()))
    }

    /// `Ok(None)` when nothing was saved for `key` yet.
    pub fn load(&self, key: &SourceKey) -> Result<Option<Annotations>> {
        let path = self.path_for(key);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(&path, e)),
        };
        let annotations =
            serde_json::from_str(&json).map_err(|source| Error::Json { path: path.clone(), source })?;
        log::info!("loaded annotations for {} from {}", key.as_str(), path.display());
        Ok(Some(annotations))
    }

    pub fn save(&self, key: &SourceKey, annotations: &Annotations) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let path = self.path_for(key);
        let json = serde_json::to_string_pretty(annotations).map_err(Error::Encode)?;
        std::fs::write(&path, json).map_err(|e| Error::io(&path, e))?;
        log::debug!("saved annotations for {} to {}", key.as_str(), path.display());
        Ok(())
    }
}

pub fn default_annotations_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("codemark"),
        None => PathBuf::from("annotations"),
    }
}
