use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// A piece of code being annotated, identified by where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Source {
    pub path: PathBuf,
    pub text: String,
}

impl Source {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        // Tabs would break the fixed-width column math of the code canvas.
        let text = text.replace('\t', "    ");
        Ok(Self { path, text })
    }

    pub fn key(&self) -> SourceKey {
        SourceKey::for_path(&self.path)
    }

    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Storage identity of a source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceKey(String);

impl SourceKey {
    pub fn for_path(path: &Path) -> Self {
        Self(format!("file:{}", path.display()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name safe on every platform. Bytes outside `[A-Za-z0-9.-]`,
    /// `_` included, become `_XX` in hex, so distinct keys never share a
    /// file.
    pub fn file_stem(&self) -> String {
        let mut stem = String::with_capacity(self.0.len());
        for b in self.0.bytes() {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b'.' {
                stem.push(char::from(b));
            } else {
                stem.push_str(&format!("_{b:02X}"));
            }
        }
        stem
    }
}
