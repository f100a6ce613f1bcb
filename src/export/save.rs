use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::UnderlayResult;

/// The client-side save action an export is delivered to.
pub trait SaveTarget {
    /// Persist `bytes` under the suggested `filename`.
    fn save(&mut self, filename: &str, bytes: &[u8]) -> UnderlayResult<()>;
}

/// Writes exports to the filesystem.
#[derive(Clone, Debug)]
pub struct FileSaveTarget {
    dir: PathBuf,
    file_name: Option<PathBuf>,
    saved: Vec<PathBuf>,
}

impl FileSaveTarget {
    /// Save into `dir` using the suggested filename.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file_name: None,
            saved: Vec::new(),
        }
    }

    /// Save to exactly `path`, ignoring the suggested filename.
    pub fn at_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            dir,
            file_name: path.file_name().map(PathBuf::from),
            saved: Vec::new(),
        }
    }

    /// Where a file suggested as `filename` will land.
    pub fn resolve(&self, filename: &str) -> PathBuf {
        match &self.file_name {
            Some(name) => self.dir.join(name),
            None => self.dir.join(filename),
        }
    }

    /// Paths written so far.
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }
}

impl SaveTarget for FileSaveTarget {
    fn save(&mut self, filename: &str, bytes: &[u8]) -> UnderlayResult<()> {
        let path = self.resolve(filename);
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create export dir '{}'", self.dir.display()))?;
        std::fs::write(&path, bytes).with_context(|| format!("write '{}'", path.display()))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "saved export");
        self.saved.push(path);
        Ok(())
    }
}

/// Keeps exports in memory, for tests and embedding hosts.
#[derive(Clone, Debug, Default)]
pub struct MemorySaveTarget {
    files: Vec<(String, Vec<u8>)>,
}

impl MemorySaveTarget {
    /// An empty target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved `(filename, bytes)` pairs in save order.
    pub fn files(&self) -> &[(String, Vec<u8>)] {
        &self.files
    }
}

impl SaveTarget for MemorySaveTarget {
    fn save(&mut self, filename: &str, bytes: &[u8]) -> UnderlayResult<()> {
        self.files.push((filename.to_owned(), bytes.to_vec()));
        Ok(())
    }
}
