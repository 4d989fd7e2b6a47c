use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Fixed directory + file pair the seed database is staged into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbLocation {
    dir: PathBuf,
    file: PathBuf,
}

impl DbLocation {
    pub fn new(root: impl AsRef<Path>, dir_name: &str, file_name: &str) -> Self {
        let dir = root.as_ref().join(dir_name);
        let file = dir.join(file_name);
        Self { dir, file }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Sibling path transfers write to before being renamed into place.
    pub fn partial_file(&self) -> PathBuf {
        let mut name = self
            .file
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".partial");
        self.dir.join(name)
    }
}
