//! Read-only filesystems that migration scripts are loaded from

use std::fmt::Debug;
use std::io;
use std::path::PathBuf;

/// A read-only tree of files addressed by `/`-separated relative paths
pub trait MigrationFs: Send + Sync + Debug {
    /// Names of the regular files directly inside `dir`
    fn read_dir(&self, dir: &str) -> io::Result<Vec<String>>;

    fn read_to_string(&self, path: &str) -> io::Result<String>;
}

/// Files compiled into the binary
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedFs {
    files: &'static [(&'static str, &'static str)],
}

impl EmbeddedFs {
    /// `files` pairs a relative path with the file's contents
    pub const fn new(files: &'static [(&'static str, &'static str)]) -> Self {
        Self { files }
    }

    pub fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.files.iter().map(|(path, _)| *path)
    }
}

impl MigrationFs for EmbeddedFs {
    fn read_dir(&self, dir: &str) -> io::Result<Vec<String>> {
        let prefix = format!("{}/", dir.trim_matches('/'));
        let mut found = false;
        let mut names = Vec::new();

        for (path, _) in self.files {
            if let Some(rest) = path.strip_prefix(&prefix) {
                found = true;
                if !rest.contains('/') {
                    names.push(rest.to_string());
                }
            }
        }

        if !found {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no embedded directory '{}'", dir),
            ));
        }
        Ok(names)
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        let path = path.trim_start_matches('/');
        self.files
            .iter()
            .find(|(candidate, _)| *candidate == path)
            .map(|(_, contents)| contents.to_string())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("no embedded file '{}'", path))
            })
    }
}

/// A directory on disk
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl MigrationFs for DirFs {
    fn read_dir(&self, dir: &str) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.root.join(dir))? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(self.root.join(path))
    }
}
