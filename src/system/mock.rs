//! Mock system implementation for testing

use super::System;
use std::collections::{HashMap, HashSet};
use std::env::VarError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// In-memory implementation of System trait for testing
///
/// `MockSystem` provides an in-memory filesystem and environment for fast,
/// isolated unit tests without side effects.
///
/// # Example
/// ```
/// use repofleet::system::{MockSystem, System};
/// use std::path::Path;
///
/// let system = MockSystem::new()
///     .with_env("HOME", "/home/user")
///     .with_file("/test/file.txt", b"hello");
///
/// assert_eq!(system.env_var("HOME").unwrap(), "/home/user");
/// assert!(system.exists(Path::new("/test/file.txt")));
/// ```
#[derive(Clone)]
pub struct MockSystem {
    state: Arc<RwLock<MockSystemState>>,
}

struct MockSystemState {
    env_vars: HashMap<String, String>,
    current_dir: PathBuf,
    home_dir: Option<PathBuf>,
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
}

impl MockSystem {
    /// Create a new `MockSystem` with default state
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockSystemState {
                env_vars: HashMap::new(),
                current_dir: PathBuf::from("/"),
                home_dir: Some(PathBuf::from("/home/user")),
                files: HashMap::new(),
                dirs: HashSet::from([PathBuf::from("/")]),
            })),
        }
    }

    /// Set an environment variable (builder pattern)
    #[must_use]
    pub fn with_env(self, key: &str, value: &str) -> Self {
        self.state
            .write()
            .expect("mock state poisoned")
            .env_vars
            .insert(key.to_owned(), value.to_owned());
        self
    }

    /// Set the current working directory (builder pattern)
    #[must_use]
    pub fn with_current_dir<P: AsRef<Path>>(self, dir: P) -> Self {
        self.state
            .write()
            .expect("mock state poisoned")
            .current_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Add a file with contents (builder pattern)
    #[must_use]
    pub fn with_file<P: AsRef<Path>>(self, path: P, contents: &[u8]) -> Self {
        let path_buf = path.as_ref().to_path_buf();
        {
            let mut state = self.state.write().expect("mock state poisoned");
            if let Some(parent) = path_buf.parent() {
                Self::ensure_parent_dirs(&mut state.dirs, parent);
            }
            state.files.insert(path_buf, contents.to_vec());
        }
        self
    }

    /// Add a directory (builder pattern)
    #[must_use]
    pub fn with_dir<P: AsRef<Path>>(self, path: P) -> Self {
        let path_buf = path.as_ref().to_path_buf();
        {
            let mut state = self.state.write().expect("mock state poisoned");
            Self::ensure_parent_dirs(&mut state.dirs, &path_buf);
            state.dirs.insert(path_buf);
        }
        self
    }

    fn ensure_parent_dirs(dirs: &mut HashSet<PathBuf>, path: &Path) {
        let mut current = path;
        loop {
            dirs.insert(current.to_path_buf());
            match current.parent() {
                Some(parent) if parent != Path::new("") => current = parent,
                _ => break,
            }
        }
    }
}

impl Default for MockSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MockSystem {
    fn env_var(&self, key: &str) -> Result<String, VarError> {
        self.state
            .read()
            .expect("mock state poisoned")
            .env_vars
            .get(key)
            .cloned()
            .ok_or(VarError::NotPresent)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        Ok(self
            .state
            .read()
            .expect("mock state poisoned")
            .current_dir
            .clone())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.state
            .read()
            .expect("mock state poisoned")
            .home_dir
            .clone()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.home_dir().map(|home| home.join(".config"))
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let state = self.state.read().expect("mock state poisoned");
        let contents = state.files.get(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
        })?;
        String::from_utf8(contents.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut state = self.state.write().expect("mock state poisoned");
        if let Some(parent) = path.parent() {
            Self::ensure_parent_dirs(&mut state.dirs, parent);
        }
        state.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.write().expect("mock state poisoned");
        Self::ensure_parent_dirs(&mut state.dirs, path);
        state.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state.write().expect("mock state poisoned");
        let contents = state.files.remove(from).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", from.display()))
        })?;
        state.files.insert(to.to_path_buf(), contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.read().expect("mock state poisoned");
        state.files.contains_key(path) || state.dirs.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_round_trip() {
        let system = MockSystem::new().with_file("/a/b.txt", b"contents");
        assert_eq!(
            system.read_to_string(Path::new("/a/b.txt")).unwrap(),
            "contents"
        );
        assert!(system.exists(Path::new("/a")));
    }

    #[test]
    fn test_rename_replaces_destination() {
        let system = MockSystem::new()
            .with_file("/store/doc.tmp", b"new")
            .with_file("/store/doc", b"old");

        system
            .rename(Path::new("/store/doc.tmp"), Path::new("/store/doc"))
            .unwrap();

        assert_eq!(system.read_to_string(Path::new("/store/doc")).unwrap(), "new");
        assert!(!system.exists(Path::new("/store/doc.tmp")));
    }

    #[test]
    fn test_env_vars() {
        let system = MockSystem::new().with_env("REPOFLEET_HOME", "/tmp/store");
        assert_eq!(system.env_var("REPOFLEET_HOME").unwrap(), "/tmp/store");
        assert!(system.env_var("MISSING").is_err());
    }
}
