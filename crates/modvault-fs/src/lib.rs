//! Filesystem primitives for modvault.
//!
//! - [`atomic_write`]: write-to-temp then rename, so readers never observe a
//!   half-written ledger.
//! - [`staging_path`]: sibling path a download streams into before it is
//!   renamed onto its destination.
//! - [`sanitize_component`]: turns catalog names into safe path components.

mod error;
mod sanitize;

pub use error::{FsError, Result};
pub use sanitize::{sanitize_component, REPLACEMENT};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    pub permissions: Option<u32>,
    pub sync:        bool,
}

impl AtomicWriteOptions {
    pub fn new() -> Self { Self::default() }

    pub fn permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode);
        self
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// Temporary sibling used by [`atomic_write`].
fn temp_path(path: &Path) -> Result<PathBuf> {
    let parent = parent_of(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(parent.join(format!(".{name}.{}.tmp", std::process::id())))
}

fn parent_of(path: &Path) -> Result<PathBuf> {
    match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Ok(PathBuf::from(".")),
        Some(p) => Ok(p.to_path_buf()),
        None => Err(FsError::NoParent {
            path: path.to_path_buf(),
        }),
    }
}

pub fn atomic_write(path: impl AsRef<Path>, content: &[u8], options: AtomicWriteOptions) -> Result<()> {
    let path = path.as_ref();
    let tmp_path = temp_path(path)?;

    let write = |tmp: &Path| -> std::io::Result<()> {
        let mut file = fs::File::create(tmp)?;
        file.write_all(content)?;
        if options.sync {
            file.sync_all()?;
        }
        Ok(())
    };

    write(&tmp_path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        FsError::Write {
            path: tmp_path.clone(),
            source,
        }
    })?;

    #[cfg(unix)]
    if let Some(mode) = options.permissions {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(mode)).map_err(|source| {
            FsError::Write {
                path: tmp_path.clone(),
                source,
            }
        })?;
    }

    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        FsError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|source| FsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Create `path` and every missing ancestor.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::create_dir_all(path).map_err(|source| FsError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// `dir/name.ext` -> `dir/.name.ext.part`
pub fn staging_path(destination: &Path) -> Result<PathBuf> {
    let parent = parent_of(destination)?;
    let name = destination
        .file_name()
        .ok_or_else(|| FsError::NoParent {
            path: destination.to_path_buf(),
        })?
        .to_string_lossy()
        .into_owned();
    Ok(parent.join(format!(".{name}.part")))
}

/// Move a finished staging file onto its destination, replacing any previous file.
pub fn commit_staged(staging: &Path, destination: &Path) -> Result<()> {
    fs::rename(staging, destination).map_err(|source| {
        let _ = fs::remove_file(staging);
        FsError::Write {
            path: destination.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        atomic_write(&path, b"{\"items\":[]}", AtomicWriteOptions::new()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{\"items\":[]}");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        atomic_write(&path, b"one", AtomicWriteOptions::new().sync(true)).unwrap();
        atomic_write(&path, b"two", AtomicWriteOptions::new()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("ledger.json")]);
        assert_eq!(atomic_read(&path).unwrap(), b"two");
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_with_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        atomic_write(&path, b"data", AtomicWriteOptions::new().permissions(0o600)).unwrap();
        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_atomic_read_missing() {
        let dir = tempdir().unwrap();
        let err = atomic_read(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, FsError::Read { .. }));
    }

    #[test]
    fn test_staging_path() {
        let staged = staging_path(Path::new("Checkpoint/Model/model.safetensors")).unwrap();
        assert_eq!(staged, Path::new("Checkpoint/Model/.model.safetensors.part"));
    }
}
