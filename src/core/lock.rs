//! Advisory project lock
//!
//! At most one reconciliation may run against a project at a time. The lock
//! is a file created with `create_new`, which is atomic on every platform we
//! care about. The guard removes the file on drop, so every exit path that
//! unwinds back through main releases it.

use crate::core::error::{LockError, ShipError, ShipResult};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// RAII guard over the `.shipver/lock` file
pub struct ProjectLock {
  path: PathBuf,
}

impl ProjectLock {
  /// Acquire the lock, creating its parent directory if needed.
  ///
  /// The holder's pid is written into the file so a conflicting run can be
  /// identified; staleness is judged by the user, never auto-broken.
  pub fn acquire(path: &Path) -> ShipResult<Self> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|source| {
        ShipError::Lock(LockError::Io {
          path: path.to_path_buf(),
          source,
        })
      })?;
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
      Ok(mut file) => {
        let _ = writeln!(file, "pid {}", std::process::id());
        Ok(Self {
          path: path.to_path_buf(),
        })
      }
      Err(e) if e.kind() == ErrorKind::AlreadyExists => {
        let holder = fs::read_to_string(path)
          .ok()
          .map(|s| s.trim().to_string())
          .filter(|s| !s.is_empty());
        Err(ShipError::Lock(LockError::Held {
          path: path.to_path_buf(),
          holder,
        }))
      }
      Err(source) => Err(ShipError::Lock(LockError::Io {
        path: path.to_path_buf(),
        source,
      })),
    }
  }
}

impl Drop for ProjectLock {
  fn drop(&mut self) {
    let _ = fs::remove_file(&self.path);
  }
}
