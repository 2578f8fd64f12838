//! One writing synchronization run per library at a time.

use std::{
   fs::{self, File, OpenOptions},
   io,
   path::{Path, PathBuf},
};

use fs4::FileExt;

use crate::error::{Error, Result};

pub const LOCK_FILE: &str = "sync.lock";

/// Exclusive advisory lock on `{library_dir}/sync.lock`, released on drop.
pub struct SyncLock {
   file: File,
   path: PathBuf,
}

impl SyncLock {
   /// Takes the lock without waiting. A held lock is [`Error::Busy`].
   pub fn acquire(library_dir: &Path) -> Result<Self> {
      fs::create_dir_all(library_dir).map_err(|e| Error::storage("lock", library_dir, e))?;
      let path = library_dir.join(LOCK_FILE);
      let file = OpenOptions::new()
         .create(true)
         .read(true)
         .write(true)
         .truncate(false)
         .open(&path)
         .map_err(|e| Error::storage("lock", &path, e))?;

      match FileExt::try_lock_exclusive(&file) {
         Ok(()) => {},
         Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Err(Error::Busy(path)),
         Err(e) => return Err(Error::storage("lock", path, e)),
      }
      tracing::debug!("acquired {}", path.display());
      Ok(Self { file, path })
   }

   pub fn path(&self) -> &Path {
      &self.path
   }
}

impl Drop for SyncLock {
   fn drop(&mut self) {
      let _ = FileExt::unlock(&self.file);
   }
}
