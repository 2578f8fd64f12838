//! Packing a store into a tar archive and restoring it from one.

use std::{
   fs::{self, File},
   io::{self, BufReader, BufWriter, Read, Write},
   path::{Path, PathBuf},
};

use uuid::Uuid;
use walkdir::WalkDir;

use super::IndexStore;
use crate::{
   error::{ArchiveError, Error, Result},
   util::{fsync_dir, is_temp_name},
};

impl IndexStore {
   /// Writes every file under the store root into a tar archive at `dest`.
   /// Entry names are relative to the root and emitted in sorted order.
   pub fn export_archive(&self, dest: &Path) -> Result<()> {
      if !self.root().is_dir() {
         return Err(ArchiveError::MissingRoot(self.root().to_path_buf()).into());
      }
      if let Some(parent) = dest.parent() {
         fs::create_dir_all(parent).map_err(|e| Error::storage("export", parent, e))?;
      }
      let file = File::create(dest).map_err(|e| Error::storage("export", dest, e))?;
      let mut builder = tar::Builder::new(BufWriter::new(file));

      for entry in WalkDir::new(self.root()).min_depth(1).sort_by_file_name() {
         let entry = entry.map_err(|e| Error::Io(io::Error::other(e)))?;
         let name = entry.file_name().to_string_lossy();
         if is_temp_name(&name) || !entry.file_type().is_file() {
            continue;
         }
         let rel = entry
            .path()
            .strip_prefix(self.root())
            .map_err(|e| Error::Io(io::Error::other(e)))?;
         builder
            .append_path_with_name(entry.path(), rel)
            .map_err(|e| Error::storage("export", entry.path(), e))?;
      }

      let mut writer = builder
         .into_inner()
         .map_err(|e| Error::storage("export", dest, e))?;
      writer.flush().map_err(|e| Error::storage("export", dest, e))?;
      writer
         .get_ref()
         .sync_all()
         .map_err(|e| Error::storage("export", dest, e))?;
      Ok(())
   }

   /// Replaces the store contents with the archive at `archive`.
   pub fn import_archive(&self, archive: &Path) -> Result<()> {
      let file = File::open(archive).map_err(|e| Error::storage("import", archive, e))?;
      self.unpack_from(BufReader::new(file))
   }

   /// Replaces the store contents with a tar stream.
   ///
   /// The archive is unpacked next to the root first; the live root is
   /// swapped only once unpacking succeeded, so a broken archive leaves the
   /// store as it was.
   pub fn unpack_from<R: Read>(&self, reader: R) -> Result<()> {
      let staging = StagingDir::create(self.sibling("import"))?;

      let mut archive = tar::Archive::new(reader);
      archive
         .unpack(staging.path())
         .map_err(|e| Error::storage("import", staging.path(), e))?;

      let retired = self.sibling("old");
      let had_root = self.root().exists();
      if had_root {
         fs::rename(self.root(), &retired).map_err(|e| Error::storage("import", self.root(), e))?;
      }
      if let Err(e) = fs::rename(staging.path(), self.root()) {
         if had_root {
            let _ = fs::rename(&retired, self.root());
         }
         return Err(Error::storage("import", self.root(), e));
      }
      staging.release();
      if had_root {
         let _ = fs::remove_dir_all(&retired);
      }
      if let Some(parent) = self.root().parent() {
         fsync_dir(parent).map_err(|e| Error::storage("import", parent, e))?;
      }

      self.reload();
      tracing::info!(index = self.name(), "index replaced from archive");
      Ok(())
   }

   fn sibling(&self, tag: &str) -> PathBuf {
      let name = self
         .root()
         .file_name()
         .and_then(|n| n.to_str())
         .unwrap_or("index");
      self
         .root()
         .with_file_name(format!("{name}.{tag}-{}", Uuid::new_v4().simple()))
   }
}

/// Unpack directory next to a store root; removed on drop unless released.
struct StagingDir {
   path: Option<PathBuf>,
}

impl StagingDir {
   fn create(path: PathBuf) -> Result<Self> {
      fs::create_dir_all(&path).map_err(|e| Error::storage("import", &path, e))?;
      Ok(Self { path: Some(path) })
   }

   fn path(&self) -> &Path {
      self.path.as_deref().unwrap_or(Path::new(""))
   }

   /// The directory has been moved into place; nothing to clean up.
   fn release(mut self) {
      self.path = None;
   }
}

impl Drop for StagingDir {
   fn drop(&mut self) {
      if let Some(path) = self.path.take() {
         let _ = fs::remove_dir_all(path);
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn leftovers(dir: &Path) -> Vec<String> {
      fs::read_dir(dir)
         .unwrap()
         .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
         .filter(|n| n != "index")
         .collect()
   }

   #[test]
   fn staging_dir_is_removed_unless_released() {
      let dir = tempfile::tempdir().unwrap();
      let dropped = dir.path().join("index.import-a");
      drop(StagingDir::create(dropped.clone()).unwrap());
      assert!(!dropped.exists());

      let kept = dir.path().join("index.import-b");
      StagingDir::create(kept.clone()).unwrap().release();
      assert!(kept.is_dir());
   }

   #[test]
   fn broken_archive_leaves_no_unpack_dir() {
      let dir = tempfile::tempdir().unwrap();
      let store = IndexStore::open("test", dir.path().join("index")).unwrap();
      let garbage = vec![0xffu8; 1024];
      assert!(store.unpack_from(&garbage[..]).is_err());
      assert!(store.root().is_dir());
      assert!(leftovers(dir.path()).is_empty(), "{:?}", leftovers(dir.path()));
   }
}
