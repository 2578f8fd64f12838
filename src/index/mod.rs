//! Hierarchical document store rooted at one directory.
//!
//! Every node of the catalog tree is a directory named after its entity id;
//! the node's document lives in `index.json` inside it. Reserved namespace
//! directories (`_notes`, `_words`, ...) sit next to entity children and are
//! never returned by [`IndexStore::list`].

pub mod archive;
pub mod merge;
pub mod path;

use std::{
   fs, io,
   path::{Path, PathBuf},
};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use self::{
   merge::{MergeMode, MergeReport},
   path::{DOCUMENT_FILE, IndexPath, Namespace, SourceTranslation},
};
use crate::{
   error::{Error, Result},
   util::{self, is_temp_name},
};

pub struct IndexStore {
   name:     String,
   root:     PathBuf,
   projects: RwLock<Option<Vec<String>>>,
}

impl std::fmt::Debug for IndexStore {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("IndexStore")
         .field("name", &self.name)
         .field("root", &self.root)
         .finish()
   }
}

impl IndexStore {
   /// Opens (and creates on first use) the store rooted at `root`.
   pub fn open(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
      let root = root.into();
      fs::create_dir_all(&root).map_err(|e| Error::storage("open", &root, e))?;
      Ok(Self { name: name.into(), root, projects: RwLock::new(None) })
   }

   pub fn name(&self) -> &str {
      &self.name
   }

   pub fn root(&self) -> &Path {
      &self.root
   }

   /// Reads the document at `path`.
   ///
   /// A missing node yields `Ok(None)`. A document that is not valid JSON is
   /// reported and treated as absent; other read failures are errors.
   pub fn get(&self, path: &IndexPath) -> Result<Option<Value>> {
      let file = path.document_path(&self.root);
      let bytes = match fs::read(&file) {
         Ok(bytes) => bytes,
         Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
         Err(e) => return Err(Error::storage("read", file, e)),
      };
      match serde_json::from_slice(&bytes) {
         Ok(value) => Ok(Some(value)),
         Err(e) => {
            tracing::warn!(index = %self.name, %path, "ignoring malformed document: {e}");
            Ok(None)
         },
      }
   }

   /// Reads and decodes the document at `path`. A document missing a
   /// required field is reported and treated as absent.
   pub fn get_typed<T: DeserializeOwned>(&self, path: &IndexPath) -> Result<Option<T>> {
      let Some(value) = self.get(path)? else {
         return Ok(None);
      };
      match serde_json::from_value(value) {
         Ok(doc) => Ok(Some(doc)),
         Err(e) => {
            tracing::warn!(index = %self.name, %path, "ignoring malformed document: {e}");
            Ok(None)
         },
      }
   }

   /// Sorted ids of the entity children under `path`.
   pub fn list(&self, path: &IndexPath) -> Result<Vec<String>> {
      let dir = path.to_fs_path(&self.root);
      let entries = match fs::read_dir(&dir) {
         Ok(entries) => entries,
         Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            return Ok(Vec::new());
         },
         Err(e) => return Err(Error::storage("list", dir, e)),
      };

      let mut ids = Vec::new();
      for entry in entries {
         let entry = entry.map_err(|e| Error::storage("list", &dir, e))?;
         let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
         if !is_dir {
            continue;
         }
         let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
         };
         if name.starts_with('_') || name.starts_with('.') || is_temp_name(&name) {
            continue;
         }
         ids.push(name);
      }
      ids.sort_by(|a, b| util::compare_ids(a, b));
      Ok(ids)
   }

   /// Writes `doc` at `path`, replacing any previous document atomically.
   pub fn put(&self, path: &IndexPath, doc: &Value) -> Result<()> {
      let bytes = serde_json::to_vec(doc)?;
      self.put_bytes(path, &bytes)
   }

   pub(crate) fn put_bytes(&self, path: &IndexPath, bytes: &[u8]) -> Result<()> {
      if path.is_root() {
         return Err(Error::RootDocument);
      }
      let file = path.document_path(&self.root);
      util::write_atomic(&file, bytes).map_err(|e| Error::storage("write", file, e))?;
      self.invalidate();
      Ok(())
   }

   /// Removes the node at `path` with all of its descendants. Removing a
   /// missing node is not an error.
   pub fn delete_subtree(&self, path: &IndexPath) -> Result<()> {
      let dir = path.to_fs_path(&self.root);
      if path.is_root() {
         return self.clear();
      }
      match fs::remove_dir_all(&dir) {
         Ok(()) => {},
         Err(e) if e.kind() == io::ErrorKind::NotFound => {},
         Err(e) => return Err(Error::storage("delete", dir, e)),
      }
      self.invalidate();
      Ok(())
   }

   pub fn exists(&self, path: &IndexPath) -> bool {
      path.document_path(&self.root).is_file()
   }

   /// Project ids at the top level; cached until the next write or reload.
   pub fn projects(&self) -> Result<Vec<String>> {
      if let Some(cached) = self.projects.read().as_ref() {
         return Ok(cached.clone());
      }
      let ids = self.list(&IndexPath::root())?;
      *self.projects.write() = Some(ids.clone());
      Ok(ids)
   }

   /// Drops cached listings so the next read sees the directory as it is.
   pub fn reload(&self) {
      self.invalidate();
   }

   pub(crate) fn invalidate(&self) {
      *self.projects.write() = None;
   }

   /// Removes every node. The root directory itself is recreated empty.
   pub fn destroy(&self) -> Result<()> {
      self.clear()
   }

   fn clear(&self) -> Result<()> {
      match fs::remove_dir_all(&self.root) {
         Ok(()) => {},
         Err(e) if e.kind() == io::ErrorKind::NotFound => {},
         Err(e) => return Err(Error::storage("destroy", &self.root, e)),
      }
      fs::create_dir_all(&self.root).map_err(|e| Error::storage("destroy", &self.root, e))?;
      self.invalidate();
      Ok(())
   }

   /// Every node path at or below `path` that holds a document, children
   /// before parents. Namespace directories are included.
   pub fn collect_documents(&self, path: &IndexPath) -> Result<Vec<IndexPath>> {
      let mut out = Vec::new();
      self.collect_into(path, &mut out)?;
      Ok(out)
   }

   fn collect_into(&self, path: &IndexPath, out: &mut Vec<IndexPath>) -> Result<()> {
      let dir = path.to_fs_path(&self.root);
      let entries = match fs::read_dir(&dir) {
         Ok(entries) => entries,
         Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            return Ok(());
         },
         Err(e) => return Err(Error::storage("walk", dir, e)),
      };

      let mut children = Vec::new();
      for entry in entries {
         let entry = entry.map_err(|e| Error::storage("walk", &dir, e))?;
         if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
         }
         let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
         };
         if name.starts_with('.') || is_temp_name(&name) {
            continue;
         }
         children.push(name);
      }
      children.sort_by(|a, b| util::compare_ids(a, b));

      for child in children {
         self.collect_into(&path.child_segment(&child), out)?;
      }
      if !path.is_root() && self.exists(path) {
         out.push(path.clone());
      }
      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use serde_json::json;

   use super::*;

   fn store() -> (tempfile::TempDir, IndexStore) {
      let dir = tempfile::tempdir().unwrap();
      let store = IndexStore::open("test", dir.path().join("index")).unwrap();
      (dir, store)
   }

   #[test]
   fn project_cache_follows_writes() {
      let (_dir, store) = store();
      assert!(store.projects().unwrap().is_empty());
      store
         .put(&IndexPath::from_ids(["gen"]).unwrap(), &json!({"slug": "gen"}))
         .unwrap();
      assert_eq!(store.projects().unwrap(), vec!["gen"]);
      store
         .delete_subtree(&IndexPath::from_ids(["gen"]).unwrap())
         .unwrap();
      assert!(store.projects().unwrap().is_empty());
   }

   #[test]
   fn collect_documents_is_post_order() {
      let (_dir, store) = store();
      let res = IndexPath::from_ids(["gen", "en", "ulb"]).unwrap();
      store.put(&res, &json!({})).unwrap();
      store.put(&res.child("01").unwrap(), &json!({})).unwrap();
      store
         .put(&res.namespace(Namespace::Words).child("god").unwrap(), &json!({}))
         .unwrap();

      let docs: Vec<String> = store
         .collect_documents(&res)
         .unwrap()
         .iter()
         .map(ToString::to_string)
         .collect();
      assert_eq!(docs, vec!["gen/en/ulb/01", "gen/en/ulb/_words/god", "gen/en/ulb"]);
   }

   #[test]
   fn root_put_is_rejected() {
      let (_dir, store) = store();
      let err = store.put(&IndexPath::root(), &json!({})).unwrap_err();
      assert!(matches!(err, Error::RootDocument), "{err}");
   }
}
