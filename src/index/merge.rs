//! Copying documents from one store into another.

use std::{fs, io};

use super::{IndexPath, IndexStore};
use crate::error::{Error, Result};

/// How much of the tree around a scope path is copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
   /// The documents on the scope path itself: every ancestor, then the
   /// scope node.
   Shallow,
   /// The scope node and its entire subtree, descendants first.
   Deep,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
   pub copied:  usize,
   pub skipped: usize,
}

impl IndexStore {
   /// Copies the documents selected by `mode` and `scope` from `source`
   /// into this store.
   ///
   /// Copied documents are byte-identical to the source and replace what the
   /// destination had at the same path. Documents outside the selection are
   /// never touched, and nothing is ever removed. A malformed source
   /// document is skipped and reported.
   pub fn merge_from(
      &self,
      source: &IndexStore,
      scope: &IndexPath,
      mode: MergeMode,
   ) -> Result<MergeReport> {
      let paths = match mode {
         MergeMode::Shallow => scope.ancestors_and_self(),
         MergeMode::Deep => source.collect_documents(scope)?,
      };

      let mut report = MergeReport::default();
      for path in &paths {
         if self.copy_document(source, path)? {
            report.copied += 1;
         } else {
            report.skipped += 1;
         }
      }
      self.invalidate();

      tracing::debug!(
         from = source.name(),
         to = self.name(),
         %scope,
         ?mode,
         copied = report.copied,
         skipped = report.skipped,
         "merged"
      );
      Ok(report)
   }

   /// Copies every project, source-language and resource catalog document
   /// of `source`. Content below resources is left alone.
   pub fn merge_catalog(&self, source: &IndexStore) -> Result<MergeReport> {
      self.merge_catalog_excluding(source, &[])
   }

   /// Like [`merge_catalog`](Self::merge_catalog), leaving out the listed
   /// projects together with everything below them.
   pub fn merge_catalog_excluding(
      &self,
      source: &IndexStore,
      excluded_projects: &[String],
   ) -> Result<MergeReport> {
      let mut paths = Vec::new();
      for project_id in source.list(&IndexPath::root())? {
         if excluded_projects.contains(&project_id) {
            tracing::debug!(from = source.name(), project = %project_id, "holding back catalog");
            continue;
         }
         let project = IndexPath::root().child_segment(&project_id);
         for language_id in source.list(&project)? {
            let language = project.child_segment(&language_id);
            for resource_id in source.list(&language)? {
               paths.push(language.child_segment(&resource_id));
            }
            paths.push(language);
         }
         paths.push(project);
      }

      let mut report = MergeReport::default();
      for path in &paths {
         if self.copy_document(source, path)? {
            report.copied += 1;
         } else {
            report.skipped += 1;
         }
      }
      self.invalidate();
      Ok(report)
   }

   /// Returns whether the document was copied.
   fn copy_document(&self, source: &IndexStore, path: &IndexPath) -> Result<bool> {
      if path.is_root() {
         return Ok(false);
      }
      let file = path.document_path(source.root());
      let bytes = match fs::read(&file) {
         Ok(bytes) => bytes,
         Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
         Err(e) => return Err(Error::storage("merge", file, e)),
      };
      if let Err(e) = serde_json::from_slice::<serde_json::Value>(&bytes) {
         tracing::warn!(from = source.name(), %path, "skipping malformed document: {e}");
         return Ok(false);
      }
      self.put_bytes(path, &bytes)?;
      Ok(true)
   }
}

#[cfg(test)]
mod tests {
   use serde_json::json;

   use super::*;

   #[test]
   fn shallow_merge_skips_missing_ancestors() {
      let dir = tempfile::tempdir().unwrap();
      let src = IndexStore::open("src", dir.path().join("src")).unwrap();
      let dst = IndexStore::open("dst", dir.path().join("dst")).unwrap();
      let scope = IndexPath::from_ids(["gen", "en"]).unwrap();
      src.put(&scope, &json!({"slug": "en"})).unwrap();

      let report = dst.merge_from(&src, &scope, MergeMode::Shallow).unwrap();
      assert_eq!(report, MergeReport { copied: 1, skipped: 1 });
      assert_eq!(dst.get(&scope).unwrap(), Some(json!({"slug": "en"})));
   }
}
