//! Index paths and source-translation identities.

use std::{
   fmt,
   path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File name of the document stored at every node directory.
pub const DOCUMENT_FILE: &str = "index.json";

/// Reserved child namespaces that hang off a resource, chapter, frame or
/// project. They never show up in entity listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
   Notes,
   Words,
   Questions,
   Chunks,
}

impl Namespace {
   pub const fn as_str(self) -> &'static str {
      match self {
         Self::Notes => "_notes",
         Self::Words => "_words",
         Self::Questions => "_questions",
         Self::Chunks => "_chunks",
      }
   }
}

/// Checks that `id` can be used as an entity path segment.
pub fn validate_id(id: &str) -> Result<()> {
   let bad = id.is_empty()
      || id == "."
      || id == ".."
      || id.starts_with('_')
      || id.starts_with('.')
      || id.contains(['/', '\\', '\0']);
   if bad { Err(Error::InvalidId(id.to_string())) } else { Ok(()) }
}

/// Ordered sequence of entity ids (and reserved namespaces) addressing one
/// node of the catalog tree. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexPath(Vec<String>);

impl IndexPath {
   pub const fn root() -> Self {
      Self(Vec::new())
   }

   /// Builds a path from entity ids, validating each.
   pub fn from_ids<I, S>(ids: I) -> Result<Self>
   where
      I: IntoIterator<Item = S>,
      S: AsRef<str>,
   {
      let mut path = Self::root();
      for id in ids {
         path = path.child(id.as_ref())?;
      }
      Ok(path)
   }

   pub fn child(&self, id: &str) -> Result<Self> {
      validate_id(id)?;
      Ok(self.child_segment(id))
   }

   pub fn namespace(&self, ns: Namespace) -> Self {
      self.child_segment(ns.as_str())
   }

   /// Appends a segment read back from disk; namespaces are accepted.
   pub(crate) fn child_segment(&self, segment: &str) -> Self {
      let mut segments = self.0.clone();
      segments.push(segment.to_string());
      Self(segments)
   }

   pub fn segments(&self) -> &[String] {
      &self.0
   }

   pub fn depth(&self) -> usize {
      self.0.len()
   }

   pub fn is_root(&self) -> bool {
      self.0.is_empty()
   }

   pub fn parent(&self) -> Option<Self> {
      if self.0.is_empty() {
         None
      } else {
         Some(Self(self.0[..self.0.len() - 1].to_vec()))
      }
   }

   /// Every non-root prefix of this path, shortest first, ending with self.
   pub fn ancestors_and_self(&self) -> Vec<Self> {
      (1..=self.0.len()).map(|n| Self(self.0[..n].to_vec())).collect()
   }

   pub fn starts_with(&self, prefix: &Self) -> bool {
      self.0.starts_with(&prefix.0)
   }

   pub fn last(&self) -> Option<&str> {
      self.0.last().map(String::as_str)
   }

   pub fn to_fs_path(&self, root: &Path) -> PathBuf {
      let mut out = root.to_path_buf();
      for segment in &self.0 {
         out.push(segment);
      }
      out
   }

   pub fn document_path(&self, root: &Path) -> PathBuf {
      self.to_fs_path(root).join(DOCUMENT_FILE)
   }
}

impl fmt::Display for IndexPath {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      if self.0.is_empty() {
         f.write_str("/")
      } else {
         f.write_str(&self.0.join("/"))
      }
   }
}

/// One (project, source language, resource) triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceTranslation {
   pub project_id:         String,
   pub source_language_id: String,
   pub resource_id:        String,
}

impl SourceTranslation {
   pub fn new(
      project_id: impl Into<String>,
      source_language_id: impl Into<String>,
      resource_id: impl Into<String>,
   ) -> Self {
      Self {
         project_id:         project_id.into(),
         source_language_id: source_language_id.into(),
         resource_id:        resource_id.into(),
      }
   }

   /// `{project}-{source_language}-{resource}`.
   pub fn id(&self) -> String {
      format!("{}-{}-{}", self.project_id, self.source_language_id, self.resource_id)
   }

   /// Parses an id produced by [`Self::id`]. The project id ends at the
   /// first dash and the resource id starts after the last one, so source
   /// language ids such as `pt-br` survive.
   pub fn parse_id(id: &str) -> Option<Self> {
      let (project, rest) = id.split_once('-')?;
      let (language, resource) = rest.rsplit_once('-')?;
      if project.is_empty() || language.is_empty() || resource.is_empty() {
         return None;
      }
      Some(Self::new(project, language, resource))
   }

   pub fn project_path(&self) -> Result<IndexPath> {
      IndexPath::from_ids([&self.project_id])
   }

   pub fn source_language_path(&self) -> Result<IndexPath> {
      IndexPath::from_ids([&self.project_id, &self.source_language_id])
   }

   pub fn resource_path(&self) -> Result<IndexPath> {
      IndexPath::from_ids([&self.project_id, &self.source_language_id, &self.resource_id])
   }

   pub fn chapter_path(&self, chapter_id: &str) -> Result<IndexPath> {
      self.resource_path()?.child(chapter_id)
   }

   pub fn frame_path(&self, chapter_id: &str, frame_id: &str) -> Result<IndexPath> {
      self.chapter_path(chapter_id)?.child(frame_id)
   }
}

impl fmt::Display for SourceTranslation {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.id())
   }
}
