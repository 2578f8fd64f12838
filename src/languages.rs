//! Flat target-language catalog and its in-memory cache.

use std::{
   collections::BTreeMap,
   fs, io,
   path::{Path, PathBuf},
   sync::Arc,
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
   error::{Error, Result},
   types::Direction,
};

/// A language content can be translated into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetLanguage {
   #[serde(rename = "lc")]
   pub id:              String,
   #[serde(rename = "ln")]
   pub name:            String,
   #[serde(default, rename = "ang")]
   pub anglicized_name: String,
   #[serde(default, rename = "ld")]
   pub direction:       Direction,
   #[serde(default, rename = "lr")]
   pub region:          String,
}

type LanguageMap = BTreeMap<String, TargetLanguage>;

/// Lazily loaded view of the target-language file. Loaded on first read,
/// dropped by [`TargetLanguageCache::invalidate`].
#[derive(Debug)]
pub struct TargetLanguageCache {
   path:      PathBuf,
   languages: RwLock<Option<Arc<LanguageMap>>>,
}

impl TargetLanguageCache {
   pub fn new(path: impl Into<PathBuf>) -> Self {
      Self { path: path.into(), languages: RwLock::new(None) }
   }

   pub fn path(&self) -> &Path {
      &self.path
   }

   pub fn exists(&self) -> bool {
      self.path.is_file()
   }

   /// All target languages keyed by id. A missing file is an empty catalog.
   pub fn all(&self) -> Result<Arc<LanguageMap>> {
      if let Some(cached) = self.languages.read().as_ref() {
         return Ok(Arc::clone(cached));
      }
      let loaded = Arc::new(self.load()?);
      *self.languages.write() = Some(Arc::clone(&loaded));
      Ok(loaded)
   }

   pub fn get(&self, id: &str) -> Result<Option<TargetLanguage>> {
      Ok(self.all()?.get(id).cloned())
   }

   /// Target languages sorted by id.
   pub fn list(&self) -> Result<Vec<TargetLanguage>> {
      Ok(self.all()?.values().cloned().collect())
   }

   pub fn invalidate(&self) {
      *self.languages.write() = None;
   }

   fn load(&self) -> Result<LanguageMap> {
      let bytes = match fs::read(&self.path) {
         Ok(bytes) => bytes,
         Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LanguageMap::new()),
         Err(e) => return Err(Error::storage("read", &self.path, e)),
      };
      let entries: Vec<Value> = serde_json::from_slice(&bytes).map_err(|e| Error::Malformed {
         path:   self.path.display().to_string(),
         reason: e.to_string(),
      })?;

      let mut languages = LanguageMap::new();
      for entry in entries {
         match serde_json::from_value::<TargetLanguage>(entry) {
            Ok(lang) => {
               languages.entry(lang.id.clone()).or_insert(lang);
            },
            Err(e) => tracing::warn!("skipping target language entry: {e}"),
         }
      }
      tracing::debug!(count = languages.len(), "loaded target languages");
      Ok(languages)
   }
}
