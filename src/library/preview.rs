//! Read-only library over the server mirror.

use std::{
   path::{Path, PathBuf},
   sync::Arc,
};

use super::{CatalogView, LibraryOptions, export_index};
use crate::{
   error::Result,
   index::IndexStore,
   languages::{TargetLanguage, TargetLanguageCache},
};

/// Browses what the remote catalog offers. Shares the on-disk server
/// mirror with the [`Library`](super::Library) it came from and has no way
/// to write to any index.
pub struct PreviewLibrary {
   server:    Arc<IndexStore>,
   languages: Arc<TargetLanguageCache>,
   view:      CatalogView,
}

impl PreviewLibrary {
   pub(crate) fn new(
      server: Arc<IndexStore>,
      languages: Arc<TargetLanguageCache>,
      options: &LibraryOptions,
   ) -> Self {
      let view = CatalogView::new(Arc::clone(&server), options);
      Self { server, languages, view }
   }

   pub const fn view(&self) -> &CatalogView {
      &self.view
   }

   pub fn target_languages(&self) -> Result<Vec<TargetLanguage>> {
      self.languages.list()
   }

   /// Whether the server mirror has been populated by an update check.
   pub fn is_populated(&self) -> Result<bool> {
      Ok(!self.server.projects()?.is_empty())
   }

   /// Exports the server mirror, same layout as [`Library::export`](super::Library::export).
   pub fn export(&self, dest_dir: &Path) -> Result<PathBuf> {
      export_index(&self.server, dest_dir)
   }
}
