//! The local source-content library.
//!
//! A [`Library`] owns three index stores:
//!
//! - the app index (`{library_dir}/index`), the durable content readers use;
//! - the server mirror (`{cache_dir}/server`), catalog documents as last
//!   seen on the remote;
//! - the staging index (`{cache_dir}/downloads`), where downloads land
//!   before they are merged.
//!
//! The cache directory can be deleted at any time; the app index and the
//! target-language file in `library_dir` survive it.

pub mod preview;
pub mod view;

use std::{
   fs,
   io::{self, Read},
   path::{Path, PathBuf},
   sync::Arc,
};

use chrono::Local;

pub use self::{
   preview::PreviewLibrary,
   view::{CatalogView, ProjectCategory, SourceTranslationInfo},
};
use crate::{
   config::Config,
   error::{ArchiveError, Error, Result},
   fetch::{CatalogTransport, Downloader, Endpoints},
   index::{IndexPath, IndexStore},
   languages::{TargetLanguage, TargetLanguageCache},
   lock::SyncLock,
   util::{self, sha256_file, timestamp_slug},
};

pub const TARGET_LANGUAGES_FILE: &str = "languages.json";
pub const APP_INDEX_DIR: &str = "index";
pub const SERVER_INDEX_DIR: &str = "server";
pub const DOWNLOAD_INDEX_DIR: &str = "downloads";

/// Where a library lives and which policies it applies.
#[derive(Debug, Clone)]
pub struct LibraryOptions {
   pub library_dir:                 PathBuf,
   pub cache_dir:                   PathBuf,
   pub endpoints:                   Endpoints,
   pub default_resource_id:         String,
   /// Resources at or above this level are source translations; the rest
   /// are drafts.
   pub min_checking_level:          i64,
   /// When set, bulk downloads skip resources below this level.
   pub download_min_checking_level: Option<i64>,
}

impl LibraryOptions {
   pub fn new(library_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>, endpoints: Endpoints) -> Self {
      Self {
         library_dir: library_dir.into(),
         cache_dir: cache_dir.into(),
         endpoints,
         default_resource_id: crate::config::DEFAULT_RESOURCE_ID.to_string(),
         min_checking_level: i64::from(crate::config::SOURCE_TRANSLATION_MIN_CHECKING_LEVEL),
         download_min_checking_level: None,
      }
   }

   pub fn from_config(cfg: &Config) -> Self {
      Self {
         library_dir: cfg.library_dir(),
         cache_dir: cfg.cache_dir(),
         endpoints: cfg.endpoints(),
         default_resource_id: cfg.default_resource_id.clone(),
         min_checking_level: i64::from(cfg.min_checking_level),
         download_min_checking_level: cfg.download_min_checking_level.map(i64::from),
      }
   }
}

pub struct Library {
   pub(crate) options:    LibraryOptions,
   pub(crate) app:        Arc<IndexStore>,
   pub(crate) server:     Arc<IndexStore>,
   pub(crate) downloader: Downloader,
   pub(crate) languages:  Arc<TargetLanguageCache>,
   view:                  CatalogView,
}

impl Library {
   pub fn new(options: LibraryOptions, transport: Arc<dyn CatalogTransport>) -> Result<Self> {
      let app = Arc::new(IndexStore::open("app", options.library_dir.join(APP_INDEX_DIR))?);
      let server = Arc::new(IndexStore::open("server", options.cache_dir.join(SERVER_INDEX_DIR))?);
      let staging =
         Arc::new(IndexStore::open("downloads", options.cache_dir.join(DOWNLOAD_INDEX_DIR))?);
      let languages = Arc::new(TargetLanguageCache::new(options.library_dir.join(TARGET_LANGUAGES_FILE)));
      let downloader = Downloader::new(transport, options.endpoints.clone(), staging);
      let view = CatalogView::new(Arc::clone(&app), &options);
      Ok(Self { options, app, server, downloader, languages, view })
   }

   pub const fn options(&self) -> &LibraryOptions {
      &self.options
   }

   /// Read accessors over the app index.
   pub const fn view(&self) -> &CatalogView {
      &self.view
   }

   /// A read-only library over the server mirror, for browsing what the
   /// remote offers before downloading it.
   pub fn preview(&self) -> PreviewLibrary {
      PreviewLibrary::new(Arc::clone(&self.server), Arc::clone(&self.languages), &self.options)
   }

   pub fn app_index(&self) -> &IndexStore {
      &self.app
   }

   pub fn server_index(&self) -> &IndexStore {
      &self.server
   }

   pub fn download_index(&self) -> &IndexStore {
      self.downloader.index()
   }

   /// Whether the library has been deployed: the target-language file is
   /// present and the app index holds at least one project.
   pub fn exists(&self) -> Result<bool> {
      Ok(self.languages.exists() && !self.app.projects()?.is_empty())
   }

   pub fn target_languages(&self) -> Result<Vec<TargetLanguage>> {
      self.languages.list()
   }

   pub fn target_language(&self, id: &str) -> Result<Option<TargetLanguage>> {
      self.languages.get(id)
   }

   /// Copies the app catalog into staging so a first download run does not
   /// need to refetch documents the app already has.
   pub fn seed_download_index(&self) -> Result<()> {
      let _lock = SyncLock::acquire(&self.options.library_dir)?;
      self.download_index().merge_catalog(&self.app)?;
      Ok(())
   }

   /// Installs a bundled library: the target-language catalog and an
   /// archive of an app index root.
   pub fn deploy_default_library<L: Read, A: Read>(&self, mut languages: L, archive: A) -> Result<()> {
      let _lock = SyncLock::acquire(&self.options.library_dir)?;
      let mut bytes = Vec::new();
      languages.read_to_end(&mut bytes)?;
      serde_json::from_slice::<Vec<serde_json::Value>>(&bytes).map_err(|e| Error::Malformed {
         path:   TARGET_LANGUAGES_FILE.to_string(),
         reason: e.to_string(),
      })?;
      util::write_atomic(self.languages.path(), &bytes)
         .map_err(|e| Error::storage("deploy", self.languages.path(), e))?;
      self.languages.invalidate();

      self.app.unpack_from(archive)?;
      tracing::info!("deployed default library");
      Ok(())
   }

   /// Writes `library_<timestamp>.tar` of the app index into `dest_dir`
   /// together with a `.sha256` sidecar. Returns the archive path.
   pub fn export(&self, dest_dir: &Path) -> Result<PathBuf> {
      export_index(&self.app, dest_dir)
   }

   /// Replaces the app index with an exported archive. When a `.sha256`
   /// sidecar sits next to the archive it must match.
   pub fn import(&self, archive: &Path) -> Result<()> {
      let _lock = SyncLock::acquire(&self.options.library_dir)?;
      verify_checksum(archive)?;
      self.app.import_archive(archive)
   }

   /// Removes a project and all of its content from the app index.
   pub fn delete_project(&self, project_id: &str) -> Result<()> {
      let _lock = SyncLock::acquire(&self.options.library_dir)?;
      self.app.delete_subtree(&IndexPath::from_ids([project_id])?)
   }

   /// Removes the app index and the cache indexes. The target-language
   /// file is kept.
   pub fn destroy_indexes(&self) -> Result<()> {
      let _lock = SyncLock::acquire(&self.options.library_dir)?;
      self.app.destroy()?;
      self.server.destroy()?;
      self.download_index().destroy()?;
      Ok(())
   }
}

pub(crate) fn export_index(index: &IndexStore, dest_dir: &Path) -> Result<PathBuf> {
   let name = format!("library_{}.tar", timestamp_slug(&Local::now()));
   let dest = dest_dir.join(name);
   index.export_archive(&dest)?;
   let digest = sha256_file(&dest).map_err(|e| Error::storage("export", &dest, e))?;
   let sidecar = checksum_path(&dest);
   util::write_atomic(&sidecar, format!("{digest}\n").as_bytes())
      .map_err(|e| Error::storage("export", &sidecar, e))?;
   tracing::info!("exported {} to {}", index.name(), dest.display());
   Ok(dest)
}

fn checksum_path(archive: &Path) -> PathBuf {
   let mut name = archive.as_os_str().to_owned();
   name.push(".sha256");
   PathBuf::from(name)
}

fn verify_checksum(archive: &Path) -> Result<()> {
   let sidecar = checksum_path(archive);
   let expected = match fs::read_to_string(&sidecar) {
      Ok(s) => s.split_whitespace().next().unwrap_or_default().to_lowercase(),
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
      Err(e) => return Err(Error::storage("import", sidecar, e)),
   };
   let actual = sha256_file(archive).map_err(|e| Error::storage("import", archive, e))?;
   if expected != actual {
      return Err(ArchiveError::ChecksumMismatch { expected, actual }.into());
   }
   Ok(())
}
