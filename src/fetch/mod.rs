//! Pulling catalog entities from the network into an index.
//!
//! Every `download_*` call fetches one document, splits it into entity
//! documents and writes them into the downloader's index. Ordinary network
//! and parse failures are logged and reported as `false`; only the caller
//! decides whether a failure matters.

pub mod endpoint;
pub mod ingest;
pub mod transport;

use std::{path::Path, sync::Arc};

pub use self::{
   endpoint::{Endpoints, ResourceFile},
   transport::{CatalogTransport, HttpTransport},
};
use crate::{
   error::{Error, Result},
   index::{IndexStore, SourceTranslation},
   util,
};

pub struct Downloader {
   transport: Arc<dyn CatalogTransport>,
   endpoints: Endpoints,
   index:     Arc<IndexStore>,
}

impl Downloader {
   pub fn new(transport: Arc<dyn CatalogTransport>, endpoints: Endpoints, index: Arc<IndexStore>) -> Self {
      Self { transport, endpoints, index }
   }

   /// The staging index downloads are written into.
   pub fn index(&self) -> &Arc<IndexStore> {
      &self.index
   }

   pub const fn endpoints(&self) -> &Endpoints {
      &self.endpoints
   }

   async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
      self.transport.get(url).await
   }

   /// Fetches the project list; returns project ids in catalog order.
   pub(crate) async fn fetch_project_list(&self) -> Result<Vec<String>> {
      let url = self.endpoints.project_list();
      let bytes = self.fetch(&url).await?;
      ingest::project_catalog(&self.index, &url, &bytes)
   }

   pub async fn download_project_list(&self) -> bool {
      report("project list", self.fetch_project_list().await)
   }

   pub(crate) async fn fetch_source_language_list(&self, project_id: &str) -> Result<Vec<String>> {
      let url = self.endpoints.source_language_list(project_id);
      let bytes = self.fetch(&url).await?;
      ingest::source_language_catalog(&self.index, project_id, &url, &bytes)
   }

   pub async fn download_source_language_list(&self, project_id: &str) -> bool {
      report(
         &format!("source languages of {project_id}"),
         self.fetch_source_language_list(project_id).await,
      )
   }

   pub async fn download_resource_list(&self, project_id: &str, source_language_id: &str) -> bool {
      let url = self.endpoints.resource_list(project_id, source_language_id);
      let result = match self.fetch(&url).await {
         Ok(bytes) => {
            ingest::resource_catalog(&self.index, project_id, source_language_id, &url, &bytes)
         },
         Err(e) => Err(e),
      };
      report(&format!("resources of {project_id}-{source_language_id}"), result)
   }

   async fn download_resource_file(&self, st: &SourceTranslation, file: ResourceFile) -> bool {
      let url = self.endpoints.resource_file(st, file);
      let result = match self.fetch(&url).await {
         Ok(bytes) => match file {
            ResourceFile::Source => ingest::source(&self.index, st, &url, &bytes),
            ResourceFile::Terms => ingest::terms(&self.index, st, &url, &bytes),
            ResourceFile::TermAssignments => ingest::term_assignments(&self.index, st, &url, &bytes),
            ResourceFile::Notes => ingest::notes(&self.index, st, &url, &bytes),
            ResourceFile::CheckingQuestions => {
               ingest::checking_questions(&self.index, st, &url, &bytes)
            },
         },
         Err(e) => Err(e),
      };
      report(&format!("{} of {st}", file.file_stem()), result)
   }

   /// Source text; the only fetch a resource download cannot do without.
   pub async fn download_source(&self, st: &SourceTranslation) -> bool {
      self.download_resource_file(st, ResourceFile::Source).await
   }

   pub async fn download_terms(&self, st: &SourceTranslation) -> bool {
      self.download_resource_file(st, ResourceFile::Terms).await
   }

   pub async fn download_term_assignments(&self, st: &SourceTranslation) -> bool {
      self.download_resource_file(st, ResourceFile::TermAssignments).await
   }

   pub async fn download_notes(&self, st: &SourceTranslation) -> bool {
      self.download_resource_file(st, ResourceFile::Notes).await
   }

   pub async fn download_checking_questions(&self, st: &SourceTranslation) -> bool {
      self.download_resource_file(st, ResourceFile::CheckingQuestions).await
   }

   /// Chunk markers for one project, written under `{project}/_chunks`.
   pub async fn download_chunks(&self, project_id: &str) -> bool {
      let url = self.endpoints.chunks(project_id);
      let result = match self.fetch(&url).await {
         Ok(bytes) => ingest::chunks(&self.index, project_id, &url, &bytes),
         Err(e) => Err(e),
      };
      report(&format!("chunks of {project_id}"), result)
   }

   /// Replaces the flat target-language catalog at `dest`. The body must be
   /// a JSON array; anything else leaves the existing file alone.
   pub async fn download_target_languages(&self, dest: &Path) -> bool {
      let url = self.endpoints.target_languages().to_string();
      let result = async {
         let bytes = self.fetch(&url).await?;
         let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Malformed { path: url.clone(), reason: e.to_string() })?;
         if !value.is_array() {
            return Err(Error::Malformed { path: url.clone(), reason: "expected a JSON array".to_string() });
         }
         util::write_atomic(dest, &bytes).map_err(|e| Error::storage("write", dest, e))?;
         Ok(())
      }
      .await;
      report("target languages", result)
   }
}

fn report<T>(what: &str, result: Result<T>) -> bool {
   match result {
      Ok(_) => {
         tracing::debug!("downloaded {what}");
         true
      },
      Err(e) => {
         tracing::warn!("failed to download {what}: {e}");
         false
      },
   }
}
