//! Update detection and download-and-merge runs.
//!
//! A run fetches into the staging index, then copies finished units into
//! the durable app index. Projects are processed one at a time in catalog
//! order and a project is merged only once every resource it downloads has
//! its source text, so readers of the app index never see half a project.

use indicatif::ProgressBar;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{
   error::{Error, Result},
   index::{IndexPath, IndexStore, MergeMode, Namespace, SourceTranslation},
   library::Library,
   lock::SyncLock,
   types::{Resource, flexible_int},
   updates::UpdateSet,
};

/// Number of fetch steps per resource.
pub const RESOURCE_STEPS: u64 = 5;

/// A progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
   Determinate { current: u64, max: u64 },
   Indeterminate,
}

/// Receives progress from long-running operations. Called inline on the
/// task running the operation, so implementations must return quickly.
pub trait ProgressListener: Send {
   fn on_progress(&mut self, current: u64, max: u64);
   fn on_indeterminate(&mut self);
}

impl ProgressListener for () {
   fn on_progress(&mut self, _current: u64, _max: u64) {}

   fn on_indeterminate(&mut self) {}
}

impl<F: FnMut(Progress) + Send> ProgressListener for F {
   fn on_progress(&mut self, current: u64, max: u64) {
      self(Progress::Determinate { current, max });
   }

   fn on_indeterminate(&mut self) {
      self(Progress::Indeterminate);
   }
}

impl ProgressListener for ProgressBar {
   fn on_progress(&mut self, current: u64, max: u64) {
      self.set_length(max);
      self.set_position(current);
   }

   fn on_indeterminate(&mut self) {
      self.set_message("merging");
      self.tick();
   }
}

/// Result of a download run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
   /// Every unit downloaded and merged.
   pub success:         bool,
   /// The run stopped at a cancellation checkpoint.
   pub cancelled:       bool,
   /// Projects merged into the app index, in merge order.
   pub merged_projects: Vec<String>,
   /// Resources whose source text could not be fetched.
   pub failed:          Vec<SourceTranslation>,
}

impl SyncOutcome {
   fn started() -> Self {
      Self { success: true, ..Self::default() }
   }

   fn cancel(&mut self) {
      self.cancelled = true;
      self.success = false;
   }
}

/// Whether a local copy stamped `local` is older than the remote `remote`.
/// No remote stamp means there is nothing to fetch; no local stamp means
/// the entity was never fetched.
pub fn is_stale(local: Option<i64>, remote: Option<i64>) -> bool {
   match (local, remote) {
      (_, None) => false,
      (None, Some(_)) => true,
      (Some(local), Some(remote)) => local < remote,
   }
}

#[derive(Deserialize)]
struct Stamp {
   #[serde(deserialize_with = "flexible_int")]
   date_modified: i64,
}

fn date_modified(index: &IndexStore, path: &IndexPath) -> Result<Option<i64>> {
   Ok(index.get_typed::<Stamp>(path)?.map(|s| s.date_modified))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchStatus {
   Complete,
   Failed,
   Cancelled,
}

impl Library {
   fn staging(&self) -> &IndexStore {
      self.downloader.index()
   }

   fn lock(&self) -> Result<SyncLock> {
      SyncLock::acquire(&self.options.library_dir)
   }

   /// Refreshes the server mirror from the remote catalog and returns the
   /// resources whose app copy is stale.
   ///
   /// An unreachable project list is [`Error::UpdateCheck`]; the app index
   /// is never touched.
   pub async fn check_for_updates(
      &self,
      listener: &mut dyn ProgressListener,
      cancel: &CancellationToken,
   ) -> Result<UpdateSet> {
      let _lock = self.lock()?;
      self.check_for_updates_locked(listener, cancel).await
   }

   async fn check_for_updates_locked(
      &self,
      listener: &mut dyn ProgressListener,
      cancel: &CancellationToken,
   ) -> Result<UpdateSet> {
      let project_ids = self
         .downloader
         .fetch_project_list()
         .await
         .map_err(|e| Error::UpdateCheck(e.to_string()))?;

      let total = project_ids.len() as u64;
      let mut incomplete = Vec::new();
      for (n, project_id) in project_ids.iter().enumerate() {
         if cancel.is_cancelled() {
            return Err(Error::Cancelled);
         }
         let path = IndexPath::from_ids([project_id])?;
         let remote = date_modified(self.staging(), &path)?;
         let local = date_modified(&self.server, &path)?;
         if is_stale(local, remote) && !self.refresh_source_languages(project_id, cancel).await? {
            incomplete.push(project_id.clone());
         }
         listener.on_progress(n as u64 + 1, total);
      }

      listener.on_indeterminate();
      // A project whose children could not be listed keeps its old mirror
      // copy so the next check sees it as stale again.
      self
         .server
         .merge_catalog_excluding(self.staging(), &incomplete)?;
      self.available_updates()
   }

   /// Returns whether every listing below `project_id` was fetched.
   async fn refresh_source_languages(&self, project_id: &str, cancel: &CancellationToken) -> Result<bool> {
      let language_ids = match self.downloader.fetch_source_language_list(project_id).await {
         Ok(ids) => ids,
         Err(e) => {
            tracing::warn!("failed to download source languages of {project_id}: {e}");
            return Ok(false);
         },
      };
      let mut complete = true;
      for language_id in language_ids {
         if cancel.is_cancelled() {
            return Err(Error::Cancelled);
         }
         let path = IndexPath::from_ids([project_id, language_id.as_str()])?;
         let remote = date_modified(self.staging(), &path)?;
         let local = date_modified(&self.server, &path)?;
         if is_stale(local, remote)
            && !self
               .downloader
               .download_resource_list(project_id, &language_id)
               .await
         {
            complete = false;
         }
      }
      Ok(complete)
   }

   /// Compares the server mirror against the app index without touching the
   /// network.
   pub fn available_updates(&self) -> Result<UpdateSet> {
      let mut updates = UpdateSet::new();
      for project_id in self.server.projects()? {
         let project = IndexPath::root().child(&project_id)?;
         for language_id in self.server.list(&project)? {
            let language = project.child(&language_id)?;
            for resource_id in self.server.list(&language)? {
               let resource = language.child(&resource_id)?;
               let remote = date_modified(&self.server, &resource)?;
               let local = date_modified(&self.app, &resource)?;
               if is_stale(local, remote) {
                  updates.insert(SourceTranslation::new(
                     project_id.as_str(),
                     language_id.as_str(),
                     resource_id,
                  ));
               }
            }
         }
      }
      tracing::info!(count = updates.len(), "computed available updates");
      Ok(updates)
   }

   /// Downloads every resource in `updates` and merges each project whose
   /// downloads all succeeded.
   ///
   /// Projects are processed in sorted id order; the mirror does not keep
   /// the order of the remote project list.
   pub async fn download_updates(
      &self,
      updates: &UpdateSet,
      project_listener: &mut dyn ProgressListener,
      step_listener: &mut dyn ProgressListener,
      cancel: &CancellationToken,
   ) -> Result<SyncOutcome> {
      let _lock = self.lock()?;
      let plan = updates
         .projects()
         .into_iter()
         .map(|p| (p.to_string(), updates.translations_in(p)))
         .collect();
      self
         .download_projects(plan, project_listener, step_listener, cancel)
         .await
   }

   /// Downloads every resource the server mirror knows about.
   ///
   /// When `download_min_checking_level` is configured, resources below it
   /// are left out.
   pub async fn download_all_projects(
      &self,
      project_listener: &mut dyn ProgressListener,
      step_listener: &mut dyn ProgressListener,
      cancel: &CancellationToken,
   ) -> Result<SyncOutcome> {
      let _lock = self.lock()?;
      let plan = self.server_plan()?;
      self
         .download_projects(plan, project_listener, step_listener, cancel)
         .await
   }

   fn server_plan(&self) -> Result<Vec<(String, Vec<SourceTranslation>)>> {
      let min_level = self.options.download_min_checking_level;
      let mut plan = Vec::new();
      for project_id in self.server.projects()? {
         let project = IndexPath::root().child(&project_id)?;
         let mut translations = Vec::new();
         for language_id in self.server.list(&project)? {
            let language = project.child(&language_id)?;
            for resource_id in self.server.list(&language)? {
               if let Some(min_level) = min_level {
                  let level = self
                     .server
                     .get_typed::<Resource>(&language.child(&resource_id)?)?
                     .map(|r| r.checking_level());
                  if level.is_none_or(|level| level < min_level) {
                     tracing::debug!("skipping {project_id}-{language_id}-{resource_id}: below checking level");
                     continue;
                  }
               }
               translations.push(SourceTranslation::new(
                  project_id.as_str(),
                  language_id.as_str(),
                  resource_id,
               ));
            }
         }
         plan.push((project_id, translations));
      }
      Ok(plan)
   }

   /// Downloads one resource and merges it alone: the project and source
   /// language documents shallowly, the resource subtree deeply.
   pub async fn download_source_translation(
      &self,
      st: &SourceTranslation,
      listener: &mut dyn ProgressListener,
      cancel: &CancellationToken,
   ) -> Result<SyncOutcome> {
      let _lock = self.lock()?;
      let mut outcome = SyncOutcome::started();
      match self.download_without_merging(st, listener, cancel).await? {
         FetchStatus::Complete => {},
         FetchStatus::Failed => {
            outcome.success = false;
            outcome.failed.push(st.clone());
            return Ok(outcome);
         },
         FetchStatus::Cancelled => {
            outcome.cancel();
            return Ok(outcome);
         },
      }

      listener.on_indeterminate();
      match self.merge_translation(st) {
         Ok(()) => outcome.merged_projects.push(st.project_id.clone()),
         Err(e) => {
            tracing::error!("failed to merge {st} into the app index: {e}");
            outcome.success = false;
         },
      }
      Ok(outcome)
   }

   async fn download_projects(
      &self,
      plan: Vec<(String, Vec<SourceTranslation>)>,
      project_listener: &mut dyn ProgressListener,
      step_listener: &mut dyn ProgressListener,
      cancel: &CancellationToken,
   ) -> Result<SyncOutcome> {
      let mut outcome = SyncOutcome::started();
      let total = plan.len() as u64;

      for (n, (project_id, translations)) in plan.iter().enumerate() {
         if cancel.is_cancelled() {
            outcome.cancel();
            return Ok(outcome);
         }

         let mut project_complete = true;
         for st in translations {
            match self.download_without_merging(st, step_listener, cancel).await? {
               FetchStatus::Complete => {},
               FetchStatus::Failed => {
                  tracing::warn!("failed to download {st}");
                  outcome.failed.push(st.clone());
                  project_complete = false;
               },
               FetchStatus::Cancelled => {
                  outcome.cancel();
                  return Ok(outcome);
               },
            }
         }

         if project_complete {
            project_listener.on_indeterminate();
            match self.merge_project(project_id, translations) {
               Ok(()) => outcome.merged_projects.push(project_id.clone()),
               Err(e) => {
                  tracing::error!("failed to merge project {project_id} into the app index: {e}");
                  outcome.success = false;
               },
            }
         } else {
            outcome.success = false;
         }
         project_listener.on_progress(n as u64 + 1, total);
      }

      tracing::info!(
         merged = outcome.merged_projects.len(),
         failed = outcome.failed.len(),
         "download run finished"
      );
      Ok(outcome)
   }

   fn merge_project(&self, project_id: &str, translations: &[SourceTranslation]) -> Result<()> {
      if translations.is_empty() {
         self
            .app
            .merge_from(self.staging(), &IndexPath::from_ids([project_id])?, MergeMode::Shallow)?;
      }
      for st in translations {
         self.merge_translation(st)?;
      }
      Ok(())
   }

   fn merge_translation(&self, st: &SourceTranslation) -> Result<()> {
      self
         .app
         .merge_from(self.staging(), &st.source_language_path()?, MergeMode::Shallow)?;
      self
         .app
         .merge_from(self.staging(), &st.resource_path()?, MergeMode::Deep)?;
      Ok(())
   }

   /// Runs the five fetch steps for one resource against staging. Only the
   /// source text decides success.
   async fn download_without_merging(
      &self,
      st: &SourceTranslation,
      listener: &mut dyn ProgressListener,
      cancel: &CancellationToken,
   ) -> Result<FetchStatus> {
      if cancel.is_cancelled() {
         return Ok(FetchStatus::Cancelled);
      }
      self.prepare_staging(st)?;

      let source_ok = self.downloader.download_source(st).await;
      listener.on_progress(1, RESOURCE_STEPS);
      if cancel.is_cancelled() {
         return Ok(FetchStatus::Cancelled);
      }

      self.downloader.download_terms(st).await;
      listener.on_progress(2, RESOURCE_STEPS);
      if cancel.is_cancelled() {
         return Ok(FetchStatus::Cancelled);
      }

      self.downloader.download_term_assignments(st).await;
      listener.on_progress(3, RESOURCE_STEPS);
      if cancel.is_cancelled() {
         return Ok(FetchStatus::Cancelled);
      }

      self.downloader.download_notes(st).await;
      listener.on_progress(4, RESOURCE_STEPS);
      if cancel.is_cancelled() {
         return Ok(FetchStatus::Cancelled);
      }

      self.downloader.download_checking_questions(st).await;
      listener.on_progress(5, RESOURCE_STEPS);
      if cancel.is_cancelled() {
         return Ok(FetchStatus::Cancelled);
      }

      Ok(if source_ok { FetchStatus::Complete } else { FetchStatus::Failed })
   }

   /// Copies the mirror's catalog documents of `st` into staging and drops
   /// content left there by an earlier download of the same resource.
   fn prepare_staging(&self, st: &SourceTranslation) -> Result<()> {
      let staging = self.staging();
      let resource = st.resource_path()?;
      staging.merge_from(&self.server, &resource, MergeMode::Shallow)?;
      for child in staging.list(&resource)? {
         staging.delete_subtree(&resource.child(&child)?)?;
      }
      staging.delete_subtree(&resource.namespace(Namespace::Words))?;
      Ok(())
   }

   /// Re-downloads the flat target-language catalog.
   pub async fn update_catalogs(&self, cancel: &CancellationToken) -> Result<bool> {
      let _lock = self.lock()?;
      Ok(self.update_catalogs_locked(cancel).await)
   }

   async fn update_catalogs_locked(&self, cancel: &CancellationToken) -> bool {
      if cancel.is_cancelled() {
         return false;
      }
      let ok = self
         .downloader
         .download_target_languages(self.languages.path())
         .await;
      if ok {
         self.languages.invalidate();
      }
      ok
   }

   /// Re-downloads chunk markers for every project in the app index and
   /// merges them project by project.
   pub async fn update_chunks(
      &self,
      listener: &mut dyn ProgressListener,
      cancel: &CancellationToken,
   ) -> Result<SyncOutcome> {
      let _lock = self.lock()?;
      self.update_chunks_locked(listener, cancel).await
   }

   async fn update_chunks_locked(
      &self,
      listener: &mut dyn ProgressListener,
      cancel: &CancellationToken,
   ) -> Result<SyncOutcome> {
      let mut outcome = SyncOutcome::started();
      let project_ids = self.app.projects()?;
      let total = project_ids.len() as u64;
      for (n, project_id) in project_ids.iter().enumerate() {
         if cancel.is_cancelled() {
            outcome.cancel();
            return Ok(outcome);
         }
         if self.downloader.download_chunks(project_id).await {
            let markers = IndexPath::from_ids([project_id])?.namespace(Namespace::Chunks);
            self.app.merge_from(self.staging(), &markers, MergeMode::Deep)?;
            outcome.merged_projects.push(project_id.clone());
         } else {
            outcome.success = false;
         }
         listener.on_progress(n as u64 + 1, total);
      }
      Ok(outcome)
   }

   /// Checks for and downloads content updates, then refreshes the
   /// target-language catalog and chunk markers. Succeeds only if all three
   /// succeed; stops at the first cancellation.
   pub async fn update_all(
      &self,
      project_listener: &mut dyn ProgressListener,
      step_listener: &mut dyn ProgressListener,
      cancel: &CancellationToken,
   ) -> Result<SyncOutcome> {
      let _lock = self.lock()?;

      let mut outcome = match self.check_for_updates_locked(project_listener, cancel).await {
         Ok(updates) => {
            let plan = updates
               .projects()
               .into_iter()
               .map(|p| (p.to_string(), updates.translations_in(p)))
               .collect();
            self
               .download_projects(plan, project_listener, step_listener, cancel)
               .await?
         },
         Err(Error::Cancelled) => {
            let mut outcome = SyncOutcome::default();
            outcome.cancel();
            return Ok(outcome);
         },
         Err(e) => {
            tracing::error!("source update failed: {e}");
            SyncOutcome::default()
         },
      };
      if outcome.cancelled {
         return Ok(outcome);
      }

      let catalogs_ok = self.update_catalogs_locked(cancel).await;
      if cancel.is_cancelled() {
         outcome.cancel();
         return Ok(outcome);
      }

      let chunks = self.update_chunks_locked(project_listener, cancel).await?;
      if chunks.cancelled {
         outcome.cancel();
         return Ok(outcome);
      }

      outcome.success = outcome.success && catalogs_ok && chunks.success;
      Ok(outcome)
   }
}
