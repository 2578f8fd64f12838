//! Read accessors over one index.

use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;

use super::LibraryOptions;
use crate::{
   error::Result,
   index::{IndexPath, IndexStore, Namespace, SourceTranslation},
   types::{
      Chapter, CheckingQuestion, ChunkMarker, Direction, Frame, Project, Resource, SourceLanguage,
      TranslationNote, TranslationWord,
   },
};

/// Source language used when the requested one is missing.
pub const FALLBACK_LANGUAGE: &str = "en";

/// One entry of the browse tree: either a category or, at the bottom, a
/// project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCategory {
   pub title:              String,
   /// `None` when this entry is the project itself.
   pub category_id:        Option<String>,
   pub project_id:         String,
   /// Language the title is in; may differ from the requested one.
   pub source_language_id: String,
   pub sort:               i64,
   pub depth:              usize,
}

impl ProjectCategory {
   pub fn id(&self) -> &str {
      self.category_id.as_deref().unwrap_or(&self.project_id)
   }

   pub const fn is_project(&self) -> bool {
      self.category_id.is_none()
   }
}

/// A resource together with the names needed to show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTranslationInfo {
   pub translation:          SourceTranslation,
   pub project_title:        String,
   pub source_language_name: String,
   pub resource_name:        String,
   pub direction:            Direction,
   pub checking_level:       i64,
   pub date_modified:        i64,
}

impl SourceTranslationInfo {
   pub fn id(&self) -> String {
      self.translation.id()
   }
}

/// Typed, read-only queries against an index. Never touches the network.
#[derive(Debug, Clone)]
pub struct CatalogView {
   index:               Arc<IndexStore>,
   default_resource_id: String,
   min_checking_level:  i64,
}

impl CatalogView {
   pub(crate) fn new(index: Arc<IndexStore>, options: &LibraryOptions) -> Self {
      Self {
         index,
         default_resource_id: options.default_resource_id.clone(),
         min_checking_level: options.min_checking_level,
      }
   }

   /// Name of the index this view reads.
   pub fn index_name(&self) -> &str {
      self.index.name()
   }

   pub fn project_ids(&self) -> Result<Vec<String>> {
      self.index.projects()
   }

   pub fn project(&self, project_id: &str) -> Result<Option<Project>> {
      self.index.get_typed(&IndexPath::from_ids([project_id])?)
   }

   /// Projects ordered by their sort key.
   pub fn projects(&self) -> Result<Vec<Project>> {
      let mut projects = Vec::new();
      for id in self.project_ids()? {
         if let Some(project) = self.project(&id)? {
            projects.push(project);
         }
      }
      projects.sort_by(|a, b| a.sort.cmp(&b.sort).then_with(|| a.id.cmp(&b.id)));
      Ok(projects)
   }

   /// The project title in `language_id`, falling back
   /// like [`Self::preferred_source_language`].
   pub fn project_title(&self, project_id: &str, language_id: &str) -> Result<Option<String>> {
      Ok(self
         .preferred_source_language(project_id, language_id)?
         .map(|sl| sl.project.name))
   }

   /// `language_id` if the project has it, else English, else the first
   /// source language there is.
   pub fn preferred_source_language(
      &self,
      project_id: &str,
      language_id: &str,
   ) -> Result<Option<SourceLanguage>> {
      if let Some(sl) = self.source_language(project_id, language_id)? {
         return Ok(Some(sl));
      }
      if let Some(sl) = self.source_language(project_id, FALLBACK_LANGUAGE)? {
         return Ok(Some(sl));
      }
      for id in self.index.list(&IndexPath::from_ids([project_id])?)? {
         if let Some(sl) = self.source_language(project_id, &id)? {
            return Ok(Some(sl));
         }
      }
      Ok(None)
   }

   pub fn source_language(&self, project_id: &str, language_id: &str) -> Result<Option<SourceLanguage>> {
      let Ok(path) = IndexPath::from_ids([project_id, language_id]) else {
         return Ok(None);
      };
      self.index.get_typed(&path)
   }

   pub fn source_languages(&self, project_id: &str) -> Result<Vec<SourceLanguage>> {
      let mut out = Vec::new();
      for id in self.index.list(&IndexPath::from_ids([project_id])?)? {
         if let Some(sl) = self.source_language(project_id, &id)? {
            out.push(sl);
         }
      }
      Ok(out)
   }

   pub fn resource(&self, st: &SourceTranslation) -> Result<Option<Resource>> {
      self.index.get_typed(&st.resource_path()?)
   }

   pub fn resources(&self, project_id: &str, language_id: &str) -> Result<Vec<Resource>> {
      let mut out = Vec::new();
      for id in self.index.list(&IndexPath::from_ids([project_id, language_id])?)? {
         if let Some(res) = self.resource(&SourceTranslation::new(project_id, language_id, id))? {
            out.push(res);
         }
      }
      Ok(out)
   }

   pub fn source_translation(
      &self,
      project_id: &str,
      language_id: &str,
      resource_id: &str,
   ) -> Result<Option<SourceTranslationInfo>> {
      let st = SourceTranslation::new(project_id, language_id, resource_id);
      let Some(project) = self.project(project_id)? else {
         return Ok(None);
      };
      let Some(language) = self.source_language(project_id, language_id)? else {
         return Ok(None);
      };
      let Some(resource) = self.resource(&st)? else {
         return Ok(None);
      };
      let project_title = if language.project.name.is_empty() {
         project.id
      } else {
         language.project.name
      };
      Ok(Some(SourceTranslationInfo {
         translation: st,
         project_title,
         source_language_name: language.name,
         resource_name: resource.name.clone(),
         direction: language.direction,
         checking_level: resource.checking_level(),
         date_modified: resource.date_modified,
      }))
   }

   /// Looks up a `{project}-{language}-{resource}` id.
   pub fn source_translation_by_id(&self, id: &str) -> Result<Option<SourceTranslationInfo>> {
      let Some(st) = SourceTranslation::parse_id(id) else {
         return Ok(None);
      };
      self.source_translation(&st.project_id, &st.source_language_id, &st.resource_id)
   }

   /// The default resource (`ulb` unless configured) of a source language,
   /// or its first resource when that is missing.
   pub fn default_source_translation(
      &self,
      project_id: &str,
      language_id: &str,
   ) -> Result<Option<SourceTranslationInfo>> {
      if let Some(info) = self.source_translation(project_id, language_id, &self.default_resource_id)? {
         return Ok(Some(info));
      }
      for resource in self.resources(project_id, language_id)? {
         if let Some(info) = self.source_translation(project_id, language_id, &resource.id)? {
            return Ok(Some(info));
         }
      }
      Ok(None)
   }

   fn translations_where(
      &self,
      project_id: &str,
      keep: impl Fn(i64) -> bool,
   ) -> Result<Vec<SourceTranslationInfo>> {
      let mut out = Vec::new();
      for language in self.source_languages(project_id)? {
         for resource in self.resources(project_id, &language.id)? {
            if !keep(resource.checking_level()) {
               continue;
            }
            if let Some(info) = self.source_translation(project_id, &language.id, &resource.id)? {
               out.push(info);
            }
         }
      }
      Ok(out)
   }

   /// Resources checked enough to translate from.
   pub fn source_translations(&self, project_id: &str) -> Result<Vec<SourceTranslationInfo>> {
      let min = self.min_checking_level;
      self.translations_where(project_id, |level| level >= min)
   }

   /// Resources below the checking threshold.
   pub fn draft_translations(&self, project_id: &str) -> Result<Vec<SourceTranslationInfo>> {
      let min = self.min_checking_level;
      self.translations_where(project_id, |level| level < min)
   }

   /// Chapters ordered by id.
   pub fn chapters(&self, st: &SourceTranslation) -> Result<Vec<Chapter>> {
      let mut out = Vec::new();
      for id in self.index.list(&st.resource_path()?)? {
         if let Some(chapter) = self.chapter(st, &id)? {
            out.push(chapter);
         }
      }
      Ok(out)
   }

   pub fn chapter(&self, st: &SourceTranslation, chapter_id: &str) -> Result<Option<Chapter>> {
      let Ok(path) = st.chapter_path(chapter_id) else {
         return Ok(None);
      };
      let chapter: Option<Chapter> = self.index.get_typed(&path)?;
      Ok(chapter.map(|mut c| {
         c.id = chapter_id.to_string();
         c
      }))
   }

   /// Frames of a chapter ordered by id.
   pub fn frames(&self, st: &SourceTranslation, chapter_id: &str) -> Result<Vec<Frame>> {
      let Ok(path) = st.chapter_path(chapter_id) else {
         return Ok(Vec::new());
      };
      let mut out = Vec::new();
      for id in self.index.list(&path)? {
         if let Some(frame) = self.frame(st, chapter_id, &id)? {
            out.push(frame);
         }
      }
      Ok(out)
   }

   pub fn frame(&self, st: &SourceTranslation, chapter_id: &str, frame_id: &str) -> Result<Option<Frame>> {
      let Ok(path) = st.frame_path(chapter_id, frame_id) else {
         return Ok(None);
      };
      self.index.get_typed(&path)
   }

   pub fn translation_notes(
      &self,
      st: &SourceTranslation,
      chapter_id: &str,
      frame_id: &str,
   ) -> Result<Vec<TranslationNote>> {
      let Ok(frame) = st.frame_path(chapter_id, frame_id) else {
         return Ok(Vec::new());
      };
      let notes = frame.namespace(Namespace::Notes);
      let mut out = Vec::new();
      for id in self.index.list(&notes)? {
         if let Some(note) = self.index.get_typed(&notes.child(&id)?)? {
            out.push(note);
         }
      }
      Ok(out)
   }

   /// Key-term definition of the resource.
   pub fn translation_word(&self, st: &SourceTranslation, word_id: &str) -> Result<Option<TranslationWord>> {
      let Ok(path) = st.resource_path()?.namespace(Namespace::Words).child(word_id) else {
         return Ok(None);
      };
      self.index.get_typed(&path)
   }

   /// Every key-term definition of the resource, ordered by id.
   pub fn all_translation_words(&self, st: &SourceTranslation) -> Result<Vec<TranslationWord>> {
      let words = st.resource_path()?.namespace(Namespace::Words);
      let mut out = Vec::new();
      for id in self.index.list(&words)? {
         if let Some(word) = self.translation_word(st, &id)? {
            out.push(word);
         }
      }
      Ok(out)
   }

   /// Key terms that occur in a frame, resolved to their definitions.
   /// Assignments without a definition are left out.
   pub fn translation_words(
      &self,
      st: &SourceTranslation,
      chapter_id: &str,
      frame_id: &str,
   ) -> Result<Vec<TranslationWord>> {
      let Ok(frame) = st.frame_path(chapter_id, frame_id) else {
         return Ok(Vec::new());
      };
      let mut out = Vec::new();
      for id in self.index.list(&frame.namespace(Namespace::Words))? {
         if let Some(word) = self.translation_word(st, &id)? {
            out.push(word);
         }
      }
      Ok(out)
   }

   pub fn checking_questions(&self, st: &SourceTranslation, chapter_id: &str) -> Result<Vec<CheckingQuestion>> {
      let Ok(chapter) = st.chapter_path(chapter_id) else {
         return Ok(Vec::new());
      };
      let questions = chapter.namespace(Namespace::Questions);
      let mut out = Vec::new();
      for id in self.index.list(&questions)? {
         if let Some(q) = self.index.get_typed(&questions.child(&id)?)? {
            out.push(q);
         }
      }
      Ok(out)
   }

   /// Chunk markers of a project in chapter order.
   pub fn chunk_markers(&self, project_id: &str) -> Result<Vec<ChunkMarker>> {
      let markers = IndexPath::from_ids([project_id])?.namespace(Namespace::Chunks);
      let mut out = Vec::new();
      for id in self.index.list(&markers)? {
         if let Some(marker) = self.index.get_typed(&markers.child(&id)?)? {
            out.push(marker);
         }
      }
      Ok(out)
   }

   /// Whether any resource of the source language has at least one chapter.
   pub fn source_language_has_source(&self, project_id: &str, language_id: &str) -> Result<bool> {
      let Ok(language) = IndexPath::from_ids([project_id, language_id]) else {
         return Ok(false);
      };
      for resource_id in self.index.list(&language)? {
         if !self.index.list(&language.child(&resource_id)?)?.is_empty() {
            return Ok(true);
         }
      }
      Ok(false)
   }

   pub fn project_has_source(&self, project_id: &str) -> Result<bool> {
      for language_id in self.index.list(&IndexPath::from_ids([project_id])?)? {
         if self.source_language_has_source(project_id, &language_id)? {
            return Ok(true);
         }
      }
      Ok(false)
   }

   /// Browse entries one level below `parent` (the top level for `None`).
   ///
   /// A project contributes the category at the next position of its
   /// category path, or itself once the path is exhausted. Only projects
   /// with downloaded source count. Titles come from the preferred source
   /// language; when several projects share a category the title in
   /// `language_id` wins.
   pub fn categories(
      &self,
      language_id: &str,
      parent: Option<&ProjectCategory>,
   ) -> Result<Vec<ProjectCategory>> {
      if parent.is_some_and(ProjectCategory::is_project) {
         return Ok(Vec::new());
      }
      let level = parent.map_or(0, |p| p.depth + 1);

      let mut by_id: BTreeMap<String, ProjectCategory> = BTreeMap::new();
      for project in self.projects()? {
         if let Some(parent) = parent {
            let matches_parent = parent
               .category_id
               .as_deref()
               .is_some_and(|id| project.categories.get(parent.depth).map(String::as_str) == Some(id));
            if !matches_parent {
               continue;
            }
         }

         let Some(language) = self.preferred_source_language(&project.id, language_id)? else {
            tracing::warn!("no source languages for {}", project.id);
            continue;
         };
         if !self.source_language_has_source(&project.id, &language.id)? {
            continue;
         }

         let (category_id, title) = match project.categories.get(level) {
            Some(category_id) => {
               let title = language
                  .project
                  .meta
                  .get(level)
                  .filter(|t| !t.is_empty())
                  .cloned()
                  .unwrap_or_else(|| category_id.clone());
               (Some(category_id.clone()), title)
            },
            None => (None, language.project.name.clone()),
         };

         let entry = ProjectCategory {
            title,
            category_id,
            project_id: project.id.clone(),
            source_language_id: language.id.clone(),
            sort: project.sort,
            depth: level,
         };
         let replace = by_id
            .get(entry.id())
            .is_none_or(|_| entry.source_language_id == language_id);
         if replace {
            by_id.insert(entry.id().to_string(), entry);
         }
      }

      let mut out: Vec<ProjectCategory> = by_id.into_values().collect();
      out.sort_by(|a, b| a.sort.cmp(&b.sort).then_with(|| a.id().cmp(b.id())));
      Ok(out)
   }

   /// Every project as a browse entry, ignoring categories. Projects
   /// without downloaded source are included.
   pub fn categories_flat(&self, language_id: &str) -> Result<Vec<ProjectCategory>> {
      let mut out = Vec::new();
      for project in self.projects()? {
         let Some(language) = self.preferred_source_language(&project.id, language_id)? else {
            tracing::warn!("no source languages for {}", project.id);
            continue;
         };
         out.push(ProjectCategory {
            title: language.project.name.clone(),
            category_id: None,
            project_id: project.id.clone(),
            source_language_id: language.id,
            sort: project.sort,
            depth: 0,
         });
      }
      out.sort_by(|a, b| a.sort.cmp(&b.sort).then_with(|| a.project_id.cmp(&b.project_id)));
      Ok(out)
   }
}
