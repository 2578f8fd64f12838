//! URLs of the versioned catalog API.

use crate::{
   config::{DEFAULT_CHUNKS_URL_TEMPLATE, DEFAULT_TARGET_LANGUAGES_URL},
   index::SourceTranslation,
};

/// Per-resource documents published by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFile {
   Source,
   Terms,
   TermAssignments,
   Notes,
   CheckingQuestions,
}

impl ResourceFile {
   pub const fn file_stem(self) -> &'static str {
      match self {
         Self::Source => "source",
         Self::Terms => "terms",
         Self::TermAssignments => "tw_cat",
         Self::Notes => "notes",
         Self::CheckingQuestions => "checking_questions",
      }
   }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
   base:                 String,
   target_languages_url: String,
   chunks_url_template:  String,
}

impl Endpoints {
   /// `base` is the API root without the version, e.g.
   /// `https://api.unfoldingword.org/ts/txt`.
   pub fn new(base: &str, version: &str) -> Self {
      let base = format!("{}/{}", base.trim_end_matches('/'), version.trim_matches('/'));
      Self {
         base,
         target_languages_url: DEFAULT_TARGET_LANGUAGES_URL.to_string(),
         chunks_url_template: DEFAULT_CHUNKS_URL_TEMPLATE.to_string(),
      }
   }

   pub fn with_target_languages_url(mut self, url: &str) -> Self {
      self.target_languages_url = url.to_string();
      self
   }

   /// `{project}` in the template is replaced by the project id.
   pub fn with_chunks_url_template(mut self, template: &str) -> Self {
      self.chunks_url_template = template.to_string();
      self
   }

   pub fn project_list(&self) -> String {
      format!("{}/catalog.json", self.base)
   }

   pub fn source_language_list(&self, project_id: &str) -> String {
      format!("{}/{project_id}/languages.json", self.base)
   }

   pub fn resource_list(&self, project_id: &str, source_language_id: &str) -> String {
      format!("{}/{project_id}/{source_language_id}/resources.json", self.base)
   }

   pub fn resource_file(&self, st: &SourceTranslation, file: ResourceFile) -> String {
      format!(
         "{}/{}/{}/{}/{}.json",
         self.base,
         st.project_id,
         st.source_language_id,
         st.resource_id,
         file.file_stem()
      )
   }

   pub fn target_languages(&self) -> &str {
      &self.target_languages_url
   }

   pub fn chunks(&self, project_id: &str) -> String {
      self.chunks_url_template.replace("{project}", project_id)
   }
}
