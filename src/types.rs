//! Typed records for the documents held in an index.
//!
//! Field names follow the catalog wire format. Required fields have no
//! serde default, so a document missing one fails to decode and is treated
//! as malformed.

use serde::{Deserialize, Deserializer, Serialize};

/// Text direction of a language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
   #[default]
   Ltr,
   Rtl,
}

/// Markup used by a frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
   Usx,
   Default,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
   Int(i64),
   Str(String),
}

/// Accepts `150` as well as `"150"`; catalogs publish both.
pub(crate) fn flexible_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
   D: Deserializer<'de>,
{
   match IntOrString::deserialize(deserializer)? {
      IntOrString::Int(n) => Ok(n),
      IntOrString::Str(s) => s
         .trim()
         .parse()
         .map_err(|_| serde::de::Error::custom(format!("expected an integer, got {s:?}"))),
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
   #[serde(rename = "slug")]
   pub id:            String,
   #[serde(deserialize_with = "flexible_int")]
   pub date_modified: i64,
   #[serde(default, deserialize_with = "flexible_int")]
   pub sort:          i64,
   /// Category path, outermost first.
   #[serde(default, rename = "meta")]
   pub categories:    Vec<String>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub lang_catalog:  Option<String>,
}

/// Project title and category names in one source language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
   pub name: String,
   #[serde(default)]
   pub desc: String,
   #[serde(default)]
   pub meta: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLanguage {
   #[serde(rename = "slug")]
   pub id:            String,
   pub name:          String,
   #[serde(default)]
   pub direction:     Direction,
   #[serde(deserialize_with = "flexible_int")]
   pub date_modified: i64,
   pub project:       ProjectInfo,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub res_catalog:   Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
   #[serde(default, deserialize_with = "flexible_int")]
   pub checking_level: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
   #[serde(rename = "slug")]
   pub id:            String,
   pub name:          String,
   #[serde(deserialize_with = "flexible_int")]
   pub date_modified: i64,
   #[serde(default)]
   pub status:        ResourceStatus,
}

impl Resource {
   pub const fn checking_level(&self) -> i64 {
      self.status.checking_level
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
   #[serde(rename = "number")]
   pub id:        String,
   #[serde(default, rename = "ref")]
   pub reference: String,
   #[serde(default)]
   pub title:     String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
   /// Catalog id, `{chapter}-{frame}`.
   pub id:     String,
   #[serde(default)]
   pub format: String,
   #[serde(rename = "text")]
   pub body:   String,
   #[serde(default)]
   pub img:    Option<String>,
   #[serde(default)]
   pub title:  String,
}

impl Frame {
   /// Id of the frame within its chapter.
   pub fn slug(&self) -> &str {
      self.id.split_once('-').map_or(self.id.as_str(), |(_, f)| f)
   }

   pub fn format(&self) -> TextFormat {
      if self.format.eq_ignore_ascii_case("usx") { TextFormat::Usx } else { TextFormat::Default }
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationNote {
   pub id:    String,
   #[serde(rename = "ref")]
   pub title: String,
   #[serde(rename = "text")]
   pub body:  String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationWord {
   pub id:        String,
   pub term:      String,
   #[serde(rename = "def")]
   pub body:      String,
   #[serde(default)]
   pub def_title: String,
   #[serde(default)]
   pub aliases:   Vec<String>,
   #[serde(default)]
   pub cf:        Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckingQuestion {
   pub id:         String,
   #[serde(rename = "q")]
   pub question:   String,
   #[serde(rename = "a")]
   pub answer:     String,
   #[serde(default, rename = "ref")]
   pub references: Vec<String>,
}

/// First verse of a chunk within a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMarker {
   #[serde(rename = "chp")]
   pub chapter_id:  String,
   #[serde(rename = "firstvs")]
   pub first_verse: String,
}
