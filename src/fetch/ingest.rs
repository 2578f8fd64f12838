//! Splitting catalog responses into per-entity index documents.
//!
//! Each function takes a raw response body, writes the documents it holds
//! into `index` and reports what it wrote. A body that is not the expected
//! JSON shape is an [`Error::Malformed`]; single entries without a usable id
//! are skipped with a warning.

use serde_json::{Map, Value};

use crate::{
   error::{Error, Result},
   index::{IndexPath, IndexStore, Namespace, SourceTranslation},
};

fn parse(url: &str, bytes: &[u8]) -> Result<Value> {
   serde_json::from_slice(bytes)
      .map_err(|e| Error::Malformed { path: url.to_string(), reason: e.to_string() })
}

fn expect_array<'a>(url: &str, value: &'a Value) -> Result<&'a Vec<Value>> {
   value
      .as_array()
      .ok_or_else(|| Error::Malformed { path: url.to_string(), reason: "expected a JSON array".to_string() })
}

/// Reads an id that may be published as a string or a number.
fn id_field(entry: &Value, key: &str) -> Option<String> {
   match entry.get(key)? {
      Value::String(s) if !s.is_empty() => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      _ => None,
   }
}

fn child(parent: &IndexPath, id: &str) -> Option<IndexPath> {
   match parent.child(id) {
      Ok(path) => Some(path),
      Err(e) => {
         tracing::warn!(%parent, "skipping catalog entry: {e}");
         None
      },
   }
}

/// Frame id within its chapter: `01-02` under chapter `01` is `02`.
fn frame_slug<'a>(chapter_id: &str, raw: &'a str) -> &'a str {
   raw.strip_prefix(chapter_id)
      .and_then(|rest| rest.strip_prefix('-'))
      .or_else(|| raw.split_once('-').map(|(_, f)| f))
      .unwrap_or(raw)
}

/// Writes one document per project; returns project ids in catalog order.
pub fn project_catalog(index: &IndexStore, url: &str, bytes: &[u8]) -> Result<Vec<String>> {
   let value = parse(url, bytes)?;
   let mut ids = Vec::new();
   for entry in expect_array(url, &value)? {
      let Some(id) = id_field(entry, "slug") else {
         continue;
      };
      let Some(path) = child(&IndexPath::root(), &id) else {
         continue;
      };
      index.put(&path, entry)?;
      ids.push(id);
   }
   Ok(ids)
}

/// Writes one document per source language of `project_id`. The nested
/// `language` object is flattened; `project` and `res_catalog` are kept.
pub fn source_language_catalog(
   index: &IndexStore,
   project_id: &str,
   url: &str,
   bytes: &[u8],
) -> Result<Vec<String>> {
   let value = parse(url, bytes)?;
   let project = IndexPath::from_ids([project_id])?;
   let mut ids = Vec::new();
   for entry in expect_array(url, &value)? {
      let Some(language) = entry.get("language").and_then(Value::as_object) else {
         continue;
      };
      let mut doc: Map<String, Value> = language.clone();
      for key in ["project", "res_catalog"] {
         if let Some(v) = entry.get(key) {
            doc.insert(key.to_string(), v.clone());
         }
      }
      let doc = Value::Object(doc);
      let Some(id) = id_field(&doc, "slug") else {
         continue;
      };
      let Some(path) = child(&project, &id) else {
         continue;
      };
      index.put(&path, &doc)?;
      ids.push(id);
   }
   Ok(ids)
}

pub fn resource_catalog(
   index: &IndexStore,
   project_id: &str,
   source_language_id: &str,
   url: &str,
   bytes: &[u8],
) -> Result<Vec<String>> {
   let value = parse(url, bytes)?;
   let language = IndexPath::from_ids([project_id, source_language_id])?;
   let mut ids = Vec::new();
   for entry in expect_array(url, &value)? {
      let Some(id) = id_field(entry, "slug") else {
         continue;
      };
      let Some(path) = child(&language, &id) else {
         continue;
      };
      index.put(&path, entry)?;
      ids.push(id);
   }
   Ok(ids)
}

/// Writes chapter documents (without their frames) and frame documents.
/// Returns the number of frames written.
pub fn source(index: &IndexStore, st: &SourceTranslation, url: &str, bytes: &[u8]) -> Result<usize> {
   let value = parse(url, bytes)?;
   let chapters = value
      .get("chapters")
      .and_then(Value::as_array)
      .ok_or_else(|| Error::Malformed { path: url.to_string(), reason: "missing chapters".to_string() })?;
   let resource = st.resource_path()?;

   let mut frames_written = 0;
   for chapter in chapters {
      let Some(chapter_id) = id_field(chapter, "number") else {
         continue;
      };
      let Some(chapter_path) = child(&resource, &chapter_id) else {
         continue;
      };
      let mut doc = chapter.clone();
      if let Some(obj) = doc.as_object_mut() {
         obj.remove("frames");
      }
      index.put(&chapter_path, &doc)?;

      let frames = chapter.get("frames").and_then(Value::as_array);
      for frame in frames.into_iter().flatten() {
         let Some(raw_id) = id_field(frame, "id") else {
            continue;
         };
         let Some(frame_path) = child(&chapter_path, frame_slug(&chapter_id, &raw_id)) else {
            continue;
         };
         index.put(&frame_path, frame)?;
         frames_written += 1;
      }
   }
   Ok(frames_written)
}

/// Writes key-term definitions under the resource's `_words` namespace.
pub fn terms(index: &IndexStore, st: &SourceTranslation, url: &str, bytes: &[u8]) -> Result<usize> {
   let value = parse(url, bytes)?;
   let words = st.resource_path()?.namespace(Namespace::Words);
   let mut written = 0;
   for entry in expect_array(url, &value)? {
      let Some(id) = id_field(entry, "id") else {
         continue;
      };
      let Some(path) = child(&words, &id) else {
         continue;
      };
      index.put(&path, entry)?;
      written += 1;
   }
   Ok(written)
}

/// Writes which key terms occur in each frame, under the frame's `_words`.
pub fn term_assignments(
   index: &IndexStore,
   st: &SourceTranslation,
   url: &str,
   bytes: &[u8],
) -> Result<usize> {
   let value = parse(url, bytes)?;
   let chapters = value
      .get("chapters")
      .and_then(Value::as_array)
      .ok_or_else(|| Error::Malformed { path: url.to_string(), reason: "missing chapters".to_string() })?;
   let resource = st.resource_path()?;

   let mut written = 0;
   for chapter in chapters {
      let Some(chapter_path) = id_field(chapter, "id").and_then(|id| child(&resource, &id)) else {
         continue;
      };
      for frame in chapter.get("frames").and_then(Value::as_array).into_iter().flatten() {
         let Some(frame_path) = id_field(frame, "id").and_then(|id| child(&chapter_path, &id))
         else {
            continue;
         };
         let words = frame_path.namespace(Namespace::Words);
         for item in frame.get("items").and_then(Value::as_array).into_iter().flatten() {
            let Some(term_id) = id_field(item, "id") else {
               continue;
            };
            let Some(path) = child(&words, &term_id) else {
               continue;
            };
            index.put(&path, &serde_json::json!({ "id": term_id }))?;
            written += 1;
         }
      }
   }
   Ok(written)
}

/// Writes translation notes under each frame's `_notes`. Note ids are the
/// catalog frame id followed by the note's ordinal.
pub fn notes(index: &IndexStore, st: &SourceTranslation, url: &str, bytes: &[u8]) -> Result<usize> {
   let value = parse(url, bytes)?;
   let resource = st.resource_path()?;
   let mut written = 0;
   for entry in expect_array(url, &value)? {
      let Some(raw_id) = id_field(entry, "id") else {
         continue;
      };
      let Some((chapter_id, frame_id)) = raw_id.split_once('-') else {
         tracing::warn!(%raw_id, "skipping notes without a chapter-frame id");
         continue;
      };
      let Some(frame_path) = child(&resource, chapter_id).and_then(|c| child(&c, frame_id)) else {
         continue;
      };
      let notes_path = frame_path.namespace(Namespace::Notes);
      for (n, note) in entry.get("tn").and_then(Value::as_array).into_iter().flatten().enumerate() {
         let Some(obj) = note.as_object() else {
            continue;
         };
         let id = format!("{raw_id}-{:02}", n + 1);
         let mut doc = obj.clone();
         doc.insert("id".to_string(), Value::String(id.clone()));
         if let Some(path) = child(&notes_path, &id) {
            index.put(&path, &Value::Object(doc))?;
            written += 1;
         }
      }
   }
   Ok(written)
}

/// Writes checking questions under each chapter's `_questions`.
pub fn checking_questions(
   index: &IndexStore,
   st: &SourceTranslation,
   url: &str,
   bytes: &[u8],
) -> Result<usize> {
   let value = parse(url, bytes)?;
   let resource = st.resource_path()?;
   let mut written = 0;
   for entry in expect_array(url, &value)? {
      let Some(chapter_id) = id_field(entry, "id") else {
         continue;
      };
      let Some(chapter_path) = child(&resource, &chapter_id) else {
         continue;
      };
      let questions = chapter_path.namespace(Namespace::Questions);
      for (n, question) in entry.get("cq").and_then(Value::as_array).into_iter().flatten().enumerate() {
         let Some(obj) = question.as_object() else {
            continue;
         };
         let id = format!("{chapter_id}-{:02}", n + 1);
         let mut doc = obj.clone();
         doc.insert("id".to_string(), Value::String(id.clone()));
         if let Some(path) = child(&questions, &id) {
            index.put(&path, &Value::Object(doc))?;
            written += 1;
         }
      }
   }
   Ok(written)
}

/// Writes chunk markers under the project's `_chunks`.
pub fn chunks(index: &IndexStore, project_id: &str, url: &str, bytes: &[u8]) -> Result<usize> {
   let value = parse(url, bytes)?;
   let markers = IndexPath::from_ids([project_id])?.namespace(Namespace::Chunks);
   let mut written = 0;
   for entry in expect_array(url, &value)? {
      let (Some(chapter), Some(verse)) = (id_field(entry, "chp"), id_field(entry, "firstvs")) else {
         continue;
      };
      let Some(path) = child(&markers, &format!("{chapter}-{verse}")) else {
         continue;
      };
      index.put(&path, entry)?;
      written += 1;
   }
   Ok(written)
}
