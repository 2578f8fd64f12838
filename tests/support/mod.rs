#![allow(dead_code)]

use std::{collections::HashMap, path::Path, sync::Arc};

use parking_lot::Mutex;
use serde_json::{Value, json};
use srclib::{
   CatalogTransport, Endpoints, IndexPath, IndexStore, Library, LibraryOptions, SourceTranslation,
   error::HttpError,
};
use tokio_util::sync::CancellationToken;

pub const BASE: &str = "https://catalog.test/ts/txt";
pub const LANGUAGES_URL: &str = "https://catalog.test/langnames.json";
pub const CHUNKS_URL: &str = "https://catalog.test/bible/{project}/chunks.json";

/// In-memory catalog. Unknown URLs answer 404.
#[derive(Default)]
pub struct MockTransport {
   responses: Mutex<HashMap<String, Vec<u8>>>,
   calls:     Mutex<Vec<String>>,
   triggers:  Mutex<HashMap<String, CancellationToken>>,
}

impl MockTransport {
   pub fn new() -> Arc<Self> {
      Arc::new(Self::default())
   }

   pub fn serve(&self, url: impl Into<String>, body: &Value) {
      self
         .responses
         .lock()
         .insert(url.into(), body.to_string().into_bytes());
   }

   pub fn serve_raw(&self, url: impl Into<String>, body: &[u8]) {
      self.responses.lock().insert(url.into(), body.to_vec());
   }

   pub fn fail(&self, url: &str) {
      self.responses.lock().remove(url);
   }

   /// Cancels `token` when `url` is requested; the response is still served.
   pub fn cancel_on(&self, url: impl Into<String>, token: &CancellationToken) {
      self.triggers.lock().insert(url.into(), token.clone());
   }

   pub fn calls(&self) -> Vec<String> {
      self.calls.lock().clone()
   }

   pub fn clear_calls(&self) {
      self.calls.lock().clear();
   }

   pub fn was_requested(&self, url: &str) -> bool {
      self.calls.lock().iter().any(|c| c == url)
   }
}

#[async_trait::async_trait]
impl CatalogTransport for MockTransport {
   async fn get(&self, url: &str) -> srclib::Result<Vec<u8>> {
      self.calls.lock().push(url.to_string());
      if let Some(token) = self.triggers.lock().get(url) {
         token.cancel();
      }
      match self.responses.lock().get(url) {
         Some(body) => Ok(body.clone()),
         None => Err(HttpError::StatusCode { url: url.to_string(), status: 404 }.into()),
      }
   }
}

pub fn endpoints() -> Endpoints {
   Endpoints::new(BASE, "2")
      .with_target_languages_url(LANGUAGES_URL)
      .with_chunks_url_template(CHUNKS_URL)
}

pub fn options(dir: &Path) -> LibraryOptions {
   LibraryOptions::new(dir.join("library"), dir.join("cache"), endpoints())
}

pub fn library(dir: &Path, transport: &Arc<MockTransport>) -> Library {
   let transport: Arc<dyn CatalogTransport> = transport.clone();
   Library::new(options(dir), transport).expect("library")
}

pub fn url(path: &str) -> String {
   format!("{BASE}/2/{path}")
}

pub fn project_doc(id: &str, date_modified: i64, sort: i64, meta: &[&str]) -> Value {
   json!({
      "slug": id,
      "date_modified": date_modified.to_string(),
      "sort": sort.to_string(),
      "meta": meta,
      "lang_catalog": url(&format!("{id}/languages.json")),
   })
}

/// A source-language document as stored in an index.
pub fn language_doc(id: &str, name: &str, date_modified: i64, title: &str, meta: &[&str]) -> Value {
   json!({
      "slug": id,
      "name": name,
      "direction": "ltr",
      "date_modified": date_modified,
      "project": {"name": title, "desc": "", "meta": meta},
   })
}

/// A source-language entry as the catalog publishes it.
pub fn language_entry(id: &str, name: &str, date_modified: i64, title: &str, meta: &[&str]) -> Value {
   json!({
      "language": {"slug": id, "name": name, "direction": "ltr", "date_modified": date_modified},
      "project": {"name": title, "desc": "", "meta": meta},
   })
}

pub fn resource_doc(id: &str, date_modified: i64, checking_level: i64) -> Value {
   json!({
      "slug": id,
      "name": id.to_uppercase(),
      "date_modified": date_modified,
      "status": {"checking_level": checking_level.to_string()},
   })
}

/// Two chapters, the first with two frames.
pub fn source_body(marker: &str) -> Value {
   json!({
      "chapters": [
         {
            "number": "01",
            "ref": "",
            "title": "Chapter 1",
            "frames": [
               {"id": "01-01", "format": "usx", "text": format!("{marker} 1:1"), "img": ""},
               {"id": "01-02", "format": "usx", "text": format!("{marker} 1:2"), "img": ""},
            ],
         },
         {
            "number": "02",
            "ref": "",
            "title": "Chapter 2",
            "frames": [{"id": "02-01", "format": "usx", "text": format!("{marker} 2:1"), "img": ""}],
         },
      ],
      "date_modified": "20150826",
   })
}

/// Publishes the catalog document chain and the five resource files of `st`.
pub fn serve_translation(transport: &MockTransport, st: &SourceTranslation, stamp: i64) {
   let (p, l, r) = (&st.project_id, &st.source_language_id, &st.resource_id);
   transport.serve(url(&format!("{p}/languages.json")), &json!([language_entry(
      l,
      "English",
      stamp,
      &format!("Book of {p}"),
      &["Old Testament"],
   )]));
   transport.serve(url(&format!("{p}/{l}/resources.json")), &json!([resource_doc(r, stamp, 3)]));
   serve_content(transport, st, &format!("{p} v{stamp}"));
}

pub fn serve_content(transport: &MockTransport, st: &SourceTranslation, marker: &str) {
   let base = url(&format!("{}/{}/{}", st.project_id, st.source_language_id, st.resource_id));
   transport.serve(format!("{base}/source.json"), &source_body(marker));
   transport.serve(
      format!("{base}/terms.json"),
      &json!([{"id": "god", "term": "God", "def": "The creator", "def_title": "Definition", "aliases": [], "cf": []}]),
   );
   transport.serve(
      format!("{base}/tw_cat.json"),
      &json!({"chapters": [{"id": "01", "frames": [{"id": "01", "items": [{"id": "god"}]}]}]}),
   );
   transport.serve(
      format!("{base}/notes.json"),
      &json!([{"id": "01-01", "tn": [{"ref": "In the beginning", "text": "first note"}]}]),
   );
   transport.serve(
      format!("{base}/checking_questions.json"),
      &json!([{"id": "01", "cq": [{"q": "Who created?", "a": "God", "ref": ["01-01"]}]}]),
   );
}

pub fn serve_project_list(transport: &MockTransport, projects: &[(&str, i64)]) {
   let list: Vec<Value> = projects
      .iter()
      .enumerate()
      .map(|(n, (id, stamp))| project_doc(id, *stamp, n as i64 + 1, &["bible-ot"]))
      .collect();
   transport.serve(url("catalog.json"), &Value::Array(list));
}

pub fn resource_file_url(st: &SourceTranslation, file: &str) -> String {
   url(&format!("{}/{}/{}/{file}.json", st.project_id, st.source_language_id, st.resource_id))
}

/// Writes the project, language and resource documents of `st`, all stamped
/// `stamp`, into `index`.
pub fn seed_catalog(index: &IndexStore, st: &SourceTranslation, stamp: i64) {
   index
      .put(&st.project_path().expect("path"), &project_doc(&st.project_id, stamp, 1, &["bible-ot"]))
      .expect("seed project");
   index
      .put(
         &st.source_language_path().expect("path"),
         &language_doc(&st.source_language_id, "English", stamp, &format!("Book of {}", st.project_id), &[
            "Old Testament",
         ]),
      )
      .expect("seed language");
   index
      .put(&st.resource_path().expect("path"), &resource_doc(&st.resource_id, stamp, 3))
      .expect("seed resource");
}

pub fn date_modified(index: &IndexStore, path: &IndexPath) -> Option<i64> {
   let doc = index.get(path).expect("read")?;
   match &doc["date_modified"] {
      Value::Number(n) => n.as_i64(),
      Value::String(s) => s.parse().ok(),
      _ => None,
   }
}
