mod support;

use serde_json::json;
use srclib::{Progress, SourceTranslation, index::Namespace};
use support::{
   MockTransport, date_modified, library, resource_file_url, seed_catalog, serve_project_list,
   serve_translation,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn gen_en_ulb() -> SourceTranslation {
   SourceTranslation::new("gen", "en", "ulb")
}

#[tokio::test]
async fn optional_failures_do_not_block_the_merge() {
   let dir = TempDir::new().expect("temp dir");
   let transport = MockTransport::new();
   let lib = library(dir.path(), &transport);
   let st = gen_en_ulb();
   seed_catalog(lib.app_index(), &st, 100);
   serve_project_list(&transport, &[("gen", 150)]);
   serve_translation(&transport, &st, 150);
   transport.fail(&resource_file_url(&st, "notes"));

   let cancel = CancellationToken::new();
   let updates = lib.check_for_updates(&mut (), &cancel).await.expect("check");
   let outcome = lib
      .download_updates(&updates, &mut (), &mut (), &cancel)
      .await
      .expect("download");

   assert!(outcome.success);
   assert!(!outcome.cancelled);
   assert_eq!(outcome.merged_projects, vec!["gen"]);
   assert!(outcome.failed.is_empty());

   let app = lib.app_index();
   assert_eq!(date_modified(app, &st.resource_path().expect("path")), Some(150));
   assert_eq!(date_modified(app, &st.source_language_path().expect("path")), Some(150));
   assert_eq!(date_modified(app, &st.project_path().expect("path")), Some(150));

   let view = lib.view();
   let frame = view.frame(&st, "01", "02").expect("frame").expect("frame present");
   assert_eq!(frame.body, "gen v150 1:2");
   assert!(view.translation_notes(&st, "01", "01").expect("notes").is_empty());
   assert_eq!(view.all_translation_words(&st).expect("words").len(), 1);
   assert_eq!(view.checking_questions(&st, "01").expect("questions").len(), 1);

   // Downloaded means no longer pending.
   assert!(lib.available_updates().expect("updates").is_empty());
}

#[tokio::test]
async fn missing_source_keeps_the_previous_project() {
   let dir = TempDir::new().expect("temp dir");
   let transport = MockTransport::new();
   let lib = library(dir.path(), &transport);
   let st = gen_en_ulb();
   seed_catalog(lib.app_index(), &st, 100);
   let chapter = st.chapter_path("01").expect("path");
   lib.app_index()
      .put(&chapter, &json!({"number": "01", "title": "old"}))
      .expect("seed chapter");
   serve_project_list(&transport, &[("gen", 150)]);
   serve_translation(&transport, &st, 150);
   transport.fail(&resource_file_url(&st, "source"));

   let cancel = CancellationToken::new();
   let updates = lib.check_for_updates(&mut (), &cancel).await.expect("check");
   let outcome = lib
      .download_updates(&updates, &mut (), &mut (), &cancel)
      .await
      .expect("download");

   assert!(!outcome.success);
   assert!(outcome.merged_projects.is_empty());
   assert_eq!(outcome.failed, vec![st.clone()]);

   let app = lib.app_index();
   assert_eq!(date_modified(app, &st.resource_path().expect("path")), Some(100));
   assert_eq!(date_modified(app, &st.project_path().expect("path")), Some(100));
   assert_eq!(app.get(&chapter).expect("get"), Some(json!({"number": "01", "title": "old"})));
   // Staged optional content never reaches the app index.
   let words = st.resource_path().expect("path").namespace(Namespace::Words);
   assert!(app.list(&words).expect("list").is_empty());
   assert_eq!(lib.available_updates().expect("updates").len(), 1);
}

#[tokio::test]
async fn one_failing_project_does_not_hold_back_others() {
   let dir = TempDir::new().expect("temp dir");
   let transport = MockTransport::new();
   let lib = library(dir.path(), &transport);
   let gen_st = gen_en_ulb();
   let mat_st = SourceTranslation::new("mat", "en", "ulb");
   serve_project_list(&transport, &[("gen", 150), ("mat", 150)]);
   serve_translation(&transport, &gen_st, 150);
   serve_translation(&transport, &mat_st, 150);
   transport.fail(&resource_file_url(&gen_st, "source"));

   let cancel = CancellationToken::new();
   let updates = lib.check_for_updates(&mut (), &cancel).await.expect("check");
   let mut projects = Vec::new();
   let mut project_listener = |p: Progress| projects.push(p);
   let outcome = lib
      .download_updates(&updates, &mut project_listener, &mut (), &cancel)
      .await
      .expect("download");

   assert!(!outcome.success);
   assert_eq!(outcome.merged_projects, vec!["mat"]);
   assert_eq!(lib.app_index().projects().expect("projects"), vec!["mat"]);
   assert!(projects.contains(&Progress::Determinate { current: 2, max: 2 }));
}

#[tokio::test]
async fn single_translation_reports_each_step() {
   let dir = TempDir::new().expect("temp dir");
   let transport = MockTransport::new();
   let lib = library(dir.path(), &transport);
   let st = gen_en_ulb();
   serve_project_list(&transport, &[("gen", 150)]);
   serve_translation(&transport, &st, 150);

   let cancel = CancellationToken::new();
   lib.check_for_updates(&mut (), &cancel).await.expect("check");

   let mut events = Vec::new();
   let mut listener = |p: Progress| events.push(p);
   let outcome = lib
      .download_source_translation(&st, &mut listener, &cancel)
      .await
      .expect("download");
   assert!(outcome.success);

   let expected: Vec<Progress> = (1..=5)
      .map(|current| Progress::Determinate { current, max: 5 })
      .chain([Progress::Indeterminate])
      .collect();
   assert_eq!(events, expected);

   let view = lib.view();
   assert_eq!(view.chapters(&st).expect("chapters").len(), 2);
   let notes = view.translation_notes(&st, "01", "01").expect("notes");
   assert_eq!(notes.len(), 1);
   assert_eq!(notes[0].id, "01-01-01");
   let words = view.translation_words(&st, "01", "01").expect("words");
   assert_eq!(words.iter().map(|w| w.term.as_str()).collect::<Vec<_>>(), vec!["God"]);
}

#[tokio::test]
async fn redownload_restages_cleanly_and_merge_only_adds() {
   let dir = TempDir::new().expect("temp dir");
   let transport = MockTransport::new();
   let lib = library(dir.path(), &transport);
   let st = gen_en_ulb();
   serve_project_list(&transport, &[("gen", 150)]);
   serve_translation(&transport, &st, 150);

   let cancel = CancellationToken::new();
   lib.check_for_updates(&mut (), &cancel).await.expect("check");
   lib.download_source_translation(&st, &mut (), &cancel)
      .await
      .expect("first download");

   transport.serve(
      resource_file_url(&st, "terms"),
      &json!([{"id": "adam", "term": "Adam", "def": "The first man"}]),
   );
   lib.download_source_translation(&st, &mut (), &cancel)
      .await
      .expect("second download");

   // Staging starts clean, and merging only adds: the app index keeps both.
   let staged = lib.download_index();
   let words = st.resource_path().expect("path").namespace(Namespace::Words);
   assert!(staged.exists(&words.child("adam").expect("id")));
   assert!(!staged.exists(&words.child("god").expect("id")));
   let app_words: Vec<String> = lib
      .view()
      .all_translation_words(&st)
      .expect("words")
      .into_iter()
      .map(|w| w.id)
      .collect();
   assert_eq!(app_words, vec!["adam", "god"]);
}

#[tokio::test]
async fn reseeded_staging_takes_catalog_stamps_from_the_mirror() {
   let dir = TempDir::new().expect("temp dir");
   let transport = MockTransport::new();
   let lib = library(dir.path(), &transport);
   let st = gen_en_ulb();
   seed_catalog(lib.app_index(), &st, 100);
   serve_project_list(&transport, &[("gen", 150)]);
   serve_translation(&transport, &st, 150);

   let cancel = CancellationToken::new();
   let updates = lib.check_for_updates(&mut (), &cancel).await.expect("check");
   // Staging now holds the app's older catalog documents.
   lib.seed_download_index().expect("seed staging");
   let resource = st.resource_path().expect("path");
   assert_eq!(date_modified(lib.download_index(), &resource), Some(100));

   let outcome = lib
      .download_updates(&updates, &mut (), &mut (), &cancel)
      .await
      .expect("download");
   assert!(outcome.success);
   assert_eq!(date_modified(lib.app_index(), &resource), Some(150));
   assert_eq!(date_modified(lib.app_index(), &st.source_language_path().expect("path")), Some(150));
   assert!(lib.available_updates().expect("updates").is_empty());
}

#[tokio::test]
async fn download_all_honours_the_checking_level_floor() {
   let dir = TempDir::new().expect("temp dir");
   let transport = MockTransport::new();
   let mut options = support::options(dir.path());
   options.download_min_checking_level = Some(3);
   let transport_dyn: std::sync::Arc<dyn srclib::CatalogTransport> = transport.clone();
   let lib = srclib::Library::new(options, transport_dyn).expect("library");

   let st = gen_en_ulb();
   let draft = SourceTranslation::new("gen", "en", "draft");
   serve_project_list(&transport, &[("gen", 150)]);
   serve_translation(&transport, &st, 150);
   transport.serve(
      support::url("gen/en/resources.json"),
      &json!([support::resource_doc("ulb", 150, 3), support::resource_doc("draft", 150, 1)]),
   );
   support::serve_content(&transport, &draft, "draft");

   let cancel = CancellationToken::new();
   lib.check_for_updates(&mut (), &cancel).await.expect("check");
   let outcome = lib
      .download_all_projects(&mut (), &mut (), &cancel)
      .await
      .expect("download");

   assert!(outcome.success);
   assert!(lib.app_index().exists(&st.resource_path().expect("path")));
   assert!(!lib.app_index().exists(&draft.resource_path().expect("path")));
   assert!(!transport.was_requested(&resource_file_url(&draft, "source")));
}

#[tokio::test]
async fn update_all_refreshes_languages_and_chunks() {
   let dir = TempDir::new().expect("temp dir");
   let transport = MockTransport::new();
   let lib = library(dir.path(), &transport);
   let st = gen_en_ulb();
   serve_project_list(&transport, &[("gen", 150)]);
   serve_translation(&transport, &st, 150);
   transport.serve(
      support::LANGUAGES_URL,
      &json!([{"lc": "en", "ln": "English"}, {"lc": "de", "ln": "Deutsch"}]),
   );
   transport.serve(
      support::CHUNKS_URL.replace("{project}", "gen"),
      &json!([{"chp": "01", "firstvs": "01"}, {"chp": "01", "firstvs": "03"}]),
   );

   let outcome = lib
      .update_all(&mut (), &mut (), &CancellationToken::new())
      .await
      .expect("update all");

   assert!(outcome.success, "{outcome:?}");
   assert_eq!(lib.target_languages().expect("languages").len(), 2);
   let markers = lib.view().chunk_markers("gen").expect("chunks");
   assert_eq!(markers.len(), 2);
   assert_eq!(markers[1].first_verse, "03");
   assert!(lib.exists().expect("exists"));
}

#[tokio::test]
async fn update_all_fails_when_the_language_catalog_is_bad() {
   let dir = TempDir::new().expect("temp dir");
   let transport = MockTransport::new();
   let lib = library(dir.path(), &transport);
   let st = gen_en_ulb();
   serve_project_list(&transport, &[("gen", 150)]);
   serve_translation(&transport, &st, 150);
   transport.serve(support::LANGUAGES_URL, &json!({"error": "maintenance"}));
   transport.serve(support::CHUNKS_URL.replace("{project}", "gen"), &json!([]));

   let outcome = lib
      .update_all(&mut (), &mut (), &CancellationToken::new())
      .await
      .expect("update all");

   assert!(!outcome.success);
   assert_eq!(outcome.merged_projects, vec!["gen"]);
   assert!(!lib.options().library_dir.join("languages.json").exists());
}
