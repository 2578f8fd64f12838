use std::fs;

use serde_json::json;
use srclib::{Error, IndexPath, IndexStore, index::Namespace, types::Resource};
use tempfile::TempDir;

fn open() -> (TempDir, IndexStore) {
   let dir = TempDir::new().expect("temp dir");
   let store = IndexStore::open("test", dir.path().join("index")).expect("open store");
   (dir, store)
}

fn path(ids: &[&str]) -> IndexPath {
   IndexPath::from_ids(ids.iter().copied()).expect("valid path")
}

#[test]
fn documents_are_stored_per_node() {
   let (_dir, store) = open();
   let doc = json!({"slug": "en", "name": "English"});
   store.put(&path(&["gen", "en"]), &doc).expect("put");

   assert_eq!(store.get(&path(&["gen", "en"])).expect("get"), Some(doc));
   assert_eq!(store.get(&path(&["gen"])).expect("get"), None);
   assert!(store.exists(&path(&["gen", "en"])));
   assert!(!store.exists(&path(&["gen"])));
   assert!(store.root().join("gen/en/index.json").is_file());
}

#[test]
fn put_replaces_the_previous_document() {
   let (_dir, store) = open();
   store.put(&path(&["gen"]), &json!({"v": 1})).expect("put");
   store.put(&path(&["gen"]), &json!({"v": 2})).expect("put");
   assert_eq!(store.get(&path(&["gen"])).expect("get"), Some(json!({"v": 2})));
}

#[test]
fn list_orders_numeric_ids_by_value() {
   let (_dir, store) = open();
   let resource = path(&["gen", "en", "ulb"]);
   for chapter in ["10", "2", "1", "front"] {
      store
         .put(&resource.child(chapter).expect("id"), &json!({"number": chapter}))
         .expect("put");
   }
   assert_eq!(store.list(&resource).expect("list"), vec!["1", "2", "10", "front"]);
}

#[test]
fn list_skips_namespaces_and_stray_files() {
   let (_dir, store) = open();
   let resource = path(&["gen", "en", "ulb"]);
   store.put(&resource.child("01").expect("id"), &json!({})).expect("put");
   store
      .put(&resource.namespace(Namespace::Words).child("god").expect("id"), &json!({"id": "god"}))
      .expect("put");
   let dir = resource.to_fs_path(store.root());
   fs::write(dir.join("notes.txt"), "x").expect("stray file");
   fs::create_dir_all(dir.join("02.tmp-abc")).expect("temp dir");

   assert_eq!(store.list(&resource).expect("list"), vec!["01"]);
   assert_eq!(store.list(&path(&["missing"])).expect("list"), Vec::<String>::new());
}

#[test]
fn malformed_documents_read_as_absent() {
   let (_dir, store) = open();
   let node = path(&["gen"]);
   let file = node.document_path(store.root());
   fs::create_dir_all(file.parent().expect("parent")).expect("mkdir");
   fs::write(&file, b"{ not json").expect("write");
   assert_eq!(store.get(&node).expect("get"), None);

   let resource = path(&["gen", "en", "ulb"]);
   store.put(&resource, &json!({"slug": "ulb"})).expect("put");
   assert_eq!(store.get_typed::<Resource>(&resource).expect("get"), None);
}

#[test]
fn delete_subtree_is_idempotent() {
   let (_dir, store) = open();
   store.put(&path(&["gen", "en"]), &json!({})).expect("put");
   store.put(&path(&["gen"]), &json!({})).expect("put");
   store.put(&path(&["mat"]), &json!({})).expect("put");

   store.delete_subtree(&path(&["gen"])).expect("delete");
   store.delete_subtree(&path(&["gen"])).expect("delete again");
   assert_eq!(store.get(&path(&["gen", "en"])).expect("get"), None);
   assert_eq!(store.projects().expect("projects"), vec!["mat"]);
}

#[test]
fn invalid_ids_never_reach_the_filesystem() {
   for bad in ["", "..", "_notes", ".hidden", "a/b", "a\\b"] {
      assert!(matches!(IndexPath::from_ids([bad]), Err(Error::InvalidId(_))), "{bad:?} accepted");
   }
   assert!(path(&["gen"]).child("../etc").is_err());
}

#[test]
fn destroy_leaves_an_empty_root() {
   let (_dir, store) = open();
   store.put(&path(&["gen"]), &json!({})).expect("put");
   assert_eq!(store.projects().expect("projects"), vec!["gen"]);

   store.destroy().expect("destroy");
   assert!(store.root().is_dir());
   assert!(store.projects().expect("projects").is_empty());
}

#[test]
fn reload_sees_changes_made_behind_the_store() {
   let (_dir, store) = open();
   assert!(store.projects().expect("projects").is_empty());

   let other = IndexStore::open("other", store.root()).expect("second handle");
   other.put(&path(&["gen"]), &json!({})).expect("put");
   assert!(store.projects().expect("projects").is_empty());

   store.reload();
   assert_eq!(store.projects().expect("projects"), vec!["gen"]);
}
