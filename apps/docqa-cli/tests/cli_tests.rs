use std::fs;
use std::path::Path;

use docqa_cli::{load_config, App};
use docqa_core::config::Config;
use tempfile::TempDir;

fn app_in(dir: &Path) -> App {
    fs::write(
        dir.join("config.toml"),
        "[chunking]\nmax_chars = 10\n\n[index]\npath = \"data/store.json\"\n\n[embedding]\ndimension = 64\n",
    )
    .unwrap();
    let config = Config::load_for_env(dir, "test").expect("config");
    App::open(&config).expect("app")
}

#[test]
fn ingest_query_delete_round() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("report.txt"), "猫喜欢睡觉。狗喜欢跑步。鸟喜欢飞翔。").unwrap();
    fs::write(docs.join("empty.md"), "   \n").unwrap();
    fs::write(docs.join("skip.bin"), "ignored").unwrap();

    let app = app_in(tmp.path());
    let outcomes = app.ingest(&[docs.clone()]).unwrap();
    assert_eq!(outcomes.len(), 2);
    let report = outcomes.iter().find(|o| o.document_id == "report.txt").unwrap();
    assert!(report.success);
    assert_eq!(report.inserted_count, 3);
    let empty = outcomes.iter().find(|o| o.document_id == "empty.md").unwrap();
    assert!(!empty.success);
    assert!(tmp.path().join("data/store.json").exists());

    let listed = app.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].chunk_count, 3);
    assert_eq!(listed[0].dimension, Some(64));

    let hits = app.query("狗喜欢跑步。", Some("report.txt"), None);
    assert!(hits.success);
    assert_eq!(hits.results.len(), 3, "defaults to retrieval.top_k");
    assert_eq!(hits.results[0].position, 1);

    let bad = app.query("狗", None, Some(0));
    assert!(!bad.success);

    let missing = app.delete("nope.txt");
    assert!(missing.success);
    assert_eq!(missing.removed_count, 0);
    let removed = app.delete("report.txt");
    assert_eq!(removed.removed_count, 3);
    assert!(app.list().unwrap().is_empty());
}

#[test]
fn missing_input_path_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let app = app_in(tmp.path());
    assert!(app.ingest(&[tmp.path().join("does-not-exist")]).is_err());
}

#[test]
fn config_error_is_reported_once() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[retrieval]\ntop_k = 0\n").unwrap();
    let err = load_config(tmp.path()).err().expect("must fail");
    let rendered = format!("{err:#}");
    assert_eq!(rendered.matches("Error loading config").count(), 1);
    assert!(rendered.contains("top_k"));
}
