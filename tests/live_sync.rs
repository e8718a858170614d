//! Integration tests for keeping the index in sync with the files on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use pagesift::index::{Corpus, IndexStore, Update};
use pagesift::live::LiveSync;
use pagesift::query::search;
use pagesift::templates::TemplateCache;
use pagesift::watch::{ChangeHandler, WatchLedger, Watcher};
use tempfile::TempDir;

const QUIET: Duration = Duration::from_millis(100);

fn corpus_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("corpus")
        .tempdir()
        .expect("Failed to create corpus dir")
}

fn live_sync(dir: &Path) -> Arc<LiveSync> {
    let store = Arc::new(IndexStore::new(Corpus::new(dir)));
    store.load().expect("Failed to load corpus");
    let templates = Arc::new(TemplateCache::new(dir));
    templates.load_dir().expect("Failed to load templates");
    Arc::new(LiveSync::new(
        store,
        Arc::new(WatchLedger::new(QUIET)),
        templates,
    ))
}

fn names(live: &LiveSync, query: &str) -> Vec<String> {
    search(live.store(), query, 1, 50)
        .results
        .into_iter()
        .map(|r| r.name)
        .collect()
}

/// Poll `check` until it holds or `timeout` passes
fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    check()
}

/// Records what the watcher hands over, reading the file at that moment
struct Recorder {
    root: PathBuf,
    seen: Mutex<Vec<(String, Option<String>)>>,
}

impl ChangeHandler for Recorder {
    fn document_changed(&self, name: &str) {
        let content = fs::read_to_string(self.root.join(format!("{name}.md"))).ok();
        self.seen.lock().unwrap().push((name.to_string(), content));
    }

    fn template_changed(&self, _path: &Path) {}
}

fn recorder(dir: &Path) -> (Arc<Recorder>, Watcher) {
    let recorder = Arc::new(Recorder {
        root: dir.to_path_buf(),
        seen: Mutex::new(Vec::new()),
    });
    let handler: Arc<dyn ChangeHandler> = recorder.clone();
    let watcher = Watcher::new(
        Corpus::new(dir),
        Arc::new(WatchLedger::new(QUIET)),
        handler,
    );
    (recorder, watcher)
}

#[test]
fn test_burst_of_writes_gives_one_action_with_last_content() {
    let dir = corpus_dir();
    let (recorder, watcher) = recorder(dir.path());
    let rel = Path::new("draft.md");

    for (i, content) in ["one", "two", "three"].iter().enumerate() {
        fs::write(dir.path().join(rel), content).unwrap();
        let started = watcher.notify_write(rel);
        assert_eq!(started, i == 0);
        thread::sleep(Duration::from_millis(20));
    }

    thread::sleep(QUIET * 4);
    let seen = recorder.seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![("draft".to_string(), Some("three".to_string()))]
    );
}

#[test]
fn test_acknowledged_write_is_not_replayed() {
    let dir = corpus_dir();
    let (recorder, watcher) = recorder(dir.path());
    let rel = Path::new("draft.md");

    fs::write(dir.path().join(rel), "saved by us").unwrap();
    watcher.notify_write(rel);
    watcher.ledger().acknowledge(rel);

    thread::sleep(QUIET * 3);
    assert!(recorder.seen.lock().unwrap().is_empty());
}

#[test]
fn test_update_correctness() {
    let dir = corpus_dir();
    fs::write(dir.path().join("test.md"), "This is a test.").unwrap();
    let live = live_sync(dir.path());
    assert_eq!(names(&live, "This is a test"), vec!["test"]);

    let update = live.save_document("test", "Guvf vf n grfg.").unwrap();
    assert!(matches!(update, Update::Updated(_)));
    assert!(names(&live, "This is a test").is_empty());
    assert_eq!(names(&live, "Guvf"), vec!["test"]);
}

#[test]
fn test_deletion_and_rename() {
    let dir = corpus_dir();
    fs::write(dir.path().join("old.md"), "pelican facts").unwrap();
    let live = live_sync(dir.path());

    // Rename on disk: the watcher reports both paths
    fs::rename(dir.path().join("old.md"), dir.path().join("new.md")).unwrap();
    live.document_changed("old");
    live.document_changed("new");
    assert_eq!(names(&live, "pelican"), vec!["new"]);

    live.save_document("new", "").unwrap();
    assert!(names(&live, "pelican").is_empty());
    assert!(live.store().is_empty());
}

#[test]
fn test_save_then_late_watcher_event_is_harmless() {
    let dir = corpus_dir();
    let live = live_sync(dir.path());
    let first = live.save_document("cats", "# Cats\nThey purr").unwrap();
    let Update::Added(doc) = first else {
        panic!("expected an added document, got {first:?}");
    };

    // The event for the same write arrives after the acknowledgement
    live.document_changed("cats");
    assert_eq!(live.store().name_of(doc).as_deref(), Some("cats"));
    assert_eq!(names(&live, "purr"), vec!["cats"]);
}

#[test]
fn test_pagination_covers_every_match_once() {
    let dir = corpus_dir();
    for i in 0..37 {
        let body = format!("ocelot {}", "ocelot ".repeat(i % 5));
        fs::write(dir.path().join(format!("cat{i:02}.md")), body).unwrap();
    }
    let live = live_sync(dir.path());

    let all = search(live.store(), "ocelot", 1, 100);
    assert_eq!(all.total, 37);

    let mut collected = Vec::new();
    let mut page = 1;
    loop {
        let result = search(live.store(), "ocelot", page, 10);
        collected.extend(result.results.into_iter().map(|r| r.name));
        if !result.has_more {
            break;
        }
        page += 1;
    }
    assert_eq!(page, 4);
    let expected: Vec<String> = all.results.into_iter().map(|r| r.name).collect();
    assert_eq!(collected, expected);
}

#[test]
fn test_queries_during_reload() {
    let dir = corpus_dir();
    for i in 0..50 {
        fs::write(dir.path().join(format!("page{i}.md")), format!("marmot {i}")).unwrap();
    }
    let live = live_sync(dir.path());

    let reloader = {
        let live = Arc::clone(&live);
        thread::spawn(move || {
            for _ in 0..10 {
                live.store().load().unwrap();
            }
        })
    };
    for _ in 0..50 {
        let page = search(live.store(), "marmot", 1, 100);
        // Every candidate resolves to a name; nothing half-loaded shows up
        assert!(page.results.iter().all(|r| r.name.starts_with("page")));
        assert!(page.total <= 50);
    }
    reloader.join().unwrap();
    assert_eq!(search(live.store(), "marmot", 1, 100).total, 50);
}

#[test]
fn test_external_edits_reach_the_index() {
    let dir = corpus_dir();
    fs::write(dir.path().join("zebra.md"), "stripes").unwrap();
    fs::write(dir.path().join("view.html"), "<p>v1</p>").unwrap();
    let live = live_sync(dir.path());
    let mut handle = live.watcher().start().expect("Failed to start watcher");
    assert!(handle.is_running());

    fs::write(dir.path().join("zebra.md"), "stripes and a mane").unwrap();
    fs::create_dir_all(dir.path().join("notes")).unwrap();
    fs::write(dir.path().join("notes/okapi.md"), "# Okapi\nforest giraffe").unwrap();
    fs::write(dir.path().join("view.html"), "<p>v2</p>").unwrap();

    let timeout = Duration::from_secs(10);
    assert!(wait_until(timeout, || names(&live, "mane") == vec!["zebra"]));
    assert!(wait_until(timeout, || names(&live, "giraffe") == vec!["notes/okapi"]));
    assert!(wait_until(timeout, || {
        live.templates().get("view").as_deref() == Some("<p>v2</p>")
    }));

    fs::remove_file(dir.path().join("zebra.md")).unwrap();
    assert!(wait_until(timeout, || !live.store().contains("zebra")));

    handle.stop();
    assert!(!handle.is_running());
}
