//! Integration tests for the pagesift command line.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Create a corpus with pages of known content
fn create_fixture_dir() -> TempDir {
    let dir = tempfile::Builder::new()
        .prefix("corpus")
        .tempdir()
        .expect("Failed to create fixture dir");
    let root = dir.path();

    fs::write(
        root.join("poem.md"),
        "# Poem\nThe windows opens\nA wave of car noise hits me\nNo birds to be heard.\n#poetry\n",
    )
    .unwrap();
    fs::write(root.join("shopping.md"), "Window shopping all day long. #errands\n").unwrap();
    fs::create_dir_all(root.join("notes")).unwrap();
    fs::write(
        root.join("notes/cars.md"),
        "# Cars\nThe car is parked by the window. #errands #poetry\n",
    )
    .unwrap();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join(".git/window.md"), "hidden window").unwrap();

    dir
}

/// Command for the pagesift binary, isolated from the user's config
fn pagesift(dir: &Path, config_home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pagesift"));
    cmd.arg("--dir")
        .arg(dir)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("PAGESIFT_ROOT")
        .env_remove("PAGESIFT_PAGE_SIZE")
        .env_remove("PAGESIFT_QUIET_MS")
        .env("PAGESIFT_LOG", "off");
    cmd
}

/// Run pagesift with given args
fn run_pagesift(args: &[&str], dir: &Path) -> (String, String, bool) {
    let config_home = tempfile::tempdir().unwrap();
    let output = pagesift(dir, config_home.path())
        .args(args)
        .output()
        .expect("Failed to run pagesift");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

#[test]
fn test_search_prints_ranked_list() {
    let dir = create_fixture_dir();
    let (stdout, stderr, success) = run_pagesift(&["search", "window"], dir.path());
    assert!(success, "stderr: {stderr}");

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "stdout: {stdout}");
    assert!(lines.iter().all(|l| l.starts_with("* [")));
    // "Window" in shopping and "window" in cars are whole words (5 each);
    // "windows" in the poem only has a start boundary (3)
    assert_eq!(lines[0], "* [Cars](notes/cars) (5)");
    assert_eq!(lines[1], "* [shopping](shopping) (5)");
    assert_eq!(lines[2], "* [Poem](poem) (3)");
    assert!(!stdout.contains("There are more results"));
}

#[test]
fn test_search_pagination() {
    let dir = create_fixture_dir();
    let config_home = tempfile::tempdir().unwrap();
    let output = pagesift(dir.path(), config_home.path())
        .env("PAGESIFT_PAGE_SIZE", "2")
        .args(["search", "window"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert_eq!(stdout.lines().count(), 3);
    assert_eq!(stdout.lines().last(), Some("There are more results"));

    let output = pagesift(dir.path(), config_home.path())
        .env("PAGESIFT_PAGE_SIZE", "2")
        .args(["search", "-n", "2", "window"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim_end(), "* [Poem](poem) (3)");
}

#[test]
fn test_search_json() {
    let dir = create_fixture_dir();
    let (stdout, _, success) = run_pagesift(&["search", "--json", "car", "noise"], dir.path());
    assert!(success);
    let page: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(page["results"][0]["name"], "poem");
    assert_eq!(page["results"][0]["score"], 9);
    assert!(
        page["results"][0]["snippet"]
            .as_str()
            .unwrap()
            .contains("<b>car noise</b>")
    );
    assert_eq!(page["has_more"], false);
}

#[test]
fn test_search_without_matches() {
    let dir = create_fixture_dir();
    let (stdout, _, success) = run_pagesift(&["search", "giraffe"], dir.path());
    assert!(success);
    assert!(stdout.is_empty());
}

#[test]
fn test_list() {
    let dir = create_fixture_dir();
    let (stdout, _, success) = run_pagesift(&["list"], dir.path());
    assert!(success);
    assert_eq!(stdout, "notes/cars\tCars\npoem\tPoem\nshopping\tshopping\n");
}

#[test]
fn test_hashtags() {
    let dir = create_fixture_dir();
    let (stdout, _, success) = run_pagesift(&["hashtags"], dir.path());
    assert!(success);
    assert_eq!(stdout, "2\t#errands\n2\t#poetry\n");
}

#[test]
fn test_missing_dir_fails() {
    let dir = create_fixture_dir();
    let missing = dir.path().join("does-not-exist");
    let (stdout, stderr, success) = run_pagesift(&["search", "window"], &missing);
    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Failed to index"), "stderr: {stderr}");
}

#[test]
fn test_watch_answers_queries_from_stdin() {
    let dir = create_fixture_dir();
    let config_home = tempfile::tempdir().unwrap();
    let mut child = pagesift(dir.path(), config_home.path())
        .arg("watch")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to run pagesift watch");

    {
        let mut stdin = child.stdin.take().unwrap();
        writeln!(stdin, "birds").unwrap();
        writeln!(stdin).unwrap();
        writeln!(stdin, "errands").unwrap();
    }
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "* [Poem](poem) (5)");
    assert_eq!(lines.len(), 3);
}
