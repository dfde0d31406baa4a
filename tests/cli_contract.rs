use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn test_root(name: &str) -> PathBuf {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    std::env::temp_dir().join(format!("shadows-cli-{name}-{nonce}"))
}

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_shadows-search"))
}

fn stdout_lines(output: &std::process::Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(ToString::to_string)
        .collect()
}

#[test]
fn cli_prints_matching_paths_from_nested_directories() {
    let root = test_root("nested");
    fs::create_dir_all(root.join("docs/archive")).expect("create dirs");
    fs::write(root.join("report.txt"), "a").expect("write top");
    fs::write(root.join("docs/archive/old_report.pdf"), "b").expect("write nested");
    fs::write(root.join("docs/notes.txt"), "c").expect("write other");

    let output = Command::new(bin_path())
        .args(["report", "--root", root.to_string_lossy().as_ref()])
        .output()
        .expect("run cli");

    assert!(output.status.success());
    let mut lines = stdout_lines(&output);
    lines.sort();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().any(|l| l.ends_with("report.txt")));
    assert!(lines.iter().any(|l| l.ends_with("old_report.pdf")));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Found 2 items"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cli_outputs_at_most_limit_lines() {
    let root = test_root("limit");
    fs::create_dir_all(&root).expect("create root");
    for i in 0..5 {
        fs::write(root.join(format!("item{i}.txt")), "x").expect("write item");
    }

    let output = Command::new(bin_path())
        .args([
            "item",
            "--root",
            root.to_string_lossy().as_ref(),
            "--limit",
            "1",
        ])
        .output()
        .expect("run cli");

    assert!(output.status.success());
    assert_eq!(stdout_lines(&output).len(), 1);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cli_zero_limit_stops_without_printing() {
    let root = test_root("limit-zero");
    fs::create_dir_all(&root).expect("create root");
    fs::write(root.join("item.txt"), "x").expect("write item");

    let output = Command::new(bin_path())
        .args([
            "item",
            "--root",
            root.to_string_lossy().as_ref(),
            "--limit",
            "0",
        ])
        .output()
        .expect("run cli");

    assert!(output.status.success());
    assert!(stdout_lines(&output).is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Found "));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cli_json_lines_carry_record_fields() {
    let root = test_root("json");
    fs::create_dir_all(&root).expect("create root");
    fs::write(root.join("budget.xlsx"), vec![b'x'; 42]).expect("write file");

    let output = Command::new(bin_path())
        .args([
            "BUDGET",
            "--root",
            root.to_string_lossy().as_ref(),
            "--json",
            "--type",
            "documents",
            "--min-size",
            "42",
        ])
        .output()
        .expect("run cli");

    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 1);
    let value: serde_json::Value = serde_json::from_str(&lines[0]).expect("json line");
    assert_eq!(value["name"], "budget.xlsx");
    assert_eq!(value["size"], 42);
    assert_eq!(value["is_directory"], false);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cli_returns_non_zero_when_root_does_not_exist() {
    let missing = test_root("missing");
    let output = Command::new(bin_path())
        .args(["x", "--root", missing.to_string_lossy().as_ref()])
        .output()
        .expect("run cli");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to canonicalize root"));
}

#[test]
fn cli_returns_non_zero_for_empty_query() {
    let root = test_root("empty-query");
    fs::create_dir_all(&root).expect("create root");

    let output = Command::new(bin_path())
        .args(["--root", root.to_string_lossy().as_ref()])
        .output()
        .expect("run cli");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nothing to search for"));

    let _ = fs::remove_dir_all(&root);
}
