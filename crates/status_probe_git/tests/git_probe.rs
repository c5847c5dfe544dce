use std::fs;
use std::path::Path;
use std::process::Command;

use status_probe::StatusProbe;
use status_probe_git::GitStatusProbe;
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args([
            "-c",
            "user.name=devlog tests",
            "-c",
            "user.email=devlog@example.invalid",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .status()
        .expect("git should launch");
    assert!(status.success(), "git {args:?} should succeed");
}

fn init_repo() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    git(dir.path(), &["init", "--quiet"]);
    dir
}

fn commit_file(dir: &Path, name: &str, content: &str, message: &str) {
    fs::write(dir.join(name), content).expect("file should be written");
    git(dir, &["add", name]);
    git(dir, &["commit", "--quiet", "-m", message]);
}

#[test]
fn snapshot_of_unborn_repository_has_branch_line_and_no_revision() {
    if !git_available() {
        return;
    }
    let repo = init_repo();

    let snapshot = GitStatusProbe::new(repo.path())
        .snapshot()
        .expect("snapshot should succeed inside a repository");

    assert!(
        snapshot.summary.starts_with("## "),
        "unexpected summary: {}",
        snapshot.summary
    );
    assert!(snapshot.revision.is_none());
}

#[test]
fn snapshot_reports_head_and_untracked_files() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    commit_file(repo.path(), "README.md", "hello\n", "initial commit");
    fs::write(repo.path().join("notes.txt"), "draft\n").expect("untracked file");

    let snapshot = GitStatusProbe::new(repo.path())
        .snapshot()
        .expect("snapshot should succeed");

    assert!(snapshot.summary.contains("?? notes.txt"));
    let revision = snapshot.revision.expect("committed repository has HEAD");
    assert_eq!(revision.len(), 40);
    assert!(revision.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn changes_since_lists_new_commits_and_diff_stat() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    commit_file(repo.path(), "README.md", "hello\n", "initial commit");
    let probe = GitStatusProbe::new(repo.path());
    let start = probe.snapshot().expect("start snapshot");

    commit_file(repo.path(), "lib.rs", "fn main() {}\n", "add lib");

    let changes = probe
        .changes_since(start.revision.as_deref())
        .expect("change summary should succeed");

    assert!(changes.contains("Commits:"), "changes: {changes}");
    assert!(changes.contains("add lib"), "changes: {changes}");
    assert!(changes.contains("lib.rs"), "changes: {changes}");
}

#[test]
fn changes_since_without_revision_uses_working_tree_diff() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    commit_file(repo.path(), "README.md", "hello\n", "initial commit");
    fs::write(repo.path().join("README.md"), "hello world\n").expect("modify file");

    let changes = GitStatusProbe::new(repo.path())
        .changes_since(None)
        .expect("working tree diff should succeed");

    assert!(changes.contains("README.md"), "changes: {changes}");
}

#[test]
fn snapshot_outside_repository_fails() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir should be created");

    let error = GitStatusProbe::new(dir.path())
        .snapshot()
        .expect_err("status outside a repository should fail");

    assert!(error.message().contains("git status"), "{error}");
}

#[test]
fn changes_since_refuses_option_like_revision() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    commit_file(repo.path(), "README.md", "hello\n", "initial commit");
    let target = repo.path().join("written-by-git.txt");
    let revision = format!("--output={}", target.display());

    let error = GitStatusProbe::new(repo.path())
        .changes_since(Some(&revision))
        .expect_err("option-like revision should be refused");

    assert!(error.message().contains("malformed revision"), "{error}");
    assert!(!target.exists());
}

#[test]
fn changes_since_accepts_abbreviated_revision() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    commit_file(repo.path(), "README.md", "hello\n", "initial commit");
    let probe = GitStatusProbe::new(repo.path());
    let full = probe
        .snapshot()
        .expect("start snapshot")
        .revision
        .expect("committed repository has HEAD");

    commit_file(repo.path(), "lib.rs", "fn main() {}\n", "add lib");

    let changes = probe
        .changes_since(Some(&full[..7]))
        .expect("abbreviated revision should resolve");
    assert!(changes.contains("add lib"), "changes: {changes}");
}

#[test]
fn snapshot_output_is_capped() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    for index in 0..50 {
        fs::write(repo.path().join(format!("untracked-{index:02}.txt")), "x\n")
            .expect("untracked file");
    }

    let snapshot = GitStatusProbe::new(repo.path())
        .with_max_output_bytes(64)
        .snapshot()
        .expect("snapshot should succeed");

    assert!(
        snapshot.summary.ends_with("\n[truncated]"),
        "summary: {}",
        snapshot.summary
    );
    assert!(snapshot.summary.len() <= 64 + "\n[truncated]".len());
}
