//! Behavioral tests for the sandboxed file operations, run against a real
//! temporary directory.

use std::fs;

use rootfence::{DirEntry, Error, Request, Response, Sandbox, WriteOutcome};
use tempfile::TempDir;

fn sandbox() -> (TempDir, Sandbox) {
    let dir = TempDir::new().unwrap();
    let sandbox = Sandbox::new(dir.path()).unwrap();
    (dir, sandbox)
}

#[test]
fn test_traversal_is_rejected_without_side_effects() {
    let (dir, sandbox) = sandbox();
    let outside = dir.path().parent().unwrap().join("escape.txt");

    for path in ["../escape.txt", "../../etc/passwd", "/etc/passwd", "a/../../escape.txt"] {
        assert!(sandbox.read_file(path).unwrap_err().is_rejected(), "{path}");
        assert!(
            sandbox.write_file(path, "x").unwrap_err().is_rejected(),
            "{path}"
        );
        assert!(
            sandbox.append_file(path, "x").unwrap_err().is_rejected(),
            "{path}"
        );
        assert!(sandbox.list_dir(Some(path)).unwrap_err().is_rejected(), "{path}");
    }
    // Rejection is idempotent and never touches the filesystem.
    assert!(sandbox.write_file("../escape.txt", "x").unwrap_err().is_rejected());
    assert!(!outside.exists());
}

#[test]
fn test_not_found_and_rejected_are_distinct() {
    let (_dir, sandbox) = sandbox();
    let missing = sandbox.read_file("absent.txt").unwrap_err();
    assert!(missing.is_not_found());
    assert!(!missing.is_rejected());

    let escaped = sandbox.read_file("../absent.txt").unwrap_err();
    assert!(escaped.is_rejected());
    assert!(!escaped.is_not_found());
}

#[test]
fn test_list_dir_reports_names_kinds_and_sizes() {
    let (_dir, sandbox) = sandbox();
    sandbox.write_file("a.txt", "hello").unwrap();
    sandbox.write_file("b/inner.txt", "x").unwrap();

    let mut entries = sandbox.list_dir(None).unwrap();
    entries.sort_by(|left, right| left.name.cmp(&right.name));
    assert_eq!(
        entries,
        vec![
            DirEntry {
                name: "a.txt".into(),
                is_file: true,
                size: 5,
            },
            DirEntry {
                name: "b".into(),
                is_file: false,
                size: 0,
            },
        ]
    );
}

#[test]
fn test_list_dir_empty_path_means_root() {
    let (_dir, sandbox) = sandbox();
    sandbox.write_file("only.txt", "x").unwrap();
    assert_eq!(sandbox.list_dir(None).unwrap(), sandbox.list_dir(Some("")).unwrap());
}

#[test]
fn test_list_dir_on_missing_or_file_is_not_found() {
    let (_dir, sandbox) = sandbox();
    sandbox.write_file("plain.txt", "x").unwrap();
    assert!(sandbox.list_dir(Some("absent")).unwrap_err().is_not_found());
    assert!(sandbox.list_dir(Some("plain.txt")).unwrap_err().is_not_found());
}

#[test]
fn test_write_then_read_round_trips_exactly() {
    let (_dir, sandbox) = sandbox();
    sandbox.write_file("greeting.txt", "hello").unwrap();
    // No implicit newline.
    assert_eq!(sandbox.read_file("greeting.txt").unwrap(), "hello");
}

#[test]
fn test_backup_tracks_immediately_prior_content() {
    let (_dir, sandbox) = sandbox();
    assert_eq!(sandbox.write_file("p.txt", "old").unwrap(), WriteOutcome::Fresh);
    assert_eq!(
        sandbox.write_file("p.txt", "new").unwrap(),
        WriteOutcome::BackedUp
    );
    assert_eq!(sandbox.read_file("p.txt").unwrap(), "new");
    assert_eq!(sandbox.read_file("p.txt.bak").unwrap(), "old");

    assert_eq!(
        sandbox.append_file("p.txt", "!").unwrap(),
        WriteOutcome::BackedUp
    );
    assert_eq!(sandbox.read_file("p.txt").unwrap(), "new!");
    // Backup reflects the content just before the append, not the original.
    assert_eq!(sandbox.read_file("p.txt.bak").unwrap(), "new");
}

#[test]
fn test_append_to_missing_file_creates_it_without_backup() {
    let (dir, sandbox) = sandbox();
    assert_eq!(
        sandbox.append_file("log.txt", "first line").unwrap(),
        WriteOutcome::Fresh
    );
    assert_eq!(sandbox.read_file("log.txt").unwrap(), "first line");
    assert!(!dir.path().join("log.txt.bak").exists());
}

#[test]
fn test_write_creates_nested_parent_directories() {
    let (_dir, sandbox) = sandbox();
    sandbox.write_file("new/nested/dir/file.txt", "x").unwrap();
    assert_eq!(sandbox.read_file("new/nested/dir/file.txt").unwrap(), "x");
    let entries = sandbox.list_dir(Some("new/nested")).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].is_file);
}

#[cfg(unix)]
#[test]
fn test_symlink_escaping_the_root_is_rejected() {
    let (dir, sandbox) = sandbox();
    let secret = dir.path().parent().unwrap().join("rootfence-secret.txt");
    fs::write(&secret, "secret").unwrap();
    std::os::unix::fs::symlink(&secret, dir.path().join("link.txt")).unwrap();

    assert!(sandbox.read_file("link.txt").unwrap_err().is_rejected());
    assert!(sandbox.write_file("link.txt", "x").unwrap_err().is_rejected());
    assert_eq!(fs::read_to_string(&secret).unwrap(), "secret");
    fs::remove_file(&secret).unwrap();
}

#[cfg(unix)]
#[test]
fn test_symlink_staying_inside_the_root_is_followed() {
    let (dir, sandbox) = sandbox();
    sandbox.write_file("real.txt", "content").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("alias.txt")).unwrap();
    assert_eq!(sandbox.read_file("alias.txt").unwrap(), "content");
}

#[test]
fn test_handle_dispatches_json_requests() {
    let (_dir, sandbox) = sandbox();

    let write: Request = serde_json::from_str(
        r#"{"operation":"write","path":"doc.txt","contents":"hi"}"#,
    )
    .unwrap();
    assert_eq!(
        sandbox.handle(write).unwrap(),
        Response::Wrote {
            outcome: WriteOutcome::Fresh
        }
    );

    let read: Request = serde_json::from_str(r#"{"operation":"read","path":"doc.txt"}"#).unwrap();
    assert_eq!(
        sandbox.handle(read).unwrap(),
        Response::Contents { text: "hi".into() }
    );

    let list: Request = serde_json::from_str(r#"{"operation":"list"}"#).unwrap();
    match sandbox.handle(list).unwrap() {
        Response::Listing { entries } => {
            assert!(entries.iter().any(|entry| entry.name == "doc.txt"));
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn test_errors_render_readable_messages() {
    let (_dir, sandbox) = sandbox();
    let err = sandbox.read_file("../outside").unwrap_err();
    assert!(err.to_string().contains("out of scope"));

    let err = sandbox.read_file("absent").unwrap_err();
    assert!(err.to_string().contains("no such file"));

    sandbox.write_file("dir/file", "x").unwrap();
    let err = sandbox.read_file("dir").unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}
