// ABOUTME: Tests for source collection and archive packaging.
// ABOUTME: Archive contents, determinism, mixed inputs, and rejected file sets.

mod support;

use std::io::Read;

use flate2::read::GzDecoder;
use hoist::error::ErrorKind;
use hoist::package::{
    PackageError, SourceFile, collect_dir, has_build_definition, package, package_async,
};
use support::init_tracing;

/// (name, mode, content) for every entry, in archive order.
fn entries(archive: &[u8]) -> Vec<(String, u32, String)> {
    let mut reader = tar::Archive::new(GzDecoder::new(archive));
    reader
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            let mode = entry.header().mode().unwrap();
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            (name, mode, content)
        })
        .collect()
}

mod archive_tests {
    use super::*;

    #[test]
    fn archive_holds_every_input_in_order() {
        init_tracing();
        let files = vec![
            SourceFile::inline("Dockerfile", "FROM scratch\n"),
            SourceFile::inline("src/app.py", "print(1)\n"),
        ];

        let archive = package(&files).unwrap();

        let entries = entries(&archive);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "Dockerfile");
        assert_eq!(entries[0].2, "FROM scratch\n");
        assert_eq!(entries[1].0, "src/app.py");
        assert_eq!(entries[1].1, 0o644);
    }

    #[test]
    fn identical_input_gives_identical_bytes() {
        let files = vec![
            SourceFile::inline("a.txt", "alpha"),
            SourceFile::inline("b.txt", "beta"),
        ];

        assert_eq!(package(&files).unwrap(), package(&files).unwrap());
    }

    #[test]
    fn leading_dot_segments_are_normalized() {
        let archive = package(&[SourceFile::inline("./main.go", "package main")]).unwrap();

        assert_eq!(entries(&archive)[0].0, "main.go");
    }

    #[test]
    fn inline_and_on_disk_inputs_mix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.js");
        std::fs::write(&path, "console.log('up')").unwrap();

        let archive = package(&[
            SourceFile::inline("Dockerfile", "FROM node:20"),
            SourceFile::on_disk("server.js", &path),
        ])
        .unwrap();

        let entries = entries(&archive);
        assert_eq!(entries[1].0, "server.js");
        assert_eq!(entries[1].2, "console.log('up')");
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_survives() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("start.sh");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let archive = package(&[SourceFile::on_disk("start.sh", &path)]).unwrap();

        assert_eq!(entries(&archive)[0].1, 0o755);
    }

    #[tokio::test]
    async fn async_packaging_matches_sync() {
        let files = vec![SourceFile::inline("index.html", "<h1>hi</h1>")];

        let sync = package(&files).unwrap();
        let async_result = package_async(files).await.unwrap();

        assert_eq!(sync, async_result);
    }
}

mod rejection_tests {
    use super::*;

    #[test]
    fn empty_file_set_is_rejected() {
        let err = package(&[]).unwrap_err();
        assert!(matches!(err, PackageError::Empty));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let err = package(&[
            SourceFile::inline("app.py", "a"),
            SourceFile::inline("./app.py", "b"),
        ])
        .unwrap_err();

        assert!(matches!(err, PackageError::Duplicate(ref name) if name == "app.py"));
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let err = package(&[SourceFile::inline("../secrets.env", "x")]).unwrap_err();
        assert!(matches!(err, PackageError::InvalidName { .. }));

        let err = package(&[SourceFile::inline("/etc/passwd", "x")]).unwrap_err();
        assert!(matches!(err, PackageError::InvalidName { .. }));
    }

    #[test]
    fn unreadable_path_fails_instead_of_being_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.txt");

        let err = package(&[
            SourceFile::inline("Dockerfile", "FROM scratch"),
            SourceFile::on_disk("gone.txt", &missing),
        ])
        .unwrap_err();

        assert!(matches!(err, PackageError::Unreadable { ref path, .. } if *path == missing));
        assert_eq!(err.kind(), ErrorKind::Local);
    }
}

mod collect_tests {
    use super::*;

    #[test]
    fn collects_tree_sorted_and_skips_git() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join(".git/objects")).unwrap();
        std::fs::write(root.join("Dockerfile"), "FROM scratch").unwrap();
        std::fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        std::fs::write(root.join(".git/HEAD"), "ref: refs/heads/main").unwrap();

        let files = collect_dir(root).unwrap();

        let names: Vec<_> = files.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["Dockerfile", "src/main.rs"]);
        assert!(has_build_definition(&files));
    }

    #[test]
    fn nested_dockerfile_is_not_a_build_definition() {
        let files = vec![
            SourceFile::inline("docker/Dockerfile", "FROM scratch"),
            SourceFile::inline("app.py", ""),
        ];

        assert!(!has_build_definition(&files));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("main.py"), "print('hi')").unwrap();
        std::os::unix::fs::symlink(".", root.join("loop")).unwrap();

        let err = collect_dir(root).unwrap_err();

        assert!(matches!(err, PackageError::SymlinkedDir { ref path } if path.ends_with("loop")));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_file_is_collected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("main.py"), "print('hi')").unwrap();
        std::os::unix::fs::symlink("main.py", root.join("app.py")).unwrap();

        let files = collect_dir(root).unwrap();

        let names: Vec<_> = files.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["app.py", "main.py"]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_fails_during_collection() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("missing.py", dir.path().join("gone.py")).unwrap();

        let err = collect_dir(dir.path()).unwrap_err();

        assert!(matches!(err, PackageError::Unreadable { ref path, .. } if path.ends_with("gone.py")));
        assert_eq!(err.kind(), ErrorKind::Local);
    }

    #[test]
    fn missing_directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();

        let err = collect_dir(&dir.path().join("nope")).unwrap_err();

        assert!(matches!(err, PackageError::Unreadable { .. }));
    }
}
