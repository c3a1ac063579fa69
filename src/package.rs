// ABOUTME: Source bundling into a reproducible gzip-compressed tar archive.
// ABOUTME: Accepts on-disk paths and inline content uniformly, never skipping inputs.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use flate2::{Compression, GzBuilder};
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::error::ErrorKind;

/// File name that selects the Dockerfile build strategy when present at the archive root.
pub const BUILD_DEFINITION: &str = "Dockerfile";

/// Directories never collected from a source tree.
const IGNORED_DIRS: &[&str] = &[".git"];

/// One file destined for the source archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFile {
    /// Content supplied directly by the caller.
    Inline { name: String, content: Bytes },
    /// Content read from disk at packaging time.
    OnDisk { name: String, path: PathBuf },
}

impl SourceFile {
    pub fn inline(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        SourceFile::Inline {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn on_disk(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        SourceFile::OnDisk {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Path of the file inside the archive.
    pub fn name(&self) -> &str {
        match self {
            SourceFile::Inline { name, .. } | SourceFile::OnDisk { name, .. } => name,
        }
    }

    fn read(&self) -> Result<(Vec<u8>, u32), PackageError> {
        match self {
            SourceFile::Inline { content, .. } => Ok((content.to_vec(), 0o644)),
            SourceFile::OnDisk { path, .. } => {
                let data = std::fs::read(path).map_err(|source| PackageError::Unreadable {
                    path: path.clone(),
                    source,
                })?;
                Ok((data, file_mode(path)))
            }
        }
    }
}

#[cfg(unix)]
fn file_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(path) {
        Ok(meta) if meta.permissions().mode() & 0o111 != 0 => 0o755,
        _ => 0o644,
    }
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> u32 {
    0o644
}

/// Errors from collecting or packaging source files.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("no source files to package")]
    Empty,

    #[error("invalid archive path {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("duplicate archive path: {0}")]
    Duplicate(String),

    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("symlinked directory {} is not followed", path.display())]
    SymlinkedDir { path: PathBuf },

    #[error("failed to write archive: {0}")]
    Archive(#[from] std::io::Error),

    #[error("packaging task failed: {0}")]
    Task(String),
}

impl PackageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PackageError::Empty
            | PackageError::InvalidName { .. }
            | PackageError::Duplicate(_)
            | PackageError::SymlinkedDir { .. } => ErrorKind::Validation,
            PackageError::Unreadable { .. } | PackageError::Archive(_) | PackageError::Task(_) => {
                ErrorKind::Local
            }
        }
    }
}

/// Whether the file set carries a build definition at its root.
pub fn has_build_definition<'a>(files: impl IntoIterator<Item = &'a SourceFile>) -> bool {
    files
        .into_iter()
        .any(|f| normalize_name(f.name()).is_ok_and(|n| n == BUILD_DEFINITION))
}

/// Check archive paths without touching file contents.
pub fn validate_names(files: &[SourceFile]) -> Result<(), PackageError> {
    if files.is_empty() {
        return Err(PackageError::Empty);
    }

    let mut seen = HashSet::new();
    for file in files {
        let name = normalize_name(file.name())?;
        if !seen.insert(name.clone()) {
            return Err(PackageError::Duplicate(name));
        }
    }
    Ok(())
}

/// Bundle files into a tar.gz archive.
///
/// Entries appear in input order with fixed metadata (mtime 0, uid/gid 0,
/// mode 0644 or 0755), so identical input yields identical bytes.
pub fn package(files: &[SourceFile]) -> Result<Bytes, PackageError> {
    if files.is_empty() {
        return Err(PackageError::Empty);
    }

    let mut seen = HashSet::new();
    let encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::new(), Compression::default());
    let mut archive = tar::Builder::new(encoder);
    let mut uncompressed = 0usize;

    for file in files {
        let name = normalize_name(file.name())?;
        if !seen.insert(name.clone()) {
            return Err(PackageError::Duplicate(name));
        }

        let (data, mode) = file.read()?;
        uncompressed += data.len();

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        archive.append_data(&mut header, &name, data.as_slice())?;
    }

    let mut encoder = archive.into_inner()?;
    encoder.flush()?;
    let compressed = encoder.finish()?;

    debug!(
        files = files.len(),
        uncompressed_size = uncompressed,
        compressed_size = compressed.len(),
        "packaged source archive"
    );

    Ok(Bytes::from(compressed))
}

/// Package on a blocking thread; reading files from disk must not stall the runtime.
pub async fn package_async(files: Vec<SourceFile>) -> Result<Bytes, PackageError> {
    spawn_blocking(move || package(&files))
        .await
        .map_err(|e| PackageError::Task(e.to_string()))?
}

/// Collect every file under `root`, named relative to it, in sorted order.
pub fn collect_dir(root: &Path) -> Result<Vec<SourceFile>, PackageError> {
    let mut files = Vec::new();
    walk(root, root, &mut files)?;
    Ok(files)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<SourceFile>) -> Result<(), PackageError> {
    let unreadable = |source| PackageError::Unreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = std::fs::read_dir(dir)
        .map_err(unreadable)?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(unreadable)?;
    entries.sort();

    for path in entries {
        let file_type = std::fs::symlink_metadata(&path)
            .map_err(|source| PackageError::Unreadable {
                path: path.clone(),
                source,
            })?
            .file_type();

        if file_type.is_symlink() {
            // Dangling links fail during collection.
            let target = std::fs::metadata(&path).map_err(|source| PackageError::Unreadable {
                path: path.clone(),
                source,
            })?;
            if target.is_dir() {
                return Err(PackageError::SymlinkedDir { path });
            }
        } else if file_type.is_dir() {
            let ignored = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| IGNORED_DIRS.contains(&n));
            if !ignored {
                walk(root, &path, out)?;
            }
            continue;
        }

        let relative = path.strip_prefix(root).map_err(|_| PackageError::InvalidName {
            name: path.display().to_string(),
            reason: "outside of source root",
        })?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        out.push(SourceFile::on_disk(name, path));
    }

    Ok(())
}

/// Reduce an archive path to its canonical `a/b/c` form.
fn normalize_name(name: &str) -> Result<String, PackageError> {
    let invalid = |reason| PackageError::InvalidName {
        name: name.to_string(),
        reason,
    };

    let mut parts = Vec::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| invalid("not valid UTF-8"))?;
                parts.push(part);
            }
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("parent directory reference")),
            Component::RootDir | Component::Prefix(_) => return Err(invalid("absolute path")),
        }
    }

    if parts.is_empty() {
        return Err(invalid("empty path"));
    }

    Ok(parts.join("/"))
}
