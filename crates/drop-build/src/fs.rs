//! Filesystem helpers: cleaning, copying, walking and persisting.

use std::io;
use std::path::{Path, PathBuf};

use drop_context::Artifact;
use tokio::fs;

use crate::BuildError;

/// Remove `dir` if it exists, then recreate it empty.
pub(crate) async fn clean_dir(dir: &Path) -> Result<(), BuildError> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(BuildError::io(dir)(e)),
    }
    fs::create_dir_all(dir).await.map_err(BuildError::io(dir))
}

/// Copy `src` into `dst` recursively, overwriting existing files.
///
/// Returns the number of files copied.
pub(crate) async fn copy_dir(src: &Path, dst: &Path) -> Result<usize, BuildError> {
    let mut pending = vec![(src.to_path_buf(), dst.to_path_buf())];
    let mut copied = 0;

    while let Some((from, to)) = pending.pop() {
        fs::create_dir_all(&to).await.map_err(BuildError::io(&to))?;
        let mut entries = fs::read_dir(&from).await.map_err(BuildError::io(&from))?;
        while let Some(entry) = entries.next_entry().await.map_err(BuildError::io(&from))? {
            let path = entry.path();
            let target = to.join(entry.file_name());
            let file_type = entry.file_type().await.map_err(BuildError::io(&path))?;
            if file_type.is_dir() {
                pending.push((path, target));
            } else {
                fs::copy(&path, &target).await.map_err(BuildError::io(&path))?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}

/// Every non-directory entry below `root`, relative to `root`, sorted.
pub(crate) async fn walk_files(root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(relative) = pending.pop() {
        let dir = root.join(&relative);
        let mut entries = fs::read_dir(&dir).await.map_err(BuildError::io(&dir))?;

        while let Some(entry) = entries.next_entry().await.map_err(BuildError::io(&dir))? {
            let path = relative.join(entry.file_name());
            if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Write an artifact to `target`, creating parent directories.
///
/// Returns `false` when the artifact holds nothing to write.
pub(crate) async fn persist(target: &Path, artifact: Artifact) -> Result<bool, BuildError> {
    if matches!(artifact, Artifact::Callable(_)) {
        return Err(BuildError::UnpersistableArtifact {
            target: target.to_path_buf(),
        });
    }
    let bytes = artifact.into_bytes().map_err(|source| BuildError::Process {
        target: target.to_path_buf(),
        source,
    })?;
    let Some(bytes) = bytes else {
        return Ok(false);
    };

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await.map_err(BuildError::io(parent))?;
    }
    fs::write(target, bytes).await.map_err(BuildError::io(target))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_walk_files_relative_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("blog/2024")).unwrap();
        std::fs::write(dir.path().join("index.md"), "").unwrap();
        std::fs::write(dir.path().join("blog/post.md"), "").unwrap();
        std::fs::write(dir.path().join("blog/2024/old.md"), "").unwrap();

        let files = walk_files(dir.path()).await.unwrap();

        assert_eq!(
            files,
            vec![
                PathBuf::from("blog/2024/old.md"),
                PathBuf::from("blog/post.md"),
                PathBuf::from("index.md"),
            ]
        );
    }

    #[tokio::test]
    async fn test_walk_files_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = walk_files(&dir.path().join("missing")).await.unwrap_err();

        assert!(matches!(err, BuildError::Io { .. }));
    }

    #[tokio::test]
    async fn test_copy_dir_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::create_dir_all(src.join("css")).unwrap();
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(src.join("css/site.css"), "body{}").unwrap();
        std::fs::write(src.join("logo.svg"), "<svg/>").unwrap();
        std::fs::write(dst.join("logo.svg"), "old").unwrap();

        let copied = copy_dir(&src, &dst).await.unwrap();

        assert_eq!(copied, 2);
        assert_eq!(std::fs::read_to_string(dst.join("logo.svg")).unwrap(), "<svg/>");
        assert_eq!(std::fs::read_to_string(dst.join("css/site.css")).unwrap(), "body{}");
    }

    #[tokio::test]
    async fn test_clean_dir_removes_content() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(out.join("stale")).unwrap();
        std::fs::write(out.join("stale/file.html"), "x").unwrap();

        clean_dir(&out).await.unwrap();

        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_persist_variants() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("a/b.txt");
        let data = dir.path().join("menu.json");
        let nothing = dir.path().join("none.txt");

        assert!(persist(&text, Artifact::Text("hi".to_owned())).await.unwrap());
        assert!(persist(&data, Artifact::Data(serde_json::json!({"k": 1}))).await.unwrap());
        assert!(!persist(&nothing, Artifact::Nothing).await.unwrap());

        assert_eq!(std::fs::read_to_string(&text).unwrap(), "hi");
        assert_eq!(std::fs::read_to_string(&data).unwrap(), "{\n  \"k\": 1\n}");
        assert!(!nothing.exists());
    }

    #[tokio::test]
    async fn test_persist_rejects_callable() {
        let dir = tempfile::tempdir().unwrap();
        let callable = drop_context::Callable::new(|_| async { Ok(Artifact::Nothing) });

        let err = persist(&dir.path().join("x"), Artifact::Callable(callable))
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::UnpersistableArtifact { .. }));
    }
}
