use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use super::error::WorkspaceError;

/// Subdirectory holding per-task staging directories.
const TASKS_DIR: &str = ".tasks";

/// Whether `name` is a plain file name that stays inside a directory.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}

/// Owner of the scratch directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Opens the workspace at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Root directory of published files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tasks_dir(&self) -> PathBuf {
        self.root.join(TASKS_DIR)
    }

    /// Deletes every entry in the workspace root.
    ///
    /// Files, symlinks and whole subtrees are removed; symlinks are never
    /// followed. A failure on one entry is logged and the rest are still
    /// removed. Returns the number of entries removed.
    pub async fn reset(&self) -> Result<usize, WorkspaceError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            match remove_entry(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to clean workspace entry"),
            }
        }

        info!(root = %self.root.display(), removed, "Workspace reset");
        Ok(removed)
    }

    /// Creates the staging directory for a task and returns its path.
    pub async fn create_task_dir(&self, task_id: &str) -> Result<PathBuf, WorkspaceError> {
        if !is_safe_file_name(task_id) {
            return Err(WorkspaceError::InvalidName(task_id.to_string()));
        }

        let dir = self.tasks_dir().join(task_id);
        tokio::fs::create_dir_all(&dir).await?;
        debug!(task_id, dir = %dir.display(), "Created task staging directory");
        Ok(dir)
    }

    /// Removes a task's staging directory. Failures are logged, not returned.
    pub async fn discard_task_dir(&self, task_id: &str) {
        if !is_safe_file_name(task_id) {
            return;
        }

        let dir = self.tasks_dir().join(task_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => debug!(task_id, "Discarded task staging directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(task_id, error = %e, "Failed to discard task staging directory"),
        }
    }

    /// Moves a finished file into the root, replacing any file of the same name.
    ///
    /// Returns the published file name.
    pub async fn publish(&self, file: &Path) -> Result<String, WorkspaceError> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| is_safe_file_name(n))
            .ok_or_else(|| WorkspaceError::InvalidName(file.display().to_string()))?;

        let target = self.root.join(&name);
        match tokio::fs::remove_file(&target).await {
            Ok(()) => debug!(file = %name, "Replacing previously published file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        tokio::fs::rename(file, &target).await?;

        // Retention counts from publication, not from the upload date a tool may have set
        let published = tokio::fs::OpenOptions::new()
            .write(true)
            .open(&target)
            .await?
            .into_std()
            .await;
        published.set_modified(SystemTime::now())?;
        Ok(name)
    }

    /// Path of a published file, rejecting names that would leave the root.
    pub async fn resolve_download(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        if !is_safe_file_name(name) {
            return Err(WorkspaceError::InvalidName(name.to_string()));
        }

        let path = self.root.join(name);
        match tokio::fs::symlink_metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(WorkspaceError::NotFound(name.to_string())),
        }
    }

    /// Deletes published entries last modified more than `max_age` ago.
    ///
    /// Staging directories are left alone. Returns the number removed.
    pub async fn evict_older_than(&self, max_age: Duration) -> Result<usize, WorkspaceError> {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name() == TASKS_DIR {
                continue;
            }

            let path = entry.path();
            let modified = match tokio::fs::symlink_metadata(&path).await {
                Ok(meta) => meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                Err(_) => continue,
            };
            if modified >= cutoff {
                continue;
            }

            match remove_entry(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to evict workspace entry"),
            }
        }

        if removed > 0 {
            info!(removed, "Evicted expired workspace files");
        }
        Ok(removed)
    }
}

/// Removes a file, symlink or directory tree without following symlinks.
async fn remove_entry(path: &Path) -> std::io::Result<()> {
    let meta = tokio::fs::symlink_metadata(path).await?;
    if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File, FileTimes};
    use tempfile::TempDir;

    async fn workspace() -> (TempDir, Workspace) {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::open(temp.path().join("ws")).await.unwrap();
        (temp, ws)
    }

    fn is_empty(dir: &Path) -> bool {
        fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_safe_file_names() {
        assert!(is_safe_file_name("video_ab12.mp4"));
        assert!(is_safe_file_name("my clip (1).mp3"));
        assert!(!is_safe_file_name(""));
        assert!(!is_safe_file_name(".."));
        assert!(!is_safe_file_name(".hidden"));
        assert!(!is_safe_file_name("../etc/passwd"));
        assert!(!is_safe_file_name("a/b"));
        assert!(!is_safe_file_name("a\\b"));
    }

    #[tokio::test]
    async fn test_reset_removes_everything() {
        let (_temp, ws) = workspace().await;
        let root = ws.root().to_path_buf();
        fs::write(root.join("a.mp4"), b"a").unwrap();
        fs::write(root.join(".hidden"), b"h").unwrap();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("nested/deeper/b.mp3"), b"b").unwrap();

        let removed = ws.reset().await.unwrap();
        assert_eq!(removed, 3);
        assert!(is_empty(&root));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reset_removes_symlinks_without_following() {
        let (temp, ws) = workspace().await;
        let outside = temp.path().join("outside");
        fs::create_dir(&outside).unwrap();
        fs::write(outside.join("keep.txt"), b"keep").unwrap();
        std::os::unix::fs::symlink(&outside, ws.root().join("link_dir")).unwrap();
        std::os::unix::fs::symlink(outside.join("keep.txt"), ws.root().join("link_file")).unwrap();

        ws.reset().await.unwrap();
        assert!(is_empty(ws.root()));
        assert!(outside.join("keep.txt").exists());
    }

    #[tokio::test]
    async fn test_reset_recreates_missing_root() {
        let (_temp, ws) = workspace().await;
        fs::remove_dir_all(ws.root()).unwrap();
        assert_eq!(ws.reset().await.unwrap(), 0);
        assert!(ws.root().is_dir());
    }

    #[tokio::test]
    async fn test_task_dir_publish_and_discard() {
        let (_temp, ws) = workspace().await;
        let dir = ws.create_task_dir("task-1").await.unwrap();
        assert!(dir.starts_with(ws.root()));

        let staged = dir.join("video_1.mp4");
        fs::write(&staged, b"video").unwrap();
        let name = ws.publish(&staged).await.unwrap();
        assert_eq!(name, "video_1.mp4");
        assert_eq!(fs::read(ws.root().join("video_1.mp4")).unwrap(), b"video");

        ws.discard_task_dir("task-1").await;
        assert!(!dir.exists());
        // Discarding twice is harmless
        ws.discard_task_dir("task-1").await;
    }

    #[tokio::test]
    async fn test_publish_replaces_existing_file() {
        let (_temp, ws) = workspace().await;
        fs::write(ws.root().join("song.mp3"), b"old").unwrap();
        let dir = ws.create_task_dir("t").await.unwrap();
        fs::write(dir.join("song.mp3"), b"new").unwrap();

        ws.publish(&dir.join("song.mp3")).await.unwrap();
        assert_eq!(fs::read(ws.root().join("song.mp3")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_publish_refreshes_modification_time() {
        let (_temp, ws) = workspace().await;
        let dir = ws.create_task_dir("t").await.unwrap();
        let staged = dir.join("video.mp4");
        fs::write(&staged, b"video").unwrap();
        let uploaded_long_ago = SystemTime::now() - Duration::from_secs(30 * 24 * 3600);
        File::options()
            .write(true)
            .open(&staged)
            .unwrap()
            .set_times(FileTimes::new().set_modified(uploaded_long_ago))
            .unwrap();

        ws.publish(&staged).await.unwrap();

        let modified = fs::metadata(ws.root().join("video.mp4"))
            .unwrap()
            .modified()
            .unwrap();
        assert!(modified > SystemTime::now() - Duration::from_secs(60));
        assert_eq!(ws.evict_older_than(Duration::from_secs(600)).await.unwrap(), 0);
        assert!(ws.root().join("video.mp4").exists());
    }

    #[tokio::test]
    async fn test_create_task_dir_rejects_traversal() {
        let (_temp, ws) = workspace().await;
        let err = ws.create_task_dir("../escape").await.unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidName(_)));
    }

    #[tokio::test]
    async fn test_resolve_download() {
        let (_temp, ws) = workspace().await;
        fs::write(ws.root().join("a.mp3"), b"a").unwrap();
        ws.create_task_dir("t").await.unwrap();

        assert_eq!(ws.resolve_download("a.mp3").await.unwrap(), ws.root().join("a.mp3"));
        assert!(matches!(
            ws.resolve_download("missing.mp3").await,
            Err(WorkspaceError::NotFound(_))
        ));
        assert!(matches!(
            ws.resolve_download("../a.mp3").await,
            Err(WorkspaceError::InvalidName(_))
        ));
        assert!(matches!(
            ws.resolve_download(".tasks").await,
            Err(WorkspaceError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_evict_older_than_keeps_fresh_and_staging() {
        let (_temp, ws) = workspace().await;
        let old = ws.root().join("old.mp3");
        fs::write(&old, b"old").unwrap();
        let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
        File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_times(FileTimes::new().set_modified(an_hour_ago))
            .unwrap();
        fs::write(ws.root().join("fresh.mp3"), b"fresh").unwrap();
        ws.create_task_dir("running").await.unwrap();

        let removed = ws.evict_older_than(Duration::from_secs(600)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(!old.exists());
        assert!(ws.root().join("fresh.mp3").exists());
        assert!(ws.root().join(".tasks/running").exists());
    }
}
