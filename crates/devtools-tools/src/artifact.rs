//! Saved artifacts served by the gateway under `/tmp/<filename>`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use tracing::info;

use devtools_core::ServePort;

use crate::ToolError;

/// Filename prefix for HTML extracted from the page.
pub const HTML_ARTIFACT_PREFIX: &str = "chrome-devtools-html";

/// URL path segment the gateway serves artifacts from.
pub const ARTIFACT_ROUTE: &str = "/tmp";

/// A file written by a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
}

/// Writes artifacts into one shared directory and builds their retrieval URLs.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    host: String,
    port: ServePort,
}

impl ArtifactStore {
    /// `port` is read on every [`persist`](Self::persist) call, never cached.
    pub fn new(dir: impl Into<PathBuf>, port: ServePort) -> Self {
        let dir = dir.into();
        let dir = std::path::absolute(&dir).unwrap_or(dir);
        Self {
            dir,
            host: "localhost".to_string(),
            port,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `content` under a fresh name and return where it can be fetched.
    pub async fn persist(
        &self,
        prefix: &str,
        extension: &str,
        content: &str,
    ) -> Result<SavedArtifact, ToolError> {
        let port = self.port.get().ok_or(ToolError::ServerUnavailable)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ToolError::io(&self.dir, e))?;

        let filename = unique_filename(prefix, extension);
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ToolError::io(&path, e))?;

        let url = format!("http://{}:{port}{ARTIFACT_ROUTE}/{filename}", self.host);
        info!(path = %path.display(), bytes = content.len(), "Artifact saved");

        Ok(SavedArtifact {
            filename,
            path,
            url,
        })
    }
}

/// `<prefix>-<epoch-ms>-<12 hex chars>.<extension>`
pub fn unique_filename(prefix: &str, extension: &str) -> String {
    let suffix: [u8; 6] = rand::rng().random();
    let hex: String = suffix.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{prefix}-{}-{hex}.{extension}",
        Utc::now().timestamp_millis()
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn bound_port() -> ServePort {
        let port = ServePort::new();
        port.set(9321);
        port
    }

    #[test]
    fn test_filename_shape() {
        let name = unique_filename(HTML_ARTIFACT_PREFIX, "html");
        let rest = name.strip_prefix("chrome-devtools-html-").unwrap();
        let rest = rest.strip_suffix(".html").unwrap();
        let (millis, hex) = rest.split_once('-').unwrap();
        assert!(millis.parse::<i64>().unwrap() > 0);
        assert_eq!(hex.len(), 12);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_filenames_are_distinct() {
        let names: HashSet<String> = (0..10_000)
            .map(|_| unique_filename(HTML_ARTIFACT_PREFIX, "html"))
            .collect();
        assert_eq!(names.len(), 10_000);
    }

    #[tokio::test]
    async fn test_persist_creates_dir_and_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().join("nested/tmp"), bound_port());

        let saved = store.persist("test", "html", "<p>hi</p>").await.unwrap();
        assert!(saved.path.is_absolute());
        assert_eq!(std::fs::read_to_string(&saved.path).unwrap(), "<p>hi</p>");
        assert_eq!(
            saved.url,
            format!("http://localhost:9321/tmp/{}", saved.filename)
        );

        // Existing directory is fine.
        store.persist("test", "html", "again").await.unwrap();
    }

    #[tokio::test]
    async fn test_persist_reads_port_at_call_time() {
        let tmp = tempfile::tempdir().unwrap();
        let port = ServePort::new();
        let store = ArtifactStore::new(tmp.path(), port.clone());

        let err = store.persist("test", "html", "x").await.unwrap_err();
        assert!(matches!(err, ToolError::ServerUnavailable));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);

        port.set(5555);
        let saved = store.persist("test", "html", "x").await.unwrap();
        assert!(saved.url.starts_with("http://localhost:5555/tmp/"));

        port.set(6666);
        let saved = store.persist("test", "html", "x").await.unwrap();
        assert!(saved.url.starts_with("http://localhost:6666/tmp/"));
    }

    #[tokio::test]
    async fn test_concurrent_persist() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().join("shared"), bound_port());

        let writes = (0..32).map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.persist("same", "html", &format!("{i}")).await })
        });
        let saved: Vec<_> = futures::future::join_all(writes)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        let names: HashSet<_> = saved.iter().map(|s| s.filename.clone()).collect();
        assert_eq!(names.len(), 32);
        assert_eq!(std::fs::read_dir(store.dir()).unwrap().count(), 32);
    }

    #[tokio::test]
    async fn test_persist_write_failure_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "not a dir").unwrap();

        let store = ArtifactStore::new(blocker.join("sub"), bound_port());
        let err = store.persist("test", "html", "x").await.unwrap_err();
        assert!(matches!(err, ToolError::Io { .. }));
    }
}
