//! Per-invocation response accumulator.

use std::path::PathBuf;

use base64::Engine;
use tracing::debug;

use crate::artifact::SavedArtifact;
use crate::{ToolContext, ToolError, ToolMedia, ToolOutput};

/// Request to append the page's accessibility snapshot when the response is finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDirective {
    pub verbose: bool,
    /// Write the snapshot here instead of embedding it.
    pub file_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Image { mime_type: String, data: Vec<u8> },
    File(SavedArtifact),
}

/// Output collected by a handler. Created empty for each call and consumed by [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct Response {
    lines: Vec<String>,
    snapshot: Option<SnapshotDirective>,
    attachments: Vec<Attachment>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// At most one snapshot per response; a later request replaces an earlier one.
    pub fn include_snapshot(&mut self, directive: SnapshotDirective) {
        self.snapshot = Some(directive);
    }

    pub fn snapshot(&self) -> Option<&SnapshotDirective> {
        self.snapshot.as_ref()
    }

    pub fn attach_image(&mut self, mime_type: impl Into<String>, data: Vec<u8>) {
        self.attachments.push(Attachment::Image {
            mime_type: mime_type.into(),
            data,
        });
    }

    pub fn attach_file(&mut self, artifact: SavedArtifact) {
        self.attachments.push(Attachment::File(artifact));
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Serialize for the caller, rendering the snapshot through the page driver.
    pub async fn finish(self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let mut text = self.lines;
        let mut media = Vec::new();

        for attachment in self.attachments {
            match attachment {
                Attachment::Image { mime_type, data } => media.push(ToolMedia {
                    mime_type,
                    data: base64::engine::general_purpose::STANDARD.encode(&data),
                }),
                Attachment::File(artifact) => text.push(format!("Saved to: {}", artifact.url)),
            }
        }

        if let Some(directive) = self.snapshot {
            let snapshot = ctx
                .page
                .accessibility_snapshot(directive.verbose)
                .await
                .map_err(ToolError::Driver)?;
            match directive.file_path {
                Some(path) => {
                    tokio::fs::write(&path, &snapshot)
                        .await
                        .map_err(|e| ToolError::io(&path, e))?;
                    debug!(path = %path.display(), "Snapshot written");
                    text.push(format!("Saved snapshot to {}.", path.display()));
                }
                None => {
                    text.push("## Latest page snapshot".to_string());
                    text.push(snapshot.trim_end().to_string());
                }
            }
        }

        Ok(ToolOutput {
            content: text.join("\n"),
            is_error: false,
            media: (!media.is_empty()).then_some(media),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;

    #[tokio::test]
    async fn test_lines_in_order() {
        let (ctx, _tmp) = context("<p>x</p>");
        let mut response = Response::new();
        response.append_line("first");
        response.append_line("second");

        let output = response.finish(&ctx).await.unwrap();
        assert_eq!(output.content, "first\nsecond");
        assert!(!output.is_error);
        assert!(output.media.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_inline() {
        let (ctx, _tmp) = context("<h1>Title</h1>");
        let mut response = Response::new();
        response.append_line("done");
        response.include_snapshot(SnapshotDirective::default());

        let output = response.finish(&ctx).await.unwrap();
        let mut lines = output.content.lines();
        assert_eq!(lines.next(), Some("done"));
        assert_eq!(lines.next(), Some("## Latest page snapshot"));
        assert!(output.content.contains("heading level=1 \"Title\""));
    }

    #[tokio::test]
    async fn test_snapshot_to_file() {
        let (ctx, tmp) = context("<h1>Title</h1>");
        let path = tmp.path().join("snap.txt");
        let mut response = Response::new();
        response.include_snapshot(SnapshotDirective {
            verbose: false,
            file_path: Some(path.clone()),
        });

        let output = response.finish(&ctx).await.unwrap();
        assert_eq!(output.content, format!("Saved snapshot to {}.", path.display()));
        assert!(std::fs::read_to_string(&path).unwrap().contains("Title"));
    }

    #[tokio::test]
    async fn test_attachments() {
        let (ctx, _tmp) = context("");
        let mut response = Response::new();
        response.append_line("see file");
        response.attach_file(SavedArtifact {
            filename: "a.html".into(),
            path: PathBuf::from("/tmp/a.html"),
            url: "http://localhost:1/tmp/a.html".into(),
        });
        response.attach_image("image/png", vec![1, 2, 3]);

        let output = response.finish(&ctx).await.unwrap();
        assert_eq!(output.content, "see file\nSaved to: http://localhost:1/tmp/a.html");
        let media = output.media.unwrap();
        assert_eq!(media[0].mime_type, "image/png");
        assert_eq!(media[0].data, "AQID");
    }

    #[test]
    fn test_single_snapshot_directive() {
        let mut response = Response::new();
        response.include_snapshot(SnapshotDirective::default());
        response.include_snapshot(SnapshotDirective {
            verbose: true,
            file_path: None,
        });
        assert!(response.snapshot().unwrap().verbose);
    }
}
