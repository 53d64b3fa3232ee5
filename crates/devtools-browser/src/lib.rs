//! Page drivers.
//!
//! The tool layer talks to a browser page only through [`PageDriver`].
//! [`StaticPage`] serves an in-memory document (fixtures, offline runs);
//! `CdpPage` drives Chrome/Chromium and requires the `cdp` feature.

#[cfg(feature = "cdp")]
pub mod cdp;
pub mod static_page;

use async_trait::async_trait;

#[cfg(feature = "cdp")]
pub use cdp::CdpPage;
pub use static_page::StaticPage;

/// The selected page as seen by tool handlers.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Serialized HTML of the whole document.
    async fn content(&self) -> anyhow::Result<String>;

    /// Inner HTML of the first element matching `selector`, `None` if nothing matches.
    async fn inner_html(&self, selector: &str) -> anyhow::Result<Option<String>>;

    /// Resolve once the page's visible text contains `text`.
    ///
    /// Implementations may wait indefinitely; callers bound the wait.
    async fn wait_for_text(&self, text: &str) -> anyhow::Result<()>;

    /// Text rendering of the page's accessibility tree.
    async fn accessibility_snapshot(&self, verbose: bool) -> anyhow::Result<String>;
}
