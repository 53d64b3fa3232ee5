//! In-memory page backed by an HTML string.

use std::path::Path;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use tokio::sync::watch;
use tracing::debug;

use crate::PageDriver;

const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// A page whose document can be replaced at any time, waking pending waiters.
pub struct StaticPage {
    html: watch::Sender<String>,
}

impl StaticPage {
    pub fn new(html: impl Into<String>) -> Self {
        let (html, _) = watch::channel(html.into());
        Self { html }
    }

    /// Load the document from an HTML file on disk.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page {}", path.display()))?;
        Ok(Self::new(html))
    }

    /// Replace the document.
    pub fn set_html(&self, html: impl Into<String>) {
        self.html.send_replace(html.into());
        debug!("Static page content replaced");
    }
}

/// Visible text of a document, skipping non-rendered elements.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts = Vec::new();
    collect_text(document.root_element(), &mut parts);
    parts.join(" ")
}

fn collect_text(element: ElementRef, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Node::Element(el) if !SKIP_TAGS.contains(&el.name()) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn select_inner_html(html: &str, selector: &str) -> anyhow::Result<Option<String>> {
    let selector =
        Selector::parse(selector).map_err(|e| anyhow!("Invalid selector '{selector}': {e:?}"))?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).next().map(|el| el.inner_html()))
}

/// Role and accessible name for elements that carry meaning in the tree.
fn role_of(el: ElementRef) -> Option<(String, String)> {
    let value = el.value();
    let name = || collapse(&el.text().collect::<Vec<_>>().join(" "));
    let role = match value.name() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = &value.name()[1..];
            return Some((format!("heading level={level}"), name()));
        }
        "a" if value.attr("href").is_some() => "link",
        "button" => "button",
        "input" => {
            let label = value
                .attr("aria-label")
                .or_else(|| value.attr("placeholder"))
                .or_else(|| value.attr("name"))
                .unwrap_or_default();
            let role = match value.attr("type").unwrap_or("text") {
                "checkbox" => "checkbox",
                "radio" => "radio",
                "submit" | "button" => "button",
                _ => "textbox",
            };
            return Some((role.to_string(), label.to_string()));
        }
        "textarea" => "textbox",
        "select" => "combobox",
        "img" => {
            return Some(("image".into(), value.attr("alt").unwrap_or_default().into()));
        }
        "ul" | "ol" => return Some(("list".into(), String::new())),
        "li" => "listitem",
        "p" => "paragraph",
        "main" => return Some(("main".into(), String::new())),
        "nav" => return Some(("navigation".into(), String::new())),
        _ => return None,
    };
    Some((role.to_string(), name()))
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn render_tree(el: ElementRef, depth: usize, verbose: bool, next_uid: &mut usize, out: &mut String) {
    let tag = el.value().name();
    if SKIP_TAGS.contains(&tag) {
        return;
    }

    let mut child_depth = depth;
    let node = match role_of(el) {
        Some(node) => Some(node),
        None if verbose => Some(("generic".to_string(), String::new())),
        None => None,
    };
    if let Some((role, name)) = node {
        *next_uid += 1;
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("uid={} {role}", next_uid));
        if !name.is_empty() {
            out.push_str(&format!(" \"{name}\""));
        }
        if verbose {
            out.push_str(&format!(" <{tag}>"));
        }
        out.push('\n');
        child_depth += 1;
    }

    for child in el.children().filter_map(ElementRef::wrap) {
        render_tree(child, child_depth, verbose, next_uid, out);
    }
}

fn snapshot(html: &str, verbose: bool) -> String {
    let document = Html::parse_document(html);
    let title = Selector::parse("title")
        .ok()
        .and_then(|s| document.select(&s).next().map(|t| collapse(&t.text().collect::<String>())))
        .unwrap_or_default();

    let mut out = format!("uid=0 RootWebArea \"{title}\"\n");
    let mut next_uid = 0;
    for child in document.root_element().children().filter_map(ElementRef::wrap) {
        render_tree(child, 1, verbose, &mut next_uid, &mut out);
    }
    out
}

#[async_trait]
impl PageDriver for StaticPage {
    async fn content(&self) -> anyhow::Result<String> {
        Ok(self.html.borrow().clone())
    }

    async fn inner_html(&self, selector: &str) -> anyhow::Result<Option<String>> {
        let html = self.html.borrow().clone();
        select_inner_html(&html, selector)
    }

    async fn wait_for_text(&self, text: &str) -> anyhow::Result<()> {
        let mut rx = self.html.subscribe();
        loop {
            let found = visible_text(&rx.borrow_and_update()).contains(text);
            if found {
                return Ok(());
            }
            rx.changed().await?;
        }
    }

    async fn accessibility_snapshot(&self, verbose: bool) -> anyhow::Result<String> {
        let html = self.html.borrow().clone();
        Ok(snapshot(&html, verbose))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    const PAGE: &str = r#"<html><head><title>Demo</title><script>var hidden = "secret";</script></head>
<body><main><h1>Welcome</h1><p id="intro">Hello <b>there</b></p>
<a href="/next">Next page</a><div class="box"><button>Go</button></div></main></body></html>"#;

    #[test]
    fn test_visible_text_skips_scripts() {
        let text = visible_text(PAGE);
        assert!(text.contains("Welcome"));
        assert!(text.contains("Next page"));
        assert!(!text.contains("secret"));
    }

    #[tokio::test]
    async fn test_inner_html_match() {
        let page = StaticPage::new(PAGE);
        let inner = page.inner_html("#intro").await.unwrap();
        assert_eq!(inner.as_deref(), Some("Hello <b>there</b>"));
    }

    #[tokio::test]
    async fn test_inner_html_no_match() {
        let page = StaticPage::new(PAGE);
        assert!(page.inner_html(".missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inner_html_invalid_selector() {
        let page = StaticPage::new(PAGE);
        assert!(page.inner_html("<<<").await.is_err());
    }

    #[tokio::test]
    async fn test_content_is_source() {
        let page = StaticPage::new(PAGE);
        assert_eq!(page.content().await.unwrap(), PAGE);
    }

    #[tokio::test]
    async fn test_snapshot_roles() {
        let page = StaticPage::new(PAGE);
        let snap = page.accessibility_snapshot(false).await.unwrap();
        assert!(snap.starts_with("uid=0 RootWebArea \"Demo\""));
        assert!(snap.contains("heading level=1 \"Welcome\""));
        assert!(snap.contains("link \"Next page\""));
        assert!(snap.contains("button \"Go\""));
        assert!(!snap.contains("generic"));
    }

    #[tokio::test]
    async fn test_snapshot_verbose_includes_generic() {
        let page = StaticPage::new(PAGE);
        let snap = page.accessibility_snapshot(true).await.unwrap();
        assert!(snap.contains("generic"));
        assert!(snap.contains("<div>"));
    }

    #[tokio::test]
    async fn test_wait_for_text_present() {
        let page = StaticPage::new(PAGE);
        page.wait_for_text("Welcome").await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_text_after_update() {
        let page = Arc::new(StaticPage::new("<p>Loading</p>"));
        let waiter = {
            let page = page.clone();
            tokio::spawn(async move { page.wait_for_text("Done").await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        page.set_html("<p>Done</p>");

        tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter should finish")
            .unwrap()
            .unwrap();
    }
}
