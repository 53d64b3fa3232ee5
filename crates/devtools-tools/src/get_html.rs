//! get_html tool: extract, clean, and return page HTML.
//!
//! Small results are embedded in the response; anything above the configured
//! inline limit is saved as an artifact and returned as a link.

use futures::future::BoxFuture;
use tracing::debug;

use crate::artifact::HTML_ARTIFACT_PREFIX;
use crate::html::{self, PipelineConfig, DEFAULT_MAX_LENGTH};
use crate::{
    ParamKind, ParamSpec, ParamValue, Request, Response, Schema, ToolAnnotations, ToolCategory,
    ToolContext, ToolDefinition, ToolError,
};

pub const NAME: &str = "get_html";

fn flag(name: &str, default: bool, description: &str) -> ParamSpec {
    ParamSpec::optional(name, ParamKind::Boolean, description).with_default(ParamValue::Bool(default))
}

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        NAME,
        "Get the HTML of the selected page or of one element, with optional cleanup. \
         Large results are saved to a file and returned as a URL.",
        // Saves artifacts to disk.
        ToolAnnotations::new("Get HTML", ToolCategory::Extraction, false),
        Schema::new()
            .param(ParamSpec::optional(
                "selector",
                ParamKind::String,
                "CSS selector of the element whose inner HTML to return. Whole document when omitted.",
            ))
            .param(flag("removeScripts", true, "Remove <script> blocks."))
            .param(flag("removeComments", false, "Remove <!-- --> comments."))
            .param(flag("removeStyles", false, "Remove <style> blocks."))
            .param(flag("removeMeta", false, "Remove <meta> tags."))
            .param(flag(
                "cleanHtml",
                false,
                "Normalize whitespace and strip empty attributes.",
            ))
            .param(flag("minify", false, "Aggressively collapse whitespace."))
            .param(
                ParamSpec::optional(
                    "maxLength",
                    ParamKind::Integer,
                    "Maximum number of characters to return.",
                )
                .with_default(ParamValue::Integer(DEFAULT_MAX_LENGTH as u64)),
            ),
        handle,
    )
}

fn pipeline_config(request: &Request) -> PipelineConfig {
    let defaults = PipelineConfig::default();
    PipelineConfig {
        remove_scripts: request.bool("removeScripts").unwrap_or(defaults.remove_scripts),
        remove_comments: request.bool("removeComments").unwrap_or(defaults.remove_comments),
        remove_styles: request.bool("removeStyles").unwrap_or(defaults.remove_styles),
        remove_meta: request.bool("removeMeta").unwrap_or(defaults.remove_meta),
        clean_html: request.bool("cleanHtml").unwrap_or(defaults.clean_html),
        minify: request.bool("minify").unwrap_or(defaults.minify),
        max_length: request
            .u64("maxLength")
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
            .unwrap_or(defaults.max_length),
    }
}

fn handle<'a>(
    request: &'a Request,
    response: &'a mut Response,
    ctx: &'a ToolContext,
) -> BoxFuture<'a, Result<(), ToolError>> {
    Box::pin(async move {
        let selector = request.str("selector").filter(|s| !s.is_empty());

        let raw = match selector {
            Some(selector) => ctx
                .page
                .inner_html(selector)
                .await
                .map_err(ToolError::Driver)?
                .ok_or_else(|| ToolError::ElementNotFound(selector.to_string()))?,
            None => ctx.page.content().await.map_err(ToolError::Driver)?,
        };

        let config = pipeline_config(request);
        let cleaned = html::clean(&raw, &config);
        debug!(
            source_len = raw.len(),
            cleaned_len = cleaned.cleaned_len,
            truncated = cleaned.truncated,
            "HTML cleaned"
        );

        let source = match selector {
            Some(selector) => format!("element \"{selector}\""),
            None => "the page".to_string(),
        };
        let mut summary = format!(
            "Extracted HTML from {source} ({} characters",
            cleaned.cleaned_len
        );
        if cleaned.truncated {
            summary.push_str(&format!(", truncated to {}", config.max_length));
        }
        summary.push_str(").");
        response.append_line(summary);

        if cleaned.html.chars().count() <= ctx.config.html_inline_limit() {
            response.append_line("```html");
            response.append_line(cleaned.html);
            response.append_line("```");
        } else {
            let saved = ctx
                .artifacts
                .persist(HTML_ARTIFACT_PREFIX, "html", &cleaned.html)
                .await?;
            response.attach_file(saved);
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use devtools_browser::StaticPage;
    use devtools_core::config::{Config, HtmlToolConfig, ToolsConfig};
    use devtools_core::ServePort;
    use serde_json::json;

    use crate::test_support::{context, with_page};
    use crate::{ArtifactStore, ToolContext, ToolError, ToolRegistry};

    const PAGE: &str = "<html><head><meta charset=\"utf-8\"><style>p{}</style></head><body>\
        <p>A</p><script>if(1<2){}</script><!--x--><p>B</p><div id=\"box\"><b>inner</b></div></body></html>";

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(super::definition()).unwrap();
        registry
    }

    fn inline_body(content: &str) -> &str {
        let start = content.find("```html\n").unwrap() + "```html\n".len();
        let end = content.rfind("\n```").unwrap();
        &content[start..end]
    }

    fn small_inline_limit(limit: usize) -> Config {
        Config {
            tools: Some(ToolsConfig {
                html: Some(HtmlToolConfig {
                    inline_limit: limit,
                    artifact_dir: None,
                }),
            }),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_defaults_remove_scripts() {
        let (ctx, _tmp) = context("<p>A</p><script>if(1<2){}</script><!--x--><p>B</p>");
        let output = registry()
            .dispatch("get_html", &json!({"maxLength": 1000}), &ctx)
            .await
            .unwrap();
        assert_eq!(inline_body(&output.content), "<p>A</p><!--x--><p>B</p>");
        assert!(output.content.starts_with("Extracted HTML from the page (24 characters)."));
    }

    #[tokio::test]
    async fn test_remove_comments_and_more() {
        let (ctx, _tmp) = context(PAGE);
        let output = registry()
            .dispatch(
                "get_html",
                &json!({"removeComments": true, "removeStyles": true, "removeMeta": true}),
                &ctx,
            )
            .await
            .unwrap();
        let body = inline_body(&output.content);
        assert!(!body.contains("<!--"));
        assert!(!body.contains("<style"));
        assert!(!body.contains("<meta"));
        assert!(!body.contains("<script"));
        assert!(body.contains("<p>A</p><p>B</p>"));
    }

    #[tokio::test]
    async fn test_selector_inner_html() {
        let (ctx, _tmp) = context(PAGE);
        let output = registry()
            .dispatch("get_html", &json!({"selector": "#box"}), &ctx)
            .await
            .unwrap();
        assert_eq!(inline_body(&output.content), "<b>inner</b>");
        assert!(output.content.contains("element \"#box\""));
    }

    #[tokio::test]
    async fn test_selector_not_found() {
        let (ctx, _tmp) = context(PAGE);
        let err = registry()
            .dispatch("get_html", &json!({"selector": ".nothing"}), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Element not found: .nothing");
        assert!(matches!(err.cause(), ToolError::ElementNotFound(_)));
    }

    #[tokio::test]
    async fn test_truncation() {
        let (ctx, _tmp) = context("<p>Hello world</p>");
        let output = registry()
            .dispatch("get_html", &json!({"maxLength": 5}), &ctx)
            .await
            .unwrap();
        assert_eq!(inline_body(&output.content), "<p>He...");
        assert!(output.content.contains("truncated to 5"));
    }

    #[tokio::test]
    async fn test_large_output_saved_as_artifact() {
        let page = format!("<main>{}</main>", "<p>row</p>".repeat(50));
        let (ctx, _tmp) = with_page(Arc::new(StaticPage::new(page.clone())), small_inline_limit(100));

        let output = registry().dispatch("get_html", &json!({}), &ctx).await.unwrap();
        assert!(!output.content.contains("```html"));

        let url = output
            .content
            .lines()
            .find_map(|l| l.strip_prefix("Saved to: "))
            .unwrap();
        assert!(url.starts_with("http://localhost:4321/tmp/chrome-devtools-html-"));
        assert!(url.ends_with(".html"));

        let filename = url.rsplit('/').next().unwrap();
        let saved = std::fs::read_to_string(ctx.artifacts.dir().join(filename)).unwrap();
        assert_eq!(saved, page);
    }

    #[tokio::test]
    async fn test_artifact_failure_fails_invocation() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ToolContext {
            page: Arc::new(StaticPage::new("<p>long enough content</p>")),
            artifacts: ArtifactStore::new(tmp.path(), ServePort::new()),
            config: Arc::new(small_inline_limit(1)),
        };

        let err = registry().dispatch("get_html", &json!({}), &ctx).await.unwrap_err();
        assert!(matches!(err.cause(), ToolError::ServerUnavailable));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_max_length() {
        let (ctx, _tmp) = context(PAGE);
        let err = registry()
            .dispatch("get_html", &json!({"maxLength": "lots"}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation { ref field, .. } if field == "maxLength"));
    }
}
