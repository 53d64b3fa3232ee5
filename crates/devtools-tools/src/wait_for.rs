//! wait_for tool: block until text shows up on the page.

use std::time::Duration;

use futures::future::BoxFuture;
use tracing::debug;

use crate::{
    ParamKind, ParamSpec, Request, Response, Schema, SnapshotDirective, ToolAnnotations,
    ToolCategory, ToolContext, ToolDefinition, ToolError,
};

pub const NAME: &str = "wait_for";

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        NAME,
        "Wait for the specified text to appear on the selected page.",
        ToolAnnotations::new("Wait for text", ToolCategory::Navigation, true),
        Schema::new()
            .param(ParamSpec::required(
                "text",
                ParamKind::String,
                "Text to appear on the page",
            ))
            .param(ParamSpec::optional(
                "timeout",
                ParamKind::Integer,
                "Maximum wait time in milliseconds. Uses the browser default when omitted.",
            )),
        handle,
    )
}

fn handle<'a>(
    request: &'a Request,
    response: &'a mut Response,
    ctx: &'a ToolContext,
) -> BoxFuture<'a, Result<(), ToolError>> {
    Box::pin(async move {
        let text = request.str("text").unwrap_or_default();
        let timeout = request
            .u64("timeout")
            .map(Duration::from_millis)
            .unwrap_or_else(|| ctx.config.wait_timeout());

        debug!(text, timeout_ms = timeout.as_millis() as u64, "Waiting for text");

        match tokio::time::timeout(timeout, ctx.page.wait_for_text(text)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ToolError::Driver(e)),
            Err(_) => {
                return Err(ToolError::Timeout(format!(
                    "Timed out after {}ms waiting for text \"{text}\"",
                    timeout.as_millis()
                )));
            }
        }

        response.append_line(format!("Element with text \"{text}\" found."));
        response.include_snapshot(SnapshotDirective::default());
        Ok(())
    })
}
