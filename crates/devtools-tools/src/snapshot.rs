//! take_snapshot tool: accessibility snapshot of the selected page.

use futures::future::BoxFuture;

use crate::{
    ParamKind, ParamSpec, ParamValue, Request, Response, Schema, SnapshotDirective,
    ToolAnnotations, ToolCategory, ToolContext, ToolDefinition, ToolError,
};

pub const NAME: &str = "take_snapshot";

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        NAME,
        "Take a text snapshot of the currently selected page based on the a11y tree. \
         The snapshot lists page elements along with a unique identifier (uid).",
        // Writes a file when filePath is given.
        ToolAnnotations::new("Take snapshot", ToolCategory::Debugging, false),
        Schema::new()
            .param(
                ParamSpec::optional(
                    "verbose",
                    ParamKind::Boolean,
                    "Whether to include all information available in the full a11y tree.",
                )
                .with_default(ParamValue::Bool(false)),
            )
            .param(ParamSpec::optional(
                "filePath",
                ParamKind::String,
                "Path to save the snapshot to instead of attaching it to the response.",
            )),
        handle,
    )
}

fn handle<'a>(
    request: &'a Request,
    response: &'a mut Response,
    _ctx: &'a ToolContext,
) -> BoxFuture<'a, Result<(), ToolError>> {
    Box::pin(async move {
        response.include_snapshot(SnapshotDirective {
            verbose: request.bool("verbose").unwrap_or(false),
            file_path: request.str("filePath").map(Into::into),
        });
        Ok(())
    })
}
