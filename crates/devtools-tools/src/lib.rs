//! Page tools exposed to a calling agent.
//!
//! Each tool is a [`ToolDefinition`]: metadata, a parameter [`Schema`], and a
//! handler. [`ToolRegistry::dispatch`] validates the raw parameters, runs the
//! handler against a fresh [`Response`], and returns the finished output.

pub mod artifact;
pub mod definition;
mod error;
pub mod get_html;
pub mod html;
pub mod response;
pub mod schema;
pub mod snapshot;
pub mod wait_for;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use devtools_browser::PageDriver;
use devtools_core::config::Config;

pub use artifact::{ArtifactStore, SavedArtifact};
pub use definition::{Request, ToolAnnotations, ToolCategory, ToolDefinition, ToolHandler};
pub use error::ToolError;
pub use response::{Response, SnapshotDirective};
pub use schema::{ParamKind, ParamSpec, ParamValue, Schema};

/// Context provided to tools during execution.
pub struct ToolContext {
    pub page: Arc<dyn PageDriver>,
    pub artifacts: ArtifactStore,
    pub config: Arc<Config>,
}

/// Output from a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<ToolMedia>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMedia {
    pub mime_type: String,
    pub data: String,
}

/// Registry of available tools, keyed by name.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Names are unique; a collision is a programming error.
    pub fn register(&mut self, tool: ToolDefinition) -> Result<(), ToolError> {
        if self.tools.contains_key(&tool.name) {
            return Err(ToolError::DuplicateTool(tool.name));
        }
        self.tools.insert(tool.name.clone(), tool);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&ToolDefinition, ToolError> {
        self.tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Generate tool definitions for the calling agent.
    pub fn to_llm_tools(&self) -> Vec<serde_json::Value> {
        self.tools.values().map(ToolDefinition::to_llm_tool).collect()
    }

    /// Run one invocation end to end.
    ///
    /// Validation and lookup failures are returned as-is. Anything that fails
    /// after the handler starts is wrapped in [`ToolError::Execution`] and the
    /// partial response is dropped.
    pub async fn dispatch(
        &self,
        name: &str,
        raw_params: &serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self.resolve(name)?;
        let params = tool.schema.validate(raw_params)?;
        let request = Request::new(tool.name.clone(), params);
        let mut response = Response::new();

        debug!(tool = name, params = ?request.params(), "Dispatching tool");

        let handled = (tool.handler)(&request, &mut response, context).await;
        let result = match handled {
            Ok(()) => response.finish(context).await,
            Err(e) => Err(e),
        };

        result.map_err(|e| {
            warn!(tool = name, error = %e, "Tool invocation failed");
            ToolError::Execution {
                tool: tool.name.clone(),
                source: Box::new(e),
            }
        })
    }
}

/// Register the page tools.
pub fn register_builtin_tools(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry.register(snapshot::definition())?;
    registry.register(wait_for::definition())?;
    registry.register(get_html::definition())?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use devtools_browser::StaticPage;
    use devtools_core::config::Config;
    use devtools_core::ServePort;

    use crate::{ArtifactStore, ToolContext};

    /// Context over a static page with a bound artifact port and a private directory.
    pub fn context(html: &str) -> (ToolContext, tempfile::TempDir) {
        with_page(Arc::new(StaticPage::new(html)), Config::default())
    }

    pub fn with_page(page: Arc<StaticPage>, config: Config) -> (ToolContext, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let port = ServePort::new();
        port.set(4321);
        let ctx = ToolContext {
            page,
            artifacts: ArtifactStore::new(tmp.path().join("tmp"), port),
            config: Arc::new(config),
        };
        (ctx, tmp)
    }
}
