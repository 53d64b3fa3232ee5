//! Gateway shared state.

use std::sync::Arc;

use devtools_tools::{ToolContext, ToolRegistry};

/// Shared state accessible from all request handlers.
pub struct GatewayState {
    pub tools: Arc<ToolRegistry>,
    pub context: Arc<ToolContext>,
}

impl GatewayState {
    pub fn new(tools: Arc<ToolRegistry>, context: Arc<ToolContext>) -> Self {
        Self { tools, context }
    }
}
