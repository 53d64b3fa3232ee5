//! Tool definitions: metadata, schema, and handler bound into one value.

use std::fmt;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{json, Value};

use crate::response::Response;
use crate::schema::{ParamValue, Params, Schema};
use crate::{ToolContext, ToolError};

/// Logical grouping for tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Navigation,
    Input,
    Debugging,
    Extraction,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    pub title: String,
    pub category: ToolCategory,
    /// True only if the tool cannot change any observable state, files included.
    pub read_only_hint: bool,
}

impl ToolAnnotations {
    pub fn new(title: impl Into<String>, category: ToolCategory, read_only_hint: bool) -> Self {
        Self {
            title: title.into(),
            category,
            read_only_hint,
        }
    }
}

/// A validated invocation of one tool.
#[derive(Debug, Clone)]
pub struct Request {
    tool: String,
    params: Params,
}

impl Request {
    pub fn new(tool: impl Into<String>, params: Params) -> Self {
        Self {
            tool: tool.into(),
            params,
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.params.get(name) {
            Some(ParamValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.params.get(name) {
            Some(ParamValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn u64(&self, name: &str) -> Option<u64> {
        match self.params.get(name) {
            Some(ParamValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        match self.params.get(name) {
            Some(ParamValue::Number(n)) => Some(*n),
            Some(ParamValue::Integer(n)) => Some(*n as f64),
            _ => None,
        }
    }
}

/// Handler signature shared by every tool.
pub type ToolHandler = for<'a> fn(
    &'a Request,
    &'a mut Response,
    &'a ToolContext,
) -> BoxFuture<'a, Result<(), ToolError>>;

/// Immutable description of a tool plus the function that runs it.
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub annotations: ToolAnnotations,
    pub schema: Schema,
    pub handler: ToolHandler,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        annotations: ToolAnnotations,
        schema: Schema,
        handler: ToolHandler,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            annotations,
            schema,
            handler,
        }
    }

    /// Catalogue entry exposed to the calling agent.
    pub fn to_llm_tool(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "annotations": self.annotations,
            "input_schema": self.schema.to_json_schema(),
        })
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("annotations", &self.annotations)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
