//! Parameter schemas and validation.
//!
//! A [`Schema`] is an ordered list of [`ParamSpec`]s. [`Schema::validate`] turns
//! the raw JSON parameter bag of a call into typed [`Params`], applying
//! defaults. Unknown fields in the bag are ignored.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::ToolError;

/// Primitive kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Boolean,
    /// Non-negative whole number.
    Integer,
    Number,
    String,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Boolean => "boolean",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::String => "string",
        }
    }

    fn parse(&self, value: &Value) -> Option<ParamValue> {
        match (self, value) {
            (ParamKind::Boolean, Value::Bool(b)) => Some(ParamValue::Bool(*b)),
            (ParamKind::String, Value::String(s)) => Some(ParamValue::String(s.clone())),
            (ParamKind::Number, Value::Number(n)) => n.as_f64().map(ParamValue::Number),
            (ParamKind::Integer, Value::Number(n)) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            })
            .map(ParamValue::Integer),
            _ => None,
        }
    }
}

/// A validated parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(u64),
    Number(f64),
    String(String),
}

/// Declaration of one named parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<ParamValue>,
    /// Only used for introspection, never for validation.
    pub description: String,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            description: description.into(),
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn with_default(mut self, value: ParamValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// Validated parameters keyed by name. Unset optionals without a default are absent.
pub type Params = BTreeMap<String, ParamValue>;

/// Ordered parameter declarations for one tool.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    params: Vec<ParamSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Validate a raw parameter bag. `null` counts as an empty bag and as an
    /// unset value for individual optional fields.
    pub fn validate(&self, raw: &Value) -> Result<Params, ToolError> {
        let empty = Map::new();
        let bag = match raw {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(ToolError::validation(
                    "<params>",
                    format!("expected an object, got {}", json_type(other)),
                ));
            }
        };

        let mut params = Params::new();
        for spec in &self.params {
            match bag.get(&spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(ToolError::validation(&spec.name, "required parameter is missing"));
                    }
                    if let Some(default) = &spec.default {
                        params.insert(spec.name.clone(), default.clone());
                    }
                }
                Some(value) => {
                    let parsed = spec.kind.parse(value).ok_or_else(|| {
                        ToolError::validation(
                            &spec.name,
                            format!("expected {}, got {}", spec.kind.as_str(), json_type(value)),
                        )
                    })?;
                    params.insert(spec.name.clone(), parsed);
                }
            }
        }
        Ok(params)
    }

    /// JSON Schema for the parameter object, used for tool introspection.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for spec in &self.params {
            let mut prop = json!({
                "type": spec.kind.as_str(),
                "description": spec.description,
            });
            if let Some(default) = &spec.default {
                prop["default"] = json!(default);
            }
            properties.insert(spec.name.clone(), prop);
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
