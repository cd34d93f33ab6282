//! Operation registry and the catalog of mail operations.
//!
//! Each category module contributes plain [`Operation`] values through its
//! `register` function; [`register_all`] is the only place they are wired
//! together.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::{
    bridge::{parser, Bridge, ScriptInvocation},
    error::{BridgeError, Result},
};

pub mod analytics;
pub mod args;
pub mod attachments;
pub mod composition;
pub mod drafts;
pub mod inbox;
pub mod organization;
pub mod search;
pub mod trash;

pub use args::Args;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl Param {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self { name, kind, required: true, description }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self { name, kind, required: false, description }
    }
}

/// How captured text is turned into a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// Raw text, passed through untouched.
    Text,
    /// `a|b|c` as a JSON array of strings.
    List,
    /// `key:n|key:ERROR` as a JSON object of integers.
    Counts,
    /// Marker-based listing as a JSON array of records.
    Records,
}

impl ResultShape {
    pub fn apply(self, stdout: String) -> Output {
        match self {
            Self::Text => Output::Text(stdout),
            Self::List => Output::Data(json!(parser::decode_list(&stdout))),
            Self::Counts => Output::Data(json!(parser::decode_counts(&stdout))),
            Self::Records => Output::Data(json!(parser::decode_records(&stdout))),
        }
    }
}

/// A validated call: what to run and how to read its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub invocation: ScriptInvocation,
    pub shape: ResultShape,
}

impl Plan {
    pub fn text(invocation: ScriptInvocation) -> Self {
        Self { invocation, shape: ResultShape::Text }
    }
}

pub type Planner = fn(&Args) -> Result<Plan>;

#[derive(Clone)]
pub struct Operation {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub params: &'static [Param],
    pub plan: Planner,
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Text(String),
    Data(Value),
}

impl Output {
    /// Text as-is; structured data as pretty JSON.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Data(v) => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
        }
    }
}

/// Descriptor handed to remote callers listing the operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    ops: BTreeMap<&'static str, Operation>,
    preferences: Option<String>,
}

impl Registry {
    pub fn new(preferences: Option<String>) -> Self {
        Self { ops: BTreeMap::new(), preferences }
    }

    /// A registry holding the full catalog.
    pub fn with_catalog(preferences: Option<String>) -> Self {
        let mut registry = Self::new(preferences);
        register_all(&mut registry);
        registry
    }

    pub fn register(&mut self, op: Operation) {
        let name = op.name;
        if self.ops.insert(name, op).is_some() {
            tracing::warn!(operation = name, "operation registered twice; keeping the latest");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.ops.get(name)
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.ops.values()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Operation description with user preferences appended.
    pub fn description(&self, op: &Operation) -> String {
        match &self.preferences {
            Some(prefs) => format!("{}\n\nUser Preferences: {}", op.description, prefs),
            None => op.description.to_string(),
        }
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.ops
            .values()
            .map(|op| ToolSchema {
                name: op.name.to_string(),
                description: self.description(op),
                input_schema: input_schema(op.params),
            })
            .collect()
    }

    /// Validate arguments and build the plan, without running anything.
    pub fn plan(&self, name: &str, args: Value) -> Result<Plan> {
        let op = self
            .get(name)
            .ok_or_else(|| BridgeError::UnknownOperation(name.to_string()))?;
        let args = Args::from_value(args)?;
        (op.plan)(&args)
    }

    pub async fn call(&self, bridge: &Bridge, name: &str, args: Value) -> Result<Output> {
        let plan = self.plan(name, args)?;
        tracing::info!(operation = name, "calling operation");
        let stdout = bridge.execute(&plan.invocation).await?;
        Ok(plan.shape.apply(stdout))
    }
}

fn input_schema(params: &[Param]) -> Value {
    let mut properties = Map::new();
    for p in params {
        properties.insert(
            p.name.to_string(),
            json!({ "type": p.kind.json_type(), "description": p.description }),
        );
    }
    let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Register every operation category.
pub fn register_all(registry: &mut Registry) {
    analytics::register(registry);
    attachments::register(registry);
    composition::register(registry);
    drafts::register(registry);
    inbox::register(registry);
    organization::register(registry);
    search::register(registry);
    trash::register(registry);
}
