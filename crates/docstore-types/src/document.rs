use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::impl_timestamped;
use crate::object_type::ObjectType;
use crate::timestamped::Document;

// ---------------------------------------------------------------------------
// GenericDocument
// ---------------------------------------------------------------------------

/// A document whose business fields are kept as raw JSON.
///
/// Works with any [`ObjectType`]; used by the CLI and by callers that only
/// shuttle documents around without interpreting them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl GenericDocument {
    /// Build from a JSON object. Returns `None` for any other JSON value.
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    /// Fetch a business field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Set a business field, returning `self` for chaining.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }
}

impl_timestamped!(GenericDocument);

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// An application record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    /// Fields this struct does not model are carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl_timestamped!(Application);

impl Document for Application {
    const OBJECT_TYPE: ObjectType = ObjectType::Application;
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A pipeline definition belonging to an application.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: String,
    pub name: String,
    pub application: String,
    #[serde(default)]
    pub stages: Vec<Value>,
    #[serde(default)]
    pub triggers: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_timestamped!(Pipeline);

impl Document for Pipeline {
    const OBJECT_TYPE: ObjectType = ObjectType::Pipeline;
}
