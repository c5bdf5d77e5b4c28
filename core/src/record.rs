//! Attribute bags built from `result_list` entries.
//!
//! # Design
//! The service does not pin a schema, so a record keeps the raw JSON object
//! and reads fields on demand. Callers that do know the shape can
//! `deserialize` into their own struct. The type parameter ties a record to
//! the resource type that fetched it.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Index;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::resource::Resource;

static NULL: Value = Value::Null;

/// One entry of a WMS `result_list`, fetched as resource type `R`.
pub struct ResourceRecord<R> {
    attributes: Map<String, Value>,
    resource: PhantomData<fn() -> R>,
}

impl<R: Resource> ResourceRecord<R> {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            attributes,
            resource: PhantomData,
        }
    }

    /// Name of the resource type this record was fetched as.
    pub fn resource_name(&self) -> &'static str {
        R::NAME
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn into_attributes(self) -> Map<String, Value> {
        self.attributes
    }

    /// Decode the whole record into a caller-defined type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.attributes.clone()))
    }
}

/// Missing fields index to `Value::Null`, like `serde_json::Value`.
impl<R: Resource> Index<&str> for ResourceRecord<R> {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.attributes.get(key).unwrap_or(&NULL)
    }
}

impl<R> Clone for ResourceRecord<R> {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            resource: PhantomData,
        }
    }
}

impl<R> PartialEq for ResourceRecord<R> {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

impl<R: Resource> fmt::Debug for ResourceRecord<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRecord")
            .field("resource", &R::NAME)
            .field("attributes", &self.attributes)
            .finish()
    }
}
