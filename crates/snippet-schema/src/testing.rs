//! Test doubles shared by the unit tests of this crate

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    errors::ProviderError,
    introspection::{IntrospectionProvider, IntrospectionResponse},
};

/// An in-memory provider which counts how often each type is requested
#[derive(Default)]
pub(crate) struct MockProvider {
    responses: HashMap<String, Value>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    pub(crate) fn with_type(mut self, name: &str, shape: Value) -> Self {
        self.responses
            .insert(name.to_string(), json!({"data": {"__type": shape}}));
        self
    }

    pub(crate) fn with_failure(mut self, name: &str, message: &str) -> Self {
        self.failures.insert(name.to_string(), message.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| *call == name).count()
    }
}

#[async_trait]
impl IntrospectionProvider for MockProvider {
    async fn fetch_type_shape(
        &self,
        type_name: &str,
    ) -> Result<IntrospectionResponse, ProviderError> {
        self.calls.lock().unwrap().push(type_name.to_string());

        if let Some(message) = self.failures.get(type_name) {
            return Err(ProviderError::Transport(message.clone().into()));
        }

        let response = self
            .responses
            .get(type_name)
            .cloned()
            .unwrap_or_else(|| json!({"data": {"__type": null}}));
        Ok(serde_json::from_value(response)?)
    }
}

/// The shape of an input object with the given `inputFields`
pub(crate) fn input_object(name: &str, fields: Value) -> Value {
    json!({
        "__typename": "__Type",
        "kind": "INPUT_OBJECT",
        "name": name,
        "inputFields": fields,
        "enumValues": null,
    })
}

/// The shape of an enum with the given members
pub(crate) fn enumeration(name: &str, members: &[&str]) -> Value {
    json!({
        "__typename": "__Type",
        "kind": "ENUM",
        "name": name,
        "inputFields": null,
        "enumValues": members.iter().map(|member| json!({"name": member})).collect::<Vec<_>>(),
    })
}

/// An input field named `name` referencing another input object
pub(crate) fn object_field(name: &str, type_name: &str) -> Value {
    json!({"name": name, "type": {"kind": "INPUT_OBJECT", "name": type_name, "ofType": null}})
}
