//! HTTP client for the target GraphQL API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use snippet_schema::{
    IntrospectionProvider, IntrospectionResponse, ProviderError,
    introspection::{TYPE_SHAPE_OPERATION_NAME, TYPE_SHAPE_QUERY},
};
use tracing::debug;
use url::Url;

use crate::{errors::RunnerError, snippet::LoadedSnippet};

/// A GraphQL client authenticating with HTTP basic auth
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
    username: String,
    password: SecretString,
}

impl Client {
    /// Create a client sending `headers` along with every request
    pub fn new(
        endpoint: Url,
        username: String,
        password: SecretString,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<Self, RunnerError> {
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint,
            username,
            password,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Execute a snippet's operation with the given variables
    pub async fn execute(
        &self,
        snippet: &LoadedSnippet,
        variables: Value,
    ) -> Result<Value, RunnerError> {
        let mut request_body = json!({
            "query": snippet.source_text(),
            "variables": variables,
        });

        if let Some(op_name) = snippet.operation_name()
            && let Some(obj) = request_body.as_object_mut()
        {
            obj.insert("operationName".to_string(), Value::String(op_name));
        }

        Ok(self.post(&request_body).await?)
    }

    async fn post(&self, body: &Value) -> Result<Value, reqwest::Error> {
        debug!(endpoint = %self.endpoint, "sending GraphQL request");
        self.http
            .post(self.endpoint.clone())
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }
}

#[async_trait]
impl IntrospectionProvider for Client {
    async fn fetch_type_shape(
        &self,
        type_name: &str,
    ) -> Result<IntrospectionResponse, ProviderError> {
        let body = json!({
            "query": TYPE_SHAPE_QUERY,
            "variables": {"type": type_name},
            "operationName": TYPE_SHAPE_OPERATION_NAME,
        });

        let response = self
            .post(&body)
            .await
            .map_err(|e| ProviderError::Transport(Box::new(e)))?;
        Ok(serde_json::from_value(response)?)
    }
}
