use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};
use snippet_schema::{SchemaError, Violation};

/// An error while running a snippet
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Missing environment variable: {0}")]
    EnvironmentVariable(String),

    #[error("Snippet '{0}' not found")]
    SnippetNotFound(String),

    #[error("No .graphql file found for snippet '{0}'")]
    NoOperationFile(String),

    #[error("Invalid JSON arguments: {0}")]
    InvalidArguments(serde_json::Error),

    #[error("Arguments do not match the snippet's input schema:\n{}", list_violations(.0))]
    ValidationFailed(Vec<Violation>),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("GraphQL request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid header value: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),

    #[error("invalid header name: {0}")]
    HeaderName(#[from] InvalidHeaderName),

    #[error("invalid header: {0}")]
    Header(String),

    #[error(transparent)]
    File(#[from] std::io::Error),
}

fn list_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|violation| format!("  - {violation}"))
        .collect::<Vec<_>>()
        .join("\n")
}
