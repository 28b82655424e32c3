use apollo_compiler::{ast::Document, validation::WithErrors};

/// An error returned by an [`IntrospectionProvider`](crate::IntrospectionProvider)
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("GraphQL errors: {0}")]
    GraphQL(String),

    #[error("type not found on the server")]
    TypeNotFound,

    #[error("invalid introspection response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to resolve one named type referenced by an operation
#[derive(Debug, thiserror::Error)]
#[error("Could not resolve type `{type_name}`: {source}")]
pub struct ResolveError {
    pub type_name: String,

    #[source]
    pub source: ProviderError,
}

/// An error while building the input schema of an operation
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Could not parse GraphQL document: {0}")]
    GraphQLDocument(Box<WithErrors<Document>>),

    #[error("No operations defined in {}", .source_path.as_deref().unwrap_or("document"))]
    NoOperations { source_path: Option<String> },

    #[error(
        "Too many operations in {}. Expected 1 but got {count}",
        .source_path.as_deref().unwrap_or("document")
    )]
    TooManyOperations {
        source_path: Option<String>,
        count: usize,
    },

    #[error("Subscription operations cannot be run: {0}")]
    Subscription(String),

    #[error("Variable `${0}` is declared more than once")]
    DuplicateVariable(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Generated schema contains a reference with no definition: {0}")]
    DanglingReference(String),

    #[error("Invalid JSON schema: {0}")]
    InvalidSchema(String),
}
