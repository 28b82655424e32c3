//! Snippets on disk
//!
//! Every directory below the snippet root is a snippet. It holds the GraphQL
//! operation to run in a `.graphql` file and, optionally, a `README.md`
//! describing how to use it.

use std::{
    fs,
    path::{Path, PathBuf},
};

use apollo_compiler::{Node, ast::OperationDefinition};
use schemars::Schema;
use serde_json::Value;
use snippet_schema::{IntrospectionProvider, OperationSchema, operation_defs, operation_name};
use tracing::{debug, warn};

use crate::errors::RunnerError;

const OPERATION_DOCUMENT_EXTENSION: &str = "graphql";
const README_FILE_NAME: &str = "README.md";

/// A snippet directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub name: String,
    pub path: PathBuf,
}

/// List the snippets below `root`, sorted by name
pub fn discover(root: &Path) -> Result<Vec<Snippet>, RunnerError> {
    let mut snippets = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => snippets.push(Snippet {
                name: name.to_string(),
                path: path.clone(),
            }),
            None => warn!(?path, "Skipping snippet directory with a non UTF-8 name"),
        }
    }

    snippets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(snippets)
}

/// Find the snippet called `name` below `root`
pub fn find(root: &Path, name: &str) -> Result<Snippet, RunnerError> {
    discover(root)?
        .into_iter()
        .find(|snippet| snippet.name == name)
        .ok_or_else(|| RunnerError::SnippetNotFound(name.to_string()))
}

impl Snippet {
    /// The operation document of this snippet, the first `.graphql` file by name
    pub fn operation_path(&self) -> Result<PathBuf, RunnerError> {
        let mut documents = fs::read_dir(&self.path)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(OPERATION_DOCUMENT_EXTENSION)
            })
            .collect::<Vec<_>>();
        documents.sort();

        documents
            .into_iter()
            .next()
            .ok_or_else(|| RunnerError::NoOperationFile(self.name.clone()))
    }

    /// Read and parse the operation of this snippet
    pub fn load(&self) -> Result<LoadedSnippet, RunnerError> {
        let path = self.operation_path()?;
        debug!(snippet = %self.name, ?path, "loading snippet");
        let source_text = fs::read_to_string(&path)?;
        LoadedSnippet::parse(source_text, path.to_str().map(str::to_string))
    }

    /// The contents of the snippet's README, if it has one
    pub fn readme(&self) -> Result<Option<String>, RunnerError> {
        let path = self.path.join(README_FILE_NAME);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }
}

/// A snippet whose operation has been parsed
#[derive(Debug, Clone)]
pub struct LoadedSnippet {
    source_text: String,
    operation: Node<OperationDefinition>,
}

impl LoadedSnippet {
    pub fn parse(source_text: String, source_path: Option<String>) -> Result<Self, RunnerError> {
        let (_, operation) = operation_defs(&source_text, source_path)?;
        Ok(Self {
            source_text,
            operation,
        })
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn operation_name(&self) -> Option<String> {
        operation_name(&self.operation)
    }

    /// Build the JSON schema which arguments to this snippet must satisfy
    pub async fn input_schema<P>(
        &self,
        provider: &P,
        max_concurrent_fetches: usize,
    ) -> Result<Schema, RunnerError>
    where
        P: IntrospectionProvider + ?Sized,
    {
        Ok(OperationSchema::new(provider)
            .with_max_concurrent_fetches(max_concurrent_fetches)
            .build(&self.operation)
            .await?)
    }
}

/// Check `arguments` against an input schema, failing with every violation found
pub fn check_arguments(schema: &Schema, arguments: &Value) -> Result<(), RunnerError> {
    let violations = snippet_schema::validate(schema.as_value(), arguments)?;
    if violations.is_empty() {
        Ok(())
    } else {
        Err(RunnerError::ValidationFailed(violations))
    }
}
