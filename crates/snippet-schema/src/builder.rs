//! Build the complete input schema of a GraphQL operation

use std::collections::{BTreeSet, HashSet};

use apollo_compiler::{
    Node,
    ast::{Definition, Document, OperationDefinition, OperationType},
    parser::Parser,
};
use schemars::{Schema, json_schema};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    errors::SchemaError,
    fragment::{DEFINITIONS_PREFIX, merge_discovered},
    introspection::IntrospectionProvider,
    resolver::TypeResolver,
    type_mapper::map_type,
};

/// The dialect of every generated schema
pub const JSON_SCHEMA_DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";

/// Parse a document and extract its single operation
///
/// Fragments may accompany the operation. Any other kind of definition is
/// ignored with a warning.
pub fn operation_defs(
    source_text: &str,
    source_path: Option<String>,
) -> Result<(Document, Node<OperationDefinition>), SchemaError> {
    let document = Parser::new()
        .parse_ast(
            source_text,
            source_path
                .clone()
                .unwrap_or_else(|| "operation.graphql".to_string()),
        )
        .map_err(|e| SchemaError::GraphQLDocument(Box::new(e)))?;

    let mut operation_defs = document
        .definitions
        .iter()
        .filter_map(|def| match def {
            Definition::OperationDefinition(operation_def) => Some(operation_def.clone()),
            Definition::FragmentDefinition(_) => None,
            _ => {
                warn!(
                    ?source_path,
                    "Schema definitions were passed in, but only operations and fragments are allowed"
                );
                None
            }
        });

    let operation = match (operation_defs.next(), operation_defs.next()) {
        (None, _) => return Err(SchemaError::NoOperations { source_path }),
        (_, Some(_)) => {
            let count = 2 + operation_defs.count();
            return Err(SchemaError::TooManyOperations { source_path, count });
        }
        (Some(operation), None) => operation,
    };

    if operation.operation_type == OperationType::Subscription {
        return Err(SchemaError::Subscription(
            operation_name(&operation).unwrap_or_else(|| "<anonymous>".to_string()),
        ));
    }

    Ok((document, operation))
}

/// The name of an operation, if it has one
pub fn operation_name(operation: &OperationDefinition) -> Option<String> {
    operation.name.as_ref().map(|name| name.to_string())
}

/// Builder for the input schema of one operation
pub struct OperationSchema<'a, P: ?Sized> {
    resolver: TypeResolver<'a, P>,
}

impl<'a, P> OperationSchema<'a, P>
where
    P: IntrospectionProvider + ?Sized,
{
    pub fn new(provider: &'a P) -> Self {
        Self {
            resolver: TypeResolver::new(provider),
        }
    }

    /// See [`TypeResolver::with_max_concurrent_fetches`]
    pub fn with_max_concurrent_fetches(self, limit: usize) -> Self {
        Self {
            resolver: self.resolver.with_max_concurrent_fetches(limit),
        }
    }

    /// Generate the draft-04 schema describing the variables of `operation`
    pub async fn build(&self, operation: &OperationDefinition) -> Result<Schema, SchemaError> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        let mut discovered = Vec::new();
        let mut seen = HashSet::new();

        for variable in &operation.variables {
            let variable_name = variable.name.to_string();
            if !seen.insert(variable_name.clone()) {
                return Err(SchemaError::DuplicateVariable(variable_name));
            }

            let fragment = map_type(&variable.ty);
            if fragment.required {
                required.push(Value::String(variable_name.clone()));
            }
            merge_discovered(&mut discovered, fragment.discovered);
            properties.insert(variable_name, fragment.schema.into());
        }

        debug!(
            operation = ?operation_name(operation),
            types = ?discovered,
            "resolving input types"
        );
        let definitions = self.resolver.resolve(discovered).await?;

        let schema = json_schema!({
            "$schema": JSON_SCHEMA_DRAFT_04,
            "type": "object",
            "properties": properties,
            "required": required,
            "definitions": definitions,
        });
        ensure_no_dangling_references(&schema)?;

        Ok(schema)
    }
}

/// Check that every `$ref` in the schema names a definition it contains
fn ensure_no_dangling_references(schema: &Schema) -> Result<(), SchemaError> {
    let definitions = schema.as_value().get("definitions").and_then(Value::as_object);

    let mut references = BTreeSet::new();
    collect_references(schema.as_value(), &mut references);

    match references.into_iter().find(|reference| {
        reference
            .strip_prefix(DEFINITIONS_PREFIX)
            .filter(|name| definitions.is_some_and(|definitions| definitions.contains_key(*name)))
            .is_none()
    }) {
        Some(dangling) => Err(SchemaError::DanglingReference(dangling.to_string())),
        None => Ok(()),
    }
}

fn collect_references<'v>(value: &'v Value, references: &mut BTreeSet<&'v str>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                references.insert(reference.as_str());
            }
            for nested in map.values() {
                collect_references(nested, references);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, references);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{OperationSchema, operation_defs, operation_name};
    use crate::{
        errors::SchemaError,
        testing::{MockProvider, enumeration, input_object, object_field},
        validation::validate,
    };

    async fn build(provider: &MockProvider, source: &str) -> Result<serde_json::Value, SchemaError> {
        let (_, operation) = operation_defs(source, None)?;
        OperationSchema::new(provider)
            .build(&operation)
            .await
            .map(|schema| schema.to_value())
    }

    #[tokio::test]
    async fn create_widget_input() {
        let provider = MockProvider::default().with_type(
            "CreateWidgetInput",
            input_object(
                "CreateWidgetInput",
                json!([
                    {"name": "name", "type": {"kind": "NON_NULL", "name": null, "ofType": {"kind": "SCALAR", "name": "String"}}},
                    {"name": "tags", "type": {"kind": "LIST", "name": null, "ofType": {"kind": "SCALAR", "name": "String"}}},
                ]),
            ),
        );

        let schema = build(
            &provider,
            "query Q($in: CreateWidgetInput!) { createWidget(input: $in) { id } }",
        )
        .await
        .unwrap();

        insta::with_settings!({ sort_maps => true }, {
            insta::assert_json_snapshot!(schema, @r##"
            {
              "$schema": "http://json-schema.org/draft-04/schema#",
              "definitions": {
                "CreateWidgetInput": {
                  "properties": {
                    "name": {
                      "type": "string"
                    },
                    "tags": {
                      "items": {
                        "type": "string"
                      },
                      "type": "array"
                    }
                  },
                  "required": [
                    "name"
                  ],
                  "type": "object"
                }
              },
              "properties": {
                "in": {
                  "$ref": "#/definitions/CreateWidgetInput"
                }
              },
              "required": [
                "in"
              ],
              "type": "object"
            }
            "##);
        });
    }

    #[tokio::test]
    async fn custom_scalar_variables_accept_strings() {
        let provider = MockProvider::default().with_type(
            "DateTime",
            json!({"kind": "SCALAR", "name": "DateTime", "inputFields": null, "enumValues": null}),
        );

        let schema = build(&provider, "query Q($since: DateTime!) { a }")
            .await
            .unwrap();

        assert_eq!(
            schema["properties"]["since"],
            json!({"$ref": "#/definitions/DateTime"})
        );
        assert_eq!(schema["definitions"]["DateTime"], json!({"type": "string"}));

        let valid = validate(&schema, &json!({"since": "2024-01-01T00:00:00Z"})).unwrap();
        assert!(valid.is_empty());
        let invalid = validate(&schema, &json!({"since": {"year": 2024}})).unwrap();
        assert_eq!(invalid.len(), 1);
    }

    #[tokio::test]
    async fn enum_variables_are_resolved_to_their_values() {
        let provider =
            MockProvider::default().with_type("Status", enumeration("Status", &["OPEN", "CLOSED"]));

        let schema = build(&provider, "query Q($status: Status) { a }")
            .await
            .unwrap();

        assert_eq!(
            schema["definitions"]["Status"],
            json!({"type": "string", "enum": ["OPEN", "CLOSED"]})
        );
        assert_eq!(schema["required"], json!([]));
        assert!(validate(&schema, &json!({"status": "OPEN"})).unwrap().is_empty());
        assert_eq!(
            validate(&schema, &json!({"status": "PENDING"})).unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn deeply_wrapped_fields_resolve() {
        // Grid.cells: [[String!]!]!
        let provider = MockProvider::default().with_type(
            "Grid",
            input_object(
                "Grid",
                json!([{"name": "cells", "type": {
                    "kind": "NON_NULL", "name": null, "ofType": {
                    "kind": "LIST", "name": null, "ofType": {
                    "kind": "NON_NULL", "name": null, "ofType": {
                    "kind": "LIST", "name": null, "ofType": {
                    "kind": "NON_NULL", "name": null, "ofType": {
                    "kind": "SCALAR", "name": "String", "ofType": null}}}}}
                }}]),
            ),
        );

        let schema = build(&provider, "query Q($grid: Grid!) { a }")
            .await
            .unwrap();

        assert_eq!(
            schema["definitions"]["Grid"],
            json!({
                "type": "object",
                "properties": {
                    "cells": {"type": "array", "items": {"type": "array", "items": {"type": "string"}}}
                },
                "required": ["cells"]
            })
        );
        assert!(
            validate(&schema, &json!({"grid": {"cells": [["a", "b"], []]}}))
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn scalar_variables_need_no_definitions() {
        let provider = MockProvider::default();

        let schema = build(
            &provider,
            "query Q($id: ID!, $first: Int, $ratio: Float, $active: Boolean, $names: [String]) { a }",
        )
        .await
        .unwrap();

        assert_eq!(
            schema,
            json!({
                "$schema": "http://json-schema.org/draft-04/schema#",
                "type": "object",
                "properties": {
                    "id": {"type": "string"},
                    "first": {"type": "integer"},
                    "ratio": {"type": "number"},
                    "active": {"type": "boolean"},
                    "names": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["id"],
                "definitions": {}
            })
        );
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn operation_without_variables() {
        let provider = MockProvider::default();

        let schema = build(&provider, "{ viewer { id } }").await.unwrap();

        assert_eq!(schema["properties"], json!({}));
        assert_eq!(schema["required"], json!([]));
        assert_eq!(schema["definitions"], json!({}));
    }

    #[tokio::test]
    async fn types_shared_between_variables_are_fetched_once() {
        let provider = MockProvider::default()
            .with_type(
                "Filter",
                input_object(
                    "Filter",
                    json!([object_field("owner", "Person"), object_field("author", "Person")]),
                ),
            )
            .with_type("Person", input_object("Person", json!([])));

        let schema = build(
            &provider,
            "query Q($filter: Filter, $people: [Person!]!, $person: Person) { a }",
        )
        .await
        .unwrap();

        assert_eq!(
            schema["properties"]["people"],
            json!({"type": "array", "items": {"$ref": "#/definitions/Person"}})
        );
        assert_eq!(schema["required"], json!(["people"]));
        assert_eq!(provider.call_count("Person"), 1);
        assert_eq!(provider.call_count("Filter"), 1);
    }

    #[tokio::test]
    async fn self_referencing_types_terminate() {
        let provider = MockProvider::default()
            .with_type(
                "A",
                input_object("A", json!([object_field("and", "A"), object_field("b", "B")])),
            )
            .with_type(
                "B",
                input_object(
                    "B",
                    json!([
                        object_field("a", "A"),
                        {"name": "kind", "type": {"kind": "ENUM", "name": "Kind"}},
                    ]),
                ),
            )
            .with_type("Kind", enumeration("Kind", &["ONE", "TWO"]));

        let schema = build(&provider, "query Q($where: A) { a }").await.unwrap();

        let definitions = schema["definitions"].as_object().unwrap();
        let mut names = definitions.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, vec!["A", "B", "Kind"]);
        assert_eq!(provider.calls().len(), 3);
    }

    #[tokio::test]
    async fn required_never_leaks_into_fragments() {
        let provider = MockProvider::default().with_type(
            "Input",
            input_object(
                "Input",
                json!([{"name": "id", "type": {"kind": "NON_NULL", "ofType": {"kind": "SCALAR", "name": "ID"}}}]),
            ),
        );

        let schema = build(&provider, "query Q($id: ID!, $input: Input!) { a }")
            .await
            .unwrap();

        assert_eq!(schema["properties"]["id"], json!({"type": "string"}));
        assert_eq!(
            schema["properties"]["input"],
            json!({"$ref": "#/definitions/Input"})
        );
        assert_eq!(
            schema["definitions"]["Input"]["properties"]["id"],
            json!({"type": "string"})
        );
        assert_eq!(schema["definitions"]["Input"]["required"], json!(["id"]));
    }

    #[tokio::test]
    async fn malformed_descriptors_are_reported_as_dangling() {
        let provider = MockProvider::default().with_type(
            "Input",
            input_object(
                "Input",
                json!([{"name": "broken", "type": {"kind": "LIST", "ofType": {"name": null}}}]),
            ),
        );

        let error = build(&provider, "query Q($input: Input) { a }")
            .await
            .unwrap_err();

        insta::assert_snapshot!(error.to_string(), @"Generated schema contains a reference with no definition: #/definitions/");
    }

    #[tokio::test]
    async fn resolution_failures_abort_the_build() {
        let provider = MockProvider::default().with_failure("Input", "connection refused");

        let error = build(&provider, "query Q($input: Input) { a }")
            .await
            .unwrap_err();

        insta::assert_snapshot!(error.to_string(), @"Could not resolve type `Input`: request failed: connection refused");
    }

    #[tokio::test]
    async fn duplicate_variables_are_rejected() {
        let provider = MockProvider::default();

        let error = build(&provider, "query Q($id: ID, $id: String) { a }")
            .await
            .unwrap_err();

        insta::assert_snapshot!(error.to_string(), @"Variable `$id` is declared more than once");
    }

    #[test]
    fn fragments_are_allowed_alongside_the_operation() {
        let (_, operation) = operation_defs(
            "query Widgets { widgets { ...WidgetFields } } fragment WidgetFields on Widget { id }",
            None,
        )
        .unwrap();

        assert_eq!(operation_name(&operation), Some("Widgets".to_string()));
    }

    #[test]
    fn anonymous_operations_have_no_name() {
        let (_, operation) = operation_defs("{ a }", None).unwrap();

        assert_eq!(operation_name(&operation), None);
    }

    #[test]
    fn no_operations_should_error() {
        let error = operation_defs(
            "fragment WidgetFields on Widget { id }",
            Some("widgets.graphql".to_string()),
        )
        .unwrap_err();

        insta::assert_snapshot!(error.to_string(), @"No operations defined in widgets.graphql");
    }

    #[test]
    fn multiple_operations_should_error() {
        let error = operation_defs("query A { a } query B { b } mutation C { c }", None).unwrap_err();

        insta::assert_snapshot!(error.to_string(), @"Too many operations in document. Expected 1 but got 3");
    }

    #[test]
    fn subscriptions_should_error() {
        let error = operation_defs("subscription OnWidget { widget { id } }", None).unwrap_err();

        assert!(matches!(error, SchemaError::Subscription(name) if name == "OnWidget"));
    }

    #[test]
    fn invalid_documents_should_error() {
        let error = operation_defs("query Q($id: ) { a }", None).unwrap_err();

        assert!(matches!(error, SchemaError::GraphQLDocument(_)));
    }
}
