//! Introspection of individual named types
//!
//! Only the input surface of a type is needed to describe variables, so a
//! single `__type` query is issued per named type instead of downloading the
//! whole schema.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::errors::ProviderError;

/// The operation name of [`TYPE_SHAPE_QUERY`]
pub const TYPE_SHAPE_OPERATION_NAME: &str = "GetTypeInput";

/// Query used to fetch the input shape of one named type.
///
/// Type references are expanded eight `ofType` levels deep, as the standard
/// introspection query does, so that wrapped types such as `[[Foo!]!]!` still
/// reach their named leaf.
pub const TYPE_SHAPE_QUERY: &str = r#"query GetTypeInput($type: String!) {
  __type(name: $type) {
    __typename
    kind
    name
    inputFields {
      name
      type {
        ...TypeRef
      }
    }
    enumValues {
      name
    }
  }
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
                ofType {
                  kind
                  name
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

/// Something able to fetch the introspected shape of a named type
#[async_trait]
pub trait IntrospectionProvider: Send + Sync {
    /// Fetch the raw `__type` response for `type_name`
    async fn fetch_type_shape(&self, type_name: &str)
    -> Result<IntrospectionResponse, ProviderError>;
}

/// A GraphQL response to [`TYPE_SHAPE_QUERY`]
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionResponse {
    #[serde(default)]
    pub data: Option<TypeData>,

    #[serde(default)]
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeData {
    #[serde(rename = "__type", default)]
    pub r#type: Option<TypeShape>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

impl IntrospectionResponse {
    /// Extract the type shape, treating GraphQL errors and missing types as failures
    pub fn into_shape(self) -> Result<TypeShape, ProviderError> {
        if let Some(errors) = self.errors.filter(|errors| !errors.is_empty()) {
            return Err(ProviderError::GraphQL(
                errors
                    .into_iter()
                    .map(|error| error.message)
                    .collect::<Vec<_>>()
                    .join("; "),
            ));
        }

        self.data
            .and_then(|data| data.r#type)
            .ok_or(ProviderError::TypeNotFound)
    }
}

/// The introspected description of one named type
///
/// A shape listing `enumValues` is an enum; anything else is described by its
/// `inputFields`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeShape {
    #[serde(default, deserialize_with = "kind_or_unknown")]
    pub kind: TypeKind,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub input_fields: Option<Vec<InputValue>>,

    #[serde(default)]
    pub enum_values: Option<Vec<EnumValue>>,
}

/// A single field of an input object
#[derive(Debug, Clone, Deserialize)]
pub struct InputValue {
    pub name: String,

    #[serde(rename = "type")]
    pub r#type: TypeRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumValue {
    pub name: String,
}

/// A (possibly wrapped) reference to a type, as used by input fields
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    #[serde(default, deserialize_with = "kind_or_unknown")]
    pub kind: TypeKind,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub of_type: Option<Box<TypeRef>>,
}

/// The kinds of type an input field can refer to
///
/// Kinds which cannot appear in input position, missing kinds, and kinds this
/// crate does not recognise all become [`TypeKind::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    NonNull,
    List,
    InputObject,
    Enum,
    #[default]
    #[serde(other)]
    Unknown,
}

fn kind_or_unknown<'de, D>(deserializer: D) -> Result<TypeKind, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TypeKind>::deserialize(deserializer)?.unwrap_or_default())
}
