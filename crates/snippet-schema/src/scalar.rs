//! Built-in GraphQL scalars
//!
//! Both the variable walker and the introspection converter map scalars
//! through this table so that a scalar name always yields the same schema.

use schemars::{Schema, json_schema};

/// A scalar built into every GraphQL schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinScalar {
    Id,
    String,
    Int,
    Float,
    Boolean,
}

impl BuiltinScalar {
    /// Look up a built-in scalar by its GraphQL name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ID" => Some(Self::Id),
            "String" => Some(Self::String),
            "Int" => Some(Self::Int),
            "Float" => Some(Self::Float),
            "Boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn is_builtin(name: &str) -> bool {
        Self::from_name(name).is_some()
    }

    /// The primitive JSON schema for values of this scalar
    pub fn to_schema(self) -> Schema {
        match self {
            Self::Id | Self::String => json_schema!({"type": "string"}),
            Self::Int => json_schema!({"type": "integer"}),
            Self::Float => json_schema!({"type": "number"}),
            Self::Boolean => json_schema!({"type": "boolean"}),
        }
    }
}
