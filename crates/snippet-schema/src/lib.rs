//! JSON Schema synthesis for GraphQL operation variables
//!
//! Variables declared by an operation are mapped into a draft-04 JSON Schema.
//! Custom input types are not known ahead of time, so they are resolved one at
//! a time through an [`IntrospectionProvider`] until every reference in the
//! schema points at a definition.

pub mod builder;
pub mod converter;
pub mod errors;
pub mod fragment;
pub mod introspection;
pub mod resolver;
pub mod scalar;
pub mod type_mapper;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{JSON_SCHEMA_DRAFT_04, OperationSchema, operation_defs, operation_name};
pub use errors::{ProviderError, ResolveError, SchemaError};
pub use introspection::{IntrospectionProvider, IntrospectionResponse, TypeShape};
pub use resolver::TypeResolver;
pub use validation::{Violation, validate};
