//! Map the declared type of an operation variable into a JSON schema fragment

use apollo_compiler::ast::Type;

use crate::{fragment::Fragment, scalar::BuiltinScalar};

/// Convert a GraphQL type reference into a schema fragment.
///
/// Non-null wrappers set the fragment's `required` flag rather than altering
/// the schema. Any named type which is not a built-in scalar becomes a
/// reference into `definitions` and is reported in `discovered`.
pub fn map_type(r#type: &Type) -> Fragment {
    match r#type {
        Type::Named(name) => map_named(name.as_str()),
        Type::NonNullNamed(name) => map_named(name.as_str()).into_required(),
        Type::List(inner) => map_type(inner).into_list(),
        Type::NonNullList(inner) => map_type(inner).into_list().into_required(),
    }
}

fn map_named(name: &str) -> Fragment {
    match BuiltinScalar::from_name(name) {
        Some(scalar) => Fragment::leaf(scalar.to_schema()),
        None => Fragment::reference(name),
    }
}
