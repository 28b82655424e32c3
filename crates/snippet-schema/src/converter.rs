//! Convert introspected type shapes into schema definitions

use schemars::{Schema, json_schema};
use serde_json::{Map, Value};

use crate::{
    fragment::{Fragment, definition_ref, merge_discovered},
    introspection::{TypeKind, TypeRef, TypeShape},
    scalar::BuiltinScalar,
};

/// The definition of one named type, along with the named types it refers to
#[derive(Debug, Clone)]
pub struct Converted {
    pub definition: Schema,
    pub discovered: Vec<String>,
}

/// Convert the shape of a named type into its JSON schema definition.
///
/// Malformed field descriptors never fail here: they turn into references to
/// a type which will never be defined, which the schema builder reports.
pub fn convert_shape(shape: &TypeShape) -> Converted {
    // Custom scalars travel as strings
    if shape.kind == TypeKind::Scalar {
        return Converted {
            definition: json_schema!({"type": "string"}),
            discovered: Vec::new(),
        };
    }

    // Enums are always leaves
    if let Some(values) = &shape.enum_values {
        return Converted {
            definition: json_schema!({
                "type": "string",
                "enum": values.iter().map(|value| value.name.as_str()).collect::<Vec<_>>(),
            }),
            discovered: Vec::new(),
        };
    }

    let mut properties = Map::new();
    let mut required = Vec::new();
    let mut discovered = Vec::new();
    for field in shape.input_fields.iter().flatten() {
        let fragment = convert_type_ref(&field.r#type);
        if fragment.required {
            required.push(Value::String(field.name.clone()));
        }
        merge_discovered(&mut discovered, fragment.discovered);
        properties.insert(field.name.clone(), fragment.schema.into());
    }

    let mut definition = json_schema!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        definition
            .ensure_object()
            .insert("required".to_string(), Value::Array(required));
    }

    Converted {
        definition,
        discovered,
    }
}

/// Convert the type descriptor of an input field
pub(crate) fn convert_type_ref(type_ref: &TypeRef) -> Fragment {
    if let Some(scalar) = type_ref.name.as_deref().and_then(BuiltinScalar::from_name) {
        return Fragment::leaf(scalar.to_schema());
    }

    match (type_ref.kind, type_ref.of_type.as_deref()) {
        // Built-in scalars were handled above, so this is a custom scalar
        (TypeKind::Scalar, _) => Fragment::leaf(json_schema!({"type": "string"})),
        (TypeKind::NonNull, Some(inner)) => convert_type_ref(inner).into_required(),
        (TypeKind::List, Some(inner)) => convert_type_ref(inner).into_list(),
        (TypeKind::NonNull | TypeKind::List, None)
        | (TypeKind::InputObject | TypeKind::Enum | TypeKind::Unknown, _) => {
            named_reference(type_ref)
        }
    }
}

fn named_reference(type_ref: &TypeRef) -> Fragment {
    match type_ref.name.as_deref() {
        Some(name) => Fragment::reference(name),
        // Nothing to look up, so leave a reference that can never be satisfied
        None => Fragment::leaf(definition_ref("")),
    }
}
