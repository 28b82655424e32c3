use schemars::{Schema, json_schema};

/// Prefix of every reference into the `definitions` section of a generated schema
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// A partial schema describing one variable or one input field
///
/// The `required` flag belongs to the position the fragment is placed at, so
/// it is consumed by whoever inserts the fragment into an object and is never
/// written into the schema itself.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub schema: Schema,
    pub required: bool,

    /// Named types referenced by this fragment which still need a definition
    pub discovered: Vec<String>,
}

impl Fragment {
    /// A fragment that needs no further resolution
    pub fn leaf(schema: Schema) -> Self {
        Self {
            schema,
            required: false,
            discovered: Vec::new(),
        }
    }

    /// A reference to the definition of a named type
    pub fn reference(name: &str) -> Self {
        Self {
            schema: definition_ref(name),
            required: false,
            discovered: vec![name.to_string()],
        }
    }

    /// Wrap the fragment as the item type of an array.
    ///
    /// Nullability of list items has no parent object to be recorded in, so
    /// the inner `required` flag is dropped here.
    pub fn into_list(self) -> Self {
        Self {
            schema: json_schema!({
                "type": "array",
                "items": self.schema,
            }),
            required: false,
            discovered: self.discovered,
        }
    }

    pub fn into_required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }
}

/// Build a `$ref` schema pointing at the definition of `name`
pub fn definition_ref(name: &str) -> Schema {
    Schema::new_ref(format!("{DEFINITIONS_PREFIX}{name}"))
}

/// Append names to `into`, skipping any already present
pub(crate) fn merge_discovered(into: &mut Vec<String>, names: Vec<String>) {
    for name in names {
        if !into.contains(&name) {
            into.push(name);
        }
    }
}
