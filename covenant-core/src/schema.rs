//! Structural schema derivation for type descriptors.
//!
//! Named struct types are registered once in a shared component table
//! and referenced by `$ref` wherever they recur; everything else is
//! produced inline. Derivation is deterministic: the same descriptor
//! against the same component table always yields the same schema.

use serde_json::{json, Value};

use crate::descriptor::{StructDescriptor, TypeDescriptor};
use crate::metadata::{ComponentMetadata, ObjectMetadata};

/// Error deriving a schema for a descriptor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("arrays must have length greater than 0")]
    ZeroLengthArray,
    #[error("{0} was not a valid type")]
    InvalidType(String),
}

/// Derive the schema for `ty`, registering any named composite types it
/// contains into `components`.
pub fn schema_for(
    ty: &TypeDescriptor,
    components: &mut ComponentMetadata,
) -> Result<Value, SchemaError> {
    match ty {
        TypeDescriptor::Bool => Ok(json!({"type": "boolean"})),
        TypeDescriptor::Int(w) => Ok(json!({"type": "integer", "format": format!("int{}", w.bits())})),
        TypeDescriptor::Uint(w) => Ok(json!({
            "type": "integer",
            "format": format!("uint{}", w.bits()),
            "minimum": 0,
        })),
        TypeDescriptor::Float32 => Ok(json!({"type": "number", "format": "float"})),
        TypeDescriptor::Float64 => Ok(json!({"type": "number", "format": "double"})),
        TypeDescriptor::String => Ok(json!({"type": "string"})),
        TypeDescriptor::Any => Ok(json!({})),
        TypeDescriptor::Array { len, elem } => {
            if *len < 1 {
                return Err(SchemaError::ZeroLengthArray);
            }
            let items = schema_for(elem, components)?;
            Ok(json!({"type": "array", "items": items}))
        }
        // A slice has no length; its schema is that of a synthesized
        // single representative element.
        TypeDescriptor::List(elem) => {
            let items = schema_for(elem, components)?;
            Ok(json!({"type": "array", "items": items}))
        }
        TypeDescriptor::Map(value) => {
            let additional = schema_for(value, components)?;
            Ok(json!({"type": "object", "additionalProperties": additional}))
        }
        TypeDescriptor::Struct(sd) | TypeDescriptor::Ref(sd) => {
            add_component_if_absent(sd, components)?;
            Ok(json!({"$ref": format!("#/components/schemas/{}", sd.name)}))
        }
        TypeDescriptor::Context(_) | TypeDescriptor::Error | TypeDescriptor::Interface(_) => {
            Err(SchemaError::InvalidType(ty.to_string()))
        }
    }
}

fn add_component_if_absent(
    sd: &StructDescriptor,
    components: &mut ComponentMetadata,
) -> Result<(), SchemaError> {
    if components.schemas.contains_key(&sd.name) {
        return Ok(());
    }

    // Reserve the name before recursing into fields so self-referential
    // structs terminate.
    components
        .schemas
        .insert(sd.name.clone(), ObjectMetadata::default());

    let mut object = ObjectMetadata::default();
    for field in sd.enumerated_fields() {
        let name = field.wire_name().to_string();
        let schema = match schema_for(&field.ty, components) {
            Ok(schema) => schema,
            Err(err) => {
                components.schemas.remove(&sd.name);
                return Err(err);
            }
        };
        object.required.push(name.clone());
        object.properties.insert(name, schema);
    }

    components.schemas.insert(sd.name.clone(), object);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, IntWidth};
    use serde_json::json;
    use std::sync::Arc;

    fn asset_descriptor() -> Arc<StructDescriptor> {
        Arc::new(StructDescriptor::new(
            "Asset",
            vec![
                FieldDescriptor::exported("Id", TypeDescriptor::String).with_rename("id"),
                FieldDescriptor::exported("Owner", TypeDescriptor::String),
                FieldDescriptor::exported("Value", TypeDescriptor::Uint(IntWidth::W64)),
            ],
        ))
    }

    #[test]
    fn test_primitive_schemas() {
        let mut components = ComponentMetadata::default();
        assert_eq!(
            schema_for(&TypeDescriptor::Bool, &mut components).unwrap(),
            json!({"type": "boolean"})
        );
        assert_eq!(
            schema_for(&TypeDescriptor::Int(IntWidth::W32), &mut components).unwrap(),
            json!({"type": "integer", "format": "int32"})
        );
        assert_eq!(
            schema_for(&TypeDescriptor::Uint(IntWidth::W8), &mut components).unwrap(),
            json!({"type": "integer", "format": "uint8", "minimum": 0})
        );
        assert_eq!(
            schema_for(&TypeDescriptor::Float64, &mut components).unwrap(),
            json!({"type": "number", "format": "double"})
        );
        assert_eq!(
            schema_for(&TypeDescriptor::Any, &mut components).unwrap(),
            json!({})
        );
        assert!(components.is_empty());
    }

    #[test]
    fn test_array_and_list_schemas() {
        let mut components = ComponentMetadata::default();
        let array = TypeDescriptor::Array {
            len: 2,
            elem: Box::new(TypeDescriptor::String),
        };
        let expected = json!({"type": "array", "items": {"type": "string"}});
        assert_eq!(schema_for(&array, &mut components).unwrap(), expected);
        assert_eq!(
            schema_for(&TypeDescriptor::List(Box::new(TypeDescriptor::String)), &mut components)
                .unwrap(),
            expected
        );
    }

    #[test]
    fn test_zero_length_array_errors() {
        let mut components = ComponentMetadata::default();
        let array = TypeDescriptor::Array {
            len: 0,
            elem: Box::new(TypeDescriptor::String),
        };
        assert_eq!(
            schema_for(&array, &mut components),
            Err(SchemaError::ZeroLengthArray)
        );
    }

    #[test]
    fn test_map_schema() {
        let mut components = ComponentMetadata::default();
        assert_eq!(
            schema_for(&TypeDescriptor::Map(Box::new(TypeDescriptor::Float32)), &mut components)
                .unwrap(),
            json!({"type": "object", "additionalProperties": {"type": "number", "format": "float"}})
        );
    }

    #[test]
    fn test_struct_registers_component_once() {
        let mut components = ComponentMetadata::default();
        let sd = asset_descriptor();
        let by_value = schema_for(&TypeDescriptor::Struct(sd.clone()), &mut components).unwrap();
        let by_ref = schema_for(&TypeDescriptor::Ref(sd), &mut components).unwrap();

        let expected_ref = json!({"$ref": "#/components/schemas/Asset"});
        assert_eq!(by_value, expected_ref);
        assert_eq!(by_ref, expected_ref);
        assert_eq!(components.schemas.len(), 1);

        let object = &components.schemas["Asset"];
        // Rename alias wins over the field's own name.
        assert_eq!(object.required, vec!["id", "Owner", "Value"]);
        assert_eq!(object.properties["id"], json!({"type": "string"}));
        assert!(!object.additional_properties);
    }

    #[test]
    fn test_struct_enumeration_halts_at_private_field() {
        let sd = Arc::new(StructDescriptor::new(
            "Partial",
            vec![
                FieldDescriptor::exported("Exported1", TypeDescriptor::String),
                FieldDescriptor::private("unexported", TypeDescriptor::Bool),
                FieldDescriptor::exported("Exported2", TypeDescriptor::Bool),
            ],
        ));
        let mut components = ComponentMetadata::default();
        schema_for(&TypeDescriptor::Struct(sd), &mut components).unwrap();

        let object = &components.schemas["Partial"];
        assert_eq!(object.required, vec!["Exported1"]);
        assert!(!object.properties.contains_key("Exported2"));
    }

    #[test]
    fn test_schema_is_deterministic() {
        let sd = asset_descriptor();
        let ty = TypeDescriptor::List(Box::new(TypeDescriptor::Struct(sd)));
        let mut a = ComponentMetadata::default();
        let mut b = ComponentMetadata::default();
        let first = schema_for(&ty, &mut a).unwrap();
        let second = schema_for(&ty, &mut b).unwrap();
        assert_eq!(first, second);
        assert_eq!(a, b);
        // Repeated derivation against the same table is stable.
        let third = schema_for(&ty, &mut a).unwrap();
        assert_eq!(first, third);
        assert_eq!(a, b);
    }

    #[test]
    fn test_unschemable_kinds_error() {
        let mut components = ComponentMetadata::default();
        let err = schema_for(&TypeDescriptor::Error, &mut components).unwrap_err();
        assert_eq!(err, SchemaError::InvalidType("error".to_string()));
    }
}
