//! Text ⇄ value conversion for operation arguments and returns.
//!
//! Scalars cross the boundary as plain text with strict parsing and
//! range checks; composite kinds cross as JSON text and are conformed
//! against their descriptor after parsing. Schema validation wraps the
//! decoded value and checks it against the declared schema plus the
//! shared component table, collecting every violation.

use jsonschema::Validator;
use serde_json::{json, Map, Number, Value};

use crate::descriptor::{StructDescriptor, TypeDescriptor};
use crate::metadata::ComponentMetadata;

/// Error converting or validating a single argument.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("cannot convert passed value {value} to {ty}")]
    Conversion { value: String, ty: String },
    #[error("value {value} was not passed in expected format {ty}")]
    Format { value: String, ty: String },
    #[error("invalid schema for parameter: {0}")]
    InvalidSchema(String),
    #[error("value did not match schema:\n{0}")]
    SchemaMismatch(String),
}

fn conversion_error(text: &str, ty: &TypeDescriptor) -> CodecError {
    CodecError::Conversion {
        value: text.to_string(),
        ty: ty.to_string(),
    }
}

fn format_error(text: &str, ty: &TypeDescriptor) -> CodecError {
    CodecError::Format {
        value: text.to_string(),
        ty: ty.to_string(),
    }
}

/// Decode textual `text` into a value of the shape described by `ty`.
///
/// Empty text for a non-nilable scalar is a conversion error; there is
/// no zero-value fallback.
pub fn decode(ty: &TypeDescriptor, text: &str) -> Result<Value, CodecError> {
    match ty {
        TypeDescriptor::Bool => text
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| conversion_error(text, ty)),
        TypeDescriptor::Int(w) => {
            let parsed: i64 = text.parse().map_err(|_| conversion_error(text, ty))?;
            if !int_in_range(parsed, w.bits()) {
                return Err(conversion_error(text, ty));
            }
            Ok(Value::Number(parsed.into()))
        }
        TypeDescriptor::Uint(w) => {
            let parsed: u64 = text.parse().map_err(|_| conversion_error(text, ty))?;
            if !uint_in_range(parsed, w.bits()) {
                return Err(conversion_error(text, ty));
            }
            Ok(Value::Number(parsed.into()))
        }
        TypeDescriptor::Float32 => {
            let parsed: f32 = text.parse().map_err(|_| conversion_error(text, ty))?;
            Number::from_f64(f64::from(parsed))
                .map(Value::Number)
                .ok_or_else(|| conversion_error(text, ty))
        }
        TypeDescriptor::Float64 => {
            let parsed: f64 = text.parse().map_err(|_| conversion_error(text, ty))?;
            Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| conversion_error(text, ty))
        }
        TypeDescriptor::String => Ok(Value::String(text.to_string())),
        TypeDescriptor::Any => Ok(Value::String(text.to_string())),
        TypeDescriptor::Array { .. }
        | TypeDescriptor::List(_)
        | TypeDescriptor::Map(_)
        | TypeDescriptor::Struct(_)
        | TypeDescriptor::Ref(_) => {
            let mut value: Value =
                serde_json::from_str(text).map_err(|_| format_error(text, ty))?;
            conform(&mut value, ty).map_err(|_| format_error(text, ty))?;
            Ok(value)
        }
        TypeDescriptor::Context(_) | TypeDescriptor::Error | TypeDescriptor::Interface(_) => {
            Err(format_error(text, ty))
        }
    }
}

struct Nonconforming;

/// Check a parsed JSON value against the target shape, padding fixed
/// arrays up to their declared length.
fn conform(value: &mut Value, ty: &TypeDescriptor) -> Result<(), Nonconforming> {
    match ty {
        TypeDescriptor::Bool => value.is_boolean().then_some(()).ok_or(Nonconforming),
        TypeDescriptor::Int(w) => match value.as_i64() {
            Some(v) if int_in_range(v, w.bits()) => Ok(()),
            _ => Err(Nonconforming),
        },
        TypeDescriptor::Uint(w) => match value.as_u64() {
            Some(v) if uint_in_range(v, w.bits()) => Ok(()),
            _ => Err(Nonconforming),
        },
        TypeDescriptor::Float32 | TypeDescriptor::Float64 => {
            value.is_number().then_some(()).ok_or(Nonconforming)
        }
        TypeDescriptor::String => value.is_string().then_some(()).ok_or(Nonconforming),
        TypeDescriptor::Any => Ok(()),
        TypeDescriptor::Array { len, elem } => {
            let items = value.as_array_mut().ok_or(Nonconforming)?;
            if items.len() > *len {
                return Err(Nonconforming);
            }
            for item in items.iter_mut() {
                conform(item, elem)?;
            }
            while items.len() < *len {
                items.push(zero_value(elem));
            }
            Ok(())
        }
        TypeDescriptor::List(elem) => {
            let items = value.as_array_mut().ok_or(Nonconforming)?;
            for item in items {
                conform(item, elem)?;
            }
            Ok(())
        }
        TypeDescriptor::Map(value_ty) => {
            let entries = value.as_object_mut().ok_or(Nonconforming)?;
            for entry in entries.values_mut() {
                conform(entry, value_ty)?;
            }
            Ok(())
        }
        TypeDescriptor::Struct(sd) => conform_struct(value, sd),
        TypeDescriptor::Ref(sd) => {
            if value.is_null() {
                Ok(())
            } else {
                conform_struct(value, sd)
            }
        }
        TypeDescriptor::Context(_) | TypeDescriptor::Error | TypeDescriptor::Interface(_) => {
            Err(Nonconforming)
        }
    }
}

fn conform_struct(value: &mut Value, sd: &StructDescriptor) -> Result<(), Nonconforming> {
    let object = value.as_object_mut().ok_or(Nonconforming)?;
    // Only the enumerated fields are checked; unknown keys and keys
    // beyond the first non-exported field pass through untouched.
    for field in sd.enumerated_fields() {
        if let Some(entry) = object.get_mut(field.wire_name()) {
            conform(entry, &field.ty)?;
        }
    }
    Ok(())
}

/// The zero value of a descriptor, used to pad short fixed arrays.
fn zero_value(ty: &TypeDescriptor) -> Value {
    match ty {
        TypeDescriptor::Bool => Value::Bool(false),
        TypeDescriptor::Int(_) | TypeDescriptor::Uint(_) => Value::Number(0.into()),
        TypeDescriptor::Float32 | TypeDescriptor::Float64 => json!(0.0),
        TypeDescriptor::String => Value::String(String::new()),
        TypeDescriptor::Array { len, elem } => {
            Value::Array((0..*len).map(|_| zero_value(elem)).collect())
        }
        TypeDescriptor::List(_) => Value::Array(Vec::new()),
        TypeDescriptor::Map(_) => Value::Object(Map::new()),
        TypeDescriptor::Struct(sd) => {
            let mut object = Map::new();
            for field in sd.enumerated_fields() {
                object.insert(field.wire_name().to_string(), zero_value(&field.ty));
            }
            Value::Object(object)
        }
        _ => Value::Null,
    }
}

fn int_in_range(v: i64, bits: u32) -> bool {
    if bits >= 64 {
        return true;
    }
    let max = (1i64 << (bits - 1)) - 1;
    let min = -(1i64 << (bits - 1));
    v >= min && v <= max
}

fn uint_in_range(v: u64, bits: u32) -> bool {
    if bits >= 64 {
        return true;
    }
    v <= (1u64 << bits) - 1
}

/// Encode a value of shape `ty` back to text.
///
/// Absent nilable values yield empty text, marshalling kinds yield
/// compact JSON, everything else yields canonical scalar text.
pub fn encode(value: &Value, ty: &TypeDescriptor) -> String {
    if ty.is_nilable() && value.is_null() {
        return String::new();
    }
    let marshalling = ty.is_marshalling()
        || (matches!(ty, TypeDescriptor::Any | TypeDescriptor::Interface(_))
            && (value.is_object() || value.is_array()));
    if marshalling {
        return serde_json::to_string(value).unwrap_or_default();
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Validate a decoded value against `schema` resolved within
/// `components`, collecting every violation into one numbered,
/// newline-joined message.
pub fn validate_against(
    value: &Value,
    schema: &Value,
    components: &ComponentMetadata,
) -> Result<(), CodecError> {
    let combined = json!({
        "components": components,
        "properties": {"prop": schema},
    });
    let instance = json!({"prop": value});

    let validator =
        Validator::new(&combined).map_err(|err| CodecError::InvalidSchema(err.to_string()))?;

    // Fast path: only collect errors when validation fails.
    if validator.is_valid(&instance) {
        return Ok(());
    }
    let joined = validator
        .iter_errors(&instance)
        .enumerate()
        .map(|(i, err)| format!("{}. {err}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    Err(CodecError::SchemaMismatch(joined))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, IntWidth};
    use crate::schema::schema_for;
    use serde_json::json;
    use std::sync::Arc;

    fn asset() -> Arc<StructDescriptor> {
        Arc::new(StructDescriptor::new(
            "Asset",
            vec![
                FieldDescriptor::exported("Id", TypeDescriptor::String).with_rename("id"),
                FieldDescriptor::exported("Value", TypeDescriptor::Uint(IntWidth::W32)),
            ],
        ))
    }

    #[test]
    fn test_scalar_round_trips() {
        let cases = [
            (TypeDescriptor::Bool, "true"),
            (TypeDescriptor::Int(IntWidth::W8), "-12"),
            (TypeDescriptor::Int(IntWidth::W64), "9007199254740993"),
            (TypeDescriptor::Uint(IntWidth::W16), "65535"),
            (TypeDescriptor::Float64, "2.5"),
            (TypeDescriptor::String, "plain text"),
        ];
        for (ty, text) in cases {
            let value = decode(&ty, text).unwrap();
            assert_eq!(encode(&value, &ty), text, "{ty} should round-trip");
        }
    }

    #[test]
    fn test_scalar_range_checks() {
        assert!(decode(&TypeDescriptor::Int(IntWidth::W8), "128").is_err());
        assert!(decode(&TypeDescriptor::Int(IntWidth::W8), "-128").is_ok());
        assert!(decode(&TypeDescriptor::Uint(IntWidth::W8), "256").is_err());
        assert!(decode(&TypeDescriptor::Uint(IntWidth::W8), "-1").is_err());
    }

    #[test]
    fn test_empty_text_for_scalar_is_error() {
        let err = decode(&TypeDescriptor::Uint(IntWidth::W32), "").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot convert passed value  to u32"
        );
        assert!(decode(&TypeDescriptor::Bool, "").is_err());
        // Strings are the exception: empty text is the empty string.
        assert_eq!(decode(&TypeDescriptor::String, "").unwrap(), json!(""));
    }

    #[test]
    fn test_composite_decode_and_round_trip() {
        let ty = TypeDescriptor::List(Box::new(TypeDescriptor::Struct(asset())));
        let text = r#"[{"id":"a1","Value":7}]"#;
        let value = decode(&ty, text).unwrap();
        assert_eq!(value, json!([{"id": "a1", "Value": 7}]));
        let encoded = encode(&value, &ty);
        assert_eq!(decode(&ty, &encoded).unwrap(), value);
    }

    #[test]
    fn test_composite_decode_bad_json_names_text_and_type() {
        let ty = TypeDescriptor::Map(Box::new(TypeDescriptor::Bool));
        let err = decode(&ty, "not json").unwrap_err();
        assert_eq!(
            err.to_string(),
            "value not json was not passed in expected format Map<string, bool>"
        );
    }

    #[test]
    fn test_composite_decode_wrong_shape() {
        let ty = TypeDescriptor::List(Box::new(TypeDescriptor::Uint(IntWidth::W8)));
        assert!(decode(&ty, r#"[1, 2, 300]"#).is_err());
        assert!(decode(&ty, r#"{"a": 1}"#).is_err());
    }

    #[test]
    fn test_fixed_array_padded_and_bounded() {
        let ty = TypeDescriptor::Array {
            len: 3,
            elem: Box::new(TypeDescriptor::Int(IntWidth::W32)),
        };
        assert_eq!(decode(&ty, "[5]").unwrap(), json!([5, 0, 0]));
        assert!(decode(&ty, "[1, 2, 3, 4]").is_err());
    }

    #[test]
    fn test_ref_accepts_null() {
        let ty = TypeDescriptor::Ref(asset());
        assert_eq!(decode(&ty, "null").unwrap(), Value::Null);
        assert_eq!(encode(&Value::Null, &ty), "");
    }

    #[test]
    fn test_encode_forms() {
        assert_eq!(encode(&json!("text"), &TypeDescriptor::String), "text");
        assert_eq!(encode(&json!(true), &TypeDescriptor::Bool), "true");
        assert_eq!(
            encode(&json!({"id": "a", "Value": 1}), &TypeDescriptor::Struct(asset())),
            r#"{"id":"a","Value":1}"#
        );
        // Absent nilable values are empty text.
        assert_eq!(
            encode(&Value::Null, &TypeDescriptor::List(Box::new(TypeDescriptor::Bool))),
            ""
        );
        // Any holding a composite marshals, holding a scalar prints.
        assert_eq!(encode(&json!([1, 2]), &TypeDescriptor::Any), "[1,2]");
        assert_eq!(encode(&json!("s"), &TypeDescriptor::Any), "s");
    }

    #[test]
    fn test_validate_against_passes_valid_value() {
        let mut components = ComponentMetadata::default();
        let schema = schema_for(&TypeDescriptor::Struct(asset()), &mut components).unwrap();
        let value = json!({"id": "a1", "Value": 7});
        assert!(validate_against(&value, &schema, &components).is_ok());
    }

    #[test]
    fn test_validate_against_collects_all_violations() {
        let mut components = ComponentMetadata::default();
        let schema = schema_for(&TypeDescriptor::Struct(asset()), &mut components).unwrap();
        // Missing required "Value" and wrong type plus an extra key.
        let value = json!({"id": 3, "extra": true});
        let err = validate_against(&value, &schema, &components).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("value did not match schema:\n1. "));
        assert!(msg.contains("\n2. "), "should number multiple violations: {msg}");
    }

    #[test]
    fn test_validate_against_scalar_schema() {
        let components = ComponentMetadata::default();
        let schema = json!({"type": "integer"});
        assert!(validate_against(&json!(4), &schema, &components).is_ok());
        assert!(validate_against(&json!("four"), &schema, &components).is_err());
    }
}
