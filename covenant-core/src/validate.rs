//! Recursive representability checks for type descriptors.
//!
//! A type is representable when the serialization layer can carry it:
//! the basic scalar kinds, `Any`, and composites thereof. Callers may
//! allow-list extra descriptors (the error marker, a context type) for
//! the position being checked; slices and map values never inherit the
//! allow-list.

use crate::descriptor::TypeDescriptor;

/// Error returned when a type descriptor is not representable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeValidationError {
    #[error("arrays must have length greater than 0")]
    ZeroLengthArray,
    #[error(
        "type {ty} is not valid. Expected a struct or one of the basic types {basics} or an array/slice/map of these"
    )]
    Unsupported { ty: String, basics: String },
    #[error(
        "type {ty} is not valid. Expected a struct, one of the basic types {basics}, an array/slice/map of these, or one of these additional types {extras}"
    )]
    UnsupportedWithExtras {
        ty: String,
        basics: String,
        extras: String,
    },
}

/// Names of the basic kinds, in listing order.
const BASIC_KINDS: &[&str] = &[
    "any", "bool", "f32", "f64", "i16", "i32", "i64", "i8", "string", "u16", "u32", "u64", "u8",
];

/// Join words into the "a, b and c" sentence form used by error messages.
pub(crate) fn comma_sentence(words: &[String]) -> String {
    match words.len() {
        0 => String::new(),
        1 => words[0].clone(),
        _ => format!(
            "{} and {}",
            words[..words.len() - 1].join(", "),
            words[words.len() - 1]
        ),
    }
}

fn list_basic_kinds() -> String {
    comma_sentence(&BASIC_KINDS.iter().map(|s| (*s).to_string()).collect::<Vec<_>>())
}

fn unsupported(ty: &TypeDescriptor, allowed_extra: &[TypeDescriptor]) -> TypeValidationError {
    if allowed_extra.is_empty() {
        TypeValidationError::Unsupported {
            ty: ty.to_string(),
            basics: list_basic_kinds(),
        }
    } else {
        let extras: Vec<String> = allowed_extra.iter().map(ToString::to_string).collect();
        TypeValidationError::UnsupportedWithExtras {
            ty: ty.to_string(),
            basics: list_basic_kinds(),
            extras: comma_sentence(&extras),
        }
    }
}

fn is_basic(ty: &TypeDescriptor) -> bool {
    matches!(
        ty,
        TypeDescriptor::Bool
            | TypeDescriptor::Int(_)
            | TypeDescriptor::Uint(_)
            | TypeDescriptor::Float32
            | TypeDescriptor::Float64
            | TypeDescriptor::String
            | TypeDescriptor::Any
    )
}

/// Check whether `ty` is representable, treating any descriptor in
/// `allowed_extra` as valid at this level.
pub fn validate_type(
    ty: &TypeDescriptor,
    allowed_extra: &[TypeDescriptor],
) -> Result<(), TypeValidationError> {
    match ty {
        TypeDescriptor::Array { len, elem } => {
            if *len < 1 {
                return Err(TypeValidationError::ZeroLengthArray);
            }
            validate_type(elem, allowed_extra)
        }
        // Error-kind elements are never permitted inside a slice or map
        // value even when allowed at the enclosing level.
        TypeDescriptor::List(elem) => validate_type(elem, &[]),
        TypeDescriptor::Map(value) => validate_type(value, &[]),
        TypeDescriptor::Struct(sd) | TypeDescriptor::Ref(sd)
            if !allowed_extra.contains(ty) =>
        {
            for field in sd.enumerated_fields() {
                validate_type(&field.ty, allowed_extra)?;
            }
            Ok(())
        }
        _ => {
            if is_basic(ty) || allowed_extra.contains(ty) {
                Ok(())
            } else {
                Err(unsupported(ty, allowed_extra))
            }
        }
    }
}
