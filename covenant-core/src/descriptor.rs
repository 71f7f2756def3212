//! Runtime type descriptors for operation signatures.
//!
//! A [`TypeDescriptor`] is the registry's view of a parameter or return
//! type: enough structure to validate it, derive a JSON schema for it,
//! and drive text-to-value conversion. Descriptors are built once at
//! registration, either by hand or through the [`Described`] trait.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Bit width of a signed or unsigned integer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }
}

/// Shape of a value as seen by the registry.
///
/// `Map` is string-keyed by construction; a non-string key type is
/// unrepresentable rather than checked at validation time.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Bool,
    Int(IntWidth),
    Uint(IntWidth),
    Float32,
    Float64,
    String,
    /// Fixed-length array.
    Array {
        len: usize,
        elem: Box<TypeDescriptor>,
    },
    /// Growable sequence.
    List(Box<TypeDescriptor>),
    /// String-keyed map over the value type.
    Map(Box<TypeDescriptor>),
    Struct(Arc<StructDescriptor>),
    /// Reference to a struct; accepts `null` on the wire.
    Ref(Arc<StructDescriptor>),
    /// A transaction context parameter.
    Context(Arc<ContextDescriptor>),
    /// The error marker, only permitted where a caller allow-lists it.
    Error,
    /// Accepts any value.
    Any,
    /// A named interface; only valid where structurally satisfied by the
    /// transaction context.
    Interface(Arc<InterfaceDescriptor>),
}

impl TypeDescriptor {
    /// Descriptor for a Rust type implementing [`Described`].
    pub fn of<T: Described>() -> Self {
        T::descriptor()
    }

    /// Kinds that carry an "absent" state and encode to empty text when null.
    pub fn is_nilable(&self) -> bool {
        matches!(
            self,
            Self::Ref(_) | Self::Any | Self::Interface(_) | Self::Map(_) | Self::List(_)
        )
    }

    /// Kinds whose text form is structured JSON.
    pub fn is_marshalling(&self) -> bool {
        matches!(
            self,
            Self::Array { .. } | Self::List(_) | Self::Map(_) | Self::Struct(_) | Self::Ref(_)
        )
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int(w) => write!(f, "i{}", w.bits()),
            Self::Uint(w) => write!(f, "u{}", w.bits()),
            Self::Float32 => write!(f, "f32"),
            Self::Float64 => write!(f, "f64"),
            Self::String => write!(f, "string"),
            Self::Array { len, elem } => write!(f, "[{elem}; {len}]"),
            Self::List(elem) => write!(f, "Vec<{elem}>"),
            Self::Map(value) => write!(f, "Map<string, {value}>"),
            Self::Struct(sd) => write!(f, "{}", sd.name),
            Self::Ref(sd) => write!(f, "&{}", sd.name),
            Self::Context(cd) => write!(f, "{}", cd.name),
            Self::Error => write!(f, "error"),
            Self::Any => write!(f, "any"),
            Self::Interface(id) => write!(f, "{}", id.name),
        }
    }
}

/// A named composite type with ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl StructDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Fields that participate in validation and schema generation:
    /// the leading run of exported fields. Enumeration halts at the
    /// first non-exported field, it does not skip it.
    pub fn enumerated_fields(&self) -> &[FieldDescriptor] {
        let end = self
            .fields
            .iter()
            .position(|f| !f.exported)
            .unwrap_or(self.fields.len());
        &self.fields[..end]
    }
}

/// One struct field. `rename` is the serialization alias, when declared.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub rename: Option<String>,
    pub exported: bool,
    pub ty: TypeDescriptor,
}

impl FieldDescriptor {
    pub fn exported(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            rename: None,
            exported: true,
            ty,
        }
    }

    pub fn private(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            rename: None,
            exported: false,
            ty,
        }
    }

    pub fn with_rename(mut self, rename: impl Into<String>) -> Self {
        self.rename = Some(rename.into());
        self
    }

    /// Name used in schemas and on the wire.
    pub fn wire_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }
}

/// Signature of one method declared by an interface or context.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<TypeDescriptor>,
    pub returns: Vec<TypeDescriptor>,
}

impl MethodDescriptor {
    pub fn new(
        name: impl Into<String>,
        params: Vec<TypeDescriptor>,
        returns: Vec<TypeDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
        }
    }
}

/// A named method set an operation may demand instead of the concrete
/// context type.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDescriptor {
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
}

impl InterfaceDescriptor {
    pub fn new(name: impl Into<String>, methods: Vec<MethodDescriptor>) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }
}

/// Why a context fails to satisfy an interface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterfaceMismatch {
    #[error("context is missing method {0}")]
    MissingMethod(String),
    #[error("method {0} does not match the interface signature")]
    SignatureMismatch(String),
}

/// Registration-time description of a transaction context type.
///
/// The runtime context is always the dispatcher's own per-dispatch
/// instance; this descriptor only names the bound context and declares
/// the methods available for structural interface checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextDescriptor {
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
}

impl ContextDescriptor {
    pub fn new(name: impl Into<String>, methods: Vec<MethodDescriptor>) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }

    /// The default context bound to contracts that do not override it.
    pub fn base() -> Self {
        Self::new("TransactionContext", Vec::new())
    }

    /// Structural satisfaction check, performed once at registration.
    /// Every interface method must exist here with the same name,
    /// parameter types and return types; the error names the first
    /// unmet or mismatched method.
    pub fn satisfies(&self, iface: &InterfaceDescriptor) -> Result<(), InterfaceMismatch> {
        for wanted in &iface.methods {
            match self.methods.iter().find(|m| m.name == wanted.name) {
                None => return Err(InterfaceMismatch::MissingMethod(wanted.name.clone())),
                Some(have) => {
                    if have.params != wanted.params || have.returns != wanted.returns {
                        return Err(InterfaceMismatch::SignatureMismatch(wanted.name.clone()));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Types that can describe their own shape to the registry.
pub trait Described {
    fn descriptor() -> TypeDescriptor;
}

macro_rules! describe_primitive {
    ($($ty:ty => $desc:expr),* $(,)?) => {
        $(impl Described for $ty {
            fn descriptor() -> TypeDescriptor {
                $desc
            }
        })*
    };
}

describe_primitive! {
    bool => TypeDescriptor::Bool,
    i8 => TypeDescriptor::Int(IntWidth::W8),
    i16 => TypeDescriptor::Int(IntWidth::W16),
    i32 => TypeDescriptor::Int(IntWidth::W32),
    i64 => TypeDescriptor::Int(IntWidth::W64),
    u8 => TypeDescriptor::Uint(IntWidth::W8),
    u16 => TypeDescriptor::Uint(IntWidth::W16),
    u32 => TypeDescriptor::Uint(IntWidth::W32),
    u64 => TypeDescriptor::Uint(IntWidth::W64),
    f32 => TypeDescriptor::Float32,
    f64 => TypeDescriptor::Float64,
    String => TypeDescriptor::String,
    serde_json::Value => TypeDescriptor::Any,
}

impl<T: Described, const N: usize> Described for [T; N] {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Array {
            len: N,
            elem: Box::new(T::descriptor()),
        }
    }
}

impl<T: Described> Described for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::List(Box::new(T::descriptor()))
    }
}

impl<T: Described> Described for HashMap<String, T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Map(Box::new(T::descriptor()))
    }
}

impl<T: Described> Described for BTreeMap<String, T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Map(Box::new(T::descriptor()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        let ty = TypeDescriptor::Array {
            len: 3,
            elem: Box::new(TypeDescriptor::List(Box::new(TypeDescriptor::Uint(
                IntWidth::W16,
            )))),
        };
        assert_eq!(ty.to_string(), "[Vec<u16>; 3]");
        assert_eq!(
            TypeDescriptor::Map(Box::new(TypeDescriptor::Bool)).to_string(),
            "Map<string, bool>"
        );
    }

    #[test]
    fn test_described_maps_to_descriptors() {
        assert_eq!(
            TypeDescriptor::of::<Vec<String>>(),
            TypeDescriptor::List(Box::new(TypeDescriptor::String))
        );
        assert_eq!(TypeDescriptor::of::<[i32; 4]>(), {
            TypeDescriptor::Array {
                len: 4,
                elem: Box::new(TypeDescriptor::Int(IntWidth::W32)),
            }
        });
        assert_eq!(
            TypeDescriptor::of::<HashMap<String, f64>>(),
            TypeDescriptor::Map(Box::new(TypeDescriptor::Float64))
        );
        assert_eq!(
            TypeDescriptor::of::<BTreeMap<String, serde_json::Value>>(),
            TypeDescriptor::Map(Box::new(TypeDescriptor::Any))
        );
    }

    #[test]
    fn test_enumerated_fields_halt_at_private() {
        let sd = StructDescriptor::new(
            "Sample",
            vec![
                FieldDescriptor::exported("First", TypeDescriptor::String),
                FieldDescriptor::private("hidden", TypeDescriptor::Bool),
                FieldDescriptor::exported("Second", TypeDescriptor::Bool),
            ],
        );
        let names: Vec<&str> = sd.enumerated_fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["First"]);
    }

    #[test]
    fn test_context_satisfies_interface() {
        let ctx = ContextDescriptor::new(
            "LedgerContext",
            vec![
                MethodDescriptor::new("put", vec![TypeDescriptor::String], vec![]),
                MethodDescriptor::new("get", vec![TypeDescriptor::String], vec![TypeDescriptor::String]),
            ],
        );
        let ok = InterfaceDescriptor::new(
            "Getter",
            vec![MethodDescriptor::new(
                "get",
                vec![TypeDescriptor::String],
                vec![TypeDescriptor::String],
            )],
        );
        assert!(ctx.satisfies(&ok).is_ok());

        let missing = InterfaceDescriptor::new(
            "Deleter",
            vec![MethodDescriptor::new("delete", vec![TypeDescriptor::String], vec![])],
        );
        assert_eq!(
            ctx.satisfies(&missing),
            Err(InterfaceMismatch::MissingMethod("delete".into()))
        );

        let mismatched = InterfaceDescriptor::new(
            "BadGetter",
            vec![MethodDescriptor::new(
                "get",
                vec![TypeDescriptor::Bool],
                vec![TypeDescriptor::String],
            )],
        );
        assert_eq!(
            ctx.satisfies(&mismatched),
            Err(InterfaceMismatch::SignatureMismatch("get".into()))
        );
    }
}
