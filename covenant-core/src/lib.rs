//! covenant-core - data model for the covenant operation registry.
//!
//! This crate holds everything that is pure data or a stateless
//! algorithm over it: runtime type descriptors, representability
//! validation, JSON schema derivation with a shared component table,
//! the text ⇄ value argument codec, and the metadata document wire
//! types with their overlay semantics. The registry, dispatcher and
//! contract surface live in the `covenant` crate.

pub mod codec;
pub mod descriptor;
pub mod metadata;
pub mod schema;
pub mod validate;

pub use codec::{decode, encode, validate_against, CodecError};
pub use descriptor::{
    ContextDescriptor, Described, FieldDescriptor, IntWidth, InterfaceDescriptor,
    InterfaceMismatch, MethodDescriptor, StructDescriptor, TypeDescriptor,
};
pub use metadata::{
    ComponentMetadata, ContractMetadata, Info, MetadataParseError, ObjectMetadata,
    ParameterMetadata, RegistryMetadata, TransactionMetadata,
};
pub use schema::{schema_for, SchemaError};
pub use validate::{validate_type, TypeValidationError};
