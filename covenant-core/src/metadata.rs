//! Wire types for the registry's descriptive metadata document.
//!
//! Shapes mirror the serialized form exactly:
//! `{info, contracts: {name: {info, name, transactions}}, components: {schemas}}`.
//! Maps are `BTreeMap` so repeated serializations of the same registry
//! are byte-identical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title and version of a registry or one of its namespaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl Info {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.version.is_empty()
    }
}

/// One parameter of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub name: String,
    pub schema: Value,
}

/// One operation of a namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<String>,
    pub name: String,
}

/// One namespace and its operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractMetadata {
    #[serde(default)]
    pub info: Info,
    pub name: String,
    pub transactions: Vec<TransactionMetadata>,
}

/// Schema for one named composite type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub properties: BTreeMap<String, Value>,
    pub required: Vec<String>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

/// Shared component table; one entry per distinct named struct type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentMetadata {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, ObjectMetadata>,
}

impl ComponentMetadata {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// The full descriptive document for a registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    #[serde(default)]
    pub info: Info,
    #[serde(default)]
    pub contracts: BTreeMap<String, ContractMetadata>,
    #[serde(default)]
    pub components: ComponentMetadata,
}

/// Error parsing a supplementary metadata document.
#[derive(Debug, thiserror::Error)]
#[error("invalid metadata document: {0}")]
pub struct MetadataParseError(#[from] serde_json::Error);

impl RegistryMetadata {
    /// Parse a supplementary document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, MetadataParseError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize the document to compact JSON text.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Overlay this (supplied) document over a reflected one: each
    /// non-empty section of `self` replaces the reflected section
    /// wholesale, empty sections fall back to the reflected content.
    /// Never a per-operation deep merge.
    pub fn overlay(mut self, reflected: RegistryMetadata) -> RegistryMetadata {
        if self.info.is_empty() {
            self.info = reflected.info;
        }
        if self.contracts.is_empty() {
            self.contracts = reflected.contracts;
        }
        if self.components.is_empty() {
            self.components = reflected.components;
        }
        self
    }

    /// Look up the declared metadata for one transaction, if present.
    pub fn transaction(&self, contract: &str, name: &str) -> Option<&TransactionMetadata> {
        self.contracts
            .get(contract)?
            .transactions
            .iter()
            .find(|tx| tx.name == name)
    }
}
