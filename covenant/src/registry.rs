//! Contract registry: builds the immutable namespace table, the
//! metadata document and the built-in system namespace.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use covenant_core::{ContextDescriptor, RegistryMetadata, TypeDescriptor};
use serde_json::Value;

use crate::contract::{short_type_name, Contract, RESERVED_OPERATIONS};
use crate::error::RegistrationError;
use crate::handler::{Hook, HookKind};
use crate::metadata::assemble;
use crate::operation::{CallType, Operation, OperationSpec};

/// Namespace of the built-in system contract.
pub const SYSTEM_NAMESPACE: &str = "org.covenant";

const DEFAULT_CONTRACT_VERSION: &str = "latest";

/// One registered namespace: its operations keyed by name, the
/// lifecycle hooks and the bound context descriptor.
#[derive(Debug)]
pub struct ContractNamespace {
    pub version: String,
    pub operations: BTreeMap<String, Operation>,
    pub before: Option<Hook>,
    pub after: Option<Hook>,
    pub unknown: Option<Hook>,
    pub context: ContextDescriptor,
}

impl ContractNamespace {
    pub fn new(version: impl Into<String>, context: ContextDescriptor) -> Self {
        Self {
            version: version.into(),
            operations: BTreeMap::new(),
            before: None,
            after: None,
            unknown: None,
            context,
        }
    }
}

/// The immutable registry a dispatcher serves. Built once via
/// [`RegistryBuilder`]; registration failures abort construction.
#[derive(Debug)]
pub struct ContractRegistry {
    contracts: BTreeMap<String, ContractNamespace>,
    default_contract: String,
    metadata: RegistryMetadata,
    metadata_json: String,
}

impl ContractRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn namespace(&self, name: &str) -> Option<&ContractNamespace> {
        self.contracts.get(name)
    }

    /// Namespace used when a dispatched command carries no prefix.
    pub fn default_contract(&self) -> &str {
        &self.default_contract
    }

    /// The final descriptive document, supplementary overlay applied.
    pub fn metadata(&self) -> &RegistryMetadata {
        &self.metadata
    }

    /// Compact JSON text of [`ContractRegistry::metadata`], as served
    /// by the system contract's `GetMetadata`.
    pub fn metadata_json(&self) -> &str {
        &self.metadata_json
    }
}

/// Accumulates contracts and settings, then produces a
/// [`ContractRegistry`]. The first registration error is kept and
/// surfaced by [`RegistryBuilder::build`]; later calls become no-ops.
#[derive(Default)]
pub struct RegistryBuilder {
    title: Option<String>,
    version: Option<String>,
    default_contract: Option<String>,
    supplementary: Option<RegistryMetadata>,
    contracts: BTreeMap<String, ContractNamespace>,
    first_registered: Option<String>,
    error: Option<RegistrationError>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document title, "undefined" when never set.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Document version, "latest" when never set.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Override the namespace used for unprefixed commands. Defaults
    /// to the first contract registered.
    pub fn default_contract(mut self, name: impl Into<String>) -> Self {
        self.default_contract = Some(name.into());
        self
    }

    /// Hand-written metadata overlaid over the reflected document.
    /// Non-empty sections replace their reflected counterpart
    /// wholesale.
    pub fn supplementary_metadata(mut self, document: RegistryMetadata) -> Self {
        self.supplementary = Some(document);
        self
    }

    /// Register a contract as one namespace. Name: explicit base name,
    /// else the contract type's short name. Any invalid declaration
    /// rejects the whole contract and poisons the builder.
    pub fn contract<C: Contract>(mut self, contract: &C) -> Self {
        if self.error.is_none() {
            if let Err(err) = self.add_contract(contract) {
                self.error = Some(err);
            }
        }
        self
    }

    fn add_contract<C: Contract>(&mut self, contract: &C) -> Result<(), RegistrationError> {
        let base = contract.base();
        let name = base
            .name()
            .unwrap_or_else(|| short_type_name::<C>())
            .to_string();
        if self.contracts.contains_key(&name) || name == SYSTEM_NAMESPACE {
            return Err(RegistrationError::NameConflict(name));
        }

        let context = base.context();
        let version = base.version().unwrap_or(DEFAULT_CONTRACT_VERSION);
        let mut namespace = ContractNamespace::new(version, context.clone());

        let ignored = contract.ignored_operations();
        let evaluate = contract.evaluate_operations();
        for spec in contract.operations() {
            let skipped = RESERVED_OPERATIONS.contains(&spec.name.as_str())
                || ignored.iter().any(|i| *i == spec.name);
            if skipped {
                continue;
            }
            let call_type = if evaluate.iter().any(|e| *e == spec.name) {
                CallType::Evaluate
            } else {
                CallType::Submit
            };
            let operation = Operation::build(spec, call_type, &context)?;
            let op_name = operation.name.clone();
            if namespace.operations.insert(op_name.clone(), operation).is_some() {
                return Err(RegistrationError::DuplicateOperation {
                    contract: name,
                    operation: op_name,
                });
            }
        }

        if let Some(spec) = base.before() {
            namespace.before =
                Some(Hook::build(spec.clone(), HookKind::Before, &name, &context)?);
        }
        if let Some(spec) = base.after() {
            namespace.after = Some(Hook::build(spec.clone(), HookKind::After, &name, &context)?);
        }
        if let Some(spec) = base.unknown() {
            namespace.unknown =
                Some(Hook::build(spec.clone(), HookKind::Unknown, &name, &context)?);
        }

        tracing::debug!(contract = %name, operations = namespace.operations.len(), "registered contract");
        if self.first_registered.is_none() {
            self.first_registered = Some(name.clone());
        }
        self.contracts.insert(name, namespace);
        Ok(())
    }

    /// Finalize: surface any stored error, inject the system
    /// namespace, reflect the metadata document, overlay the
    /// supplementary one and cross-check its parameter counts.
    pub fn build(self) -> Result<ContractRegistry, RegistrationError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut contracts = self.contracts;

        // The serialized document does not exist until after the system
        // namespace is reflected into it, so its operation reads the
        // text through a slot filled in below.
        let document: Arc<OnceLock<String>> = Arc::new(OnceLock::new());
        let slot = Arc::clone(&document);
        let spec = OperationSpec::new("GetMetadata", move |_, _| {
            Ok(Some(Value::String(
                slot.get().cloned().unwrap_or_default(),
            )))
        })
        .returns(TypeDescriptor::String);
        let system_context = ContextDescriptor::base();
        let get_metadata = Operation::build(spec, CallType::Evaluate, &system_context)?;
        let mut system =
            ContractNamespace::new(DEFAULT_CONTRACT_VERSION, system_context);
        system
            .operations
            .insert(get_metadata.name.clone(), get_metadata);
        contracts.insert(SYSTEM_NAMESPACE.to_string(), system);

        let reflected = assemble(self.title.as_deref(), self.version.as_deref(), &contracts)?;
        let metadata = match self.supplementary {
            Some(supplied) => supplied.overlay(reflected),
            None => reflected,
        };

        for (ns_name, namespace) in &contracts {
            for (op_name, operation) in &namespace.operations {
                if let Some(tx) = metadata.transaction(ns_name, op_name) {
                    let expected = operation.signature.params.len();
                    let received = tx.parameters.len();
                    if received != expected {
                        return Err(RegistrationError::SupplementaryParameterCount {
                            operation: format!("{ns_name}:{op_name}"),
                            expected,
                            received,
                        });
                    }
                }
            }
        }

        let metadata_json = metadata.to_json();
        let _ = document.set(metadata_json.clone());

        let default_contract = match self.default_contract {
            Some(name) => {
                if !contracts.contains_key(&name) {
                    return Err(RegistrationError::UnknownDefault(name));
                }
                name
            }
            None => self.first_registered.unwrap_or_default(),
        };

        Ok(ContractRegistry {
            contracts,
            default_contract,
            metadata,
            metadata_json,
        })
    }
}
