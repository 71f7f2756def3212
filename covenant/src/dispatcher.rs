//! Command dispatch: resolve `[namespace:]operation`, run the hook
//! sequence and produce exactly one success or failure response.

use std::sync::Arc;

use serde_json::Value;

use crate::context::TransactionContext;
use crate::error::DispatchError;
use crate::registry::ContractRegistry;

/// Outcome of one dispatch. Failures carry the rendered error message;
/// successes carry the encoded payload, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResponse {
    Success(String),
    Failure(String),
}

impl DispatchResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The payload or message text, whichever this response carries.
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Failure(text) => text,
        }
    }
}

/// Serves dispatches against a finished registry.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ContractRegistry>,
}

impl Dispatcher {
    pub fn new(registry: ContractRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    /// Dispatch one command. The first colon splits namespace from
    /// operation; an unprefixed command targets the default namespace.
    /// Each dispatch runs against a fresh transaction context shared
    /// across the before, main and after phases.
    pub fn dispatch(&self, command: &str, args: &[String]) -> DispatchResponse {
        match self.run(command, args) {
            Ok(payload) => DispatchResponse::Success(payload),
            Err(err) => {
                tracing::warn!(command, error = %err, "dispatch failed");
                DispatchResponse::Failure(err.to_string())
            }
        }
    }

    fn run(&self, command: &str, args: &[String]) -> Result<String, DispatchError> {
        let (ns_name, op_name) = match command.split_once(':') {
            Some(parts) => parts,
            None => (self.registry.default_contract(), command),
        };

        let namespace = self
            .registry
            .namespace(ns_name)
            .ok_or_else(|| DispatchError::ContractNotFound(ns_name.to_string()))?;

        let operation = namespace.operations.get(op_name);
        let mut ctx = TransactionContext::new();

        if let Some(before) = &namespace.before {
            // A before hook's own success value is discarded.
            before.call(&mut ctx, None)?;
            tracing::debug!(command, "before hook completed");
        }

        let (payload, value) = match (operation, &namespace.unknown) {
            (Some(operation), _) => {
                let metadata = self.registry.metadata();
                let supplementary = metadata.transaction(ns_name, op_name);
                operation.call(&mut ctx, args, supplementary, &metadata.components)?
            }
            (None, Some(unknown)) => unknown.call(&mut ctx, None)?,
            (None, None) => {
                return Err(DispatchError::OperationNotFound {
                    operation: op_name.to_string(),
                    contract: ns_name.to_string(),
                })
            }
        };
        tracing::debug!(command, "main invocation completed");

        if let Some(after) = &namespace.after {
            // The after hook sees the main success value (null when
            // there was none); its own success value is discarded, but
            // its error replaces the response.
            let main = value.unwrap_or(Value::Null);
            after.call(&mut ctx, Some(&main))?;
            tracing::debug!(command, "after hook completed");
        }

        Ok(payload)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::contract::{Contract, ContractBase};
    use crate::operation::OperationSpec;
    use covenant_core::TypeDescriptor;
    use serde_json::json;

    struct Echo {
        base: ContractBase,
    }

    impl Echo {
        fn new() -> Self {
            Self {
                base: ContractBase::new(),
            }
        }
    }

    impl Contract for Echo {
        fn base(&self) -> &ContractBase {
            &self.base
        }

        fn operations(&self) -> Vec<OperationSpec> {
            vec![
                OperationSpec::new("Say", |_, args| Ok(args.into_iter().next()))
                    .param(TypeDescriptor::String)
                    .returns(TypeDescriptor::String),
                OperationSpec::new("Fail", |_, _| Err("Some error".into())).returns_error(),
            ]
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            ContractRegistry::builder()
                .contract(&Echo::new())
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_dispatch_with_explicit_namespace() {
        let response = dispatcher().dispatch("Echo:Say", &["hi".to_string()]);
        assert_eq!(response, DispatchResponse::Success("hi".to_string()));
    }

    #[test]
    fn test_dispatch_falls_back_to_default_namespace() {
        let response = dispatcher().dispatch("Say", &["hi".to_string()]);
        assert_eq!(response, DispatchResponse::Success("hi".to_string()));
    }

    #[test]
    fn test_unknown_contract_message() {
        let response = dispatcher().dispatch("nope:Say", &[]);
        assert_eq!(
            response,
            DispatchResponse::Failure("Contract not found with name nope".to_string())
        );
    }

    #[test]
    fn test_unknown_operation_message() {
        let response = dispatcher().dispatch("Echo:Missing", &[]);
        assert_eq!(
            response,
            DispatchResponse::Failure("Function Missing not found in contract Echo".to_string())
        );
    }

    #[test]
    fn test_declared_error_becomes_failure_message() {
        let response = dispatcher().dispatch("Echo:Fail", &[]);
        assert_eq!(response, DispatchResponse::Failure("Some error".to_string()));
    }

    #[test]
    fn test_first_colon_splits_namespace() {
        // Everything after the first colon is the operation name.
        let response = dispatcher().dispatch("Echo:Say:extra", &[]);
        assert_eq!(
            response,
            DispatchResponse::Failure("Function Say:extra not found in contract Echo".to_string())
        );
    }

    #[test]
    fn test_get_metadata_dispatch() {
        let dispatcher = dispatcher();
        let response = dispatcher.dispatch("org.covenant:GetMetadata", &[]);
        assert!(response.is_success());
        let doc: serde_json::Value = serde_json::from_str(response.text()).unwrap();
        assert_eq!(doc["contracts"]["Echo"]["name"], json!("Echo"));
    }
}
