//! Registration and dispatch error types.

use covenant_core::{CodecError, InterfaceMismatch, SchemaError, TypeValidationError};

use crate::handler::HookKind;

/// Error raised while building a registry. Any registration error
/// aborts construction; no partial registry is exposed.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("contract already registered with name {0}")]
    NameConflict(String),

    #[error("contract {contract} declares operation {operation} more than once")]
    DuplicateOperation { contract: String, operation: String },

    #[error("operation {name} contains invalid parameter type. {source}")]
    InvalidParameter {
        name: String,
        source: TypeValidationError,
    },

    #[error(
        "operation {name} must take the transaction context as its first parameter, not parameter {position}"
    )]
    ContextPosition { name: String, position: usize },

    #[error(
        "operation {name} declares a context interface the contract transaction context does not satisfy: {source}"
    )]
    ContextInterface {
        name: String,
        source: InterfaceMismatch,
    },

    #[error("operation {name} contains invalid single return type. {source}")]
    InvalidSingleReturn {
        name: String,
        source: TypeValidationError,
    },

    #[error("operation {name} contains invalid first return type. {source}")]
    InvalidFirstReturn {
        name: String,
        source: TypeValidationError,
    },

    #[error("operation {name} must declare error as its second return type, found {found}")]
    SecondReturnNotError { name: String, found: String },

    #[error("operations may return at most two values. {name} returns {count}")]
    TooManyReturns { name: String, count: usize },

    #[error("the {kind} hook for contract {contract} {detail}")]
    InvalidHook {
        kind: HookKind,
        contract: String,
        detail: String,
    },

    #[error(
        "supplementary metadata for {operation} declares an incorrect number of parameters: expected {expected}, received {received}"
    )]
    SupplementaryParameterCount {
        operation: String,
        expected: usize,
        received: usize,
    },

    #[error("failed to derive schema for {name}: {source}")]
    Schema { name: String, source: SchemaError },

    #[error("default contract {0} is not registered")]
    UnknownDefault(String),
}

/// Error produced by a user operation body: its declared error return.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvocationError(pub String);

impl InvocationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for InvocationError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for InvocationError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Error raised during one dispatch. Every variant renders into the
/// uniform textual failure response.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    // The two resolution messages are fixed wire text relied upon by
    // callers; do not reword them.
    #[error("Contract not found with name {0}")]
    ContractNotFound(String),

    #[error("Function {operation} not found in contract {contract}")]
    OperationNotFound { operation: String, contract: String },

    #[error("incorrect number of arguments: expected {expected}, received {received}")]
    ArgumentCount { expected: usize, received: usize },

    #[error("error converting parameter {name}: {source}")]
    ArgumentConversion { name: String, source: CodecError },

    #[error("error validating parameter {name}: {source}")]
    ArgumentValidation { name: String, source: CodecError },

    #[error("{0}")]
    Invocation(InvocationError),

    // A callable's actual returns disagreed with its validated
    // signature. Surfaced, never swallowed.
    #[error("operation response does not match its declared signature")]
    ResponseShape,
}
