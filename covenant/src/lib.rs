//! covenant - an operation registry and schema-driven dispatcher.
//!
//! Contracts describe their operations explicitly; the registry
//! validates every declaration up front, derives a JSON metadata
//! document for the whole surface, and the dispatcher routes
//! `[namespace:]operation` commands through the per-contract lifecycle
//! hooks with schema-checked arguments.
//!
//! ```
//! use covenant::{Contract, ContractBase, ContractRegistry, Dispatcher, OperationSpec};
//! use covenant_core::TypeDescriptor;
//!
//! struct Greeter { base: ContractBase }
//!
//! impl Contract for Greeter {
//!     fn base(&self) -> &ContractBase { &self.base }
//!
//!     fn operations(&self) -> Vec<OperationSpec> {
//!         vec![OperationSpec::new("Greet", |_, args| {
//!             let name = args[0].as_str().unwrap_or_default();
//!             Ok(Some(format!("hello {name}").into()))
//!         })
//!         .param(TypeDescriptor::String)
//!         .returns(TypeDescriptor::String)]
//!     }
//! }
//!
//! let registry = ContractRegistry::builder()
//!     .contract(&Greeter { base: ContractBase::new() })
//!     .build()
//!     .unwrap();
//! let dispatcher = Dispatcher::new(registry);
//! let response = dispatcher.dispatch("Greeter:Greet", &["world".to_string()]);
//! assert_eq!(response.text(), "hello world");
//! ```

pub mod context;
pub mod contract;
pub mod dispatcher;
pub mod error;
pub mod handler;
mod metadata;
pub mod operation;
pub mod registry;

pub use context::TransactionContext;
pub use contract::{Contract, ContractBase, RESERVED_OPERATIONS};
pub use dispatcher::{DispatchResponse, Dispatcher};
pub use error::{DispatchError, InvocationError, RegistrationError};
pub use handler::{Hook, HookKind, HookResult, HookSpec};
pub use operation::{
    CallType, InvocationResult, Operation, OperationSpec, Returns, Signature,
};
pub use registry::{ContractNamespace, ContractRegistry, RegistryBuilder, SYSTEM_NAMESPACE};
