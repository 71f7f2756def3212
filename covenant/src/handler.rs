//! Lifecycle hooks: before, after and unknown-operation handlers.
//!
//! Hooks are declared like operations but with a restricted signature.
//! Before and unknown hooks take no parameters beyond the optional
//! context. After hooks may additionally take a single dynamic value,
//! which receives the main invocation's success value (JSON null when
//! there was none). Return shapes follow the operation rules.

use std::fmt;
use std::sync::Arc;

use covenant_core::{ContextDescriptor, TypeDescriptor};
use serde_json::Value;

use crate::context::TransactionContext;
use crate::error::{DispatchError, InvocationError, RegistrationError};
use crate::operation::{parse_returns, Returns};

/// Which lifecycle slot a hook occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Before,
    After,
    Unknown,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Unknown => "unknown",
        })
    }
}

/// Outcome of a hook invocation.
pub type HookResult = Result<Option<Value>, InvocationError>;

/// Erased hook callable. The second argument is the main invocation's
/// success value, passed only to after hooks that declared it.
pub type HookHandler =
    Arc<dyn Fn(&mut TransactionContext, Option<&Value>) -> HookResult + Send + Sync>;

/// Self-description of one hook, as declared by a contract.
#[derive(Clone)]
pub struct HookSpec {
    pub params: Vec<TypeDescriptor>,
    pub returns: Vec<TypeDescriptor>,
    pub handler: HookHandler,
}

impl HookSpec {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut TransactionContext, Option<&Value>) -> HookResult + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            returns: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Declare a leading transaction context parameter.
    pub fn context(mut self, descriptor: ContextDescriptor) -> Self {
        self.params.push(TypeDescriptor::Context(Arc::new(descriptor)));
        self
    }

    /// Declare the dynamic value parameter (after hooks only).
    pub fn value(mut self) -> Self {
        self.params.push(TypeDescriptor::Any);
        self
    }

    pub fn returns(mut self, ty: TypeDescriptor) -> Self {
        self.returns.push(ty);
        self
    }

    pub fn returns_error(mut self) -> Self {
        self.returns.push(TypeDescriptor::Error);
        self
    }
}

/// A registered hook with a validated signature.
pub struct Hook {
    pub kind: HookKind,
    pub takes_value: bool,
    pub returns: Returns,
    handler: HookHandler,
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("kind", &self.kind)
            .field("takes_value", &self.takes_value)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

impl Hook {
    /// Validate a declared hook spec. The permitted parameter shapes
    /// are [] and [context], plus [value], [context, value] for after
    /// hooks.
    pub fn build(
        spec: HookSpec,
        kind: HookKind,
        contract: &str,
        context: &ContextDescriptor,
    ) -> Result<Self, RegistrationError> {
        let invalid = |detail: &str| RegistrationError::InvalidHook {
            kind,
            contract: contract.to_string(),
            detail: detail.to_string(),
        };

        let mut takes_value = false;
        for (position, ty) in spec.params.iter().enumerate() {
            match ty {
                TypeDescriptor::Context(cd) if cd.as_ref() == context => {
                    if position != 0 {
                        return Err(invalid(
                            "must take the transaction context as its first parameter",
                        ));
                    }
                }
                TypeDescriptor::Any if kind == HookKind::After => {
                    if takes_value {
                        return Err(invalid("may take at most one dynamic value parameter"));
                    }
                    takes_value = true;
                }
                TypeDescriptor::Any => {
                    return Err(invalid("may not take a value parameter"));
                }
                other => {
                    return Err(invalid(&format!(
                        "may not take a parameter of type {other}"
                    )));
                }
            }
        }

        let returns = parse_returns(&kind.to_string(), &spec.returns)
            .map_err(|err| invalid(&return_detail(err)))?;

        Ok(Self {
            kind,
            takes_value,
            returns,
            handler: spec.handler,
        })
    }

    /// Invoke the hook. `main_value` is the success value of the main
    /// invocation, forwarded only when the hook declared the dynamic
    /// value parameter.
    pub fn call(
        &self,
        ctx: &mut TransactionContext,
        main_value: Option<&Value>,
    ) -> Result<(String, Option<Value>), DispatchError> {
        let forwarded = if self.takes_value { main_value } else { None };
        let outcome = (self.handler)(ctx, forwarded);
        match outcome {
            Err(err) if self.returns.declares_error() => Err(DispatchError::Invocation(err)),
            Err(_) => Err(DispatchError::ResponseShape),
            Ok(value) => match (self.returns.success_type(), value) {
                (None, None) => Ok((String::new(), None)),
                (Some(ty), Some(value)) => {
                    let payload = covenant_core::encode(&value, ty);
                    Ok((payload, Some(value)))
                }
                _ => Err(DispatchError::ResponseShape),
            },
        }
    }
}

/// Rephrase a return-shape error in terms of the hook itself, without
/// the operation-style "operation <name>" prefix.
fn return_detail(err: RegistrationError) -> String {
    match err {
        RegistrationError::InvalidSingleReturn { source, .. } => {
            format!("declares an invalid single return type. {source}")
        }
        RegistrationError::InvalidFirstReturn { source, .. } => {
            format!("declares an invalid first return type. {source}")
        }
        RegistrationError::SecondReturnNotError { found, .. } => {
            format!("must declare error as its second return type, found {found}")
        }
        RegistrationError::TooManyReturns { count, .. } => {
            format!("may return at most two values, declares {count}")
        }
        other => other.to_string(),
    }
}
