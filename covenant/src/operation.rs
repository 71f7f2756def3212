//! Operation descriptors: a callable plus its validated signature.
//!
//! An [`OperationSpec`] is the raw self-description a contract hands to
//! the registry: declared parameter and return descriptors and an
//! erased handler. [`Operation::build`] validates the declaration once,
//! at registration, and produces the descriptor the dispatcher invokes;
//! no re-inspection happens per dispatch.

use std::sync::Arc;

use covenant_core::{
    codec, schema_for, validate_type, ComponentMetadata, ContextDescriptor, ParameterMetadata,
    TransactionMetadata, TypeDescriptor,
};
use serde_json::Value;

use crate::context::TransactionContext;
use crate::error::{DispatchError, InvocationError, RegistrationError};

/// Calling convention of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    /// State-changing; the default.
    Submit,
    /// Read-only.
    Evaluate,
}

impl CallType {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Evaluate => "evaluate",
        }
    }
}

/// Validated return shape of an operation or hook.
#[derive(Debug, Clone, PartialEq)]
pub enum Returns {
    None,
    Value(TypeDescriptor),
    Error,
    ValueAndError(TypeDescriptor),
}

impl Returns {
    pub fn success_type(&self) -> Option<&TypeDescriptor> {
        match self {
            Self::Value(ty) | Self::ValueAndError(ty) => Some(ty),
            Self::None | Self::Error => None,
        }
    }

    pub fn declares_error(&self) -> bool {
        matches!(self, Self::Error | Self::ValueAndError(_))
    }
}

/// Validated signature: non-context parameters in declaration order,
/// whether the callable takes the context (always position 0), and the
/// return shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub uses_context: bool,
    pub params: Vec<TypeDescriptor>,
    pub returns: Returns,
}

/// Outcome of a handler invocation: an optional success value, or the
/// operation's declared error.
pub type InvocationResult = Result<Option<Value>, InvocationError>;

/// Erased callable. Arguments arrive already decoded to the shapes the
/// signature declares, in declaration order.
pub type OperationHandler =
    Arc<dyn Fn(&mut TransactionContext, Vec<Value>) -> InvocationResult + Send + Sync>;

/// Self-description of one operation, as declared by a contract.
#[derive(Clone)]
pub struct OperationSpec {
    pub name: String,
    pub params: Vec<TypeDescriptor>,
    pub returns: Vec<TypeDescriptor>,
    pub handler: OperationHandler,
}

impl OperationSpec {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut TransactionContext, Vec<Value>) -> InvocationResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Declare the next parameter.
    pub fn param(mut self, ty: TypeDescriptor) -> Self {
        self.params.push(ty);
        self
    }

    /// Declare a leading transaction context parameter.
    pub fn context(mut self, descriptor: ContextDescriptor) -> Self {
        self.params.push(TypeDescriptor::Context(Arc::new(descriptor)));
        self
    }

    /// Declare the next return.
    pub fn returns(mut self, ty: TypeDescriptor) -> Self {
        self.returns.push(ty);
        self
    }

    /// Declare a trailing error return.
    pub fn returns_error(mut self) -> Self {
        self.returns.push(TypeDescriptor::Error);
        self
    }
}

/// A registered operation: name, convention, validated signature and
/// the exclusively-owned callable.
pub struct Operation {
    pub name: String,
    pub call_type: CallType,
    pub signature: Signature,
    handler: OperationHandler,
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("call_type", &self.call_type)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl Operation {
    /// Validate a declared spec against the contract's bound context
    /// descriptor. The first invalid parameter or return aborts.
    pub fn build(
        spec: OperationSpec,
        call_type: CallType,
        context: &ContextDescriptor,
    ) -> Result<Self, RegistrationError> {
        let name = spec.name;
        let mut uses_context = false;
        let mut params = Vec::new();

        for (position, ty) in spec.params.into_iter().enumerate() {
            let type_error = validate_type(&ty, &[]).err();
            let mut is_context =
                matches!(&ty, TypeDescriptor::Context(cd) if cd.as_ref() == context);

            // An interface parameter may stand in for the context when
            // the context structurally satisfies it; the position rule
            // below still applies.
            if type_error.is_some() && !is_context {
                if let TypeDescriptor::Interface(iface) = &ty {
                    context.satisfies(iface).map_err(|source| {
                        RegistrationError::ContextInterface {
                            name: name.clone(),
                            source,
                        }
                    })?;
                    is_context = true;
                }
            }

            if let (Some(source), false) = (type_error, is_context) {
                return Err(RegistrationError::InvalidParameter {
                    name: name.clone(),
                    source,
                });
            }
            if is_context && position != 0 {
                return Err(RegistrationError::ContextPosition {
                    name: name.clone(),
                    position,
                });
            }
            if is_context {
                uses_context = true;
            } else {
                params.push(ty);
            }
        }

        let returns = parse_returns(&name, &spec.returns)?;

        Ok(Self {
            name,
            call_type,
            signature: Signature {
                uses_context,
                params,
                returns,
            },
            handler: spec.handler,
        })
    }

    /// Decode `args`, validate them against supplementary metadata when
    /// declared, invoke the callable, and encode the success value.
    /// Returns the encoded payload together with the raw success value
    /// (handed to an after hook).
    pub fn call(
        &self,
        ctx: &mut TransactionContext,
        args: &[String],
        supplementary: Option<&TransactionMetadata>,
        components: &ComponentMetadata,
    ) -> Result<(String, Option<Value>), DispatchError> {
        let expected = self.signature.params.len();
        if args.len() < expected {
            return Err(DispatchError::ArgumentCount {
                expected,
                received: args.len(),
            });
        }

        let mut decoded = Vec::with_capacity(expected);
        for (index, ty) in self.signature.params.iter().enumerate() {
            let declared = supplementary.and_then(|tx| tx.parameters.get(index));
            let param_name = declared
                .map(|p| p.name.clone())
                .unwrap_or_else(|| format!("param{index}"));

            let value = codec::decode(ty, &args[index]).map_err(|source| {
                DispatchError::ArgumentConversion {
                    name: param_name.clone(),
                    source,
                }
            })?;

            if let Some(ParameterMetadata { schema, .. }) = declared {
                codec::validate_against(&value, schema, components).map_err(|source| {
                    DispatchError::ArgumentValidation {
                        name: param_name,
                        source,
                    }
                })?;
            }
            decoded.push(value);
        }

        let outcome = (self.handler)(ctx, decoded);
        self.shape_response(outcome)
    }

    fn shape_response(
        &self,
        outcome: InvocationResult,
    ) -> Result<(String, Option<Value>), DispatchError> {
        match outcome {
            Err(err) if self.signature.returns.declares_error() => {
                Err(DispatchError::Invocation(err))
            }
            Err(_) => Err(DispatchError::ResponseShape),
            Ok(value) => match (self.signature.returns.success_type(), value) {
                (None, None) => Ok((String::new(), None)),
                (Some(ty), Some(value)) => {
                    let payload = codec::encode(&value, ty);
                    Ok((payload, Some(value)))
                }
                _ => Err(DispatchError::ResponseShape),
            },
        }
    }

    /// Reflect this operation into its metadata entry, registering any
    /// named composite types into the shared component table.
    pub fn reflect(
        &self,
        components: &mut ComponentMetadata,
    ) -> Result<TransactionMetadata, RegistrationError> {
        let mut parameters = Vec::with_capacity(self.signature.params.len());
        for (index, ty) in self.signature.params.iter().enumerate() {
            let schema =
                schema_for(ty, components).map_err(|source| RegistrationError::Schema {
                    name: self.name.clone(),
                    source,
                })?;
            parameters.push(ParameterMetadata {
                description: None,
                name: format!("param{index}"),
                schema,
            });
        }

        let returns = match self.signature.returns.success_type() {
            Some(ty) => Some(schema_for(ty, components).map_err(|source| {
                RegistrationError::Schema {
                    name: self.name.clone(),
                    source,
                }
            })?),
            None => None,
        };

        Ok(TransactionMetadata {
            parameters,
            returns,
            tag: vec![self.call_type.tag().to_string()],
            name: self.name.clone(),
        })
    }
}

/// Validate a declared return list into a [`Returns`] shape. Shared by
/// operations and hooks: at most two returns, the second exactly the
/// error marker, the error marker allowed alone but never first of two.
pub(crate) fn parse_returns(
    name: &str,
    declared: &[TypeDescriptor],
) -> Result<Returns, RegistrationError> {
    match declared {
        [] => Ok(Returns::None),
        [only] => {
            validate_type(only, &[TypeDescriptor::Error]).map_err(|source| {
                RegistrationError::InvalidSingleReturn {
                    name: name.to_string(),
                    source,
                }
            })?;
            if *only == TypeDescriptor::Error {
                Ok(Returns::Error)
            } else {
                Ok(Returns::Value(only.clone()))
            }
        }
        [first, second] => {
            validate_type(first, &[]).map_err(|source| RegistrationError::InvalidFirstReturn {
                name: name.to_string(),
                source,
            })?;
            if *second != TypeDescriptor::Error {
                return Err(RegistrationError::SecondReturnNotError {
                    name: name.to_string(),
                    found: second.to_string(),
                });
            }
            Ok(Returns::ValueAndError(first.clone()))
        }
        more => Err(RegistrationError::TooManyReturns {
            name: name.to_string(),
            count: more.len(),
        }),
    }
}
