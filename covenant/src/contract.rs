//! The contract surface: what a type must describe about itself to be
//! registered as a namespace.

use covenant_core::ContextDescriptor;

use crate::handler::HookSpec;
use crate::operation::OperationSpec;

/// Operation names a contract may never declare: `GetMetadata` is
/// claimed by the built-in system namespace, and the registration
/// surface names are excluded so a contract cannot shadow them.
pub const RESERVED_OPERATIONS: &[&str] = &[
    "GetMetadata",
    "base",
    "operations",
    "ignored_operations",
    "evaluate_operations",
    "name",
    "set_name",
    "version",
    "set_version",
    "before",
    "set_before",
    "after",
    "set_after",
    "unknown",
    "set_unknown",
    "context",
    "set_context",
];

/// Per-contract settings shared by every implementation: an optional
/// explicit namespace name, a version string, the lifecycle hooks and
/// the bound transaction context descriptor.
#[derive(Default)]
pub struct ContractBase {
    name: Option<String>,
    version: Option<String>,
    before: Option<HookSpec>,
    after: Option<HookSpec>,
    unknown: Option<HookSpec>,
    context: Option<ContextDescriptor>,
}

impl ContractBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn set_before(&mut self, hook: HookSpec) {
        self.before = Some(hook);
    }

    pub fn before(&self) -> Option<&HookSpec> {
        self.before.as_ref()
    }

    pub fn set_after(&mut self, hook: HookSpec) {
        self.after = Some(hook);
    }

    pub fn after(&self) -> Option<&HookSpec> {
        self.after.as_ref()
    }

    pub fn set_unknown(&mut self, hook: HookSpec) {
        self.unknown = Some(hook);
    }

    pub fn unknown(&self) -> Option<&HookSpec> {
        self.unknown.as_ref()
    }

    pub fn set_context(&mut self, descriptor: ContextDescriptor) {
        self.context = Some(descriptor);
    }

    /// The bound context descriptor, defaulting to the plain base
    /// context when none was set.
    pub fn context(&self) -> ContextDescriptor {
        self.context.clone().unwrap_or_else(ContextDescriptor::base)
    }
}

/// A registrable namespace. Implementations describe their operations
/// explicitly; the registry validates every declaration up front and
/// rejects the whole contract on the first problem.
pub trait Contract {
    /// Shared settings. The default namespace name, when `base().name()`
    /// is `None`, is the implementing type's short name.
    fn base(&self) -> &ContractBase;

    /// Every callable operation, in any order. Names listed by
    /// [`Contract::ignored_operations`] are filtered out before
    /// validation.
    fn operations(&self) -> Vec<OperationSpec>;

    /// Operation names to exclude from registration entirely.
    fn ignored_operations(&self) -> Vec<String> {
        Vec::new()
    }

    /// Operation names tagged read-only instead of state-changing.
    fn evaluate_operations(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Last path segment of a type name, used as the default namespace
/// name for contracts that do not set one explicitly.
pub(crate) fn short_type_name<C: ?Sized>() -> &'static str {
    let full = std::any::type_name::<C>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SimpleContract;

    #[test]
    fn test_short_type_name_strips_path() {
        assert_eq!(short_type_name::<SimpleContract>(), "SimpleContract");
        assert_eq!(short_type_name::<String>(), "String");
    }

    #[test]
    fn test_base_defaults() {
        let base = ContractBase::new();
        assert!(base.name().is_none());
        assert!(base.version().is_none());
        assert!(base.before().is_none());
        assert_eq!(base.context(), ContextDescriptor::base());
    }

    #[test]
    fn test_base_setters() {
        let mut base = ContractBase::new();
        base.set_name("asset");
        base.set_version("2.0.0");
        assert_eq!(base.name(), Some("asset"));
        assert_eq!(base.version(), Some("2.0.0"));
    }
}
