//! Per-dispatch transaction context.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// State threaded through one dispatch: the before hook, the operation
/// (or unknown hook) and the after hook all receive the same instance
/// and can exchange values through it by type.
///
/// A fresh context is allocated per dispatch; nothing in it outlives
/// the response.
#[derive(Default)]
pub struct TransactionContext {
    values: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl TransactionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous value of the same type.
    pub fn insert<T: Send + 'static>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|prev| prev.downcast().ok())
            .map(|boxed| *boxed)
    }

    pub fn get<T: Send + 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: Send + 'static>(&mut self) -> Option<&mut T> {
        self.values
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    pub fn remove<T: Send + 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|boxed| *boxed)
    }
}
