use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

/// Typed value storage connecting independent simulation modules.
///
/// Values are keyed by their concrete type: one slot per type, the latest `put`
/// wins.
#[derive(Default, Debug)]
pub struct Bus {
    values: HashMap<TypeId, Box<dyn Any>>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the stored value of type `T`.
    pub fn put<T: 'static>(&mut self, value: T) {
        self.values.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// Like [`get`](Self::get), but a missing value is an error naming the type.
    pub fn require<T: 'static>(&self) -> anyhow::Result<&T> {
        self.get::<T>()
            .ok_or_else(|| anyhow::anyhow!("no {} on the bus", type_name::<T>()))
    }
}
