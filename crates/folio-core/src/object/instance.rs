//! Dynamic instance records.

use std::collections::BTreeMap;

use super::{InstanceId, Value};

/// One record of a type, keyed by flattened property path.
///
/// Nested properties use dotted paths (`outer.inner.leaf`). An instance
/// carries the nil id until it is inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
    id: InstanceId,
    values: BTreeMap<String, Value>,
}

impl Instance {
    /// Create an empty, not yet inserted instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(path.into(), value.into());
        self
    }

    /// Set a property value, returning the previous one.
    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(path.into(), value.into())
    }

    /// Get a property value.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.values.get(path)
    }

    /// Remove a property value.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        self.values.remove(path)
    }

    /// Instance id, nil until inserted.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Overwrite the id.
    ///
    /// Resetting to [`InstanceId::nil`] allows inserting a copy.
    pub fn set_id(&mut self, id: InstanceId) {
        self.id = id;
    }

    /// All values by path.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the instance holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut instance = Instance::new()
            .with("a", 0.5f32)
            .with("outer.inner.leaf", "x");

        assert!(!instance.id().is_valid());
        assert_eq!(instance.get("a"), Some(&Value::Float(0.5)));
        assert_eq!(instance.len(), 2);

        let previous = instance.set("a", 1.5f32);
        assert_eq!(previous, Some(Value::Float(0.5)));
        assert_eq!(instance.remove("outer.inner.leaf"), Some(Value::from("x")));
        assert_eq!(instance.values().keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_equality_includes_id() {
        let a = Instance::new().with("b", 4i32);
        let mut b = a.clone();
        assert_eq!(a, b);

        b.set_id(InstanceId::generate());
        assert_ne!(a, b);
    }
}
