//! Property layouts.

use super::{DataType, TypeId};

/// One named, typed, prospective property of a [`TypeLayout`](super::TypeLayout).
///
/// Immutable once constructed. Two property layouts are equal when their
/// name, data type, reference target and flags are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyLayout {
    name: String,
    data_type: DataType,
    reference_type: Option<TypeId>,
    is_array: bool,
    is_blob: bool,
}

impl PropertyLayout {
    pub(crate) fn new(
        name: impl Into<String>,
        data_type: DataType,
        reference_type: Option<TypeId>,
        is_array: bool,
        is_blob: bool,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            reference_type,
            is_array,
            is_blob,
        }
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Referenced or nested type, set iff the data type is Reference or Nested.
    pub fn reference_type(&self) -> Option<TypeId> {
        self.reference_type
    }

    /// Whether this property holds an ordered array of values.
    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Whether this property is stored as packed bytes in one column.
    pub fn is_blob(&self) -> bool {
        self.is_blob
    }

    /// Check if this is a single reference.
    pub fn is_reference(&self) -> bool {
        self.data_type == DataType::Reference
    }

    /// Check if this is a nested type.
    pub fn is_nested(&self) -> bool {
        self.data_type == DataType::Nested
    }
}

/// Check a property name against `^[a-z][a-z0-9_]*$`.
pub(crate) fn is_valid_property_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_names() {
        assert!(is_valid_property_name("a"));
        assert!(is_valid_property_name("float_value_2"));
        assert!(is_valid_property_name("x_"));

        assert!(!is_valid_property_name(""));
        assert!(!is_valid_property_name("1abc"));
        assert!(!is_valid_property_name("_abc"));
        assert!(!is_valid_property_name("Abc"));
        assert!(!is_valid_property_name("a-b"));
        assert!(!is_valid_property_name("a.b"));
        assert!(!is_valid_property_name("é"));
    }

    #[test]
    fn test_structural_equality() {
        let a = PropertyLayout::new("r", DataType::Reference, Some(TypeId(1)), false, false);
        let b = PropertyLayout::new("r", DataType::Reference, Some(TypeId(1)), false, false);
        let other_target = PropertyLayout::new("r", DataType::Reference, Some(TypeId(2)), false, false);
        let array = PropertyLayout::new("r", DataType::Reference, Some(TypeId(1)), true, false);

        assert_eq!(a, b);
        assert_ne!(a, other_target);
        assert_ne!(a, array);
        assert!(a.is_reference());
        assert!(!a.is_nested());
    }
}
