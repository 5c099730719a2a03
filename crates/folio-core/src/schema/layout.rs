//! Type layouts: builder-style declarations of prospective types.

use crate::error::{Result, SchemaError};
use crate::library::Library;

use super::property::is_valid_property_name;
use super::{DataType, NamespaceId, PropertyLayout, Type, TypeId};

/// Result of committing a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new type was created.
    Created,
    /// A type with the same name and an equal layout already existed.
    Existed,
}

/// An ordered, uncommitted collection of properties.
///
/// Layouts are built with the `create_*` methods and turned into a [`Type`]
/// by [`commit`](Self::commit). Two layouts are equal when their property
/// sequences are pairwise equal; committing an equal layout under an
/// existing name is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeLayout {
    properties: Vec<PropertyLayout>,
}

impl TypeLayout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> &[PropertyLayout] {
        &self.properties
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyLayout> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if the layout has no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Add a primitive numeric property.
    pub fn create_primitive(&mut self, name: &str, data_type: DataType) -> Result<&mut Self> {
        require_primitive(name, data_type)?;
        self.add(PropertyLayout::new(name, data_type, None, false, false))
    }

    /// Add an array of a primitive numeric kind, stored in a sub-table.
    pub fn create_primitive_array(&mut self, name: &str, data_type: DataType) -> Result<&mut Self> {
        require_primitive(name, data_type)?;
        self.add(PropertyLayout::new(name, data_type, None, true, false))
    }

    /// Add an array of a primitive numeric kind, packed into one binary column.
    pub fn create_primitive_blob(&mut self, name: &str, data_type: DataType) -> Result<&mut Self> {
        require_primitive(name, data_type)?;
        self.add(PropertyLayout::new(name, data_type, None, false, true))
    }

    /// Add a string property.
    pub fn create_string(&mut self, name: &str) -> Result<&mut Self> {
        self.add(PropertyLayout::new(name, DataType::String, None, false, false))
    }

    /// Add a string array property.
    pub fn create_string_array(&mut self, name: &str) -> Result<&mut Self> {
        self.add(PropertyLayout::new(name, DataType::String, None, true, false))
    }

    /// Add a binary property.
    pub fn create_blob(&mut self, name: &str) -> Result<&mut Self> {
        self.add(PropertyLayout::new(name, DataType::Blob, None, false, false))
    }

    /// Add a binary array property.
    pub fn create_blob_array(&mut self, name: &str) -> Result<&mut Self> {
        self.add(PropertyLayout::new(name, DataType::Blob, None, true, false))
    }

    /// Add a reference to an instance of `target`.
    ///
    /// Deleting the referenced instance nulls the reference.
    pub fn create_reference(&mut self, name: &str, target: &Type) -> Result<&mut Self> {
        require_instantiable(name, target)?;
        self.add(PropertyLayout::new(
            name,
            DataType::Reference,
            Some(target.id()),
            false,
            false,
        ))
    }

    /// Add an ordered array of references to instances of `target`.
    ///
    /// Deleting a referenced instance removes it from every array.
    pub fn create_reference_array(&mut self, name: &str, target: &Type) -> Result<&mut Self> {
        require_instantiable(name, target)?;
        self.add(PropertyLayout::new(
            name,
            DataType::Reference,
            Some(target.id()),
            true,
            false,
        ))
    }

    /// Embed the properties of `target` under `name.`.
    pub fn create_nested(&mut self, name: &str, target: &Type) -> Result<&mut Self> {
        self.add(PropertyLayout::new(
            name,
            DataType::Nested,
            Some(target.id()),
            false,
            false,
        ))
    }

    /// Commit this layout as type `name` in `namespace`.
    ///
    /// Returns [`CommitOutcome::Existed`] with the existing type id when the
    /// namespace already holds an equal type under this name.
    pub fn commit(
        &self,
        library: &mut Library,
        namespace: NamespaceId,
        name: &str,
        instantiable: bool,
    ) -> Result<(CommitOutcome, TypeId)> {
        super::commit::commit(library, namespace, name, self, instantiable)
    }

    /// Append a property rebuilt from metadata, skipping builder validation.
    pub(crate) fn push(&mut self, property: PropertyLayout) {
        self.properties.push(property);
    }

    fn add(&mut self, property: PropertyLayout) -> Result<&mut Self> {
        if !is_valid_property_name(property.name()) {
            return Err(SchemaError::InvalidPropertyName {
                name: property.name().to_string(),
            }
            .into());
        }
        if self.property(property.name()).is_some() {
            return Err(SchemaError::DuplicateProperty {
                name: property.name().to_string(),
            }
            .into());
        }
        self.properties.push(property);
        Ok(self)
    }
}

fn require_primitive(name: &str, data_type: DataType) -> Result<()> {
    if data_type.is_primitive() {
        Ok(())
    } else {
        Err(SchemaError::NotPrimitive {
            name: name.to_string(),
            data_type,
        }
        .into())
    }
}

fn require_instantiable(name: &str, target: &Type) -> Result<()> {
    if target.is_instantiable() {
        Ok(())
    } else {
        Err(SchemaError::NotInstantiable {
            name: name.to_string(),
            target: target.qualified_name(),
        }
        .into())
    }
}
