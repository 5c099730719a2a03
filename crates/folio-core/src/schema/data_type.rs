//! Property data types.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::store::ColumnType;

/// Data type of a property.
///
/// Array and blob storage are flags on [`PropertyLayout`](super::PropertyLayout),
/// not separate data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit unsigned integer.
    Uint32,
    /// 64-bit unsigned integer.
    Uint64,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// UTF-8 string.
    String,
    /// Binary data.
    Blob,
    /// Reference to an instance of another type.
    Reference,
    /// Another type's properties, flattened into this one.
    Nested,
}

impl DataType {
    /// Check if this is a primitive numeric type.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            DataType::Int32
                | DataType::Int64
                | DataType::Uint32
                | DataType::Uint64
                | DataType::Float
                | DataType::Double
        )
    }

    /// Check if values of this type are stored directly in a column.
    pub fn is_value(&self) -> bool {
        self.is_primitive() || matches!(self, DataType::String | DataType::Blob)
    }

    /// Physical column type used to store one value.
    ///
    /// Nested types have no column of their own.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            DataType::Int32 | DataType::Int64 | DataType::Uint32 | DataType::Uint64 => {
                Some(ColumnType::Integer)
            }
            DataType::Float | DataType::Double => Some(ColumnType::Real),
            DataType::String | DataType::Reference => Some(ColumnType::Text),
            DataType::Blob => Some(ColumnType::Blob),
            DataType::Nested => None,
        }
    }

    /// Width in bytes of one element when packed into a primitive blob.
    pub fn byte_width(&self) -> Option<usize> {
        match self {
            DataType::Int32 | DataType::Uint32 | DataType::Float => Some(4),
            DataType::Int64 | DataType::Uint64 | DataType::Double => Some(8),
            _ => None,
        }
    }

    /// Name stored in the `properties` metadata table.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Uint32 => "uint32",
            DataType::Uint64 => "uint64",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::String => "string",
            DataType::Blob => "blob",
            DataType::Reference => "reference",
            DataType::Nested => "nested",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown data type name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown data type \"{0}\"")]
pub struct UnknownDataType(pub String);

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int32" => Ok(DataType::Int32),
            "int64" => Ok(DataType::Int64),
            "uint32" => Ok(DataType::Uint32),
            "uint64" => Ok(DataType::Uint64),
            "float" => Ok(DataType::Float),
            "double" => Ok(DataType::Double),
            "string" => Ok(DataType::String),
            "blob" => Ok(DataType::Blob),
            "reference" => Ok(DataType::Reference),
            "nested" => Ok(DataType::Nested),
            other => Err(UnknownDataType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DataType; 10] = [
        DataType::Int32,
        DataType::Int64,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Float,
        DataType::Double,
        DataType::String,
        DataType::Blob,
        DataType::Reference,
        DataType::Nested,
    ];

    #[test]
    fn test_primitive_checks() {
        assert!(DataType::Int32.is_primitive());
        assert!(DataType::Double.is_primitive());
        assert!(!DataType::String.is_primitive());
        assert!(!DataType::Blob.is_primitive());
        assert!(!DataType::Reference.is_primitive());
        assert!(!DataType::Nested.is_primitive());

        assert!(DataType::String.is_value());
        assert!(DataType::Blob.is_value());
        assert!(!DataType::Reference.is_value());
    }

    #[test]
    fn test_column_types() {
        assert_eq!(DataType::Uint64.column_type(), Some(ColumnType::Integer));
        assert_eq!(DataType::Float.column_type(), Some(ColumnType::Real));
        assert_eq!(DataType::Reference.column_type(), Some(ColumnType::Text));
        assert_eq!(DataType::Blob.column_type(), Some(ColumnType::Blob));
        assert_eq!(DataType::Nested.column_type(), None);
    }

    #[test]
    fn test_names_parse_back() {
        for data_type in ALL {
            assert_eq!(data_type.as_str().parse::<DataType>(), Ok(data_type));
        }
        assert_eq!(
            "int128".parse::<DataType>().unwrap_err().to_string(),
            "unknown data type \"int128\""
        );
    }
}
