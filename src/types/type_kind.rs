//! The canonical tag for every column type, as recorded in the file footer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a schema node, without its parameters or children.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Binary,
    Timestamp,
    Date,
    Decimal,
    Char,
    Varchar,
    Struct,
    List,
    Map,
}

impl TypeKind {
    /// Returns `true` for the integer family stored with run-length encoding.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }

    /// Returns `true` for kinds whose values are byte strings.
    pub fn is_string_like(&self) -> bool {
        matches!(self, Self::String | Self::Char | Self::Varchar)
    }
}

/// Provides the schema-text keyword for a `TypeKind`.
impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // These string representations are part of the public contract.
        let s = match self {
            Self::Boolean => "boolean",
            Self::Byte => "tinyint",
            Self::Short => "smallint",
            Self::Int => "int",
            Self::Long => "bigint",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Binary => "binary",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::Decimal => "decimal",
            Self::Char => "char",
            Self::Varchar => "varchar",
            Self::Struct => "struct",
            Self::List => "array",
            Self::Map => "map",
        };
        write!(f, "{}", s)
    }
}
