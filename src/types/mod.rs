//! This module defines the core, strongly-typed data representations used
//! throughout the writer.
//!
//! It includes the closed `Value` variant set accepted by both ingestion paths
//! and the `TypeKind` tag recorded for every column in the file footer.

pub mod type_kind;
pub mod value;

// Re-export the main type(s) for easier access.
pub use type_kind::TypeKind;
pub use value::{Decimal, Value};
