//! This file is the root of the `stripe_writer` Rust crate.
//!
//! `stripe_writer` writes columnar files in an ORC-style layout: rows are
//! buffered per column, cut into stripes, encoded with run-length and
//! dictionary kernels, optionally compressed, and closed by a footer and a
//! fixed-size postscript.
//!
//! The container borrows ORC's stripe and stream layout and its `"ORC"` magic,
//! but it is not ORC-compatible: footers are JSON documents and the postscript
//! is an 18-byte little-endian record. Read these files with `format::read_tail`,
//! not with an ORC reader.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`writer`, `kernels`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types a caller needs to write a file.
//!
//! ```
//! use stripe_writer::{Value, Writer, WriterConfig};
//!
//! let mut writer = Writer::from_schema_text(
//!     Vec::new(),
//!     "struct<id:int,name:string>",
//!     WriterConfig::default(),
//! )?;
//! writer.write(&[Value::Int(1), Value::from("ada")])?;
//! writer.close()?;
//! let bytes = writer.into_inner();
//! assert_eq!(&bytes[..3], b"ORC");
//! # Ok::<(), stripe_writer::OrcError>(())
//! ```

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod codec;
pub mod column;
pub mod config;
pub mod encoding;
pub mod format;
pub mod kernels;
pub mod schema;
pub mod stripe;
pub mod types;
pub mod writer;

mod error;
mod traits;

//==================================================================================
// 2. Public Surface
//==================================================================================
#[doc(hidden)]
pub use log as __log;

pub use config::{CompressionConfig, CompressionKind, WriterConfig};
pub use error::OrcError;
pub use observability::init_logging;
pub use schema::{parse, SchemaNode};
pub use types::{Decimal, Value};
pub use writer::Writer;
