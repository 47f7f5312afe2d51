//! Core data types for askdb.
//!
//! - `AskError`: error taxonomy for every pipeline stage
//! - `Value` / `Row`: typed result cells and column-aligned rows
//! - `Result`: convenient result type alias

pub mod error;
pub mod value;

pub use error::{AskError, Result};
pub use value::{Row, Value};
