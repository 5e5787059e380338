//! I/O module
//!
//! Handles CSV parsing and output for the replay tool.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row conversion, balance serialization)
//! - `sync_reader` - Synchronous CSV reader with iterator interface

pub mod csv_format;
pub mod sync_reader;

pub use csv_format::{convert_csv_record, write_balances_csv, CsvOperation, Operation};
pub use sync_reader::SyncReader;
