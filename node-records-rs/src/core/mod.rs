//! Core data types and I/O operations.

pub mod loaders;
pub mod schema;
pub mod transforms;
pub mod writers;

pub use loaders::{Column, NodeTable, RawTable};
pub use schema::{Bank, Channel, ChannelKind, LEAF_COUNT, TIME_COLUMN};
pub use writers::{clean_output_path, write_table, write_table_csv, WriteError};
