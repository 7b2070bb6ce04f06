//! Cleaning pipeline for treatment-delivery node record logs.
//!
//! A node record file interleaves two leaf banks (A and B) as separately
//! headed blocks. This crate provides tools for:
//! - Splitting the file at repeated `Time` header rows
//! - Selecting and renaming the Exp/Prim/Sec columns of all 60 leaves per bank
//! - Merging both banks into one time-indexed table
//! - Downsampling and blanking stationary samples per leaf channel
//!
//! # Example
//!
//! ```no_run
//! use node_records::{clean_node_records, PipelineConfig};
//!
//! let mut config = PipelineConfig::default();
//! config.output.save = false;
//! let table = clean_node_records("records.csv", &config).unwrap().into_table().unwrap();
//! println!("{} rows", table.num_rows());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use config::{BankAlignment, BlockConfig, ExtraBlocks, MergeConfig, OutputConfig, PipelineConfig, StationaryConfig};
pub use crate::core::loaders::{NodeTable, RawTable};
pub use processors::cleaning::{clean_node_records, CleanError, CleanOutcome, CleanOutput};
