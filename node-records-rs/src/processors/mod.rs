//! Pipeline stages for cleaning node record files.

pub mod cleaning;
pub mod merging;
pub mod projection;
pub mod splitting;
pub mod stationary;

// Re-export key types for convenience
pub use cleaning::{clean_node_records, clean_table, CleanError, CleanOutcome, CleanOutput, CleanSummary, ErrorKind};
pub use merging::{merge_banks, MergeError};
pub use projection::{project_block, ProjectionError};
pub use splitting::{split_banks, split_blocks, BankBlocks, Block, SplitError};
pub use stationary::{remove_stationary_samples, ChannelRetention, CompressedTable, StationaryError};
