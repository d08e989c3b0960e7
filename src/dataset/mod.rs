//! Dataset I/O
//!
//! Everything that touches capture files on disk: the in-memory table, the
//! CSV reader/writer pair, and the JSONL decision log. The scoring core
//! never does I/O directly; it goes through this module so every failure
//! carries the offending path.

pub mod decision_log;
pub mod reader;
pub mod table;
pub mod writer;


pub use decision_log::{read_decisions, DecisionLog};
pub use reader::read_table;
pub use table::TrafficTable;
pub use writer::write_table;
