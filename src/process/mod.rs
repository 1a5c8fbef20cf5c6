// src/process/mod.rs
//! Turning one messy report file into a clean [`Dataset`]:
//! bytes → text ([`decode`]) → cells ([`parse`]) → records ([`extract`]).

pub mod dataset;
pub mod decode;
pub mod extract;
pub mod parse;
pub mod raw_table;
pub mod utils;

pub use dataset::{Dataset, Demographic, Record};
pub use extract::{extract_bytes, extract_file, extract_table, find_header_row, year_labels};
pub use raw_table::RawTable;
pub use utils::parse_count;
