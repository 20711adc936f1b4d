//! Recovering structured values from model output
//!
//! - `extract_json_list`: file selection lists, never fails
//! - `extract_json_object`: per-file summaries, with repair of damaged JSON

mod extract;
mod json_repair;

pub use extract::extract_json_list;
pub use json_repair::{JsonRepairer, extract_json_object};
