//! Record parsing and CSV reports

pub mod parser;
pub mod timestamp;
pub mod writer;
