// src/pipeline/readers/mod.rs

pub mod base_reader;
pub mod csv_reader;

pub use base_reader::BaseReader;
pub use csv_reader::CsvReader;
