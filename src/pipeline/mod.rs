// src/pipeline/mod.rs

pub mod analytics;
pub mod cleanser;
pub mod collector;
pub mod dedup;
pub mod readers;
pub mod store;
pub mod writers;
