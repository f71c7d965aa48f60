//! Data models: configuration and invoice records.

pub mod config;
pub mod invoice;
