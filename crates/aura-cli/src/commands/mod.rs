//! Command handlers

pub mod backup;
pub mod config;
pub mod records;
pub mod status;
