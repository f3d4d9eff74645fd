//! Utility modules for the scanner

pub mod port_parser;
pub mod target_parser;
