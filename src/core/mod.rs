//! Core value types: timestamps, capture lines and capture metadata

pub mod file_info;
pub mod line;
pub mod temporal;

pub use file_info::*;
pub use line::*;
pub use temporal::*;
