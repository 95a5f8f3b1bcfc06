//! Storage layer: segment file naming, the capture writer and the packager

pub mod naming;
pub mod packager;
pub mod writer;

pub use naming::*;
pub use packager::*;
pub use writer::*;
