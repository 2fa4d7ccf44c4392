//! Storage abstraction layer.
//!
//! The corpus, the intermediate per-class count files and the persisted model
//! all live behind the [`Storage`] trait, so the pipeline runs unchanged on the
//! local file system or entirely in memory.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::*;
pub use memory::*;
pub use traits::*;
