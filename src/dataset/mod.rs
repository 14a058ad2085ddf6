//! Reference dataset of event records.
//!
//! The dataset file is a three-level tree (category → subcategory → code →
//! option list). It is flattened once at startup into an index keyed by the
//! normalized code.

pub mod error;
pub mod index;

pub use index::{DatasetIndex, ReferenceRecord};
