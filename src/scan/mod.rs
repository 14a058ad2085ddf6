//! The capture → recognize → match → present loop.
//!
//! This module provides:
//! - Per-region cached state (`RegionState`)
//! - The scan loop itself (`ScanLoop`)
//! - Overlay text formatting
//! - The `PresentationSink` contract and the commands flowing back from it

pub mod format;
pub mod runner;
pub mod sink;
pub mod state;

pub use runner::{ScanLoop, ScanSettings};
pub use sink::{PresentationSink, ScanCommand};
