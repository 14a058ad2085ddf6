//! Screen capture for the configured regions.
//!
//! This module provides:
//! - The `ScreenCapture` seam used by the scan loop
//! - A desktop implementation backed by GDI on Windows
//! - DPI awareness setup so region boxes are physical pixels

pub mod screen;

pub use screen::{enable_dpi_awareness, DesktopCapture, ScreenCapture};
