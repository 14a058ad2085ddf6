//! Uma Event Overlay
//!
//! Reads event titles from fixed screen regions with Tesseract, fuzzy-matches
//! them against a reference dataset, and shows the matching event's options
//! in an always-on-top overlay.

// Hide console window on Windows for GUI mode
#![windows_subsystem = "windows"]

mod capture;
mod config;
mod dataset;
mod matching;
mod ocr;
mod overlay;
mod paths;
mod scan;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;

use capture::DesktopCapture;
use dataset::DatasetIndex;
use ocr::TesseractEngine;
use scan::{ScanLoop, ScanSettings};

const LOG_FILE_NAME: &str = "uma_event_overlay.log";

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join(LOG_FILE_NAME);
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    // Ensure output directories exist
    paths::ensure_directories()?;

    capture::enable_dpi_awareness();

    // Startup failures are fatal: nothing is scanned without config and data
    if let Err(e) = config::init_config() {
        log(&format!("Fatal: {:#}", e));
        return Err(e);
    }
    let config = config::get_config();

    let index = match load_index(config) {
        Ok(index) => Arc::new(index),
        Err(e) => {
            log(&format!("Fatal: {:#}", e));
            return Err(e);
        }
    };

    let (sink, overlay_events) = overlay::create_overlay_channel();
    let (command_sender, commands) = channel();

    let scan_loop = ScanLoop::new(
        config.regions.clone(),
        Arc::clone(&index),
        ScanSettings::from_config(config),
        DesktopCapture,
        TesseractEngine::new(
            config.tesseract_path.clone(),
            config.tessdata_dir.clone(),
            config.page_segmentation_mode,
        ),
        sink,
        commands,
    );

    // Detached: the loop lives until the process exits
    let _scan_thread: thread::JoinHandle<()> = thread::Builder::new()
        .name("region-scan".to_string())
        .spawn(move || scan_loop.run())
        .context("Failed to spawn scan thread")?;

    match overlay::run_overlay(config.overlay.clone(), overlay_events, command_sender) {
        Ok(()) => {
            log("Overlay closed, exiting");
            Ok(())
        }
        Err(e) => {
            log(&format!("Overlay error: {}", e));
            Err(anyhow!("Overlay error: {}", e))
        }
    }
}

/// Loads and flattens the reference dataset, reporting key collisions.
fn load_index(config: &config::AppConfig) -> Result<DatasetIndex> {
    let index = DatasetIndex::load(&config.reference_path)
        .with_context(|| format!("Failed to load {}", config.reference_path.display()))?;

    if index.is_empty() {
        log("Warning: reference dataset contains no event codes");
    }

    let collisions = index.collisions();
    if !collisions.is_empty() {
        log(&format!(
            "Warning: {} event code(s) collided after normalization (later entries kept)",
            collisions.len()
        ));
        for collision in collisions {
            log(&format!(
                "  {}: {:?} replaced by {:?}",
                collision.key, collision.displaced, collision.winner
            ));
        }
    }

    log(&format!(
        "Reference dataset loaded: {} event codes from {}",
        index.len(),
        config.reference_path.display()
    ));

    Ok(index)
}
