pub mod engine;
pub mod preprocess;

pub use engine::{Recognizer, TesseractEngine};
pub use preprocess::preprocess;

use image::{ImageBuffer, Rgba};

/// Placeholder shown when a region yields no text.
pub const NO_TEXT_SENTINEL: &str = "[No text detected]";

/// High-level function: captured region → uppercase text or the sentinel.
///
/// Preprocesses the capture, runs recognition, trims and uppercases the
/// result. Empty output and recognition failures both collapse to
/// [`NO_TEXT_SENTINEL`]; failures are logged.
pub fn read_region<R: Recognizer + ?Sized>(
    recognizer: &R,
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    threshold: u8,
) -> String {
    let processed = preprocess(img, threshold);

    match recognizer.recognize(&processed) {
        Ok(text) => canonical_text(&text),
        Err(e) => {
            crate::log(&format!("OCR failed: {}", e));
            NO_TEXT_SENTINEL.to_string()
        }
    }
}

/// Trims and uppercases recognized text; empty becomes the sentinel.
pub fn canonical_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        NO_TEXT_SENTINEL.to_string()
    } else {
        trimmed.to_uppercase()
    }
}
