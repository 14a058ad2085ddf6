use anyhow::{anyhow, Context, Result};
use image::{ImageBuffer, Luma};
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

/// Keeps the subprocess from flashing a console window.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Characters Tesseract may emit: letters, digits, a little punctuation and
/// the musical note used in some event titles.
pub const CHAR_WHITELIST: &str =
    "!♪()abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-";

/// Turns a preprocessed region image into text.
pub trait Recognizer {
    fn recognize(&self, img: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Result<String>;
}

/// Runs the Tesseract executable as a subprocess.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    pub executable: PathBuf,
    pub tessdata_dir: Option<PathBuf>,
    pub page_segmentation_mode: u8,
}

impl TesseractEngine {
    pub fn new(executable: PathBuf, tessdata_dir: Option<PathBuf>, page_segmentation_mode: u8) -> Self {
        Self {
            executable,
            tessdata_dir,
            page_segmentation_mode,
        }
    }

    /// Builds the argument list for one recognition call.
    fn args(&self, input: &std::path::Path) -> Vec<String> {
        let mut args = vec![
            input.to_string_lossy().to_string(),
            "stdout".to_string(),
        ];

        if let Some(tessdata) = &self.tessdata_dir {
            args.push("--tessdata-dir".to_string());
            args.push(tessdata.to_string_lossy().to_string());
        }

        args.extend([
            "-l".to_string(),
            "eng".to_string(),
            "--psm".to_string(),
            self.page_segmentation_mode.to_string(),
            "-c".to_string(),
            format!("tessedit_char_whitelist={}", CHAR_WHITELIST),
        ]);

        args
    }
}

impl Recognizer for TesseractEngine {
    fn recognize(&self, img: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        let mut command = Command::new(&self.executable);
        command.args(self.args(temp_input.path()));

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let output = command
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
