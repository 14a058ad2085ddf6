//! Screen-region capture using GDI.

use anyhow::Result;
use image::{ImageBuffer, Rgba};

use crate::config::ScreenRect;

/// Grabs the pixels of a screen rectangle.
pub trait ScreenCapture {
    fn capture(&self, rect: &ScreenRect) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>>;
}

/// Captures from the desktop device context.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopCapture;

#[cfg(windows)]
impl ScreenCapture for DesktopCapture {
    fn capture(&self, rect: &ScreenRect) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
        gdi::capture_rect(rect)
    }
}

#[cfg(not(windows))]
impl ScreenCapture for DesktopCapture {
    fn capture(&self, _rect: &ScreenRect) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
        Err(anyhow::anyhow!("Screen capture is only supported on Windows"))
    }
}

/// Opts the process into per-monitor DPI awareness so region boxes are
/// interpreted as physical pixels.
#[cfg(windows)]
pub fn enable_dpi_awareness() {
    use windows::Win32::UI::HiDpi::{
        SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    };

    if let Err(e) = unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) } {
        crate::log(&format!("Warning: failed to set DPI awareness: {}", e));
    }
}

#[cfg(not(windows))]
pub fn enable_dpi_awareness() {}

/// Converts top-down BGRA rows into an RGBA image.
pub fn bgra_to_rgba(width: u32, height: u32, bgra: &[u8]) -> Option<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    let expected = width as usize * height as usize * 4;
    if bgra.len() < expected {
        return None;
    }

    let mut rgba = Vec::with_capacity(expected);
    for px in bgra[..expected].chunks_exact(4) {
        // Screen DCs leave alpha at 0; the capture is opaque.
        rgba.extend_from_slice(&[px[2], px[1], px[0], 255]);
    }

    ImageBuffer::from_raw(width, height, rgba)
}

#[cfg(windows)]
mod gdi {
    use anyhow::{anyhow, Result};
    use image::{ImageBuffer, Rgba};
    use std::mem::size_of;

    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Gdi::{
        BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
        GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
        DIB_RGB_COLORS, SRCCOPY,
    };

    use super::bgra_to_rgba;
    use crate::config::ScreenRect;

    /// Copies a rectangle of the desktop into an RGBA buffer.
    ///
    /// Screen DC → compatible bitmap → BitBlt → GetDIBits (top-down 32bpp).
    pub fn capture_rect(rect: &ScreenRect) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
        let width = rect.width as i32;
        let height = rect.height as i32;

        unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                return Err(anyhow!("GetDC failed"));
            }

            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let previous = SelectObject(mem_dc, bitmap);

            let blit = BitBlt(mem_dc, 0, 0, width, height, screen_dc, rect.x, rect.y, SRCCOPY);

            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    // Negative height requests top-down rows
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            let mut buffer = vec![0u8; rect.width as usize * rect.height as usize * 4];
            let lines = if blit.is_ok() {
                GetDIBits(
                    mem_dc,
                    bitmap,
                    0,
                    rect.height,
                    Some(buffer.as_mut_ptr().cast()),
                    &mut info,
                    DIB_RGB_COLORS,
                )
            } else {
                0
            };

            SelectObject(mem_dc, previous);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);

            blit.map_err(|e| anyhow!("BitBlt failed: {}", e))?;
            if lines != height {
                return Err(anyhow!("GetDIBits copied {} of {} rows", lines, height));
            }

            bgra_to_rgba(rect.width, rect.height, &buffer)
                .ok_or_else(|| anyhow!("Captured buffer has the wrong size"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgra_to_rgba_swaps_channels() {
        let bgra = vec![
            10, 20, 30, 0, // pixel (0,0)
            40, 50, 60, 0, // pixel (1,0)
        ];
        let img = bgra_to_rgba(2, 1, &bgra).unwrap();

        assert_eq!(img.get_pixel(0, 0), &Rgba([30, 20, 10, 255]));
        assert_eq!(img.get_pixel(1, 0), &Rgba([60, 50, 40, 255]));
    }

    #[test]
    fn test_bgra_to_rgba_short_buffer() {
        assert!(bgra_to_rgba(2, 2, &[0u8; 8]).is_none());
    }
}
