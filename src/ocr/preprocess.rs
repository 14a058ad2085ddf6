use image::{ImageBuffer, Luma, Rgba};

/// Default binarization level applied after auto-contrast.
pub const DEFAULT_THRESHOLD: u8 = 125;

/// Prepares a captured region for recognition.
///
/// Grayscale, then auto-contrast, then binarize at `threshold`.
pub fn preprocess(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    threshold: u8,
) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    let gray = image::imageops::grayscale(img);
    let stretched = auto_contrast(&gray);
    binarize(&stretched, threshold)
}

/// Stretches the observed luminance range to the full 0..=255 range.
///
/// A flat image (single luminance value) is returned unchanged.
pub fn auto_contrast(img: &ImageBuffer<Luma<u8>, Vec<u8>>) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    let (lo, hi) = img
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if lo >= hi {
        return img.clone();
    }

    let range = (hi - lo) as u32;
    let mut output = img.clone();
    for pixel in output.pixels_mut() {
        let v = (pixel[0] - lo) as u32;
        pixel[0] = ((v * 255 + range / 2) / range) as u8;
    }
    output
}

/// Pixels brighter than `threshold` become white (255), the rest black (0).
pub fn binarize(
    img: &ImageBuffer<Luma<u8>, Vec<u8>>,
    threshold: u8,
) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel[0] > threshold { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}
