use image::{DynamicImage, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};

/// Red channel step that encodes one class index. Wide enough to survive
/// JPEG rounding.
pub const CLASS_STEP: u8 = 10;

pub fn class_color(class: u8) -> Rgba<u8> {
    Rgba([class * CLASS_STEP, 90, 160, 255])
}

/// Builds an image whose red channel encodes `classes` (row-major).
pub fn class_image(width: u32, height: u32, classes: &[u8]) -> RgbaImage {
    assert_eq!(classes.len(), (width * height) as usize, "one class per pixel");
    RgbaImage::from_fn(width, height, |x, y| {
        class_color(classes[(y * width + x) as usize])
    })
}

/// Image filled with a single class.
pub fn uniform_image(width: u32, height: u32, class: u8) -> RgbaImage {
    RgbaImage::from_pixel(width, height, class_color(class))
}

pub fn write_png(dir: &Path, name: &str, img: &RgbaImage) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).expect("write png fixture");
    path
}

pub fn write_jpeg(dir: &Path, name: &str, img: &RgbaImage) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgba8(img.clone())
        .to_rgb8()
        .save(&path)
        .expect("write jpeg fixture");
    path
}

pub fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).expect("write fixture");
    path
}

/// PNG signature followed by garbage: sniffs as an image, fails to decode.
pub fn write_broken_png(dir: &Path, name: &str) -> PathBuf {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(b"definitely not an IHDR chunk");
    write_bytes(dir, name, &bytes)
}

pub fn read_rgba(path: &Path) -> RgbaImage {
    image::open(path).expect("open artifact").into_rgba8()
}

pub fn alphas(img: &RgbaImage) -> Vec<u8> {
    img.pixels().map(|p| p.0[3]).collect()
}
