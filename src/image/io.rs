//! I/O helpers for input images, PNG artifacts and JSON reports.
//!
//! - `read_source`: fetch raw bytes from a file or an HTTP(S) URL.
//! - `decode_rgba`: decode PNG/JPEG/GIF/BMP bytes into an owned RGBA buffer.
//! - `fit_within`: downscale so the longest side fits the model input.
//! - `encode_png` / `write_png`: encode a composited buffer and write it.
//! - `write_json_file`: pretty-print a serializable value to disk.
use crate::error::{Error, Result};
use crate::source::Source;
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use reqwest::blocking::Client;
use serde::Serialize;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Reads the encoded bytes behind `source`.
pub fn read_source(source: &Source, client: &Client) -> Result<Vec<u8>> {
    match source {
        Source::File(path) => fs::read(path).map_err(|e| Error::decode(source.to_string(), e)),
        Source::Url(url) => {
            let response = client
                .get(url)
                .send()
                .and_then(|r| r.error_for_status())
                .map_err(|e| Error::decode(url.as_str(), e))?;
            let bytes = response.bytes().map_err(|e| Error::decode(url.as_str(), e))?;
            Ok(bytes.to_vec())
        }
    }
}

/// Decodes an encoded image into 8-bit RGBA.
pub fn decode_rgba(bytes: &[u8], source_name: &str) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes).map_err(|e| Error::decode(source_name, e))?;
    Ok(img.into_rgba8())
}

/// Downscales `img` so that neither side exceeds `max_side`, preserving the
/// aspect ratio. Smaller images are returned unchanged.
pub fn fit_within(img: RgbaImage, max_side: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    if max_side == 0 || (w <= max_side && h <= max_side) {
        return img;
    }
    let scale = f64::from(max_side) / f64::from(w.max(h));
    let nw = ((f64::from(w) * scale).round() as u32).clamp(1, max_side);
    let nh = ((f64::from(h) * scale).round() as u32).clamp(1, max_side);
    imageops::resize(&img, nw, nh, FilterType::Triangle)
}

/// Resizes `img` to exactly `width × height` unless it already matches.
pub fn resize_exact(img: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.dimensions() == (width, height) {
        return img;
    }
    imageops::resize(&img, width, height, FilterType::Triangle)
}

/// Encodes an RGBA buffer as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::ImageEncodeFailure(format!("PNG: {e}")))?;
    Ok(out.into_inner())
}

/// Encodes `img` as PNG and writes it to `path`. The parent directory must
/// already exist.
pub fn write_png(img: &RgbaImage, path: &Path) -> Result<()> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::write(path, e))?;
    fs::write(path, out.into_inner()).map_err(|e| Error::write(path, e))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|e| Error::write(path, e))?;
    fs::write(path, json).map_err(|e| Error::write(path, e))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
        }
    }
    Ok(())
}
