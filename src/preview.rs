//! Terminal preview using 24-bit colour half blocks.
//!
//! Each text row covers two pixel rows: the upper pixel is the foreground of
//! `▀`, the lower one the background. Transparent pixels are blended over
//! black, so cropped-away regions come out dark.
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::fmt::Write;

const UPPER_HALF_BLOCK: char = '▀';
const RESET: &str = "\x1b[0m";

/// Renders `image` as at most `max_columns` terminal cells wide. Rows end
/// with a reset sequence and a newline.
pub fn render(image: &RgbaImage, max_columns: u32) -> String {
    let scaled = fit_columns(image, max_columns.max(1));
    let (w, h) = scaled.dimensions();
    let mut out = String::new();
    for y in (0..h).step_by(2) {
        for x in 0..w {
            let [tr, tg, tb] = over_black(scaled.get_pixel(x, y));
            let [br, bg, bb] = if y + 1 < h {
                over_black(scaled.get_pixel(x, y + 1))
            } else {
                [0, 0, 0]
            };
            // Writing into a String cannot fail.
            let _ = write!(
                out,
                "\x1b[38;2;{tr};{tg};{tb}m\x1b[48;2;{br};{bg};{bb}m{UPPER_HALF_BLOCK}"
            );
        }
        out.push_str(RESET);
        out.push('\n');
    }
    out
}

fn fit_columns(image: &RgbaImage, max_columns: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w <= max_columns || w == 0 {
        return image.clone();
    }
    let new_h = ((h as u64 * max_columns as u64) / w as u64).max(1) as u32;
    imageops::resize(image, max_columns, new_h, FilterType::Triangle)
}

fn over_black(px: &Rgba<u8>) -> [u8; 3] {
    let [r, g, b, a] = px.0;
    let blend = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
    [blend(r), blend(g), blend(b)]
}
