//! Mask compositing on RGBA buffers.
//!
//! Purpose
//! - Turn a [`ClassMap`] plus a target label into a cut-out (`Crop`), a copy
//!   with the object punched out (`Remove`) or a false-color overlay of all
//!   foreground classes (`Colormap`).
//!
//! Design
//! - Masks are never materialized; the class map is walked once and the
//!   alpha (or RGB) bytes of the matching pixels are rewritten in place.
//! - The buffer is borrowed mutably for the whole call. Callers hand every
//!   composite its own buffer (a clone of the decoded image), so a buffer is
//!   never shared between two in-flight operations.
//! - Pixel `i` of the class map maps to bytes `4*i..4*i+4` of the buffer.
use crate::error::{Error, Result};
use crate::labels::{LabelSet, BACKGROUND, COLORMAP};
use crate::segmentation::ClassMap;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Alpha written over every highlighted pixel in colormap mode.
pub const COLORMAP_ALPHA: u8 = 200;

/// Fixed colormap palette: green, red, blue, purple, pink, teal, yellow, gray.
pub const PALETTE: [[u8; 3]; 8] = [
    [0, 128, 0],
    [255, 0, 0],
    [0, 0, 255],
    [160, 32, 240],
    [255, 185, 80],
    [0, 128, 128],
    [255, 255, 0],
    [192, 192, 192],
];

/// How foreground classes pick their palette color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteAssignment {
    /// `PALETTE[rank % 8]` where rank is the first-seen position of the class
    /// among the non-background classes of this image.
    #[default]
    Rank,
    /// `PALETTE[class_index % 8]`.
    ClassIndex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeMode {
    Crop,
    Remove,
    Colormap,
}

impl CompositeMode {
    /// Mode used to render `label`; the `colormap` pseudo-label always maps to
    /// [`CompositeMode::Colormap`].
    pub fn for_label(label: &str, remove: bool) -> Self {
        if label == COLORMAP {
            Self::Colormap
        } else if remove {
            Self::Remove
        } else {
            Self::Crop
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MaskCompositor {
    labels: LabelSet,
    palette: PaletteAssignment,
}

impl MaskCompositor {
    pub fn new(labels: LabelSet, palette: PaletteAssignment) -> Self {
        Self { labels, palette }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Applies `mode` for `label` to `buffer` in place.
    ///
    /// `label` is ignored in colormap mode. Fails with `SizeMismatch` when the
    /// buffer does not hold exactly one RGBA pixel per class-map entry and
    /// with `InvalidLabel` when `label` is not a class of the label set.
    pub fn composite(
        &self,
        buffer: &mut RgbaImage,
        map: &ClassMap,
        label: &str,
        mode: CompositeMode,
    ) -> Result<()> {
        let pixels = (buffer.width() as usize) * (buffer.height() as usize);
        if pixels != map.len() {
            return Err(Error::SizeMismatch {
                expected: map.len(),
                actual: pixels,
            });
        }
        match mode {
            CompositeMode::Crop => {
                let target = self.class_index(label)?;
                clear_alpha_where(buffer, map, |c| c != target);
            }
            CompositeMode::Remove => {
                let target = self.class_index(label)?;
                clear_alpha_where(buffer, map, |c| c == target);
            }
            CompositeMode::Colormap => self.paint_colormap(buffer, map),
        }
        Ok(())
    }

    /// Returns a composited copy of `source`, leaving `source` untouched.
    pub fn render(
        &self,
        source: &RgbaImage,
        map: &ClassMap,
        label: &str,
        mode: CompositeMode,
    ) -> Result<RgbaImage> {
        let mut buffer = source.clone();
        self.composite(&mut buffer, map, label, mode)?;
        Ok(buffer)
    }

    /// Palette color per class index for `map` under the configured policy.
    pub fn class_colors(&self, map: &ClassMap) -> Vec<Option<[u8; 3]>> {
        let mut colors = vec![None; 256];
        let background = self.background_index();
        let mut rank = 0usize;
        for class in map.distinct_classes() {
            if Some(class) == background {
                continue;
            }
            let slot = match self.palette {
                PaletteAssignment::Rank => rank,
                PaletteAssignment::ClassIndex => usize::from(class),
            };
            colors[usize::from(class)] = Some(PALETTE[slot % PALETTE.len()]);
            rank += 1;
        }
        colors
    }

    fn paint_colormap(&self, buffer: &mut RgbaImage, map: &ClassMap) {
        let colors = self.class_colors(map);
        for (px, &c) in buffer.chunks_exact_mut(4).zip(map.data()) {
            if let Some([r, g, b]) = colors[usize::from(c)] {
                px[0] = r;
                px[1] = g;
                px[2] = b;
                px[3] = COLORMAP_ALPHA;
            }
        }
    }

    fn class_index(&self, label: &str) -> Result<u8> {
        self.labels
            .index_of(label)
            .and_then(|i| u8::try_from(i).ok())
            .ok_or_else(|| Error::InvalidLabel(label.to_string()))
    }

    fn background_index(&self) -> Option<u8> {
        self.labels
            .index_of(BACKGROUND)
            .and_then(|i| u8::try_from(i).ok())
    }
}

impl Default for MaskCompositor {
    fn default() -> Self {
        Self::new(LabelSet::default(), PaletteAssignment::default())
    }
}

fn clear_alpha_where(buffer: &mut RgbaImage, map: &ClassMap, pred: impl Fn(u8) -> bool) {
    for (px, &c) in buffer.chunks_exact_mut(4).zip(map.data()) {
        if pred(c) {
            px[3] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn person_map() -> ClassMap {
        ClassMap::new(2, 2, vec![0, 0, 15, 15], &LabelSet::default()).unwrap()
    }

    fn opaque(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 7, 255]))
    }

    fn alphas(img: &RgbaImage) -> Vec<u8> {
        img.pixels().map(|p| p.0[3]).collect()
    }

    #[test]
    fn crop_keeps_only_the_label() {
        let out = MaskCompositor::default()
            .render(&opaque(2, 2), &person_map(), "person", CompositeMode::Crop)
            .unwrap();
        assert_eq!(alphas(&out), [0, 0, 255, 255]);
    }

    #[test]
    fn remove_clears_only_the_label() {
        let out = MaskCompositor::default()
            .render(&opaque(2, 2), &person_map(), "person", CompositeMode::Remove)
            .unwrap();
        assert_eq!(alphas(&out), [255, 255, 0, 0]);
    }

    #[test]
    fn crop_is_a_fixed_point() {
        let compositor = MaskCompositor::default();
        let map = person_map();
        let once = compositor
            .render(&opaque(2, 2), &map, "person", CompositeMode::Crop)
            .unwrap();
        let twice = compositor
            .render(&once, &map, "person", CompositeMode::Crop)
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn crop_and_remove_are_complementary() {
        let compositor = MaskCompositor::default();
        let data: Vec<u8> = (0..30).map(|i| [0u8, 12, 15, 8][i % 4]).collect();
        let map = ClassMap::new(6, 5, data, &LabelSet::default()).unwrap();
        let source = opaque(6, 5);
        for label in ["background", "dog", "person", "cat", "horse"] {
            let crop = compositor
                .render(&source, &map, label, CompositeMode::Crop)
                .unwrap();
            let removed = compositor
                .render(&source, &map, label, CompositeMode::Remove)
                .unwrap();
            for (a, b) in alphas(&crop).iter().zip(alphas(&removed)) {
                assert!(
                    (*a == 255) ^ (b == 255),
                    "label {label}: crop alpha {a}, remove alpha {b}"
                );
            }
        }
    }

    #[test]
    fn colormap_highlights_foreground_only() {
        let map = ClassMap::new(4, 1, vec![0, 12, 15, 12], &LabelSet::default()).unwrap();
        let out = MaskCompositor::default()
            .render(&opaque(4, 1), &map, COLORMAP, CompositeMode::Colormap)
            .unwrap();
        assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 7, 255]));
        // dog seen first -> green, person second -> red
        assert_eq!(out.get_pixel(1, 0), &Rgba([0, 128, 0, COLORMAP_ALPHA]));
        assert_eq!(out.get_pixel(2, 0), &Rgba([255, 0, 0, COLORMAP_ALPHA]));
        assert_eq!(out.get_pixel(3, 0), &Rgba([0, 128, 0, COLORMAP_ALPHA]));
    }

    #[test]
    fn class_index_palette_differs_from_rank() {
        let map = ClassMap::new(2, 1, vec![12, 15], &LabelSet::default()).unwrap();
        let compositor = MaskCompositor::new(LabelSet::default(), PaletteAssignment::ClassIndex);
        let out = compositor
            .render(&opaque(2, 1), &map, COLORMAP, CompositeMode::Colormap)
            .unwrap();
        // 12 % 8 = 4 (pink), 15 % 8 = 7 (gray)
        assert_eq!(out.get_pixel(0, 0).0[..3], PALETTE[4]);
        assert_eq!(out.get_pixel(1, 0).0[..3], PALETTE[7]);
    }

    #[test]
    fn rank_palette_wraps_after_eight_classes() {
        let data: Vec<u8> = (1..=10).collect();
        let map = ClassMap::new(10, 1, data, &LabelSet::default()).unwrap();
        let colors = MaskCompositor::default().class_colors(&map);
        assert_eq!(colors[1], Some(PALETTE[0]));
        assert_eq!(colors[9], Some(PALETTE[0]));
        assert_eq!(colors[10], Some(PALETTE[1]));
        assert_eq!(colors[0], None);
    }

    #[test]
    fn size_mismatch_is_reported() {
        let mut buffer = opaque(3, 1);
        let err = MaskCompositor::default()
            .composite(&mut buffer, &person_map(), "person", CompositeMode::Crop)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn unknown_label_is_rejected() {
        let mut buffer = opaque(2, 2);
        let err = MaskCompositor::default()
            .composite(&mut buffer, &person_map(), "all", CompositeMode::Crop)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidLabel(_)));
    }

    #[test]
    fn mode_for_colormap_label() {
        assert_eq!(CompositeMode::for_label(COLORMAP, false), CompositeMode::Colormap);
        assert_eq!(CompositeMode::for_label("dog", true), CompositeMode::Remove);
        assert_eq!(CompositeMode::for_label("dog", false), CompositeMode::Crop);
    }
}
