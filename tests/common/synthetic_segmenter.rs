use super::synthetic_image::CLASS_STEP;
use image::RgbaImage;
use magicat::{ClassMap, LabelSet, Prediction, Result, Segmenter};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reads the class of every pixel back from its red channel.
///
/// `downsample` mimics a model that answers on a coarser grid than the
/// image it was given.
#[derive(Debug)]
pub struct SyntheticSegmenter {
    labels: LabelSet,
    downsample: u32,
    calls: AtomicUsize,
}

impl SyntheticSegmenter {
    pub fn new() -> Self {
        Self::downsampled(1)
    }

    pub fn downsampled(factor: u32) -> Self {
        Self {
            labels: LabelSet::pascal_voc(),
            downsample: factor.max(1),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn class_of(&self, red: u8) -> u8 {
        let class = (u32::from(red) + u32::from(CLASS_STEP) / 2) / u32::from(CLASS_STEP);
        if (class as usize) < self.labels.len() {
            class as u8
        } else {
            0
        }
    }
}

impl Segmenter for SyntheticSegmenter {
    fn labels(&self) -> &LabelSet {
        &self.labels
    }

    fn predict(&self, image: &RgbaImage) -> Result<Prediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let f = self.downsample;
        let w = (image.width() / f).max(1);
        let h = (image.height() / f).max(1);
        let mut data = Vec::with_capacity((w * h) as usize);
        for y in 0..h {
            for x in 0..w {
                data.push(self.class_of(image.get_pixel(x * f, y * f).0[0]));
            }
        }
        let map = ClassMap::new(w, h, data, &self.labels)?;
        Ok(Prediction::from_class_map(map, &self.labels))
    }
}
