//! Segmentation model seam.
//!
//! The library never runs a network itself; it asks a [`Segmenter`] for a
//! class map of an already-scaled RGBA image. [`MaxSegmenter`] talks to a
//! Model Asset eXchange image-segmenter service; tests plug in synthetic
//! segmenters.
mod max;

pub use max::{MaxSegmenter, DEFAULT_ENDPOINT};

use crate::error::Result;
use crate::labels::LabelSet;
use crate::segmentation::ClassMap;
use image::RgbaImage;

/// Raw model output for one image.
#[derive(Clone, Debug)]
pub struct Prediction {
    pub class_map: ClassMap,
    /// Labels the model reports as present, in the model's own order.
    pub objects_detected: Vec<String>,
}

impl Prediction {
    /// Builds a prediction, deriving `objects_detected` from the class map in
    /// ascending class-index order.
    pub fn from_class_map(class_map: ClassMap, labels: &LabelSet) -> Self {
        let mut classes = class_map.distinct_classes();
        classes.sort_unstable();
        let objects_detected = classes
            .into_iter()
            .filter_map(|c| labels.label(usize::from(c)))
            .map(str::to_string)
            .collect();
        Self {
            class_map,
            objects_detected,
        }
    }
}

/// Produces a class map for an image.
///
/// Implementations are shared by every worker of a batch scan, hence the
/// `Send + Sync` bound; `predict` must not rely on per-call mutable state.
pub trait Segmenter: Send + Sync {
    /// Label set the returned class indices refer to.
    fn labels(&self) -> &LabelSet;

    fn predict(&self, image: &RgbaImage) -> Result<Prediction>;
}

impl<S: Segmenter + ?Sized> Segmenter for Box<S> {
    fn labels(&self) -> &LabelSet {
        (**self).labels()
    }

    fn predict(&self, image: &RgbaImage) -> Result<Prediction> {
        (**self).predict(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_detected_follow_class_order() {
        let labels = LabelSet::default();
        let map = ClassMap::new(4, 1, vec![15, 0, 12, 15], &labels).unwrap();
        let prediction = Prediction::from_class_map(map, &labels);
        assert_eq!(prediction.objects_detected, ["background", "dog", "person"]);
    }
}
