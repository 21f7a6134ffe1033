//! Canonical class names shared with the segmentation model.
//!
//! Indices are fixed by the model: index `i` in a class map always means
//! `LabelSet::label(i)`. Index 0 is the background class.

/// Pseudo-label naming the false-color visualization of all foreground
/// classes. Always present in an object inventory.
pub const COLORMAP: &str = "colormap";

/// Pseudo-label requesting every segment of an image.
pub const ALL: &str = "all";

pub const BACKGROUND: &str = "background";

const PASCAL_VOC: [&str; 21] = [
    BACKGROUND,
    "airplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "dining table",
    "dog",
    "horse",
    "motorbike",
    "person",
    "potted plant",
    "sheep",
    "sofa",
    "train",
    "tv",
];

/// Fixed, ordered list of lowercase class names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelSet {
    names: &'static [&'static str],
}

impl LabelSet {
    /// The 21 PASCAL VOC classes produced by the MAX image segmenter.
    pub const fn pascal_voc() -> Self {
        Self { names: &PASCAL_VOC }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&'static str> {
        self.names.get(index).copied()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| *n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }

    /// Detectable objects, i.e. every class except background.
    pub fn objects(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.iter().filter(|n| *n != BACKGROUND)
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::pascal_voc()
    }
}
