//! Class maps and the object inventory derived from them.
//!
//! A [`ClassMap`] holds one class index per pixel in row-major order. For a
//! pixel at `(x, y)` the index is `y * width + x`. Values index into the
//! [`LabelSet`] the map was produced with.
use crate::error::{Error, Result};
use crate::labels::{LabelSet, COLORMAP};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-pixel class indices produced by the segmentation model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassMap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ClassMap {
    /// Builds a class map, checking the length against the dimensions and
    /// every index against `labels`.
    pub fn new(width: u32, height: u32, data: Vec<u8>, labels: &LabelSet) -> Result<Self> {
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        if let Some(&bad) = data.iter().find(|&&c| usize::from(c) >= labels.len()) {
            return Err(Error::UnknownClass {
                index: u32::from(bad),
                labels: labels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds a class map from nested rows as returned by the model service.
    pub fn from_rows(rows: &[Vec<u32>], labels: &LabelSet) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(width * height);
        for row in rows {
            if row.len() != width {
                return Err(Error::SizeMismatch {
                    expected: width,
                    actual: row.len(),
                });
            }
            for &c in row {
                let idx = u8::try_from(c)
                    .ok()
                    .filter(|&i| usize::from(i) < labels.len())
                    .ok_or(Error::UnknownClass {
                        index: c,
                        labels: labels.len(),
                    })?;
                data.push(idx);
            }
        }
        Self::new(width as u32, height as u32, data, labels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Distinct class indices in first-seen order.
    pub fn distinct_classes(&self) -> Vec<u8> {
        let mut seen = [false; 256];
        let mut order = Vec::new();
        for &c in &self.data {
            if !seen[usize::from(c)] {
                seen[usize::from(c)] = true;
                order.push(c);
            }
        }
        order
    }
}

/// Objects found in one class map.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationResult {
    inventory: Vec<String>,
    pixel_counts: BTreeMap<String, usize>,
}

impl SegmentationResult {
    pub fn from_class_map(map: &ClassMap, labels: &LabelSet) -> Result<Self> {
        if map.is_empty() {
            return Err(Error::EmptyMap);
        }
        let mut counts = vec![0usize; labels.len()];
        for &c in map.data() {
            if let Some(slot) = counts.get_mut(usize::from(c)) {
                *slot += 1;
            }
        }

        let mut inventory = Vec::new();
        let mut pixel_counts = BTreeMap::new();
        for class in map.distinct_classes() {
            let idx = usize::from(class);
            let name = labels.label(idx).ok_or(Error::UnknownClass {
                index: u32::from(class),
                labels: labels.len(),
            })?;
            inventory.push(name.to_string());
            pixel_counts.insert(name.to_string(), counts[idx]);
        }
        inventory.push(COLORMAP.to_string());
        Ok(Self {
            inventory,
            pixel_counts,
        })
    }

    /// Detected labels in first-seen order followed by `colormap`.
    pub fn inventory(&self) -> &[String] {
        &self.inventory
    }

    pub fn contains(&self, label: &str) -> bool {
        self.inventory.iter().any(|l| l == label)
    }

    /// Inventory without the background class and the colormap entry.
    pub fn detected_objects(&self) -> impl Iterator<Item = &str> {
        self.inventory
            .iter()
            .map(String::as_str)
            .filter(|l| *l != crate::labels::BACKGROUND && *l != COLORMAP)
    }

    /// Inventory without the colormap entry.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inventory
            .iter()
            .map(String::as_str)
            .filter(|l| *l != COLORMAP)
    }

    pub fn pixel_count(&self, label: &str) -> usize {
        self.pixel_counts.get(label).copied().unwrap_or(0)
    }

    pub fn pixel_counts(&self) -> &BTreeMap<String, usize> {
        &self.pixel_counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(width: u32, height: u32, data: &[u8]) -> ClassMap {
        ClassMap::new(width, height, data.to_vec(), &LabelSet::default()).unwrap()
    }

    #[test]
    fn inventory_for_person_on_background() {
        let labels = LabelSet::default();
        let result = SegmentationResult::from_class_map(&map(2, 2, &[0, 0, 15, 15]), &labels)
            .unwrap();
        assert_eq!(result.inventory(), ["background", "person", "colormap"]);
        assert_eq!(result.pixel_count("person"), 2);
        assert_eq!(result.pixel_count("dog"), 0);
    }

    #[test]
    fn background_only_when_class_zero_occurs() {
        let labels = LabelSet::default();
        let result = SegmentationResult::from_class_map(&map(3, 1, &[12, 8, 12]), &labels)
            .unwrap();
        assert_eq!(result.inventory(), ["dog", "cat", "colormap"]);
        assert!(!result.contains("background"));
        assert_eq!(result.detected_objects().collect::<Vec<_>>(), ["dog", "cat"]);
    }

    #[test]
    fn inventory_has_no_duplicates() {
        let labels = LabelSet::default();
        let data: Vec<u8> = (0..64).map(|i| (i * 7 % 21) as u8).collect();
        let result = SegmentationResult::from_class_map(&map(8, 8, &data), &labels).unwrap();
        let inv = result.inventory();
        for (i, a) in inv.iter().enumerate() {
            assert!(inv[i + 1..].iter().all(|b| b != a), "duplicate {a}");
        }
        assert_eq!(inv.last().map(String::as_str), Some(COLORMAP));
        assert_eq!(result.pixel_counts().values().sum::<usize>(), 64);
    }

    #[test]
    fn empty_map_is_rejected() {
        let labels = LabelSet::default();
        let err = SegmentationResult::from_class_map(&map(0, 0, &[]), &labels).unwrap_err();
        assert!(matches!(err, Error::EmptyMap));
    }

    #[test]
    fn class_map_validates_shape_and_indices() {
        let labels = LabelSet::default();
        assert!(matches!(
            ClassMap::new(2, 2, vec![0; 3], &labels),
            Err(Error::SizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
        assert!(matches!(
            ClassMap::new(1, 1, vec![21], &labels),
            Err(Error::UnknownClass { index: 21, .. })
        ));
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let labels = LabelSet::default();
        let rows = vec![vec![0, 15], vec![15]];
        assert!(ClassMap::from_rows(&rows, &labels).is_err());
        let rows = vec![vec![0, 15], vec![12, 0]];
        let map = ClassMap::from_rows(&rows, &labels).unwrap();
        assert_eq!((map.width(), map.height()), (2, 2));
        assert_eq!(map.data(), &[0, 15, 12, 0]);
    }
}
