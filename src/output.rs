//! Artifact naming.
//!
//! `<stem>-<label>.png` for saved segments, `<stem>-no-<label>.png` for
//! removals. When every segment of an image is written in one go the suffix
//! carries a two-digit index (`photo-00-person.png`, `photo-01-dog.png`) so
//! names stay unique and sort in inventory order.
//!
//! Two inputs with the same stem (`a.png`, `a.jpg`) resolve to the same
//! artifact path. [`OutputClaims`] records which source wrote each path
//! during a run, so the second writer fails instead of overwriting.
use crate::error::{Error, Result};
use crate::labels::{LabelSet, COLORMAP};
use crate::normalize::normalize;
use crate::source::Source;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Artifacts are always encoded as PNG to keep the alpha channel.
pub const OUTPUT_EXTENSION: &str = "png";

/// Stem used when a URL has no usable file name.
const FALLBACK_STEM: &str = "image";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuffixPolicy {
    Save,
    Remove,
}

#[derive(Clone, Debug)]
pub struct OutputPathResolver {
    labels: LabelSet,
    out_dir: Option<PathBuf>,
}

impl OutputPathResolver {
    /// Fails with `OutputDirNotFound` unless `out_dir` is an existing
    /// directory.
    pub fn new(labels: LabelSet, out_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = &out_dir {
            ensure_output_dir(dir)?;
        }
        Ok(Self { labels, out_dir })
    }

    pub fn out_dir(&self) -> Option<&Path> {
        self.out_dir.as_deref()
    }

    pub fn resolve(
        &self,
        source: &Source,
        label: &str,
        policy: SuffixPolicy,
        index: Option<usize>,
    ) -> Result<PathBuf> {
        resolve(
            &self.labels,
            source,
            label,
            policy,
            index,
            self.out_dir.as_deref(),
        )
    }
}

/// Resolves the output path of one artifact.
pub fn resolve(
    labels: &LabelSet,
    source: &Source,
    label: &str,
    policy: SuffixPolicy,
    index: Option<usize>,
    out_dir: Option<&Path>,
) -> Result<PathBuf> {
    let canonical = normalize(label) == label && (labels.contains(label) || label == COLORMAP);
    if !canonical {
        return Err(Error::InvalidLabel(label.to_string()));
    }

    let dir = match out_dir {
        Some(dir) => {
            ensure_output_dir(dir)?;
            dir.to_path_buf()
        }
        None => match source {
            Source::File(path) => path.parent().map(Path::to_path_buf).unwrap_or_default(),
            Source::Url(_) => PathBuf::new(),
        },
    };

    let mut stem = source.stem();
    if stem.is_empty() {
        stem = FALLBACK_STEM.to_string();
    }
    let prefix = index.map(|i| format!("{i:02}-")).unwrap_or_default();
    let removal = match policy {
        SuffixPolicy::Save => "",
        SuffixPolicy::Remove => "no-",
    };
    Ok(dir.join(format!("{stem}-{prefix}{removal}{label}.{OUTPUT_EXTENSION}")))
}

/// Artifact paths written during one run, keyed to the source that wrote
/// them. Shared by every worker of a batch scan.
#[derive(Debug, Default)]
pub struct OutputClaims {
    written: Mutex<HashMap<PathBuf, String>>,
}

impl OutputClaims {
    /// Reserves `path` for `source`. Fails with `WriteFailure` naming the
    /// first writer when another source already holds the path.
    pub fn claim(&self, path: &Path, source: &Source) -> Result<()> {
        let owner = source.to_string();
        let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
        match written.entry(path.to_path_buf()) {
            Entry::Occupied(first) if *first.get() != owner => Err(Error::write(
                path,
                format!("output path already written by {}", first.get()),
            )),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(owner);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(Error::OutputDirNotFound(dir.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voc() -> LabelSet {
        LabelSet::default()
    }

    #[test]
    fn save_next_to_source() {
        let src = Source::parse("photo.jpg");
        let path = resolve(&voc(), &src, "dog", SuffixPolicy::Save, None, None).unwrap();
        assert_eq!(path, PathBuf::from("photo-dog.png"));

        let src = Source::parse("/data/pets/photo.jpg");
        let path = resolve(&voc(), &src, "dog", SuffixPolicy::Save, None, None).unwrap();
        assert_eq!(path, PathBuf::from("/data/pets/photo-dog.png"));
    }

    #[test]
    fn remove_and_indexed_suffixes() {
        let src = Source::parse("/data/photo.gif");
        let path = resolve(&voc(), &src, "person", SuffixPolicy::Remove, None, None).unwrap();
        assert_eq!(path, PathBuf::from("/data/photo-no-person.png"));
        let path = resolve(&voc(), &src, "person", SuffixPolicy::Save, Some(0), None).unwrap();
        assert_eq!(path, PathBuf::from("/data/photo-00-person.png"));
        let path =
            resolve(&voc(), &src, "background", SuffixPolicy::Remove, Some(12), None).unwrap();
        assert_eq!(path, PathBuf::from("/data/photo-12-no-background.png"));
        let path = resolve(&voc(), &src, COLORMAP, SuffixPolicy::Save, Some(3), None).unwrap();
        assert_eq!(path, PathBuf::from("/data/photo-03-colormap.png"));
    }

    #[test]
    fn url_sources_land_in_current_dir() {
        let src = Source::parse("https://example.com/pics/cat.jpg?w=300#x");
        let path = resolve(&voc(), &src, "cat", SuffixPolicy::Save, None, None).unwrap();
        assert_eq!(path, PathBuf::from("cat-cat.png"));

        let src = Source::parse("https://example.com/");
        let path = resolve(&voc(), &src, "cat", SuffixPolicy::Save, None, None).unwrap();
        assert_eq!(path, PathBuf::from("image-cat.png"));
    }

    #[test]
    fn out_dir_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let src = Source::parse("/elsewhere/photo.jpg");
        let path = resolve(
            &voc(),
            &src,
            "dog",
            SuffixPolicy::Save,
            None,
            Some(dir.path()),
        )
        .unwrap();
        assert_eq!(path, dir.path().join("photo-dog.png"));

        let missing = dir.path().join("missing");
        let err = resolve(&voc(), &src, "dog", SuffixPolicy::Save, None, Some(&missing))
            .unwrap_err();
        assert!(matches!(err, Error::OutputDirNotFound(_)));
        assert!(OutputPathResolver::new(voc(), Some(missing)).is_err());
    }

    #[test]
    fn second_source_cannot_claim_a_written_path() {
        let claims = OutputClaims::default();
        let path = PathBuf::from("/data/a-dog.png");
        let png = Source::parse("/data/a.png");
        let jpg = Source::parse("/data/a.jpg");

        claims.claim(&path, &png).unwrap();
        claims.claim(&path, &png).unwrap();
        let err = claims.claim(&path, &jpg).unwrap_err();
        assert!(
            matches!(err, Error::WriteFailure { ref reason, .. } if reason.contains("/data/a.png")),
            "{err}"
        );
        claims
            .claim(Path::new("/data/a-no-dog.png"), &jpg)
            .unwrap();
        assert_eq!(claims.len(), 2);
    }

    #[test]
    fn non_canonical_labels_are_rejected() {
        let src = Source::parse("photo.jpg");
        for label in ["Dog", "people", "all", "unicorn"] {
            let err = resolve(&voc(), &src, label, SuffixPolicy::Save, None, None).unwrap_err();
            assert!(matches!(err, Error::InvalidLabel(_)), "label {label}");
        }
    }
}
