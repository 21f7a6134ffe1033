//! Object-name normalization and the parsed object argument.
//!
//! Every label that enters the library goes through [`validate`], so alias
//! handling (`people` → `person`, `bg` → `background`, …) lives in one place.
use crate::error::{Error, Result};
use crate::labels::{LabelSet, ALL, COLORMAP};
use serde::Serialize;

/// Lower-cases `raw` and maps common synonyms onto canonical labels.
pub fn normalize(raw: &str) -> String {
    let name = raw.to_lowercase();
    let canonical = match name.as_str() {
        "bg" | "backdrop" => "background",
        "plane" | "aeroplane" => "airplane",
        "bike" => "bicycle",
        "ship" => "boat",
        "automobile" => "car",
        "table" => "dining table",
        "motorcycle" => "motorbike",
        "human" | "people" | "persons" => "person",
        "plant" | "houseplant" => "potted plant",
        "couch" => "sofa",
        "television" | "tele" | "t.v." => "tv",
        _ => return name,
    };
    canonical.to_string()
}

/// Normalizes `raw` and checks it against `labels` and the `all` /
/// `colormap` pseudo-labels.
pub fn validate(raw: &str, labels: &LabelSet) -> Result<String> {
    let name = normalize(raw);
    if labels.contains(&name) || name == ALL || name == COLORMAP {
        Ok(name)
    } else {
        Err(Error::InvalidObject(raw.to_string()))
    }
}

/// Object selector given on the command line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "label")]
pub enum ObjectArgument {
    /// Flag given without a value.
    NoFilter,
    /// Explicit `all`.
    All,
    /// A validated canonical label (may be `colormap`).
    Named(String),
}

impl ObjectArgument {
    pub fn parse(raw: Option<&str>, labels: &LabelSet) -> Result<Self> {
        match raw {
            None => Ok(Self::NoFilter),
            Some(value) => {
                let name = validate(value, labels)?;
                if name == ALL {
                    Ok(Self::All)
                } else {
                    Ok(Self::Named(name))
                }
            }
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }
}
