//! Post-processing for semantic segmentation: object inventories, crop and
//! remove cut-outs, and false-color colormaps.
//!
//! A [`Segmenter`] turns an image into a [`ClassMap`] (one class index per
//! pixel). Everything after that is local: the [`SegmentationResult`]
//! inventory, the [`MaskCompositor`] alpha masks, output naming and batch
//! scans over a directory.
//!
//! ```no_run
//! use magicat::prelude::*;
//!
//! # fn main() -> magicat::Result<()> {
//! let segmenter = MaxSegmenter::new(&ModelConfig::default())?;
//! let processor = Processor::new(segmenter, ProcessorOptions::default())?;
//! let labels = LabelSet::default();
//! let request = Request::new(
//!     Action::Save,
//!     ObjectArgument::parse(Some("dog"), &labels)?,
//!     &labels,
//! )?;
//! let report = processor.process(&Source::parse("photo.jpg"), &request)?;
//! println!("{:?}", report.result.inventory());
//! # Ok(())
//! # }
//! ```

// Core data model
pub mod error;
pub mod labels;
pub mod normalize;
pub mod segmentation;

// Pipeline stages
pub mod compositor;
pub mod image;
pub mod model;
pub mod output;
pub mod processor;
pub mod scan;
pub mod source;

// Presentation and plumbing
pub mod config;
pub mod diagnostics;
pub mod preview;
pub mod report;

// --- High-level re-exports -------------------------------------------------

pub use crate::compositor::{CompositeMode, MaskCompositor, PaletteAssignment};
pub use crate::config::{load_config, Config, ModelConfig, ProcessingConfig};
pub use crate::error::{Error, Result};
pub use crate::labels::LabelSet;
pub use crate::model::{MaxSegmenter, Prediction, Segmenter};
pub use crate::normalize::ObjectArgument;
pub use crate::output::{OutputPathResolver, SuffixPolicy};
pub use crate::processor::{Action, FileReport, Processor, ProcessorOptions, Request};
pub use crate::report::{ReportOptions, Reporter};
pub use crate::scan::{BatchScanner, FileOutcome, ScanReport};
pub use crate::segmentation::{ClassMap, SegmentationResult};
pub use crate::source::Source;

/// Everything needed to drive the pipeline from a binary or a test.
pub mod prelude {
    pub use crate::{
        Action, BatchScanner, ClassMap, FileOutcome, LabelSet, MaxSegmenter, ModelConfig,
        ObjectArgument, Prediction, Processor, ProcessorOptions, Request, Segmenter, Source,
    };
}
