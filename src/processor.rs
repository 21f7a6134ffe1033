//! Per-file pipeline: load → decode → scale → predict → inventory → action.
//!
//! Every call owns its decoded image, and every composite renders into a
//! fresh copy of it, so one [`Processor`] can be driven from many threads
//! at once.
use crate::compositor::{CompositeMode, MaskCompositor, PaletteAssignment};
use crate::diagnostics::TimingBreakdown;
use crate::error::{Error, Result};
use crate::image::io::{decode_rgba, fit_within, read_source, resize_exact, write_png};
use crate::labels::{LabelSet, COLORMAP};
use crate::model::Segmenter;
use crate::normalize::ObjectArgument;
use crate::output::{OutputClaims, OutputPathResolver, SuffixPolicy};
use crate::segmentation::{ClassMap, SegmentationResult};
use crate::source::Source;
use image::RgbaImage;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Contains,
    Save,
    Remove,
    Preview,
}

/// What to do with every input image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub action: Action,
    pub object: ObjectArgument,
}

impl Request {
    pub fn new(action: Action, object: ObjectArgument, labels: &LabelSet) -> Result<Self> {
        let request = Self { action, object };
        request.validate(labels)?;
        Ok(request)
    }

    /// Rejects named objects that are not canonical entries of `labels` (or
    /// `colormap`), and combinations that can never produce an artifact.
    pub fn validate(&self, labels: &LabelSet) -> Result<()> {
        let Some(label) = self.object.label() else {
            return Ok(());
        };
        if !(labels.contains(label) || label == COLORMAP) {
            return Err(Error::InvalidObject(label.to_string()));
        }
        if self.action == Action::Remove && label == COLORMAP {
            return Err(Error::InvalidObject(COLORMAP.to_string()));
        }
        Ok(())
    }

    pub fn label(&self) -> Option<&str> {
        self.object.label()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactStatus {
    Saved,
    Removed,
    Failed,
}

/// Outcome of writing one segment image.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub status: ArtifactStatus,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Artifact {
    pub fn written(label: impl Into<String>, output: PathBuf, removed: bool) -> Self {
        Self {
            status: if removed {
                ArtifactStatus::Removed
            } else {
                ArtifactStatus::Saved
            },
            label: label.into(),
            output: Some(output),
            error: None,
        }
    }

    pub fn failed(label: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: ArtifactStatus::Failed,
            label: label.into(),
            output: None,
            error: Some(error.into()),
        }
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

/// Composited image to show in the terminal. `label` is `None` for the
/// unmodified input.
#[derive(Clone, Debug)]
pub struct Preview {
    pub label: Option<String>,
    pub image: RgbaImage,
}

/// Everything produced for one successfully processed image.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    /// Dimensions of the image the class map refers to.
    pub width: u32,
    pub height: u32,
    pub result: SegmentationResult,
    pub objects_detected: Vec<String>,
    pub artifacts: Vec<Artifact>,
    #[serde(skip)]
    pub previews: Vec<Preview>,
    pub timings: TimingBreakdown,
}

impl FileReport {
    /// Whether this image passes the object filter.
    pub fn matches(&self, object: &ObjectArgument) -> bool {
        match object.label() {
            Some(label) => self.result.contains(label),
            None => true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProcessorOptions {
    pub max_input_size: u32,
    pub palette: PaletteAssignment,
    pub out_dir: Option<PathBuf>,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            max_input_size: 512,
            palette: PaletteAssignment::Rank,
            out_dir: None,
        }
    }
}

/// Decoded image an export renders from, and where its artifacts go.
#[derive(Clone, Copy)]
struct ExportTarget<'a> {
    source: &'a Source,
    image: &'a RgbaImage,
    map: &'a ClassMap,
    claims: &'a OutputClaims,
}

pub struct Processor<S> {
    segmenter: S,
    compositor: MaskCompositor,
    resolver: OutputPathResolver,
    http: Client,
    max_input_size: u32,
}

impl<S: Segmenter> Processor<S> {
    /// Fails with `OutputDirNotFound` when `options.out_dir` does not exist,
    /// before any image is touched.
    pub fn new(segmenter: S, options: ProcessorOptions) -> Result<Self> {
        let labels = *segmenter.labels();
        let resolver = OutputPathResolver::new(labels, options.out_dir)?;
        let http = Client::builder()
            .build()
            .map_err(|e| Error::InvalidArgument(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            segmenter,
            compositor: MaskCompositor::new(labels, options.palette),
            resolver,
            http,
            max_input_size: options.max_input_size,
        })
    }

    pub fn segmenter(&self) -> &S {
        &self.segmenter
    }

    /// Runs the full pipeline for one image. The first error aborts this
    /// image only; write failures are reported as failed artifacts instead.
    pub fn process(&self, source: &Source, request: &Request) -> Result<FileReport> {
        self.process_with(source, request, &OutputClaims::default())
    }

    /// Like [`Processor::process`], but artifact paths already in `claims`
    /// belong to another source and are not overwritten.
    pub fn process_with(
        &self,
        source: &Source,
        request: &Request,
        claims: &OutputClaims,
    ) -> Result<FileReport> {
        request.validate(self.segmenter.labels())?;
        let t0 = Instant::now();
        let mut timings = TimingBreakdown::default();
        info!("processing image '{source}' ...");

        let bytes = timings.measure("load", || read_source(source, &self.http))?;
        let name = source.to_string();
        let decoded = timings.measure("decode", || decode_rgba(&bytes, &name))?;
        drop(bytes);
        let scaled = timings.measure("scale", || fit_within(decoded, self.max_input_size));

        let prediction = timings.measure("predict", || self.segmenter.predict(&scaled))?;
        let map = prediction.class_map;
        // The model may answer at its own resolution; masks index its grid.
        let image = resize_exact(scaled, map.width(), map.height());
        let result = SegmentationResult::from_class_map(&map, self.segmenter.labels())?;
        debug!(
            "'{source}': {}x{} inventory={:?}",
            map.width(),
            map.height(),
            result.inventory()
        );

        let mut artifacts = Vec::new();
        let mut previews = Vec::new();
        match request.action {
            Action::Contains => {}
            Action::Save | Action::Remove => {
                let policy = if request.action == Action::Remove {
                    SuffixPolicy::Remove
                } else {
                    SuffixPolicy::Save
                };
                artifacts = timings.measure("export", || {
                    let target = ExportTarget {
                        source,
                        image: &image,
                        map: &map,
                        claims,
                    };
                    self.export(&target, &result, &request.object, policy)
                });
            }
            Action::Preview => {
                previews = timings.measure("composite", || {
                    self.previews(&image, &map, &result, &request.object)
                })?;
            }
        }

        timings.finish(t0);
        debug!("'{source}': {}", timings.summary());
        Ok(FileReport {
            width: map.width(),
            height: map.height(),
            result,
            objects_detected: prediction.objects_detected,
            artifacts,
            previews,
            timings,
        })
    }

    /// Segment labels written for `object`, with their index when every
    /// segment is exported at once.
    fn export_targets<'a>(
        result: &'a SegmentationResult,
        object: &'a ObjectArgument,
        policy: SuffixPolicy,
    ) -> Vec<(Option<usize>, &'a str)> {
        match object {
            ObjectArgument::Named(label) => {
                if result.contains(label) {
                    vec![(None, label.as_str())]
                } else {
                    Vec::new()
                }
            }
            ObjectArgument::NoFilter | ObjectArgument::All => {
                let labels: Vec<&str> = match policy {
                    SuffixPolicy::Save => result.inventory().iter().map(String::as_str).collect(),
                    SuffixPolicy::Remove => result.segments().collect(),
                };
                labels
                    .into_iter()
                    .enumerate()
                    .map(|(i, label)| (Some(i), label))
                    .collect()
            }
        }
    }

    fn export(
        &self,
        target: &ExportTarget<'_>,
        result: &SegmentationResult,
        object: &ObjectArgument,
        policy: SuffixPolicy,
    ) -> Vec<Artifact> {
        let ExportTarget {
            source,
            image,
            map,
            claims,
        } = *target;
        let remove = policy == SuffixPolicy::Remove;
        Self::export_targets(result, object, policy)
            .into_iter()
            .map(|(index, label)| {
                let mode = CompositeMode::for_label(label, remove);
                let written = self
                    .compositor
                    .render(image, map, label, mode)
                    .and_then(|buffer| {
                        let path = self.resolver.resolve(source, label, policy, index)?;
                        claims.claim(&path, source)?;
                        write_png(&buffer, &path)?;
                        Ok(path)
                    });
                match written {
                    Ok(path) => {
                        debug!("'{source}': wrote [{label}] to {}", path.display());
                        Artifact::written(label, path, remove)
                    }
                    Err(err) => {
                        warn!("'{source}': failed to export [{label}]: {err}");
                        Artifact::failed(label, err.to_string())
                    }
                }
            })
            .collect()
    }

    fn previews(
        &self,
        image: &RgbaImage,
        map: &ClassMap,
        result: &SegmentationResult,
        object: &ObjectArgument,
    ) -> Result<Vec<Preview>> {
        let labels: Vec<&str> = match object {
            ObjectArgument::NoFilter => {
                return Ok(vec![Preview {
                    label: None,
                    image: image.clone(),
                }]);
            }
            ObjectArgument::All => result.inventory().iter().map(String::as_str).collect(),
            ObjectArgument::Named(label) if result.contains(label) => vec![label.as_str()],
            ObjectArgument::Named(_) => Vec::new(),
        };
        labels
            .into_iter()
            .map(|label| {
                let mode = CompositeMode::for_label(label, false);
                Ok(Preview {
                    label: Some(label.to_string()),
                    image: self.compositor.render(image, map, label, mode)?,
                })
            })
            .collect()
    }
}
