//! Directory scans.
//!
//! Purpose
//! - Run the per-file pipeline over every image in a directory and split the
//!   results into matches and non-matches for the requested object.
//!
//! Design
//! - Entries are sorted by file name; that order is the listing order used
//!   by every report.
//! - Images are recognized by their leading bytes (see
//!   [`crate::image::signature`]), not by extension.
//! - Files run on a bounded rayon pool when the `parallel` feature is on.
//!   The indexed collect keeps outcomes in listing order whatever order the
//!   workers finish in.
//! - A failing file is recorded in its [`FileOutcome`] and counts as a
//!   non-match; only an unreadable directory aborts the scan.
//! - Artifact paths are claimed per scan, so same-stem inputs never
//!   overwrite each other's output.
use crate::error::{Error, Result};
use crate::image::sniff_file;
use crate::model::Segmenter;
use crate::output::OutputClaims;
use crate::processor::{Action, FileReport, Processor, Request};
use crate::source::Source;
use log::{debug, info, warn};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Result of processing one image.
#[derive(Debug)]
pub struct FileOutcome {
    pub source: Source,
    pub result: Result<FileReport>,
}

impl FileOutcome {
    pub fn new(source: Source, result: Result<FileReport>) -> Self {
        Self { source, result }
    }

    pub fn report(&self) -> Option<&FileReport> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }

    /// Failed files never match.
    pub fn matches(&self, request: &Request) -> bool {
        self.report().is_some_and(|r| r.matches(&request.object))
    }
}

impl Serialize for FileOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FileOutcome", 3)?;
        state.serialize_field("source", &self.source)?;
        match &self.result {
            Ok(report) => {
                state.serialize_field("status", "processed")?;
                state.serialize_field("report", report)?;
            }
            Err(err) => {
                state.serialize_field("status", "failed")?;
                state.serialize_field("error", &err.to_string())?;
            }
        }
        state.end()
    }
}

/// Aggregated outcome of a directory scan.
///
/// `matches` and `non_matches` partition the recognized images: together
/// they hold every path in `outcomes`, each exactly once, in listing order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub directory: PathBuf,
    pub request: Request,
    pub outcomes: Vec<FileOutcome>,
    pub matches: Vec<PathBuf>,
    pub non_matches: Vec<PathBuf>,
}

impl ScanReport {
    fn from_outcomes(directory: PathBuf, request: Request, outcomes: Vec<FileOutcome>) -> Self {
        let mut matches = Vec::new();
        let mut non_matches = Vec::new();
        for outcome in &outcomes {
            let path = match &outcome.source {
                Source::File(path) => path.clone(),
                Source::Url(url) => PathBuf::from(url),
            };
            if outcome.matches(&request) {
                matches.push(path);
            } else {
                non_matches.push(path);
            }
        }
        Self {
            directory,
            request,
            outcomes,
            matches,
            non_matches,
        }
    }

    /// Number of files recognized as images.
    pub fn image_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn outcome(&self, path: &Path) -> Option<&FileOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.source.as_path() == Some(path))
    }
}

/// Lists the images in `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    info!("scanning for images in directory '{}' ...", dir.display());

    let entries = fs::read_dir(dir).map_err(|source| Error::DirectoryReadFailure {
        path: dir.to_path_buf(),
        source,
    })?;
    let files = regular_files(dir, entries.map(|entry| entry.map(|e| e.path())));

    let images: Vec<PathBuf> = files
        .into_iter()
        .filter(|path| match sniff_file(path) {
            Ok(Some(kind)) => {
                debug!("{} recognized as {kind:?}", path.display());
                true
            }
            Ok(None) => false,
            Err(err) => {
                warn!("failed to read file '{}': {err}", path.display());
                false
            }
        })
        .collect();

    info!(
        "found {} image{} in directory '{}'",
        images.len(),
        if images.len() == 1 { "" } else { "s" },
        dir.display()
    );
    Ok(images)
}

/// Regular files among `entries`, sorted. Unreadable entries are logged and
/// skipped.
fn regular_files(
    dir: &Path,
    entries: impl IntoIterator<Item = io::Result<PathBuf>>,
) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = entries
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                warn!("skipping unreadable entry in '{}': {err}", dir.display());
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files
}

/// True when `contains <object>` matched no image. The binary exits with a
/// failure status in that case.
pub fn missed(request: &Request, outcomes: &[FileOutcome]) -> bool {
    request.action == Action::Contains
        && request.label().is_some()
        && !outcomes.iter().any(|o| o.matches(request))
}

pub struct BatchScanner<'a, S> {
    processor: &'a Processor<S>,
    workers: usize,
}

impl<'a, S: Segmenter> BatchScanner<'a, S> {
    pub fn new(processor: &'a Processor<S>, workers: usize) -> Self {
        Self {
            processor,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Processes every image in `dir` for `request`.
    pub fn scan(&self, dir: &Path, request: &Request) -> Result<ScanReport> {
        if request.action == Action::Preview {
            return Err(Error::InvalidArgument(
                "preview works with a single image, not a directory".to_string(),
            ));
        }
        request.validate(self.processor.segmenter().labels())?;
        let images = list_images(dir)?;
        let outcomes = self.run_all(&images, request);
        let report = ScanReport::from_outcomes(dir.to_path_buf(), request.clone(), outcomes);
        debug!(
            "scan of '{}': {} images, {} matches, {} failures",
            dir.display(),
            report.image_count(),
            report.matches.len(),
            report.failures().count()
        );
        Ok(report)
    }

    fn run_one(&self, path: &Path, request: &Request, claims: &OutputClaims) -> FileOutcome {
        let source = Source::File(path.to_path_buf());
        let result = self.processor.process_with(&source, request, claims);
        if let Err(err) = &result {
            warn!("error processing '{}': {err}", path.display());
        }
        FileOutcome::new(source, result)
    }

    #[cfg(feature = "parallel")]
    fn run_all(&self, images: &[PathBuf], request: &Request) -> Vec<FileOutcome> {
        use rayon::prelude::*;

        let claims = OutputClaims::default();
        let run = || {
            images
                .par_iter()
                .map(|path| self.run_one(path, request, &claims))
                .collect::<Vec<_>>()
        };
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(err) => {
                warn!(
                    "failed to build a {}-thread pool ({err}), using the global pool",
                    self.workers
                );
                run()
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run_all(&self, images: &[PathBuf], request: &Request) -> Vec<FileOutcome> {
        let claims = OutputClaims::default();
        images
            .iter()
            .map(|path| self.run_one(path, request, &claims))
            .collect()
    }
}
