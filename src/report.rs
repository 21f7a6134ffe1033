//! Text summaries of processed files.
//!
//! Three shapes, chosen from the request:
//! - inventory listing (`contains` without an object),
//! - found / not-found partition (`contains <object>`),
//! - artifact listing (`save` / `remove`, per segment or per object).
//!
//! The reporter only builds strings; printing is the caller's business.
use crate::normalize::ObjectArgument;
use crate::processor::{Action, Artifact, ArtifactStatus, Request};
use crate::scan::FileOutcome;

#[derive(Clone, Copy, Debug, Default)]
pub struct ReportOptions {
    /// List images that do not contain the requested object.
    pub show_non_matches: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Reporter {
    options: ReportOptions,
}

impl Reporter {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn report(&self, request: &Request, outcomes: &[FileOutcome]) -> String {
        let lines = match (request.action, &request.object) {
            (Action::Contains, ObjectArgument::Named(label)) => {
                self.contains_object(label, request, outcomes)
            }
            (Action::Contains, _) => inventory_listing(outcomes),
            (Action::Save | Action::Remove, ObjectArgument::Named(label)) => {
                artifacts_by_object(label, request.action == Action::Remove, outcomes)
            }
            (Action::Save | Action::Remove, _) => artifacts_by_image(outcomes),
            (Action::Preview, ObjectArgument::Named(label)) => preview_misses(label, outcomes),
            (Action::Preview, _) => failures(outcomes),
        };
        lines.join("\n")
    }

    fn contains_object(
        &self,
        label: &str,
        request: &Request,
        outcomes: &[FileOutcome],
    ) -> Vec<String> {
        let mut found = Vec::new();
        let mut missing = Vec::new();
        for outcome in outcomes {
            if outcome.matches(request) {
                found.push(outcome.source.base_name());
            } else if outcome.report().is_some() {
                missing.push(outcome.source.base_name());
            }
        }

        let mut lines = partition_lines(&format!("[{label}] found in"), &found);
        if self.options.show_non_matches {
            lines.extend(partition_lines(&format!("[{label}] not found in"), &missing));
        } else if found.is_empty() && !missing.is_empty() {
            lines.push(format!("[{label}] not found"));
        }
        lines.extend(failures(outcomes));
        lines
    }
}

/// `header x` for a single name, `header` plus an indented list otherwise.
fn partition_lines(header: &str, names: &[String]) -> Vec<String> {
    match names {
        [] => Vec::new(),
        [only] => vec![format!("{header} {only}")],
        many => std::iter::once(header.to_string())
            .chain(many.iter().map(|n| format!("  {n}")))
            .collect(),
    }
}

fn name_width(outcomes: &[FileOutcome]) -> usize {
    outcomes
        .iter()
        .map(|o| o.source.base_name().chars().count())
        .max()
        .unwrap_or(0)
}

fn inventory_listing(outcomes: &[FileOutcome]) -> Vec<String> {
    let width = name_width(outcomes);
    outcomes
        .iter()
        .map(|outcome| {
            let name = outcome.source.base_name();
            match &outcome.result {
                Ok(report) => {
                    let objects: Vec<&str> = report.result.detected_objects().collect();
                    if objects.is_empty() {
                        format!("{name:<width$} contains no known objects")
                    } else {
                        format!("{name:<width$} contains [{}]", objects.join(", "))
                    }
                }
                Err(err) => format!("{name:<width$} failed: {err}"),
            }
        })
        .collect()
}

fn artifact_line(artifact: &Artifact, width: usize) -> String {
    let tag = format!("[{}]", artifact.label);
    let output = artifact
        .output_path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    match artifact.status {
        ArtifactStatus::Saved => format!("  {tag:<width$} saved as {output}"),
        ArtifactStatus::Removed => format!("  {tag:<width$} removed and saved as {output}"),
        ArtifactStatus::Failed => format!(
            "  failed {tag}: {}",
            artifact.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn artifacts_by_image(outcomes: &[FileOutcome]) -> Vec<String> {
    let width = outcomes
        .iter()
        .filter_map(FileOutcome::report)
        .flat_map(|r| r.artifacts.iter())
        .map(|a| a.label.chars().count() + 2)
        .max()
        .unwrap_or(0);
    let mut lines = Vec::new();
    for outcome in outcomes {
        let name = outcome.source.base_name();
        match &outcome.result {
            Ok(report) if report.artifacts.is_empty() => {
                lines.push(format!("{name} contains no known objects"));
            }
            Ok(report) => {
                lines.push(name);
                lines.extend(report.artifacts.iter().map(|a| artifact_line(a, width)));
            }
            Err(err) => lines.push(format!("{name} failed: {err}")),
        }
    }
    lines
}

fn artifacts_by_object(label: &str, removed: bool, outcomes: &[FileOutcome]) -> Vec<String> {
    let width = name_width(outcomes);
    let mut written = Vec::new();
    let mut missing = Vec::new();
    for outcome in outcomes {
        let Some(report) = outcome.report() else {
            continue;
        };
        let name = outcome.source.base_name();
        if report.artifacts.is_empty() {
            missing.push(name);
            continue;
        }
        for artifact in &report.artifacts {
            match (artifact.status, artifact.output_path()) {
                (ArtifactStatus::Saved | ArtifactStatus::Removed, Some(path)) => {
                    written.push(format!("  {name:<width$} saved as {}", path.display()));
                }
                _ => written.push(format!(
                    "  {name:<width$} failed: {}",
                    artifact.error.as_deref().unwrap_or("unknown error")
                )),
            }
        }
    }

    let mut lines = Vec::new();
    if !written.is_empty() {
        let verb = if removed { "removed from" } else { "found in" };
        lines.push(format!("[{label}] {verb}"));
        lines.extend(written);
    }
    lines.extend(partition_lines(&format!("[{label}] not found in"), &missing));
    lines.extend(failures(outcomes));
    lines
}

fn preview_misses(label: &str, outcomes: &[FileOutcome]) -> Vec<String> {
    let missing: Vec<String> = outcomes
        .iter()
        .filter(|o| o.report().is_some_and(|r| r.previews.is_empty()))
        .map(|o| o.source.base_name())
        .collect();
    let mut lines = partition_lines(&format!("[{label}] not found in"), &missing);
    lines.extend(failures(outcomes));
    lines
}

fn failures(outcomes: &[FileOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .filter_map(|o| {
            o.error()
                .map(|err| format!("{} failed: {err}", o.source.base_name()))
        })
        .collect()
}
