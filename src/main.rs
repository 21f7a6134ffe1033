use clap::{CommandFactory, FromArgMatches, Parser};
use log::{debug, info};
use magicat::config::{load_config, Config};
use magicat::image::io::write_json_file;
use magicat::image::sniff_file;
use magicat::prelude::*;
use magicat::scan::missed;
use magicat::{preview, Error, ReportOptions, Reporter, Result};
use std::path::PathBuf;
use std::process::ExitCode;

const ABOUT: &str = "Identify the contents of image files with semantic segmentation.\n\
    Argument <file|directory|url> must be an image file, a directory containing images, \
    or a URL to an image. Supported image types include PNG, JPEG, GIF and BMP.";

#[derive(Parser, Debug)]
#[command(
    name = "magicat",
    version,
    about = ABOUT,
    override_usage = "magicat <file|directory|url> [options]"
)]
struct Cli {
    /// Image file, directory of images, or image URL.
    #[arg(value_name = "file|directory|url")]
    input: String,

    /// Report whether the object is in the image. Without an object, list
    /// every object found.
    #[arg(short = 'c', long, value_name = "object", num_args = 0..=1)]
    contains: Option<Option<String>>,

    /// Save the object as a separate image. Without an object, save every
    /// object found.
    #[arg(short = 's', long, value_name = "object", num_args = 0..=1)]
    save: Option<Option<String>>,

    /// Save a copy of the image with the object removed. Without an object,
    /// save one copy per object found.
    #[arg(short = 'r', long, value_name = "object", num_args = 0..=1)]
    remove: Option<Option<String>>,

    /// Draw the object in the terminal. Without an object, draw the whole
    /// image. Single images only.
    #[arg(short = 'p', long, value_name = "object", num_args = 0..=1)]
    preview: Option<Option<String>>,

    /// Existing directory for saved images. Defaults to the input image's
    /// directory, or the working directory for URLs.
    #[arg(short = 'o', long, value_name = "directory")]
    output: Option<PathBuf>,

    /// Log progress and list images that do not contain the object.
    #[arg(long)]
    verbose: bool,

    /// JSON configuration file.
    #[arg(long, value_name = "file")]
    config: Option<PathBuf>,

    /// Prediction endpoint of the segmentation service.
    #[arg(long, value_name = "url")]
    model_url: Option<String>,

    /// Worker threads for directory scans.
    #[arg(long, value_name = "n")]
    workers: Option<usize>,

    /// Write the full report as JSON.
    #[arg(long, value_name = "file")]
    json: Option<PathBuf>,
}

fn pick(flag: &Option<Option<String>>) -> Option<Option<&str>> {
    flag.as_ref().map(|object| object.as_deref())
}

impl Cli {
    /// Preview wins over save, save over remove; contains is the default.
    fn action(&self) -> (Action, Option<&str>) {
        if let Some(object) = pick(&self.preview) {
            (Action::Preview, object)
        } else if let Some(object) = pick(&self.save) {
            (Action::Save, object)
        } else if let Some(object) = pick(&self.remove) {
            (Action::Remove, object)
        } else {
            (Action::Contains, pick(&self.contains).flatten())
        }
    }
}

enum Input {
    Directory(PathBuf),
    Single(Source),
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let labels = LabelSet::default();
    let matches = Cli::command()
        .after_help(objects_help(&labels))
        .get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let config = effective_config(&cli)?;
    let (action, raw_object) = cli.action();
    let request = Request::new(action, ObjectArgument::parse(raw_object, &labels)?, &labels)?;
    debug!("request: {request:?}");

    let input = resolve_input(&cli.input)?;
    let segmenter = MaxSegmenter::new(&config.model)?;
    info!("using segmentation service at {}", segmenter.endpoint());
    let processor = Processor::new(
        segmenter,
        ProcessorOptions {
            max_input_size: config.processing.max_input_size,
            palette: config.processing.palette,
            out_dir: cli.output.clone(),
        },
    )?;

    let outcomes = match input {
        Input::Directory(dir) => {
            let scanner = BatchScanner::new(&processor, config.processing.worker_count());
            let report = scanner.scan(&dir, &request)?;
            if let Some(path) = &cli.json {
                write_json_file(path, &report)?;
            }
            print_report(&request, &report.outcomes, cli.verbose);
            report.outcomes
        }
        Input::Single(source) => {
            let report = processor.process(&source, &request)?;
            for shown in &report.previews {
                if let Some(label) = &shown.label {
                    println!("[{label}]");
                }
                print!(
                    "{}",
                    preview::render(&shown.image, config.processing.preview_columns)
                );
            }
            let outcomes = vec![FileOutcome::new(source, Ok(report))];
            if let Some(path) = &cli.json {
                write_json_file(path, &outcomes[0])?;
            }
            print_report(&request, &outcomes, true);
            outcomes
        }
    };

    if let Some(path) = &cli.json {
        info!("JSON report written to {}", path.display());
    }

    Ok(if missed(&request, &outcomes) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn effective_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    if let Some(url) = &cli.model_url {
        config.model.endpoint = url.clone();
    }
    if let Some(workers) = cli.workers {
        config.processing.workers = Some(workers);
    }
    Ok(config)
}

fn resolve_input(raw: &str) -> Result<Input> {
    let source = Source::parse(raw);
    let Some(path) = source.as_path().map(PathBuf::from) else {
        return Ok(Input::Single(source));
    };
    if path.is_dir() {
        return Ok(Input::Directory(path));
    }
    if !path.is_file() {
        return Err(Error::SourceNotFound(path));
    }
    match sniff_file(&path)? {
        Some(_) => Ok(Input::Single(source)),
        None => Err(Error::NotAnImage(path)),
    }
}

fn print_report(request: &Request, outcomes: &[FileOutcome], show_non_matches: bool) {
    let text = Reporter::new(ReportOptions { show_non_matches }).report(request, outcomes);
    if !text.is_empty() {
        println!("{text}");
    }
}

/// Detectable objects in two columns, for `--help`.
fn objects_help(labels: &LabelSet) -> String {
    let names: Vec<&str> = labels.iter().collect();
    let mid = names.len().div_ceil(2);
    let width = names.iter().take(mid).map(|n| n.len()).max().unwrap_or(0) + 4;
    let mut lines = vec!["Objects:".to_string()];
    for (i, left) in names.iter().take(mid).enumerate() {
        match names.get(i + mid) {
            Some(right) => lines.push(format!("  {left:<width$}{right}")),
            None => lines.push(format!("  {left}")),
        }
    }
    lines.join("\n")
}
