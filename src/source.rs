//! Input sources: local image files and HTTP(S) URLs.
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where an input image comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "location")]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    /// Strings starting with `http:` or `https:` are URLs, anything else is a
    /// filesystem path.
    pub fn parse(input: &str) -> Self {
        if is_url(input) {
            Self::Url(input.to_string())
        } else {
            Self::File(PathBuf::from(input))
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Url(_) => None,
        }
    }

    /// Last path component; for URLs the query string and fragment are
    /// dropped.
    pub fn base_name(&self) -> String {
        match self {
            Self::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Url(url) => url_base_name(url).to_string(),
        }
    }

    /// Base name without its extension.
    pub fn stem(&self) -> String {
        let base = self.base_name();
        match Path::new(&base).file_stem() {
            Some(stem) if !stem.is_empty() => stem.to_string_lossy().into_owned(),
            _ => base,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http:") || input.starts_with("https:")
}

fn url_base_name(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = url[..end].trim_end_matches('/');
    let after_scheme = path.find("://").map_or(path, |i| &path[i + 3..]);
    match after_scheme.rfind('/') {
        Some(i) => &after_scheme[i + 1..],
        None => "",
    }
}
