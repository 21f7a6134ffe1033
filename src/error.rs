//! Error taxonomy shared by the library and the `magicat` binary.
use std::path::PathBuf;

/// Errors produced while validating arguments, running the model and
/// writing artifacts.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("[{0}] is not a valid object")]
    InvalidObject(String),

    #[error("[{0}] is not a canonical segment label")]
    InvalidLabel(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("class map is empty")]
    EmptyMap,

    #[error("size mismatch: expected {expected} pixels, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("class index {index} is outside the label set ({labels} labels)")]
    UnknownClass { index: u32, labels: usize },

    #[error("output directory '{}' does not exist", .0.display())]
    OutputDirNotFound(PathBuf),

    #[error("failed to read directory '{}': {source}", .path.display())]
    DirectoryReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not an image file", .0.display())]
    NotAnImage(PathBuf),

    #[error("'{}' is not a file or a directory", .0.display())]
    SourceNotFound(PathBuf),

    #[error("failed to decode image '{source_name}': {reason}")]
    ImageDecodeFailure { source_name: String, reason: String },

    #[error("failed to encode image: {0}")]
    ImageEncodeFailure(String),

    #[error("model inference failed: {0}")]
    ModelInferenceFailure(String),

    #[error("failed to write '{}': {reason}", .path.display())]
    WriteFailure { path: PathBuf, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn decode(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::ImageDecodeFailure {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn inference(reason: impl ToString) -> Self {
        Self::ModelInferenceFailure(reason.to_string())
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::WriteFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_object_names_the_input() {
        let err = Error::InvalidObject("unicorn".to_string());
        assert_eq!(err.to_string(), "[unicorn] is not a valid object");
    }

    #[test]
    fn size_mismatch_reports_both_sizes() {
        let err = Error::SizeMismatch {
            expected: 4,
            actual: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains('4') && msg.contains('3'), "{msg}");
    }

    #[test]
    fn encode_failure_has_its_own_message() {
        let err = Error::ImageEncodeFailure("PNG: zero width".into());
        assert_eq!(err.to_string(), "failed to encode image: PNG: zero width");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
