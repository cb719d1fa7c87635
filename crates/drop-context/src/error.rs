//! Error types for content processing.

use std::path::PathBuf;

/// Error returned while resolving or processing a source file.
///
/// Variants fall into four groups:
/// - configuration: `UnknownProcessor`, `UnknownProducer`, `InvalidProcessors`,
///   `MissingProcessors`, `InvalidFrontMatter`
/// - resolution: `FileNotFound`, `AmbiguousFile`
/// - transform: `Transform`, raised by processors and propagated unchanged
/// - `Cycle` for files that reference themselves through a processor
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Couldn't find file {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Multiple matching files for {}: {}", .path.display(), format_candidates(.candidates))]
    AmbiguousFile {
        path: PathBuf,
        candidates: Vec<PathBuf>,
    },

    #[error("Couldn't find processor '{id}' mentioned in '{}'", .file.display())]
    UnknownProcessor { file: PathBuf, id: String },

    #[error("Couldn't find producer '{id}' mentioned in '{}'", .file.display())]
    UnknownProducer { file: PathBuf, id: String },

    #[error("Invalid processors in '{}': {detail}", .file.display())]
    InvalidProcessors { file: PathBuf, detail: String },

    #[error("Processors must be given in '{}'", .file.display())]
    MissingProcessors { file: PathBuf },

    #[error("Invalid front matter in '{}': {detail}", .file.display())]
    InvalidFrontMatter { file: PathBuf, detail: String },

    #[error("Cyclic processing: {}", format_candidates(.chain))]
    Cycle { chain: Vec<PathBuf> },

    /// Error raised by a processor implementation.
    #[error("{0}")]
    Transform(String),

    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    /// Create a transform error from any displayable value.
    pub fn transform(msg: impl std::fmt::Display) -> Self {
        Self::Transform(msg.to_string())
    }

    /// Whether the error means "no such source file".
    ///
    /// The serve-time page state treats this as a fallthrough rather than a failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn format_candidates(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_processor_names_file_and_id() {
        let err = ProcessError::UnknownProcessor {
            file: PathBuf::from("/site/pages/index.html.md"),
            id: "markdwn".to_owned(),
        };

        let msg = err.to_string();
        assert!(msg.contains("markdwn"));
        assert!(msg.contains("/site/pages/index.html.md"));
    }

    #[test]
    fn test_ambiguous_lists_candidates() {
        let err = ProcessError::AmbiguousFile {
            path: PathBuf::from("/site/a"),
            candidates: vec![PathBuf::from("/site/a.html"), PathBuf::from("/site/a.md")],
        };

        assert_eq!(
            err.to_string(),
            "Multiple matching files for /site/a: /site/a.html, /site/a.md"
        );
    }

    #[test]
    fn test_is_not_found() {
        let err = ProcessError::FileNotFound {
            path: PathBuf::from("x"),
        };
        assert!(err.is_not_found());
        assert!(!ProcessError::transform("boom").is_not_found());
    }
}
