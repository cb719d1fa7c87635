use std::path::PathBuf;

use drop_context::ProcessError;

/// Error returned while building a site.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build {}: {source}", .target.display())]
    Process {
        target: PathBuf,
        #[source]
        source: ProcessError,
    },

    #[error("Cannot write {}: result is a callable, not content", .target.display())]
    UnpersistableArtifact { target: PathBuf },

    #[error("Build task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// One page, route or statics copy that failed.
#[derive(Debug)]
pub struct BuildFailure {
    /// Source file, route path or statics directory the task worked on.
    pub target: PathBuf,
    pub error: BuildError,
}
