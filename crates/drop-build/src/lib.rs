//! Static build for drop sites.
//!
//! [`build`] cleans the destination directory, then for every descriptor
//! (concurrently with the others):
//! - copies the statics directory verbatim
//! - processes every file below the pages directory, one task per file
//! - renders every dynamic route, one task per route
//!
//! A failing task does not stop its siblings. Failures are logged and
//! collected in the returned [`BuildReport`]; files already written stay.

mod error;
mod fs;

use std::path::{Path, PathBuf};

use drop_context::{Artifact, Context, Descriptor, ProcessError, destination_file_name};
use tokio::task::JoinSet;

pub use error::{BuildError, BuildFailure};

/// Options for [`build`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Output root. Removed and recreated at the start of every build.
    pub destination_dir: PathBuf,
}

/// Outcome of a build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Pages and routes written, plus static files copied.
    pub files_written: usize,
    pub failures: Vec<BuildFailure>,
}

impl BuildReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: Self) {
        self.files_written += other.files_written;
        self.failures.extend(other.failures);
    }

    fn record(&mut self, result: TaskResult) {
        match result {
            Ok(written) => self.files_written += written,
            Err(failure) => {
                tracing::error!(
                    target_path = %failure.target.display(),
                    error = %failure.error,
                    "Build step failed"
                );
                self.failures.push(failure);
            }
        }
    }
}

type TaskResult = Result<usize, BuildFailure>;

/// Build every descriptor into `options.destination_dir`.
///
/// # Errors
///
/// Returns an error only if the destination directory cannot be prepared.
/// Failures of individual pages, routes and copies are reported in
/// [`BuildReport::failures`].
pub async fn build(
    descriptors: &[Descriptor],
    options: &BuildOptions,
) -> Result<BuildReport, BuildError> {
    tracing::info!(destination = %options.destination_dir.display(), "Building static site");
    fs::clean_dir(&options.destination_dir).await?;

    let mut sites = JoinSet::new();
    for descriptor in descriptors {
        let dest = site_destination(&options.destination_dir, descriptor);
        sites.spawn(build_descriptor(descriptor.clone(), dest));
    }

    let mut report = BuildReport::default();
    while let Some(joined) = sites.join_next().await {
        match joined {
            Ok(site_report) => report.merge(site_report),
            Err(e) => report.record(Err(BuildFailure {
                target: options.destination_dir.clone(),
                error: BuildError::Task(e),
            })),
        }
    }

    tracing::info!(
        files = report.files_written,
        failures = report.failures.len(),
        "Build finished"
    );
    Ok(report)
}

/// `destination_dir/mount_point`, or `destination_dir` for root descriptors.
fn site_destination(destination_dir: &Path, descriptor: &Descriptor) -> PathBuf {
    match descriptor.normalized_mount_point() {
        Some(mount_point) => destination_dir.join(mount_point),
        None => destination_dir.to_path_buf(),
    }
}

async fn build_descriptor(descriptor: Descriptor, dest: PathBuf) -> BuildReport {
    let mut report = BuildReport::default();
    let mut tasks: JoinSet<TaskResult> = JoinSet::new();

    if let Some(statics_dir) = descriptor.statics_dir() {
        let dest = dest.clone();
        tasks.spawn(async move {
            tracing::info!(from = %statics_dir.display(), to = %dest.display(), "Copying statics");
            fs::copy_dir(&statics_dir, &dest)
                .await
                .map_err(|error| BuildFailure {
                    target: statics_dir.clone(),
                    error,
                })
        });
    }

    if let Some(pages_dir) = descriptor.pages_dir() {
        match fs::walk_files(&pages_dir).await {
            Ok(pages) => {
                let context = descriptor.context();
                for page in pages {
                    let source_file = pages_dir.join(&page);
                    let logical = source_file
                        .strip_prefix(&descriptor.source_dir)
                        .map_or_else(|_| source_file.clone(), Path::to_path_buf);
                    let target = page_destination(&dest, &page);
                    tasks.spawn(build_page(context.clone(), source_file, logical, target));
                }
            }
            Err(error) => report.record(Err(BuildFailure {
                target: pages_dir,
                error,
            })),
        }
    }

    for route in descriptor.dynamic_routes.to_list() {
        let target = dest.join(&route.path);
        tasks.spawn(async move {
            tracing::info!(route = %route.path, to = %target.display(), "Building dynamic route");
            match route.render().await {
                Ok(artifact) => persist(&target, artifact).await,
                Err(source) => Err(process_failure(Path::new(&route.path), source)),
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        report.record(joined.unwrap_or_else(|e| {
            Err(BuildFailure {
                target: dest.clone(),
                error: BuildError::Task(e),
            })
        }));
    }
    report
}

/// Process `logical` (relative to the source root) and write it to `target`.
async fn build_page(
    context: Context,
    source_file: PathBuf,
    logical: PathBuf,
    target: PathBuf,
) -> TaskResult {
    tracing::info!(page = %source_file.display(), to = %target.display(), "Building page");
    match context.process(&logical).await {
        Ok(artifact) => persist(&target, artifact).await,
        Err(source) => Err(process_failure(&source_file, source)),
    }
}

/// `dest/<page dir>/<destination file name>`.
fn page_destination(dest: &Path, page: &Path) -> PathBuf {
    let file_name = page
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = page.parent().unwrap_or(Path::new(""));
    dest.join(dir).join(destination_file_name(&file_name))
}

fn process_failure(source_file: &Path, source: ProcessError) -> BuildFailure {
    BuildFailure {
        target: source_file.to_path_buf(),
        error: BuildError::Process {
            target: source_file.to_path_buf(),
            source,
        },
    }
}

async fn persist(target: &Path, artifact: Artifact) -> TaskResult {
    match fs::persist(target, artifact).await {
        Ok(written) => Ok(usize::from(written)),
        Err(error) => Err(BuildFailure {
            target: target.to_path_buf(),
            error,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_destination_strips_processing_extension() {
        let dest = Path::new("/out");

        assert_eq!(
            page_destination(dest, Path::new("blog/post.html.md")),
            PathBuf::from("/out/blog/post.html")
        );
        assert_eq!(
            page_destination(dest, Path::new("guide.pdf")),
            PathBuf::from("/out/guide.pdf")
        );
        assert_eq!(page_destination(dest, Path::new("README")), PathBuf::from("/out/README"));
    }

    #[test]
    fn test_site_destination_uses_mount_point() {
        let root = Descriptor::new("/site");
        let docs = Descriptor::new("/site").with_mount_point("/docs/");

        assert_eq!(site_destination(Path::new("/out"), &root), PathBuf::from("/out"));
        assert_eq!(site_destination(Path::new("/out"), &docs), PathBuf::from("/out/docs"));
    }
}
