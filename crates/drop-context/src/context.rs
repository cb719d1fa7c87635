//! Processing context and the processor-chain executor.
//!
//! A [`Context`] carries the processor [`Registry`], the shared data bag and a
//! directory stack. The bottom of the stack is the project root; the top is
//! the directory of the file currently being processed. Paths starting with
//! `.` resolve against the top, everything else against the root, so content
//! can reference shared files from the root and siblings relative to itself
//! with one rule.
//!
//! Contexts are never mutated. [`Context::with_dir_on_top`] returns a new
//! value that shares the registry, the data bag and the existing stack frames,
//! so concurrent branches of processing can derive contexts freely.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::document::{Document, FrontMatterDocument, ProducerDocument};
use crate::processor::{Processor, ProcessorDef, ProcessorInput, Registry};
use crate::resolve::lookup_real_file;
use crate::{Artifact, BoxFuture, ProcessError};

/// Data bag shared by every processor of a descriptor.
pub type ContextData = Map<String, Value>;

/// Whether a file must declare at least one processor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChainPolicy {
    /// A missing `processors` list means the body passes through unchanged.
    #[default]
    Optional,
    /// A missing or empty `processors` list is a configuration error.
    Required,
}

/// Persistent singly linked list of paths; pushing shares the existing nodes.
#[derive(Clone, Default)]
struct PathList(Option<Arc<PathNode>>);

struct PathNode {
    path: PathBuf,
    below: PathList,
}

impl PathList {
    fn push(&self, path: PathBuf) -> Self {
        Self(Some(Arc::new(PathNode {
            path,
            below: self.clone(),
        })))
    }

    fn top(&self) -> Option<&Path> {
        self.0.as_deref().map(|node| node.path.as_path())
    }

    fn iter(&self) -> impl Iterator<Item = &Path> {
        let mut current = self.0.as_deref();
        std::iter::from_fn(move || {
            let node = current?;
            current = node.below.0.as_deref();
            Some(node.path.as_path())
        })
    }

    /// Paths from bottom to top.
    fn to_vec(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.iter().map(Path::to_path_buf).collect();
        paths.reverse();
        paths
    }
}

/// Resolution and execution environment for processor chains.
#[derive(Clone)]
pub struct Context {
    registry: Arc<Registry>,
    data: Arc<ContextData>,
    root_dir: Arc<Path>,
    dirs: PathList,
    in_flight: PathList,
}

impl Context {
    /// Create a context whose directory stack is `[root_dir]`.
    pub fn new(
        root_dir: impl Into<PathBuf>,
        registry: Arc<Registry>,
        data: Arc<ContextData>,
    ) -> Self {
        let root_dir: PathBuf = root_dir.into();
        Self {
            registry,
            data,
            dirs: PathList::default().push(root_dir.clone()),
            root_dir: Arc::from(root_dir),
            in_flight: PathList::default(),
        }
    }

    /// New context with `dir` pushed on top of the directory stack.
    #[must_use]
    pub fn with_dir_on_top(&self, dir: impl Into<PathBuf>) -> Self {
        Self {
            dirs: self.dirs.push(dir.into()),
            ..self.clone()
        }
    }

    /// The fixed project root (bottom of the stack).
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// The most specific directory (top of the stack).
    #[must_use]
    pub fn current_dir(&self) -> &Path {
        self.dirs.top().unwrap_or(&self.root_dir)
    }

    /// Directory stack from root to current directory.
    #[must_use]
    pub fn dir_stack(&self) -> Vec<PathBuf> {
        self.dirs.to_vec()
    }

    #[must_use]
    pub fn data(&self) -> &ContextData {
        &self.data
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve a logical path to an absolute candidate path.
    ///
    /// Paths starting with `.` are relative to the current directory; all
    /// others are relative to the root. No filesystem access.
    #[must_use]
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        let base = if path.as_os_str().to_string_lossy().starts_with('.') {
            self.current_dir()
        } else {
            self.root_dir()
        };
        join_normalized(base, path)
    }

    /// Process a source file through the processors its front matter declares.
    ///
    /// A file without a `processors` list yields its body unchanged.
    pub fn process(
        &self,
        source_path: impl AsRef<Path>,
    ) -> BoxFuture<'_, Result<Artifact, ProcessError>> {
        self.process_with(source_path, ChainPolicy::Optional)
    }

    /// Process a source file with an explicit [`ChainPolicy`].
    pub fn process_with(
        &self,
        source_path: impl AsRef<Path>,
        policy: ChainPolicy,
    ) -> BoxFuture<'_, Result<Artifact, ProcessError>> {
        let source_path = source_path.as_ref().to_path_buf();
        Box::pin(async move { self.process_path(&source_path, policy).await })
    }

    async fn process_path(
        &self,
        source_path: &Path,
        policy: ChainPolicy,
    ) -> Result<Artifact, ProcessError> {
        let candidate = self.resolve(source_path);
        let file = lookup_real_file(&candidate)
            .await?
            .ok_or(ProcessError::FileNotFound { path: candidate })?;

        if self.in_flight.iter().any(|p| p == file.as_path()) {
            let mut chain = self.in_flight.to_vec();
            chain.push(file);
            return Err(ProcessError::Cycle { chain });
        }

        let content = tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| ProcessError::io(&file, e))?;
        let derived = self.derive_for(&file);

        match Document::parse(&file, &content)? {
            Document::Producer(doc) => derived.run_producer(&file, doc).await,
            Document::FrontMatter(doc) => derived.run_chain(file, doc, policy).await,
        }
    }

    /// Context for processors of `file`: its directory on top, `file` in flight.
    fn derive_for(&self, file: &Path) -> Self {
        let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            in_flight: self.in_flight.push(file.to_path_buf()),
            ..self.with_dir_on_top(dir)
        }
    }

    async fn run_producer(
        &self,
        file: &Path,
        doc: ProducerDocument,
    ) -> Result<Artifact, ProcessError> {
        let producer = self
            .registry
            .producer(&doc.producer_id)
            .ok_or_else(|| ProcessError::UnknownProducer {
                file: file.to_path_buf(),
                id: doc.producer_id.clone(),
            })?;
        tracing::debug!(file = %file.display(), producer = %doc.producer_id, "Running producer");
        producer.produce(self.clone(), doc.args).await
    }

    async fn run_chain(
        &self,
        file: PathBuf,
        doc: FrontMatterDocument,
        policy: ChainPolicy,
    ) -> Result<Artifact, ProcessError> {
        let defs = ProcessorDef::parse_list(&file, doc.processors_node())?;
        if policy == ChainPolicy::Required && defs.is_empty() {
            return Err(ProcessError::MissingProcessors { file });
        }

        // Resolve every step before running any of them.
        let steps = defs
            .into_iter()
            .map(|def| match self.registry.processor(&def.id) {
                Some(processor) => Ok((def, Arc::clone(processor))),
                None => Err(ProcessError::UnknownProcessor {
                    file: file.clone(),
                    id: def.id,
                }),
            })
            .collect::<Result<Vec<(ProcessorDef, Arc<dyn Processor>)>, _>>()?;

        let mut content = Artifact::Text(doc.body);
        for (def, processor) in steps {
            let id = def.id.clone();
            tracing::debug!(file = %file.display(), processor = %id, "Applying processor");
            let input = ProcessorInput {
                context: self.clone(),
                source_file: file.clone(),
                front_matter_raw: Arc::clone(&doc.front_matter_raw),
                front_matter_data: Arc::clone(&doc.front_matter_data),
                args: def,
                content,
            };
            content = processor.process(input).await.inspect_err(|e| {
                tracing::debug!(
                    file = %file.display(),
                    processor = %id,
                    error = %e,
                    "Processor failed"
                );
            })?;
        }
        Ok(content)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("dir_stack", &self.dir_stack())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Join `path` onto `base`, resolving `.` and `..` lexically.
///
/// A root component in `path` does not replace `base`.
fn join_normalized(base: &Path, path: &Path) -> PathBuf {
    let mut joined = base.to_path_buf();
    for component in path.components() {
        match component {
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                joined.pop();
            }
            Component::Normal(part) => joined.push(part),
        }
    }
    joined
}
