//! Processor contract and registry.
//!
//! A [`Processor`] is one named step in a file's chain. Files select their
//! steps through the `processors` list in front matter; each entry is looked
//! up by id in the [`Registry`] held by the [`Context`].
//!
//! A [`Producer`] backs `.producer` documents: instead of folding a body
//! through processors, the producer builds the whole artifact from the context.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{Artifact, BoxFuture, Context, ProcessError};

/// Input handed to each processor in a chain.
#[derive(Clone, Debug)]
pub struct ProcessorInput {
    /// Context with the source file's directory on top of the stack.
    pub context: Context,
    /// Physical file being processed.
    pub source_file: PathBuf,
    /// Front matter block exactly as written (without delimiters).
    pub front_matter_raw: Arc<str>,
    /// Parsed front matter.
    pub front_matter_data: Arc<Map<String, Value>>,
    /// This step's definition, including its id.
    pub args: ProcessorDef,
    /// Output of the previous step (the raw body for the first one).
    pub content: Artifact,
}

/// A single transformation step.
pub trait Processor: Send + Sync {
    fn process(&self, input: ProcessorInput) -> BoxFuture<'_, Result<Artifact, ProcessError>>;
}

/// Builds a whole artifact for a `.producer` document.
///
/// Only registered through the library API; see [`Registry::with_producer`].
pub trait Producer: Send + Sync {
    fn produce(
        &self,
        context: Context,
        args: Map<String, Value>,
    ) -> BoxFuture<'_, Result<Artifact, ProcessError>>;
}

struct FnProcessor<F>(F);

impl<F, Fut> Processor for FnProcessor<F>
where
    F: Fn(ProcessorInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Artifact, ProcessError>> + Send + 'static,
{
    fn process(&self, input: ProcessorInput) -> BoxFuture<'_, Result<Artifact, ProcessError>> {
        Box::pin((self.0)(input))
    }
}

/// Wrap an async closure as a processor.
pub fn processor_fn<F, Fut>(f: F) -> Arc<dyn Processor>
where
    F: Fn(ProcessorInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Artifact, ProcessError>> + Send + 'static,
{
    Arc::new(FnProcessor(f))
}

struct FnProducer<F>(F);

impl<F, Fut> Producer for FnProducer<F>
where
    F: Fn(Context, Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Artifact, ProcessError>> + Send + 'static,
{
    fn produce(
        &self,
        context: Context,
        args: Map<String, Value>,
    ) -> BoxFuture<'_, Result<Artifact, ProcessError>> {
        Box::pin((self.0)(context, args))
    }
}

/// Wrap an async closure as a producer.
pub fn producer_fn<F, Fut>(f: F) -> Arc<dyn Producer>
where
    F: Fn(Context, Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Artifact, ProcessError>> + Send + 'static,
{
    Arc::new(FnProducer(f))
}

/// One normalized entry of a file's `processors` list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessorDef {
    pub id: String,
    /// Every other key of the entry, passed through verbatim.
    pub args: Map<String, Value>,
}

impl ProcessorDef {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            args: Map::new(),
        }
    }

    /// Look up an argument by key.
    #[must_use]
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    /// Normalize a `processors` node from front matter.
    ///
    /// `None` (key absent) yields an empty chain. A bare string becomes
    /// `{id}`; an object must carry a non-empty string `id`.
    pub fn parse_list(file: &Path, node: Option<&Value>) -> Result<Vec<Self>, ProcessError> {
        let Some(node) = node else {
            return Ok(Vec::new());
        };
        let invalid = |detail: &str| ProcessError::InvalidProcessors {
            file: file.to_path_buf(),
            detail: detail.to_owned(),
        };

        let Value::Array(items) = node else {
            return Err(invalid("processors must be given as a list"));
        };

        items
            .iter()
            .map(|item| match item {
                Value::String(id) if !id.is_empty() => Ok(Self::new(id.clone())),
                Value::Object(map) => {
                    let id = match map.get("id") {
                        Some(Value::String(id)) if !id.is_empty() => id.clone(),
                        _ => return Err(invalid("processor in object form must have an id")),
                    };
                    let args = map
                        .iter()
                        .filter(|(key, _)| key.as_str() != "id")
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect();
                    Ok(Self { id, args })
                }
                _ => Err(invalid(
                    "each processor must be given either as string or as object",
                )),
            })
            .collect()
    }
}

/// Processors and producers available to a context, keyed by id.
#[derive(Clone, Default)]
pub struct Registry {
    processors: HashMap<String, Arc<dyn Processor>>,
    producers: HashMap<String, Arc<dyn Producer>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a processor, replacing any previous one with the same id.
    #[must_use]
    pub fn with_processor(mut self, id: impl Into<String>, processor: Arc<dyn Processor>) -> Self {
        self.register(id, processor);
        self
    }

    /// Add a producer, replacing any previous one with the same id.
    #[must_use]
    pub fn with_producer(mut self, id: impl Into<String>, producer: Arc<dyn Producer>) -> Self {
        self.register_producer(id, producer);
        self
    }

    pub fn register(&mut self, id: impl Into<String>, processor: Arc<dyn Processor>) {
        self.processors.insert(id.into(), processor);
    }

    pub fn register_producer(&mut self, id: impl Into<String>, producer: Arc<dyn Producer>) {
        self.producers.insert(id.into(), producer);
    }

    #[must_use]
    pub fn processor(&self, id: &str) -> Option<&Arc<dyn Processor>> {
        self.processors.get(id)
    }

    #[must_use]
    pub fn producer(&self, id: &str) -> Option<&Arc<dyn Producer>> {
        self.producers.get(id)
    }

    /// Registered processor ids, sorted.
    #[must_use]
    pub fn processor_ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.processors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut producers: Vec<_> = self.producers.keys().collect();
        producers.sort_unstable();
        f.debug_struct("Registry")
            .field("processors", &self.processor_ids())
            .field("producers", &producers)
            .finish()
    }
}
