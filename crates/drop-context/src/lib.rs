//! Processing core for Drop sites.
//!
//! This crate provides:
//! - [`Context`]: directory stack, path resolution and the processor-chain executor
//! - [`Registry`]: processors and producers addressable by id
//! - [`Descriptor`]: one source tree's build/serve configuration
//! - File resolution with arbitrary-extension lookup
//!
//! # Quick Start
//!
//! ```no_run
//! # async fn run() -> Result<(), drop_context::ProcessError> {
//! use drop_context::{Artifact, Descriptor, ProcessorInput, Registry, processor_fn};
//!
//! let upper = processor_fn(|input: ProcessorInput| async move {
//!     Ok(Artifact::Text(input.content.into_text()?.to_uppercase()))
//! });
//! let descriptor = Descriptor::new("site")
//!     .with_pages("pages")
//!     .with_registry(Registry::new().with_processor("upper", upper));
//!
//! // site/pages/index.html.txt with `processors: [upper]` in its front matter
//! let html = descriptor.context().process("pages/index").await?;
//! # Ok(())
//! # }
//! ```

mod artifact;
mod context;
mod descriptor;
mod document;
mod error;
mod processor;
mod resolve;

pub use artifact::{Artifact, BoxFuture, Callable};
pub use context::{ChainPolicy, Context, ContextData};
pub use descriptor::{Descriptor, DynamicRoute, DynamicRoutes, RenderFn, render_fn};
pub use document::{Document, FrontMatterDocument, PRODUCER_EXTENSION, ProducerDocument};
pub use error::ProcessError;
pub use processor::{
    Processor, ProcessorDef, ProcessorInput, Producer, Registry, processor_fn, producer_fn,
};
pub use resolve::{destination_file_name, find_file_with_arbitrary_extension, lookup_real_file};
