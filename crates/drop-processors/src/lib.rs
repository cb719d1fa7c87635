//! Built-in processors for drop.
//!
//! | id                  | input | output   |
//! |---------------------|-------|----------|
//! | `markdown`          | text  | HTML     |
//! | `yaml`              | text  | data     |
//! | `template`          | text  | text     |
//! | `template-function` | text  | callable |
//! | `decorated`         | any   | any      |
//!
//! [`default_registry`] registers all of them under these ids. There are no
//! built-in producers; applications add their own with
//! `default_registry().with_producer(id, producer)`.

mod decorated;
mod markdown;
mod template;
mod yaml;

use std::sync::Arc;

use drop_context::{Processor, Registry};

pub use decorated::DecoratedProcessor;
pub use markdown::MarkdownProcessor;
pub use template::{TemplateFunctionProcessor, TemplateProcessor};
pub use yaml::YamlProcessor;

/// Ids of the built-in processors.
pub const BUILTIN_IDS: &[&str] = &[
    "markdown",
    "yaml",
    "template",
    "template-function",
    "decorated",
];

/// Look up a built-in processor by id.
#[must_use]
pub fn builtin(id: &str) -> Option<Arc<dyn Processor>> {
    let processor: Arc<dyn Processor> = match id {
        "markdown" => Arc::new(MarkdownProcessor::new()),
        "yaml" => Arc::new(YamlProcessor),
        "template" => Arc::new(TemplateProcessor),
        "template-function" => Arc::new(TemplateFunctionProcessor),
        "decorated" => Arc::new(DecoratedProcessor),
        _ => return None,
    };
    Some(processor)
}

/// Registry with every built-in processor under its own id.
#[must_use]
pub fn default_registry() -> Registry {
    BUILTIN_IDS
        .iter()
        .filter_map(|id| builtin(id).map(|p| (*id, p)))
        .fold(Registry::new(), |registry, (id, p)| registry.with_processor(id, p))
}
