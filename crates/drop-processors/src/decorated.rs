//! Wrapping content in a decorator template.
//!
//! ```yaml
//! processors:
//!   - markdown
//!   - id: decorated
//!     decorator: ./layout
//!     args:
//!       title: Home
//! ```
//!
//! The decorator is processed through the context and must yield a callable
//! (usually via `template-function`). It is called with `args` plus `body`,
//! the content produced so far.

use drop_context::{Artifact, BoxFuture, ProcessError, Processor, ProcessorInput};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, Default)]
pub struct DecoratedProcessor;

impl Processor for DecoratedProcessor {
    fn process(&self, input: ProcessorInput) -> BoxFuture<'_, Result<Artifact, ProcessError>> {
        Box::pin(async move {
            let Some(decorator) = input.args.arg("decorator").and_then(Value::as_str) else {
                return Err(ProcessError::Transform(format!(
                    "'decorated' in {} needs a 'decorator' path",
                    input.source_file.display()
                )));
            };

            let callable = match input.context.process(decorator).await? {
                Artifact::Callable(callable) => callable,
                other => {
                    return Err(ProcessError::Transform(format!(
                        "decorator '{decorator}' must produce a callable, got {}",
                        other.kind()
                    )));
                }
            };

            let mut args = match input.args.arg("args") {
                None | Some(Value::Null) => Map::new(),
                Some(Value::Object(map)) => map.clone(),
                Some(_) => {
                    return Err(ProcessError::Transform(
                        "decorator 'args' must be a mapping".to_owned(),
                    ));
                }
            };
            args.insert("body".to_owned(), input.content.into_value()?);

            callable.call(Value::Object(args)).await
        })
    }
}

