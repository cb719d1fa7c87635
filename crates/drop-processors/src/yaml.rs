//! YAML text to structured data.

use drop_context::{Artifact, BoxFuture, ProcessError, Processor, ProcessorInput};
use serde_json::Value;

/// Parses text content as YAML and yields [`Artifact::Data`].
#[derive(Clone, Copy, Debug, Default)]
pub struct YamlProcessor;

impl Processor for YamlProcessor {
    fn process(&self, input: ProcessorInput) -> BoxFuture<'_, Result<Artifact, ProcessError>> {
        Box::pin(async move {
            let text = input.content.into_text()?;
            let value: Value = serde_yaml::from_str(&text).map_err(|e| {
                ProcessError::Transform(format!(
                    "Invalid YAML in {}: {e}",
                    input.source_file.display()
                ))
            })?;
            Ok(Artifact::Data(value))
        })
    }
}
