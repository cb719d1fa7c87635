//! Source documents: front matter + body, or producer declarations.
//!
//! # Front matter
//!
//! A file whose first line is exactly `---` starts a YAML block that runs to
//! the next line that is exactly `---`. Everything after the closing line is
//! the body:
//!
//! ```text
//! ---
//! processors:
//!   - markdown
//! ---
//! # Hello
//! ```
//!
//! Files without a block (or with an unterminated one) have empty front
//! matter and use the whole file as body.
//!
//! # Producer documents
//!
//! Files ending in `.producer` hold a YAML mapping naming a registered
//! producer (`producer: <id>`) plus free-form arguments.
//!
//! Producers are Rust code: they are registered on a [`Registry`] with
//! `with_producer` and attached through [`Descriptor::with_registry`]. None
//! are built in, so sites loaded from a config file cannot use them.
//!
//! [`Registry`]: crate::Registry
//! [`Descriptor::with_registry`]: crate::Descriptor::with_registry

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::ProcessError;

/// Extension that marks a producer document.
pub const PRODUCER_EXTENSION: &str = "producer";

const DELIMITER: &str = "---";

/// Parsed source file.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    FrontMatter(FrontMatterDocument),
    Producer(ProducerDocument),
}

/// A file with an optional front matter block and a body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrontMatterDocument {
    pub front_matter_raw: Arc<str>,
    pub front_matter_data: Arc<Map<String, Value>>,
    pub body: String,
}

/// A `.producer` file: the producer id and its arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct ProducerDocument {
    pub producer_id: String,
    pub args: Map<String, Value>,
}

impl Document {
    /// Parse file content, choosing the document kind from the file extension.
    pub fn parse(file: &Path, content: &str) -> Result<Self, ProcessError> {
        if file.extension().is_some_and(|ext| ext == PRODUCER_EXTENSION) {
            ProducerDocument::parse(file, content).map(Self::Producer)
        } else {
            FrontMatterDocument::parse(file, content).map(Self::FrontMatter)
        }
    }
}

impl FrontMatterDocument {
    pub fn parse(file: &Path, content: &str) -> Result<Self, ProcessError> {
        let Some((raw, body)) = split_front_matter(content) else {
            return Ok(Self {
                body: content.to_owned(),
                ..Self::default()
            });
        };

        let data = parse_yaml_mapping(raw).map_err(|detail| ProcessError::InvalidFrontMatter {
            file: file.to_path_buf(),
            detail,
        })?;

        Ok(Self {
            front_matter_raw: Arc::from(raw),
            front_matter_data: Arc::new(data),
            body: body.to_owned(),
        })
    }

    /// The `processors` key of the front matter, if present.
    #[must_use]
    pub fn processors_node(&self) -> Option<&Value> {
        self.front_matter_data.get("processors")
    }
}

impl ProducerDocument {
    pub fn parse(file: &Path, content: &str) -> Result<Self, ProcessError> {
        let invalid = |detail: String| ProcessError::InvalidFrontMatter {
            file: file.to_path_buf(),
            detail,
        };
        let mut args = parse_yaml_mapping(content).map_err(invalid)?;
        match args.remove("producer") {
            Some(Value::String(id)) if !id.is_empty() => Ok(Self {
                producer_id: id,
                args,
            }),
            _ => Err(invalid(
                "producer documents must name a producer".to_owned(),
            )),
        }
    }
}

/// Split `content` into (front matter, body) if it starts with a delimited block.
fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix(DELIMITER)?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let raw = rest[..offset].trim_end_matches(['\r', '\n']);
            let body = &rest[offset + line.len()..];
            return Some((raw, body));
        }
        offset += line.len();
    }
    None
}

fn parse_yaml_mapping(raw: &str) -> Result<Map<String, Value>, String> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(_) => Err("front matter must be a mapping".to_owned()),
        Err(e) => Err(format!("Invalid YAML: {e}")),
    }
}
