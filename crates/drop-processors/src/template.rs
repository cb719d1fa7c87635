//! Jinja-style templates rendered with minijinja.
//!
//! Templates see the descriptor data bag at the top level, plus:
//! - `front_matter`: the file's parsed front matter
//! - `args`: processor arguments (`template`) or call arguments (`template-function`)
//! - `file`: the source file path
//! - `includes`: other files, processed through the context, by name
//!
//! Includes are declared as processor arguments and resolved relative to the
//! template's own directory:
//!
//! ```yaml
//! processors:
//!   - id: template
//!     includes:
//!       header: ./partials/header
//!       menu: /menu.yaml
//! ```
//!
//! The front matter block is replaced by blank lines before compiling, so
//! line numbers in template errors point into the source file.
//!
//! Auto-escaping follows the source file name: `.html`, `.htm` and `.xml`
//! templates escape by default, so pre-rendered HTML needs `| safe`.

use std::path::Path;
use std::sync::Arc;

use drop_context::{Artifact, BoxFuture, Callable, ProcessError, Processor, ProcessorInput};
use minijinja::Environment;
use serde_json::{Map, Value};

/// Renders the content as a template and yields text.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateProcessor;

/// Compiles the content as a template and yields a [`Callable`] that renders
/// it with the arguments it is called with.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateFunctionProcessor;

impl Processor for TemplateProcessor {
    fn process(&self, input: ProcessorInput) -> BoxFuture<'_, Result<Artifact, ProcessError>> {
        Box::pin(async move {
            let template = Template::from_input(input).await?;
            let args = Value::Object(template.processor_args.clone());
            template.render(args).map(Artifact::Text)
        })
    }
}

impl Processor for TemplateFunctionProcessor {
    fn process(&self, input: ProcessorInput) -> BoxFuture<'_, Result<Artifact, ProcessError>> {
        Box::pin(async move {
            let template = Arc::new(Template::from_input(input).await?);
            template.check_syntax()?;
            Ok(Artifact::Callable(Callable::new(move |args| {
                let template = Arc::clone(&template);
                async move { template.render(args).map(Artifact::Text) }
            })))
        })
    }
}

struct Template {
    name: String,
    source: String,
    globals: Map<String, Value>,
    processor_args: Map<String, Value>,
}

impl Template {
    async fn from_input(input: ProcessorInput) -> Result<Self, ProcessError> {
        let includes = load_includes(&input).await?;
        let body = input.content.into_text()?;
        let source = blank_front_matter(&input.front_matter_raw, &body);

        let mut globals = input.context.data().clone();
        globals.insert(
            "front_matter".to_owned(),
            Value::Object((*input.front_matter_data).clone()),
        );
        globals.insert(
            "file".to_owned(),
            Value::String(input.source_file.display().to_string()),
        );
        globals.insert("includes".to_owned(), Value::Object(includes));

        Ok(Self {
            name: template_name(&input.source_file),
            source,
            globals,
            processor_args: input.args.args,
        })
    }

    fn check_syntax(&self) -> Result<(), ProcessError> {
        let env = Environment::new();
        env.template_from_named_str(&self.name, &self.source)
            .map(drop)
            .map_err(|e| template_error(&self.name, &e))
    }

    fn render(&self, args: Value) -> Result<String, ProcessError> {
        let mut ctx = self.globals.clone();
        ctx.insert("args".to_owned(), args);

        let env = Environment::new();
        env.render_named_str(&self.name, &self.source, Value::Object(ctx))
            .map_err(|e| template_error(&self.name, &e))
    }
}

/// Process every file named in the `includes` argument.
async fn load_includes(input: &ProcessorInput) -> Result<Map<String, Value>, ProcessError> {
    let paths = match input.args.arg("includes") {
        None | Some(Value::Null) => return Ok(Map::new()),
        Some(Value::Object(paths)) => paths,
        Some(_) => {
            return Err(ProcessError::Transform(
                "template 'includes' must be a mapping of names to paths".to_owned(),
            ));
        }
    };

    let mut includes = Map::new();
    for (name, path) in paths {
        let Some(path) = path.as_str() else {
            return Err(ProcessError::Transform(format!(
                "template include '{name}' must be a path"
            )));
        };
        let value = input.context.process(path).await?.into_value()?;
        includes.insert(name.clone(), value);
    }
    Ok(includes)
}

/// Prefix `body` with one empty line per line the front matter block took up.
fn blank_front_matter(front_matter_raw: &str, body: &str) -> String {
    if front_matter_raw.is_empty() {
        return body.to_owned();
    }
    // Block lines plus the two delimiters.
    let lines = front_matter_raw.lines().count() + 2;
    let mut source = "\n".repeat(lines);
    source.push_str(body);
    source
}

fn template_name(file: &Path) -> String {
    file.display().to_string()
}

fn template_error(name: &str, err: &minijinja::Error) -> ProcessError {
    tracing::debug!(template = name, line = ?err.line(), "Template failed");
    ProcessError::Transform(format!("Template error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_front_matter_keeps_line_numbers() {
        let source = blank_front_matter("title: Hi\nprocessors: [template]", "{{ x }}\n");

        assert_eq!(source, "\n\n\n\n{{ x }}\n");
        assert_eq!(source.lines().nth(4), Some("{{ x }}"));
    }

    #[test]
    fn test_blank_front_matter_without_block() {
        assert_eq!(blank_front_matter("", "body"), "body");
    }
}
