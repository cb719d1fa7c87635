//! Markdown to HTML.

use drop_context::{Artifact, BoxFuture, ProcessError, Processor, ProcessorInput};
use pulldown_cmark::{Options, Parser, html};

/// Renders Markdown text content to an HTML fragment.
#[derive(Clone, Copy, Debug)]
pub struct MarkdownProcessor {
    gfm: bool,
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self { gfm: true }
    }
}

impl MarkdownProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default: tables, strikethrough and task lists.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    fn parser_options(self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }

    /// Render markdown text to HTML.
    #[must_use]
    pub fn render(self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.parser_options());
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

impl Processor for MarkdownProcessor {
    fn process(&self, input: ProcessorInput) -> BoxFuture<'_, Result<Artifact, ProcessError>> {
        Box::pin(async move {
            let text = input.content.into_text()?;
            Ok(Artifact::Text(self.render(&text)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_heading_and_emphasis() {
        let html = MarkdownProcessor::new().render("# Hello\n\n**Bold** text\n");

        assert_eq!(html, "<h1>Hello</h1>\n<p><strong>Bold</strong> text</p>\n");
    }

    #[test]
    fn test_render_gfm_table() {
        let md = "| a | b |\n|---|---|\n| 1 | 2 |\n";

        let with_gfm = MarkdownProcessor::new().render(md);
        let without = MarkdownProcessor::new().with_gfm(false).render(md);

        assert!(with_gfm.contains("<table>"));
        assert!(!without.contains("<table>"));
    }

    #[test]
    fn test_render_strikethrough() {
        let html = MarkdownProcessor::new().render("~~gone~~");

        assert!(html.contains("<del>gone</del>"));
    }
}
