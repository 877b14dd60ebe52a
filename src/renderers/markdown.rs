// markdown-pdf-converter/src/renderers/markdown.rs

use pulldown_cmark::{html, Options, Parser};
use tracing::debug;

/// CommonMark to HTML, with the common GitHub-style extensions.
pub struct MarkdownRenderer {
    options: Options,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_TASKLISTS);

        Self { options }
    }

    pub fn render(&self, markdown_content: &str) -> String {
        let parser = Parser::new_ext(markdown_content, self.options);
        let mut html_buf = String::with_capacity(markdown_content.len() * 3 / 2);
        html::push_html(&mut html_buf, parser);

        debug!(
            input_bytes = markdown_content.len(),
            output_bytes = html_buf.len(),
            "Markdown rendered to HTML"
        );

        html_buf
    }
}
