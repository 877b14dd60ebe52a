// markdown-pdf-converter/src/renderers/mod.rs

mod html;
mod markdown;
mod pdf;

pub use html::StyleInjector;
pub use markdown::MarkdownRenderer;
pub use pdf::{PdfRenderer, WkhtmltopdfRenderer};

#[cfg(test)]
pub use pdf::testing;
