// markdown-pdf-converter/src/renderers/html.rs

/// Wraps a rendered fragment in a complete document with fixed page margins.
pub struct StyleInjector;

const STYLE_BLOCK: &str = "<style>
    body {
        margin: 50px 50px 50px 50px; /* Top, Right, Bottom, Left */
    }
</style>";

impl StyleInjector {
    pub fn new() -> Self {
        Self
    }

    /// The fragment is trusted renderer output and is inserted verbatim.
    pub fn wrap(&self, html_fragment: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n{}\n</head>\n<body>\n{}\n</body>\n</html>\n",
            STYLE_BLOCK, html_fragment
        )
    }
}
