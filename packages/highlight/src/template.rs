//! Standalone response page
//!
//! Wraps highlighted JSON into a complete HTML document with a header bar.
//! Styling is fixed and inline so the rendered image only depends on the
//! response content.

use crate::highlighter::{escape_html, TokenClass};

const PAGE_BACKGROUND: &str = "#1e1e1e";
const HEADER_BACKGROUND: &str = "#2d2d30";
const TEXT_COLOR: &str = "#d4d4d4";

/// Header bar contents for a rendered response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    /// HTTP method shown as a badge (e.g., "GET")
    pub method: String,

    /// Request path or label
    pub path: String,

    /// HTTP status code of the response
    pub status: u16,
}

impl ResponseHeader {
    pub fn new(method: impl Into<String>, path: impl Into<String>, status: u16) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            status,
        }
    }

    /// Header for a GET request
    pub fn get(path: impl Into<String>, status: u16) -> Self {
        Self::new("GET", path, status)
    }

    /// Reason phrase for common status codes
    pub fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            422 => "Unprocessable Entity",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            _ => "",
        }
    }

    /// Colour of the status dot
    pub fn indicator_color(&self) -> &'static str {
        match self.status {
            200..=299 => "#22c55e",
            300..=499 => "#f59e0b",
            _ => "#ef4444",
        }
    }
}

/// Fixed colour for each token class
pub fn token_color(class: TokenClass) -> &'static str {
    match class {
        TokenClass::Key => "#9cdcfe",
        TokenClass::StringValue => "#ce9178",
        TokenClass::Number => "#b5cea8",
        TokenClass::Boolean => "#569cd6",
        TokenClass::Null => "#c586c0",
    }
}

/// Render a complete HTML document for a highlighted response body
///
/// `highlighted` must already be HTML-safe, as produced by
/// [`crate::highlight_json`]. The header fields are escaped here.
pub fn render_response_page(header: &ResponseHeader, highlighted: &str) -> String {
    let mut token_styles = String::new();
    for class in TokenClass::ALL {
        token_styles.push_str(&format!(
            "        .{} {{ color: {}; }}\n",
            class.css_class(),
            token_color(class)
        ));
    }

    let status_label = match header.reason() {
        "" => header.status.to_string(),
        reason => format!("{} {}", header.status, reason),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{method} {path}</title>
    <style>
        * {{
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }}
        body {{
            background: {page_bg};
            color: {text};
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            -webkit-font-smoothing: antialiased;
        }}
        .header {{
            display: flex;
            align-items: center;
            gap: 12px;
            padding: 12px 20px;
            background: {header_bg};
            border-bottom: 1px solid #3c3c3c;
        }}
        .method {{
            padding: 2px 10px;
            border-radius: 4px;
            background: #0e639c;
            color: #ffffff;
            font-weight: 700;
            font-size: 13px;
        }}
        .path {{
            font-family: Menlo, Consolas, 'DejaVu Sans Mono', monospace;
            font-size: 14px;
        }}
        .status {{
            margin-left: auto;
            display: flex;
            align-items: center;
            gap: 6px;
            font-size: 13px;
        }}
        .dot {{
            width: 10px;
            height: 10px;
            border-radius: 50%;
            background: {indicator};
        }}
        pre {{
            padding: 20px;
            font-family: Menlo, Consolas, 'DejaVu Sans Mono', monospace;
            font-size: 13px;
            line-height: 1.5;
            white-space: pre-wrap;
            word-break: break-word;
        }}
{token_styles}    </style>
</head>
<body>
    <div class="header">
        <span class="method">{method}</span>
        <span class="path">{path}</span>
        <span class="status"><span class="dot"></span>{status}</span>
    </div>
    <pre><code>{body}</code></pre>
</body>
</html>"#,
        method = escape_html(&header.method),
        path = escape_html(&header.path),
        status = status_label,
        page_bg = PAGE_BACKGROUND,
        header_bg = HEADER_BACKGROUND,
        text = TEXT_COLOR,
        indicator = header.indicator_color(),
        token_styles = token_styles,
        body = highlighted,
    )
}
