//! # Docshot Highlight
//!
//! Deterministic JSON-to-HTML rendering for response screenshots.
//!
//! The pipeline is two pure steps:
//!
//! 1. [`highlight_json`] escapes the text once, lexes it and wraps every
//!    scalar in a class-tagged span.
//! 2. [`render_response_page`] embeds the fragment in a standalone document
//!    with a header bar and fixed colours.
//!
//! ```rust
//! use docshot_highlight::{highlight_json, render_response_page, ResponseHeader};
//!
//! let fragment = highlight_json(r#"{"status": "ok"}"#);
//! assert!(fragment.contains(r#"<span class="key">"status"</span>"#));
//!
//! let page = render_response_page(&ResponseHeader::get("/api/health", 200), &fragment);
//! assert!(page.contains("/api/health"));
//! ```

mod highlighter;
mod template;


pub use highlighter::{escape_html, highlight_json, tokenize, unescape_html, Fragment, Token, TokenClass};
pub use template::{render_response_page, token_color, ResponseHeader};
