//! JSON syntax highlighter
//!
//! Turns pretty-printed JSON into an HTML fragment where every scalar is
//! wrapped in a class-tagged span. The input is escaped exactly once, before
//! lexing, so markup characters inside string values are never interpreted
//! or escaped twice.

use logos::Logos;
use std::fmt;

/// Lexemes recognised in escaped JSON text
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[regex(r"[-+]?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[token("true")]
    #[token("false")]
    Boolean,

    #[token("null")]
    Null,

    // Bare words are lexed so literals only match as whole words
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Word,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,
}

/// Semantic class of a highlighted token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    /// Object key (a string followed by a colon)
    Key,
    /// String in value position
    StringValue,
    Number,
    Boolean,
    Null,
}

impl TokenClass {
    pub const ALL: [TokenClass; 5] = [
        TokenClass::Key,
        TokenClass::StringValue,
        TokenClass::Number,
        TokenClass::Boolean,
        TokenClass::Null,
    ];

    /// CSS class name used on the wrapping span
    pub fn css_class(&self) -> &'static str {
        match self {
            TokenClass::Key => "key",
            TokenClass::StringValue => "string",
            TokenClass::Number => "number",
            TokenClass::Boolean => "boolean",
            TokenClass::Null => "null",
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_class())
    }
}

/// A classified token borrowed from the escaped source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub text: &'src str,
    pub class: TokenClass,
}

/// A piece of escaped text: either passthrough or a classified token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'src> {
    Plain(&'src str),
    Token(Token<'src>),
}

/// Escape `&`, `<` and `>`
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inverse of [`escape_html`]
pub fn unescape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        let (ch, len) = if tail.starts_with("&amp;") {
            ('&', 5)
        } else if tail.starts_with("&lt;") {
            ('<', 4)
        } else if tail.starts_with("&gt;") {
            ('>', 4)
        } else {
            ('&', 1)
        };

        out.push(ch);
        rest = &tail[len..];
    }

    out.push_str(rest);
    out
}

/// Split already-escaped text into plain runs and classified tokens.
///
/// Concatenating the text of every fragment yields `escaped` unchanged.
pub fn tokenize(escaped: &str) -> Vec<Fragment<'_>> {
    let mut fragments = Vec::new();
    let mut cursor = 0;
    let mut lexer = Lexeme::lexer(escaped);

    while let Some(lexeme) = lexer.next() {
        let span = lexer.span();

        let class = match lexeme {
            Ok(Lexeme::String) if is_followed_by_colon(&escaped[span.end..]) => TokenClass::Key,
            Ok(Lexeme::String) => TokenClass::StringValue,
            Ok(Lexeme::Number) => TokenClass::Number,
            Ok(Lexeme::Boolean) => TokenClass::Boolean,
            Ok(Lexeme::Null) => TokenClass::Null,
            Ok(Lexeme::Word) | Ok(Lexeme::Whitespace) | Err(()) => continue,
        };

        if cursor < span.start {
            fragments.push(Fragment::Plain(&escaped[cursor..span.start]));
        }
        fragments.push(Fragment::Token(Token {
            text: &escaped[span.clone()],
            class,
        }));
        cursor = span.end;
    }

    if cursor < escaped.len() {
        fragments.push(Fragment::Plain(&escaped[cursor..]));
    }

    fragments
}

fn is_followed_by_colon(rest: &str) -> bool {
    rest.trim_start_matches([' ', '\t', '\r', '\n'])
        .starts_with(':')
}

/// Highlight JSON text as an HTML fragment
///
/// Tokens are wrapped as `<span class="{class}">{token}</span>`; whitespace
/// and punctuation pass through unchanged. Works on any text: non-JSON input
/// is escaped and whatever scalars it contains are still tagged.
pub fn highlight_json(text: &str) -> String {
    let escaped = escape_html(text);
    let mut html = String::with_capacity(escaped.len() * 2);

    for fragment in tokenize(&escaped) {
        match fragment {
            Fragment::Plain(plain) => html.push_str(plain),
            Fragment::Token(token) => {
                html.push_str(r#"<span class=""#);
                html.push_str(token.class.css_class());
                html.push_str(r#"">"#);
                html.push_str(token.text);
                html.push_str("</span>");
            }
        }
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>"), "&lt;b&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), r#""quoted""#);
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("&lt;b&gt;"), "<b>");
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
        assert_eq!(unescape_html("fish & chips"), "fish & chips");
    }

    #[test]
    fn test_tokenize_preserves_text() {
        let escaped = escape_html("{\n  \"a\": [1, -2.5e3, true, null]\n}");
        let joined: String = tokenize(&escaped)
            .iter()
            .map(|f| match f {
                Fragment::Plain(s) => *s,
                Fragment::Token(t) => t.text,
            })
            .collect();
        assert_eq!(joined, escaped);
    }

    #[test]
    fn test_literals_are_whole_words() {
        let tokens: Vec<_> = tokenize("nullable trueish")
            .into_iter()
            .filter(|f| matches!(f, Fragment::Token(_)))
            .collect();
        assert!(tokens.is_empty());
    }
}
