//! Inline elements for citation content
//!
//! A formatted citation is a short run of text with occasional emphasis
//! (titles in italics), super/subscripts and links (DOIs, URLs).

use serde::{Deserialize, Serialize};

/// Inline-level content element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inline {
    /// Plain text content
    Text(String),
    /// Formatted content (bold, italic, etc.)
    Format(FormatType, Vec<Inline>),
    /// A hyperlink
    Link(Link),
}

/// Text formatting types found in CSL output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatType {
    /// Bold text
    Bold,
    /// Italic text
    Italic,
    /// Small caps (CSL `font-variant: small-caps`)
    SmallCaps,
    /// Superscript text
    Superscript,
    /// Subscript text
    Subscript,
}

/// A hyperlink element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// The URL target
    pub url: String,
    /// The link text
    pub text: Vec<Inline>,
}

impl Inline {
    /// Shorthand for a text node
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }

    /// Collect the visible text of this node, dropping formatting
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain(&mut out);
        out
    }

    fn push_plain(&self, out: &mut String) {
        match self {
            Inline::Text(t) => out.push_str(t),
            Inline::Format(_, children) => {
                for child in children {
                    child.push_plain(out);
                }
            }
            Inline::Link(link) => {
                for child in &link.text {
                    child.push_plain(out);
                }
            }
        }
    }
}
