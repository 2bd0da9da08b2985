//! Message templates.
//!
//! # Syntax
//! ```text
//! Hello {Name}, you have {Count,5} new {@Item} items ({Ratio:0.00})
//!       └ hole  └ alignment   └ destructure hint   └ format
//! {{ and }} are literal braces; malformed holes are kept as text.
//! ```
//!
//! # Design Decisions
//! - Parsing never fails: anything that is not a valid hole is literal text
//! - Rendering a hole whose property is missing reproduces the hole's raw text
//! - Parsed templates are shared through a bounded cache

mod cache;
mod parser;

use std::collections::BTreeMap;

use crate::event::{CaptureMode, PropertyValue};

pub use cache::TemplateCache;
pub use parser::is_valid_property_name;

/// A parsed message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    text: String,
    tokens: Vec<TemplateToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateToken {
    Text(String),
    Property(PropertyToken),
}

/// A `{...}` hole naming a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyToken {
    pub name: String,
    pub capture: CaptureMode,
    pub alignment: Option<Alignment>,
    pub format: Option<String>,
    /// The hole exactly as written, braces included.
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left(usize),
    Right(usize),
}

impl MessageTemplate {
    pub fn parse(text: &str) -> Self {
        Self {
            text: text.to_string(),
            tokens: parser::tokenize(text),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[TemplateToken] {
        &self.tokens
    }

    /// Property holes in template order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyToken> {
        self.tokens.iter().filter_map(|t| match t {
            TemplateToken::Property(p) => Some(p),
            TemplateToken::Text(_) => None,
        })
    }

    pub fn render(&self, properties: &BTreeMap<String, PropertyValue>) -> String {
        let mut out = String::with_capacity(self.text.len());
        for token in &self.tokens {
            match token {
                TemplateToken::Text(text) => out.push_str(text),
                TemplateToken::Property(prop) => match properties.get(&prop.name) {
                    Some(value) => {
                        let mut rendered = String::new();
                        value.render(&mut rendered, prop.format.as_deref());
                        pad(&mut out, &rendered, prop.alignment);
                    }
                    None => out.push_str(&prop.raw),
                },
            }
        }
        out
    }
}

/// Escape braces so `text` is read back as a single literal segment.
pub fn escape_literal(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

fn pad(out: &mut String, rendered: &str, alignment: Option<Alignment>) {
    let width = rendered.chars().count();
    match alignment {
        Some(Alignment::Right(w)) if w > width => {
            out.extend(std::iter::repeat(' ').take(w - width));
            out.push_str(rendered);
        }
        Some(Alignment::Left(w)) if w > width => {
            out.push_str(rendered);
            out.extend(std::iter::repeat(' ').take(w - width));
        }
        _ => out.push_str(rendered),
    }
}
