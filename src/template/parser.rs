//! Template tokenizer.

use super::{Alignment, PropertyToken, TemplateToken};
use crate::event::CaptureMode;

/// A property name usable in a template hole: letters, digits and `_`.
pub fn is_valid_property_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

pub(super) fn tokenize(text: &str) -> Vec<TemplateToken> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    literal.push('{');
                    continue;
                }
                let after = i + 1;
                let Some(rel) = text[after..].find(&['{', '}'][..]) else {
                    literal.push_str(&text[i..]);
                    break;
                };
                let stop = after + rel;
                if text[stop..].starts_with('{') {
                    // A new hole starts before this one closes.
                    literal.push_str(&text[i..stop]);
                } else {
                    let raw = &text[i..=stop];
                    match parse_hole(&text[after..stop], raw) {
                        Some(prop) => {
                            if !literal.is_empty() {
                                tokens.push(TemplateToken::Text(std::mem::take(&mut literal)));
                            }
                            tokens.push(TemplateToken::Property(prop));
                        }
                        None => literal.push_str(raw),
                    }
                }
                let resume = if text[stop..].starts_with('{') { stop } else { stop + 1 };
                while matches!(chars.peek(), Some(&(j, _)) if j < resume) {
                    chars.next();
                }
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                }
                literal.push('}');
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        tokens.push(TemplateToken::Text(literal));
    }
    tokens
}

fn parse_hole(inner: &str, raw: &str) -> Option<PropertyToken> {
    let (capture, body) = if let Some(rest) = inner.strip_prefix('@') {
        (CaptureMode::Destructure, rest)
    } else if let Some(rest) = inner.strip_prefix('$') {
        (CaptureMode::Stringify, rest)
    } else {
        (CaptureMode::AsScalar, inner)
    };

    let (head, format) = match body.split_once(':') {
        Some((head, format)) => (head, Some(format)),
        None => (body, None),
    };
    let (name, alignment) = match head.split_once(',') {
        Some((name, alignment)) => (name, Some(parse_alignment(alignment)?)),
        None => (head, None),
    };

    if !is_valid_property_name(name) {
        return None;
    }
    if let Some(format) = format {
        if format.is_empty() || format.chars().any(char::is_control) {
            return None;
        }
    }

    Some(PropertyToken {
        name: name.to_string(),
        capture,
        alignment,
        format: format.map(str::to_string),
        raw: raw.to_string(),
    })
}

fn parse_alignment(text: &str) -> Option<Alignment> {
    let (left, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let width = digits.parse().ok()?;
    Some(if left {
        Alignment::Left(width)
    } else {
        Alignment::Right(width)
    })
}
