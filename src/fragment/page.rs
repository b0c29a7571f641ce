//! Recovery of embedded values from a fragment's rendered report page.
//!
//! A rendered page declares its data as script variables:
//!
//! ```text
//! assignment = [ "const" | "let" | "var" ] NAME "=" LITERAL
//! LITERAL    = balanced "{...}" | balanced "[...]" | quoted string | bare token
//! ```
//!
//! Balanced literals are scanned with string awareness, so braces inside
//! strings do not count. A bare token ends at whitespace, `;`, `,` or `<`.
//! The position of the assignment in the page does not matter.

use crate::error::MergeError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub const REFERENCE_VARIABLE: &str = "_referenceData";
pub const SAMPLE_VARIABLE: &str = "_sampleData";
pub const CONTIG_SIZE_VARIABLE: &str = "_minContigSize";

/// The values a rendered page declares, where present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageVariables {
    /// Reference name to its organisms (`{size, GC}` per organism).
    pub references: Option<Map<String, Value>>,
    /// Sample name to its metadata.
    pub samples: Option<Map<String, Value>>,
    /// Minimum contig length the fragment was produced with.
    pub min_contig_size: Option<Value>,
}

impl PageVariables {
    /// Extract all known variables from a page.
    pub fn parse(page: &str) -> Result<Self, MergeError> {
        Ok(Self {
            references: find_literal(page, REFERENCE_VARIABLE)
                .map(|literal| decode(REFERENCE_VARIABLE, literal))
                .transpose()?,
            samples: find_literal(page, SAMPLE_VARIABLE)
                .map(|literal| decode(SAMPLE_VARIABLE, literal))
                .transpose()?,
            min_contig_size: find_literal(page, CONTIG_SIZE_VARIABLE)
                .map(|literal| decode_scalar(CONTIG_SIZE_VARIABLE, literal))
                .transpose()?,
        })
    }
}

/// Literal text assigned to `name`, if the page assigns it anywhere.
pub fn find_literal<'a>(page: &'a str, name: &str) -> Option<&'a str> {
    let mut from = 0;

    while let Some(found) = page[from..].find(name) {
        let start = from + found;
        let end = start + name.len();
        from = end;

        if !is_name_boundary(page[..start].chars().next_back())
            || !is_name_boundary(page[end..].chars().next())
        {
            continue;
        }

        let Some(rest) = page[end..].trim_start().strip_prefix('=') else {
            continue;
        };
        if rest.starts_with('=') {
            // comparison, not an assignment
            continue;
        }

        if let Some(literal) = literal(rest.trim_start()) {
            return Some(literal);
        }
    }

    None
}

fn is_name_boundary(c: Option<char>) -> bool {
    !matches!(c, Some(c) if c.is_alphanumeric() || c == '_' || c == '$')
}

fn literal(text: &str) -> Option<&str> {
    match text.chars().next()? {
        '{' | '[' => balanced(text),
        quote @ ('"' | '\'' | '`') => quoted(text, quote),
        _ => {
            let end = text
                .find(|c: char| c.is_whitespace() || matches!(c, ';' | ',' | '<'))
                .unwrap_or(text.len());
            (end > 0).then(|| &text[..end])
        }
    }
}

fn balanced(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == open {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

fn quoted(text: &str, quote: char) -> Option<&str> {
    let mut escaped = false;

    for (i, c) in text.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some(&text[..i + c.len_utf8()]);
        }
    }

    None
}

/// Decode a literal as JSON, retrying with single quotes normalized.
fn decode<T: DeserializeOwned>(variable: &str, literal: &str) -> Result<T, MergeError> {
    serde_json::from_str(literal).or_else(|source| {
        if literal.contains('\'') {
            if let Ok(value) = serde_json::from_str(&literal.replace('\'', "\"")) {
                return Ok(value);
            }
        }
        Err(MergeError::MalformedLiteral {
            variable: variable.to_string(),
            source,
        })
    })
}

/// Decode a scalar literal; bare tokens that are not JSON are kept as text.
fn decode_scalar(variable: &str, literal: &str) -> Result<Value, MergeError> {
    if literal.starts_with(&['{', '[', '"', '\''][..]) {
        return decode(variable, literal);
    }
    let literal = literal.trim_matches('`');
    Ok(serde_json::from_str(literal).unwrap_or_else(|_| Value::String(literal.to_string())))
}
