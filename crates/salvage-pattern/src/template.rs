//! `%(N)s` templates.

use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%\((\d+)\)s").expect("placeholder regex is valid"));

/// Placeholder text for field `index`.
pub fn placeholder(index: usize) -> String {
    format!("%({})s", index)
}

#[derive(Debug, Clone)]
enum Piece {
    Literal(String),
    Field(usize),
}

/// A string with positional placeholders, compiled to an anchored regex
/// that captures every field.
#[derive(Debug, Clone)]
pub struct Template {
    text: String,
    pieces: Vec<Piece>,
    matcher: Regex,
}

impl Template {
    pub fn new(text: &str) -> Result<Self, regex::Error> {
        let mut pieces = Vec::new();
        let mut expr = String::from("^");
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(text) {
            let (Some(whole), Some(index)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Ok(index) = index.as_str().parse::<usize>() else {
                continue;
            };
            if whole.start() > last {
                let literal = &text[last..whole.start()];
                expr.push_str(&regex::escape(literal));
                pieces.push(Piece::Literal(literal.to_string()));
            }
            expr.push_str("(.*)");
            pieces.push(Piece::Field(index));
            last = whole.end();
        }
        if last < text.len() {
            expr.push_str(&regex::escape(&text[last..]));
            pieces.push(Piece::Literal(text[last..].to_string()));
        }
        expr.push('$');

        Ok(Self {
            text: text.to_string(),
            pieces,
            matcher: Regex::new(&expr)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of distinct field slots (highest index + 1).
    pub fn field_count(&self) -> usize {
        self.pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Field(index) => Some(index + 1),
                Piece::Literal(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn is_parameterized(&self) -> bool {
        self.field_count() > 0
    }

    /// Field values that make this template reproduce `value`. A field
    /// used twice must capture the same text both times.
    pub fn capture(&self, value: &str) -> Option<Vec<String>> {
        let caps = self.matcher.captures(value)?;
        let mut fields: Vec<Option<String>> = vec![None; self.field_count()];
        let mut group = 1;

        for piece in &self.pieces {
            let Piece::Field(index) = piece else {
                continue;
            };
            let text = caps.get(group)?.as_str();
            group += 1;
            match &fields[*index] {
                Some(seen) if seen != text => return None,
                Some(_) => {}
                None => fields[*index] = Some(text.to_string()),
            }
        }

        Some(fields.into_iter().map(Option::unwrap_or_default).collect())
    }

    /// Fill every placeholder from `fields`.
    pub fn substitute(&self, fields: &[String]) -> Option<String> {
        let mut out = String::with_capacity(self.text.len());
        for piece in &self.pieces {
            match piece {
                Piece::Literal(literal) => out.push_str(literal),
                Piece::Field(index) => out.push_str(fields.get(*index)?),
            }
        }
        Some(out)
    }
}
