//! Response body splitting.
//!
//! A response body is a sequence of rows separated by `\n`. Each row is a
//! sequence of fields, every field terminated by `;`. A field that starts
//! with `"` runs until the next `"`, which must be followed by `;`; this is
//! how a literal `;` travels inside a field.
//!
//! ```text
//! 12;"Sales;2024";3;1,4,7;
//! ```

use thiserror::Error;

pub const FIELD_SEPARATOR: u8 = b';';
pub const QUOTE: u8 = b'"';
pub const LIST_SEPARATOR: char = ',';

/// Malformed quoting inside a single row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unterminated quoted field at byte {offset}")]
    UnterminatedQuote { offset: usize },
    #[error("unexpected {found:?} after quoted field at byte {offset}, expected ';'")]
    UnexpectedAfterQuote { offset: usize, found: char },
}

// ── Fields ──────────────────────────────────────────────────────────

/// One raw field of a row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Field(String);

impl Field {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The field read as a comma-joined list. An empty field is an empty list.
    pub fn list(&self) -> Vec<&str> {
        if self.0.is_empty() {
            return Vec::new();
        }
        self.0.split(LIST_SEPARATOR).collect()
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lazy field splitter over one row. Restart by calling [`split_fields`] again.
pub struct Fields<'a> {
    line: &'a str,
    pos: usize,
    failed: bool,
}

/// Split one row into its fields without allocating the row up front.
pub fn split_fields(line: &str) -> Fields<'_> {
    Fields { line, pos: 0, failed: false }
}

impl<'a> Iterator for Fields<'a> {
    type Item = Result<&'a str, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let bytes = self.line.as_bytes();
        if self.pos >= bytes.len() {
            return None;
        }

        let start = self.pos;
        let raw = if bytes[start] == QUOTE {
            let body = start + 1;
            let Some(close) = find_byte(bytes, body, QUOTE) else {
                self.failed = true;
                return Some(Err(ParseError::UnterminatedQuote { offset: start }));
            };
            match bytes.get(close + 1) {
                Some(&FIELD_SEPARATOR) => self.pos = close + 2,
                // closing quote at end of row
                None => self.pos = close + 1,
                Some(_) => {
                    self.failed = true;
                    let found = self.line[close + 1..].chars().next().unwrap_or('?');
                    return Some(Err(ParseError::UnexpectedAfterQuote { offset: close + 1, found }));
                }
            }
            &self.line[body..close]
        } else {
            match find_byte(bytes, start, FIELD_SEPARATOR) {
                Some(end) => {
                    self.pos = end + 1;
                    &self.line[start..end]
                }
                None => {
                    self.pos = bytes.len();
                    &self.line[start..]
                }
            }
        };

        Some(Ok(raw.trim_matches(|c| c == ';' || c == '"')))
    }
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == needle).map(|i| from + i)
}

// ── Rows ────────────────────────────────────────────────────────────

/// A parsed response row. Field positions are fixed by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    fields: Vec<Field>,
}

impl Row {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let fields = split_fields(line)
            .map(|f| f.map(Field::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fields })
    }

    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { fields: fields.into_iter().map(Field::new).collect() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_field(&self, n: usize) -> bool {
        n < self.fields.len()
    }

    pub fn get(&self, n: usize) -> Option<&Field> {
        self.fields.get(n)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Render back to wire form. Fields containing `;` are quoted.
    ///
    /// The wire format has no quote escape and parsing trims `;` and `"`
    /// from field ends, so only fields without `"` and without a leading or
    /// trailing `;` parse back unchanged.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for field in &self.fields {
            if field.as_str().contains(';') {
                out.push('"');
                out.push_str(field.as_str());
                out.push('"');
            } else {
                out.push_str(field.as_str());
            }
            out.push(';');
        }
        out
    }
}

/// Split a body into lines, dropping the one empty line left by a trailing `\n`.
pub fn split_rows(body: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = body.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

/// Parse a whole body. The error carries the failing row index and its text.
pub fn parse_body(body: &str) -> Result<Vec<Row>, RowError> {
    split_rows(body)
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            Row::parse(line).map_err(|source| RowError {
                index,
                content: line.to_string(),
                source,
            })
        })
        .collect()
}

/// A [`ParseError`] located in a body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {index}: {source} ({content:?})")]
pub struct RowError {
    pub index: usize,
    pub content: String,
    #[source]
    pub source: ParseError,
}
