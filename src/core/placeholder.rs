//! Locates placeholder references inside a property value.
//!
//! Two forms are recognised: braced `${expr}` and bare `$expr`, where a bare
//! expression runs up to the next space or the end of the enclosing region.
//! Nested references are returned innermost first, so `${a${b}}` yields `${b}`.
//! All positions are byte offsets into the scanned value; every delimiter is
//! ASCII, so they always fall on char boundaries.

use crate::utils::error::ResolveError;

pub const PLACEHOLDER_KEY: u8 = b'$';
pub const PLACEHOLDER_EMBRACE_START_KEY: u8 = b'{';
pub const PLACEHOLDER_EMBRACE_END_KEY: u8 = b'}';
pub const PLACEHOLDER_END_KEY: u8 = b' ';
pub const DEFAULT_VALUE_SEPARATOR: u8 = b':';

/// Half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn slice<'a>(&self, value: &'a str) -> &'a str {
        &value[self.start..self.end]
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    /// The whole reference including `$`, braces and default.
    pub outer: Span,
    /// The key being referenced.
    pub key: Span,
    /// Text after the first `:` of the expression, if any.
    pub default: Option<Span>,
}

impl Placeholder {
    fn new(value: &[u8], outer: Span, expression: Span) -> Self {
        let separator = value[expression.start..expression.end]
            .iter()
            .position(|&b| b == DEFAULT_VALUE_SEPARATOR);

        match separator {
            Some(offset) if offset > 0 => Self {
                outer,
                key: Span::new(expression.start, expression.start + offset),
                default: Some(Span::new(expression.start + offset + 1, expression.end)),
            },
            _ => Self {
                outer,
                key: expression,
                default: None,
            },
        }
    }

    pub fn key<'a>(&self, value: &'a str) -> &'a str {
        self.key.slice(value)
    }

    pub fn default_value<'a>(&self, value: &'a str) -> Option<&'a str> {
        self.default.map(|span| span.slice(value))
    }

    /// Key and default as written, without delimiters.
    pub fn expression<'a>(&self, value: &'a str) -> &'a str {
        let end = self.default.map_or(self.key.end, |span| span.end);
        &value[self.key.start..end]
    }

    pub fn text<'a>(&self, value: &'a str) -> &'a str {
        self.outer.slice(value)
    }

    /// True when removing the placeholder would leave nothing behind.
    pub fn is_sole_content(&self, value: &str) -> bool {
        self.outer.start == 0 && self.outer.end == value.len()
    }
}

/// Finds the next placeholder at or after byte offset `from`.
pub fn find_placeholder(value: &str, from: usize) -> Result<Option<Placeholder>, ResolveError> {
    if from >= value.len() {
        return Ok(None);
    }
    let bytes = value.as_bytes();
    Scanner { value, bytes }.scan(from, bytes.len(), bytes.len())
}

/// Cheap pre-check so values without any `$` skip the scan loop entirely.
pub fn contains_placeholder_marker(value: &str) -> bool {
    value.as_bytes().contains(&PLACEHOLDER_KEY)
}

struct Scanner<'a> {
    value: &'a str,
    bytes: &'a [u8],
}

/// Outcome of scanning a bare `$expr` region.
enum Bare {
    Found(Placeholder),
    /// Nothing referencable up to `end`; scanning resumes there.
    Literal { end: usize },
}

impl Scanner<'_> {
    /// Scans `[from, to)`. `close_limit` is where a closing brace may still be
    /// found; inside a braced expression it reaches one past `to` so a nested
    /// `${` can share the enclosing close brace.
    fn scan(
        &self,
        from: usize,
        to: usize,
        close_limit: usize,
    ) -> Result<Option<Placeholder>, ResolveError> {
        let mut pos = from;
        while let Some(offset) = self.position(PLACEHOLDER_KEY, pos, to) {
            let start = pos + offset;
            if start + 1 >= to {
                return Ok(None);
            }

            pos = match self.bytes[start + 1] {
                PLACEHOLDER_EMBRACE_START_KEY => return self.braced(start, close_limit).map(Some),
                PLACEHOLDER_END_KEY => start + 1,
                _ => match self.bare(start, to, close_limit)? {
                    Bare::Found(found) => return Ok(Some(found)),
                    Bare::Literal { end } => end,
                },
            };
        }
        Ok(None)
    }

    fn braced(&self, start: usize, close_limit: usize) -> Result<Placeholder, ResolveError> {
        let open = start + 2;
        let close = self
            .position(PLACEHOLDER_EMBRACE_END_KEY, open, close_limit)
            .map(|offset| open + offset)
            .ok_or_else(|| ResolveError::SyntaxError {
                value: self.value.to_string(),
            })?;

        if let Some(nested) = self.scan(open, close, close + 1)? {
            return Ok(nested);
        }
        Ok(Placeholder::new(
            self.bytes,
            Span::new(start, close + 1),
            Span::new(open, close),
        ))
    }

    fn bare(&self, start: usize, to: usize, close_limit: usize) -> Result<Bare, ResolveError> {
        let expr_start = start + 1;
        let end = self
            .position(PLACEHOLDER_END_KEY, expr_start, to)
            .map_or(to, |offset| expr_start + offset);
        let nested_limit = if end == to { close_limit } else { end };

        // Every `$` of a `$$..$` run opens a region ending at `end`, so only the
        // last one can start a reference. Without one the run is literal text.
        let run = self.bytes[start..end]
            .iter()
            .take_while(|&&b| b == PLACEHOLDER_KEY)
            .count();
        if run > 1 {
            return Ok(match self.scan(start + run - 1, end, nested_limit)? {
                Some(found) => Bare::Found(found),
                None => Bare::Literal { end },
            });
        }

        if let Some(nested) = self.scan(expr_start, end, nested_limit)? {
            return Ok(Bare::Found(nested));
        }
        Ok(Bare::Found(Placeholder::new(
            self.bytes,
            Span::new(start, end),
            Span::new(expr_start, end),
        )))
    }

    fn position(&self, needle: u8, from: usize, to: usize) -> Option<usize> {
        self.bytes[from..to].iter().position(|&b| b == needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(value: &str) -> Option<Placeholder> {
        find_placeholder(value, 0).unwrap()
    }

    #[test]
    fn test_no_marker_fast_path() {
        assert!(!contains_placeholder_marker("plain value"));
        assert!(contains_placeholder_marker("cost: $5"));
        assert_eq!(find("plain value"), None);
    }

    #[test]
    fn test_braced_placeholder_spans() {
        let value = "this is ${name} here";
        let found = find(value).unwrap();
        assert_eq!(found.text(value), "${name}");
        assert_eq!(found.key(value), "name");
        assert_eq!(found.default_value(value), None);
        assert!(!found.is_sole_content(value));
    }

    #[test]
    fn test_default_splits_on_first_colon() {
        let value = "${greeting:my:default:string}";
        let found = find(value).unwrap();
        assert_eq!(found.key(value), "greeting");
        assert_eq!(found.default_value(value), Some("my:default:string"));
        assert_eq!(found.expression(value), "greeting:my:default:string");
        assert!(found.is_sole_content(value));
    }

    #[test]
    fn test_leading_colon_is_part_of_key() {
        let value = "${:odd}";
        let found = find(value).unwrap();
        assert_eq!(found.key(value), ":odd");
        assert_eq!(found.default_value(value), None);
    }

    #[test]
    fn test_empty_default() {
        let value = "${missing:}";
        let found = find(value).unwrap();
        assert_eq!(found.key(value), "missing");
        assert_eq!(found.default_value(value), Some(""));
    }

    #[test]
    fn test_nested_braced_returns_innermost() {
        let value = "${prefix.${inner}}";
        let found = find(value).unwrap();
        assert_eq!(found.text(value), "${inner}");
        assert_eq!(found.key(value), "inner");
        assert!(found.outer.start >= 2 && found.outer.end <= value.len());
    }

    #[test]
    fn test_bare_placeholder_runs_to_space() {
        let value = "run $task now";
        let found = find(value).unwrap();
        assert_eq!(found.text(value), "$task");
        assert_eq!(found.key(value), "task");
    }

    #[test]
    fn test_bare_placeholder_runs_to_end() {
        let value = "$task";
        let found = find(value).unwrap();
        assert_eq!(found.key(value), "task");
        assert!(found.is_sole_content(value));
    }

    #[test]
    fn test_bare_nested_reference_resolves_first() {
        let value = "$prefix$suffix";
        let found = find(value).unwrap();
        assert_eq!(found.text(value), "$suffix");
    }

    #[test]
    fn test_bare_inside_braced() {
        let value = "${a$b}";
        let found = find(value).unwrap();
        assert_eq!(found.key(value), "b");
    }

    #[test]
    fn test_literal_dollars_are_skipped() {
        assert_eq!(find("costs 5$"), None);
        assert_eq!(find("a $ b"), None);
        assert_eq!(find("$$"), None);

        let value = "$ then ${real}";
        assert_eq!(find(value).unwrap().key(value), "real");
    }

    #[test]
    fn test_dollar_runs_scan_in_one_pass() {
        assert_eq!(find(&"$".repeat(64)), None);
        assert_eq!(find(&"$".repeat(100_000)), None);

        let value = format!("{} ${{real}}", "$".repeat(10_000));
        assert_eq!(find(&value).unwrap().key(&value), "real");

        let value = format!("{}name", "$".repeat(10_000));
        let found = find(&value).unwrap();
        assert_eq!(found.key(&value), "name");
        assert_eq!(found.outer.start, 9_999);
    }

    #[test]
    fn test_dollar_run_before_braced() {
        let value = "$$${inner}";
        let found = find(value).unwrap();
        assert_eq!(found.text(value), "${inner}");
    }

    #[test]
    fn test_unclosed_brace_is_syntax_error() {
        let err = find_placeholder("x ${open", 0).unwrap_err();
        assert_eq!(
            err,
            ResolveError::SyntaxError {
                value: "x ${open".to_string()
            }
        );
    }

    #[test]
    fn test_scan_from_offset() {
        let value = "${a} ${b}";
        let found = find_placeholder(value, 4).unwrap().unwrap();
        assert_eq!(found.key(value), "b");
        assert_eq!(find_placeholder(value, value.len()).unwrap(), None);
    }

    #[test]
    fn test_multibyte_text_around_placeholder() {
        let value = "héllo ${wörld} ✓";
        let found = find(value).unwrap();
        assert_eq!(found.key(value), "wörld");
    }
}
