//! Lenient multi-document YAML splitting
//!
//! Manifest files routinely contain several resources separated by `---`
//! lines, plus stray separators, leading comments and blank documents.
//! [`Documents`] walks such input lazily and yields each non-empty document
//! with surrounding whitespace trimmed. It never parses YAML; deciding what a
//! document means is left to the manifest parser.

use std::iter::FusedIterator;

/// Iterator over the documents of a multi-document YAML string
///
/// A clone continues from the same position, so iteration can be replayed
/// from any point. Use [`Documents::new`] again to start over.
#[derive(Debug, Clone)]
pub struct Documents<'a> {
    rest: Option<&'a str>,
}

impl<'a> Documents<'a> {
    /// Create a document iterator over `input`
    pub fn new(input: &'a str) -> Self {
        Self { rest: Some(input) }
    }
}

impl<'a> Iterator for Documents<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let input = self.rest?;
            let (segment, rest) = split_first(input);
            self.rest = rest;

            let segment = segment.trim();
            if !segment.is_empty() {
                return Some(segment);
            }
        }
    }
}

impl FusedIterator for Documents<'_> {}

/// Split off the first document, returning it and the remaining input (if a
/// separator was found)
fn split_first(input: &str) -> (&str, Option<&str>) {
    let mut offset = 0;

    for line in input.split_inclusive('\n') {
        if is_separator(line) {
            return (&input[..offset], Some(&input[offset + line.len()..]));
        }
        offset += line.len();
    }

    (input, None)
}

/// A separator line starts with `---` at column zero, optionally followed by
/// whitespace and trailing content such as a comment
fn is_separator(line: &str) -> bool {
    match line.strip_prefix("---") {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

/// Check whether a document holds nothing but blank lines and comments
pub fn is_blank_document(document: &str) -> bool {
    document.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}
