//! Splitting of a CREATE TABLE body into column/key fragments.

use std::iter::Peekable;
use std::str::CharIndices;

/// Splits a columns section on top-level commas.
///
/// Commas nested in parentheses (`DECIMAL(10,2)`, `ENUM('a','b')`) or inside single-quoted
/// literals do not split. Inside a literal, `\'` and `''` are escaped quotes. Fragments are
/// trimmed; empty fragments are dropped.
pub struct FragmentSplitter<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    start: usize,
    depth: usize,
    in_string: bool,
}

impl<'a> FragmentSplitter<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            start: 0,
            depth: 0,
            in_string: false,
        }
    }

    fn take(&mut self, end: usize) -> &'a str {
        let input = self.input;
        let fragment = input[self.start..end].trim();
        self.start = end;
        fragment
    }
}

impl<'a> Iterator for FragmentSplitter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let Some((idx, c)) = self.chars.next() else {
                if self.start >= self.input.len() {
                    return None;
                }
                let fragment = self.take(self.input.len());
                if fragment.is_empty() {
                    return None;
                }
                return Some(fragment);
            };

            match c {
                '\\' if self.in_string => {
                    self.chars.next();
                }
                '\'' => self.in_string = !self.in_string,
                '(' if !self.in_string => self.depth += 1,
                ')' if !self.in_string => self.depth = self.depth.saturating_sub(1),
                ',' if !self.in_string && self.depth == 0 => {
                    let fragment = self.take(idx);
                    // skip the comma itself
                    self.start = idx + 1;
                    if !fragment.is_empty() {
                        return Some(fragment);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Collect all fragments of a columns section.
pub fn split_fragments(section: &str) -> Vec<&str> {
    FragmentSplitter::new(section).collect()
}
