//! Pattern matching for `=~` and `!~`.
//!
//! The evaluator only needs "does this pattern match this text"; hosts with
//! their own regex dialect plug it in through [`PatternMatcher`].

use std::cell::RefCell;

use quill_value::errors::invalid_pattern;
use quill_value::EvalError;
use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashMap;

/// Matches a pattern against text.
pub trait PatternMatcher {
    /// Whether `pattern` matches anywhere in `text`.
    fn is_match(&self, pattern: &str, text: &str, ignore_case: bool) -> Result<bool, EvalError>;
}

/// Default matcher backed by the `regex` crate, caching compiled patterns.
///
/// Patterns are written in the editor's "magic" dialect and translated:
/// `.` `*` `[]` `^` `$` are special as written, while `\+ \= \? \| \( \)
/// \%( \{n,m}` and `\< \>` need the backslash. A bare `+ ? | ( ) { }` is a
/// literal character. `\c` / `\C` anywhere force ignoring or matching case.
#[derive(Default)]
pub struct RegexMatcher {
    cache: RefCell<FxHashMap<(String, bool), Regex>>,
}

/// Compiled patterns kept before the cache is cleared.
const CACHE_LIMIT: usize = 64;

impl RegexMatcher {
    pub fn new() -> Self {
        RegexMatcher::default()
    }

    fn compile(pattern: &str, ignore_case: bool) -> Result<Regex, EvalError> {
        let (translated, case) = translate(pattern).ok_or_else(|| invalid_pattern(pattern))?;
        RegexBuilder::new(&translated)
            .case_insensitive(case.unwrap_or(ignore_case))
            .build()
            .map_err(|_| invalid_pattern(pattern))
    }
}

/// Rewrite a magic pattern in `regex` syntax, with the case override from
/// `\c` / `\C`. `None` for a malformed `\{…}` count.
fn translate(pattern: &str) -> Option<(String, Option<bool>)> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut case = None;
    // At the start of a branch `^` anchors and `*` is literal.
    let mut branch_start = true;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        let was_start = std::mem::replace(&mut branch_start, false);
        match c {
            '\\' => {
                let Some(&next) = chars.get(i) else {
                    out.push_str("\\\\");
                    break;
                };
                i += 1;
                match next {
                    '<' | '>' => out.push_str("\\b"),
                    '+' => out.push('+'),
                    '=' | '?' => out.push('?'),
                    '|' => {
                        out.push('|');
                        branch_start = true;
                    }
                    '(' => {
                        out.push('(');
                        branch_start = true;
                    }
                    ')' => out.push(')'),
                    '%' if chars.get(i) == Some(&'(') => {
                        i += 1;
                        out.push_str("(?:");
                        branch_start = true;
                    }
                    '{' => i = translate_count(&chars, i, &mut out)?,
                    'c' => {
                        case = Some(true);
                        branch_start = was_start;
                    }
                    'C' => {
                        case = Some(false);
                        branch_start = was_start;
                    }
                    's' | 'S' | 'd' | 'D' | 'w' | 'W' | 'n' | 't' => {
                        out.push('\\');
                        out.push(next);
                    }
                    'a' => out.push_str("[A-Za-z]"),
                    'A' => out.push_str("[^A-Za-z]"),
                    'l' => out.push_str("[a-z]"),
                    'L' => out.push_str("[^a-z]"),
                    'u' => out.push_str("[A-Z]"),
                    'U' => out.push_str("[^A-Z]"),
                    'x' => out.push_str("[0-9A-Fa-f]"),
                    'o' => out.push_str("[0-7]"),
                    'h' => out.push_str("[A-Za-z_]"),
                    'e' => out.push_str("\\x1b"),
                    other => push_literal(&mut out, other),
                }
            }
            '^' if was_start => out.push('^'),
            '$' if at_branch_end(&chars, i) => out.push('$'),
            '*' if !was_start => out.push('*'),
            '.' => out.push('.'),
            '[' => match bracket_end(&chars, i) {
                Some(end) => {
                    translate_bracket(&chars[i..end], &mut out);
                    i = end + 1;
                }
                None => push_literal(&mut out, '['),
            },
            other => push_literal(&mut out, other),
        }
    }
    Some((out, case))
}

/// Translate the body of `\{…}` starting at `i`; returns the index after it.
fn translate_count(chars: &[char], mut i: usize, out: &mut String) -> Option<usize> {
    let lazy = chars.get(i) == Some(&'-');
    if lazy {
        i += 1;
    }
    let mut body = String::new();
    loop {
        match *chars.get(i)? {
            '}' => {
                i += 1;
                break;
            }
            '\\' if chars.get(i + 1) == Some(&'}') => {
                i += 2;
                break;
            }
            c if c.is_ascii_digit() || c == ',' => body.push(c),
            _ => return None,
        }
        i += 1;
    }
    match body.as_str() {
        "" | "," => out.push('*'),
        _ if body.starts_with(',') => {
            out.push_str("{0");
            out.push_str(&body);
            out.push('}');
        }
        _ => {
            out.push('{');
            out.push_str(&body);
            out.push('}');
        }
    }
    if lazy {
        out.push('?');
    }
    Some(i)
}

/// Whether a `$` just consumed (ending at `i`) closes its branch.
fn at_branch_end(chars: &[char], i: usize) -> bool {
    match chars.get(i).copied() {
        None => true,
        Some('\\') => matches!(chars.get(i + 1).copied(), Some('|' | ')')),
        Some(_) => false,
    }
}

/// Index of the `]` closing a bracket expression whose body starts at `i`.
fn bracket_end(chars: &[char], mut i: usize) -> Option<usize> {
    if chars.get(i) == Some(&'^') {
        i += 1;
    }
    // A leading `]` is a member, not the end.
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    while let Some(&c) = chars.get(i) {
        match c {
            ']' => return Some(i),
            '\\' => i += 2,
            '[' if chars.get(i + 1) == Some(&':') => {
                let close = (i + 2..chars.len().saturating_sub(1))
                    .find(|&j| chars[j] == ':' && chars[j + 1] == ']')?;
                i = close + 2;
            }
            _ => i += 1,
        }
    }
    None
}

/// Copy a bracket expression body (between `[` and `]`) as a `regex` class.
/// Character class names like `[:alpha:]` pass through; other punctuation
/// the `regex` class syntax treats specially is escaped.
fn translate_bracket(body: &[char], out: &mut String) {
    out.push('[');
    let mut i = 0;
    if body.first() == Some(&'^') {
        out.push('^');
        i += 1;
    }
    while i < body.len() {
        let c = body[i];
        i += 1;
        match c {
            '[' if body.get(i) == Some(&':') => {
                out.push('[');
                while let Some(&n) = body.get(i) {
                    out.push(n);
                    i += 1;
                    if n == ']' {
                        break;
                    }
                }
            }
            '\\' => match body.get(i).copied() {
                Some('e') => {
                    out.push_str("\\x1b");
                    i += 1;
                }
                Some(n @ ('t' | 'n' | 'r' | '\\' | ']' | '^' | '-')) => {
                    out.push('\\');
                    out.push(n);
                    i += 1;
                }
                _ => out.push_str("\\\\"),
            },
            '[' | ']' | '&' | '~' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push(']');
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

impl PatternMatcher for RegexMatcher {
    fn is_match(&self, pattern: &str, text: &str, ignore_case: bool) -> Result<bool, EvalError> {
        let key = (pattern.to_string(), ignore_case);
        if let Some(regex) = self.cache.borrow().get(&key) {
            return Ok(regex.is_match(text));
        }
        let regex = Self::compile(pattern, ignore_case)?;
        let matched = regex.is_match(text);
        let mut cache = self.cache.borrow_mut();
        if cache.len() >= CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(key, regex);
        Ok(matched)
    }
}

#[cfg(test)]
mod tests;
