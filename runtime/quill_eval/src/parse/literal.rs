//! Number and string literal scanners.

use quill_value::errors::{missing_double_quote, missing_single_quote};
use quill_value::{parse_number_prefix, str_to_float, EvalError, Value};

fn digits_from(bytes: &[u8], from: usize) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count()
}

/// Scan a number literal at the start of `text`, which begins with a digit.
///
/// A Float needs the full `digits.digits[e[+-]digits]` shape and must not be
/// followed by a letter or another `.`; anything else scans as a Number
/// (decimal, `0x` hex, `0b` binary or leading-zero octal).
pub fn scan_number(text: &str) -> (Value, usize) {
    let bytes = text.as_bytes();
    let int_end = digits_from(bytes, 0);
    let has_fraction = bytes.get(int_end) == Some(&b'.')
        && bytes.get(int_end + 1).is_some_and(u8::is_ascii_digit);
    if has_fraction {
        let mut end = int_end + 1 + digits_from(bytes, int_end + 1);
        let mut is_float = true;
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            let exp_digits = digits_from(bytes, exp);
            if exp_digits == 0 {
                is_float = false;
            } else {
                end = exp + exp_digits;
            }
        }
        if bytes
            .get(end)
            .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'.')
        {
            is_float = false;
        }
        if is_float {
            let (f, len) = str_to_float(&text[..end]);
            return (Value::Float(f), len);
        }
    }
    let (n, len) = parse_number_prefix(text);
    (Value::Number(n), len)
}

/// Read up to `max` hex digits from `chars`.
fn take_hex(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    max: usize,
) -> Option<u32> {
    let mut value = None;
    for _ in 0..max {
        let Some(digit) = chars.peek().and_then(|(_, c)| c.to_digit(16)) else {
            break;
        };
        chars.next();
        value = Some(value.unwrap_or(0) * 16 + digit);
    }
    value
}

/// Scan a `"..."` literal at the start of `text`, resolving backslash
/// escapes. Returns the string and the bytes consumed, closing quote included.
pub fn scan_double_quoted(text: &str) -> Result<(String, usize), EvalError> {
    let mut out = String::new();
    let mut chars = text[1..].char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((out, i + 2)),
            '\\' => {
                let Some((_, escape)) = chars.next() else {
                    break;
                };
                match escape {
                    'b' => out.push('\u{8}'),
                    'e' => out.push('\u{1b}'),
                    'f' => out.push('\u{c}'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'x' | 'X' | 'u' | 'U' => {
                        let max = match escape {
                            'u' => 4,
                            'U' => 8,
                            _ => 2,
                        };
                        match take_hex(&mut chars, max) {
                            Some(code) => {
                                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                            }
                            None => out.push(escape),
                        }
                    }
                    '0'..='7' => {
                        let mut code = escape.to_digit(8).unwrap_or(0);
                        for _ in 0..2 {
                            let Some(digit) = chars.peek().and_then(|(_, c)| c.to_digit(8)) else {
                                break;
                            };
                            chars.next();
                            code = code * 8 + digit;
                        }
                        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                    other => out.push(other),
                }
            }
            other => out.push(other),
        }
    }
    Err(missing_double_quote(text))
}

/// Scan a `'...'` literal at the start of `text`; `''` stands for one quote.
pub fn scan_single_quoted(text: &str) -> Result<(String, usize), EvalError> {
    let mut out = String::new();
    let mut start = 1;
    loop {
        let Some(offset) = text[start..].find('\'') else {
            return Err(missing_single_quote(text));
        };
        let quote = start + offset;
        out.push_str(&text[start..quote]);
        if text[quote + 1..].starts_with('\'') {
            out.push('\'');
            start = quote + 2;
        } else {
            return Ok((out, quote + 1));
        }
    }
}
