//! Tolerant JSON extraction from raw model output.
//!
//! Models asked for "only JSON" still wrap answers in prose or Markdown code
//! fences.  [`parse`] recovers the payload in a fixed order:
//!
//! 1. direct decode of the fence-stripped, trimmed text;
//! 2. the first balanced top-level `{ … }` region;
//! 3. the first balanced top-level `[ … ]` region.
//!
//! Objects are tried before arrays so that an object containing an array is
//! never mistaken for the inner array.  Nothing is repaired: a region whose
//! interior is malformed fails.

use serde_json::Value;

use crate::llm::client::LlmError;

/// Remove every Markdown code-fence marker (with or without a `json` tag)
/// and trim the result.
///
/// ```
/// use german_tutor::llm::parser::strip_code_fences;
///
/// assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
/// ```
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Extract a JSON object or array from `raw`.
///
/// Returns [`LlmError::MalformedResponse`] when no decodable object or array
/// can be located.
pub fn parse(raw: &str) -> Result<Value, LlmError> {
    let text = strip_code_fences(raw);

    if let Ok(value) = serde_json::from_str::<Value>(&text) {
        if value.is_object() || value.is_array() {
            return Ok(value);
        }
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(region) = balanced_region(&text, open, close) {
            if let Ok(value) = serde_json::from_str::<Value>(region) {
                log::debug!("parser: recovered JSON from embedded {open}…{close} region");
                return Ok(value);
            }
        }
    }

    Err(LlmError::MalformedResponse(preview(&text)))
}

/// Locate the first top-level region opened by `open`.
///
/// Regions are tracked across both bracket kinds, so a `{` nested inside a
/// top-level `[ … ]` is not a candidate.  Delimiters inside JSON string
/// literals are ignored; prose between regions is never treated as a string.
/// A mismatched closer abandons the current region and scanning resumes.
/// An opener that is never closed (a stray `[` in prose) is skipped and the
/// scan restarts just after it.
fn balanced_region(text: &str, open: char, close: char) -> Option<&str> {
    let mut from = 0;
    loop {
        match scan(&text[from..], open, close) {
            Scan::Found(start, end) => return Some(&text[from + start..from + end]),
            // Openers are ASCII, so one byte on is a char boundary.
            Scan::Unclosed(start) => from += start + 1,
            Scan::Exhausted => return None,
        }
    }
}

enum Scan {
    /// Byte range of a complete region.
    Found(usize, usize),
    /// Input ended inside the region opened at this byte.
    Unclosed(usize),
    Exhausted,
}

fn scan(text: &str, open: char, close: char) -> Scan {
    let mut stack: Vec<char> = Vec::new();
    let mut region_start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '{' | '[' => {
                if stack.is_empty() {
                    region_start = idx;
                }
                stack.push(ch);
            }
            '}' | ']' => {
                let Some(top) = stack.pop() else { continue };
                if closer_for(top) != ch {
                    stack.clear();
                    continue;
                }
                if stack.is_empty() && top == open && ch == close {
                    return Scan::Found(region_start, idx + ch.len_utf8());
                }
            }
            '"' if !stack.is_empty() => in_string = true,
            _ => {}
        }
    }

    if stack.is_empty() {
        Scan::Exhausted
    } else {
        Scan::Unclosed(region_start)
    }
}

fn closer_for(open: char) -> char {
    if open == '{' {
        '}'
    } else {
        ']'
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 80;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
