//! Salvaging JSON from model output: code fences, typographic quotes, raw
//! control characters, trailing commas, and arrays cut off mid-object.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use exam_core::model::QuestionDraft;

use crate::error::TutorError;

/// Remove Markdown code fences the model sometimes wraps JSON in.
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Normalize common model mistakes so the text has a chance to parse.
///
/// Typographic quotes become ASCII quotes, line breaks become spaces, other
/// control characters are dropped, and commas directly before `]` or `}` are
/// removed (outside string literals).
#[must_use]
pub fn clean_model_json(text: &str) -> String {
    let normalized: String = strip_code_fences(text)
        .chars()
        .filter_map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{2036}' => {
                Some('"')
            }
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{2035}' => {
                Some('\'')
            }
            '\r' | '\n' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    strip_trailing_commas(&normalized)
}

fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escape = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if !matches!(next, Some(']' | '}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

fn is_valid_array(text: &str) -> bool {
    serde_json::from_str::<Vec<Value>>(text).is_ok()
}

/// Recover the complete leading elements of a JSON array that was cut off.
///
/// Scans from the first `[`, tracking string literals and nesting, and closes
/// the array after the last element that ended cleanly. The result always
/// parses as a JSON array; `"[]"` when nothing can be salvaged. An array that
/// is already complete and valid is returned unchanged.
#[must_use]
pub fn repair_truncated_json_array(text: &str) -> String {
    let Some(start) = text.find('[') else {
        return "[]".to_string();
    };
    let body = &text[start..];

    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escape = false;
    let mut element_ends = Vec::new();

    for (i, b) in body.bytes().enumerate() {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                if depth == 0 {
                    let whole = &body[..=i];
                    if is_valid_array(whole) {
                        return whole.to_string();
                    }
                    break;
                }
                if depth == 1 {
                    element_ends.push(i);
                }
            }
            _ => {}
        }
    }

    for &end in element_ends.iter().rev() {
        let candidate = format!("{}]", &body[..=end]);
        if is_valid_array(&candidate) {
            debug!(kept_bytes = end + 1, "repaired truncated JSON array");
            return candidate;
        }
    }
    "[]".to_string()
}

fn parse_array(text: &str) -> Option<Vec<Value>> {
    serde_json::from_str(text).ok()
}

/// Turn a question-generation reply into drafts.
///
/// Tries the text as-is, then cleaned, then repaired. Elements that are not
/// question-shaped are dropped; validation is the caller's job.
#[must_use]
pub fn parse_question_batch(text: &str) -> Vec<QuestionDraft> {
    let stripped = strip_code_fences(text);
    let values = parse_array(&stripped)
        .or_else(|| parse_array(&clean_model_json(&stripped)))
        .unwrap_or_else(|| {
            let repaired = repair_truncated_json_array(&clean_model_json(&stripped));
            warn!(
                original_len = stripped.len(),
                repaired_len = repaired.len(),
                "question batch needed truncation repair"
            );
            parse_array(&repaired).unwrap_or_default()
        });

    values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<QuestionDraft>(value).ok())
        .collect()
}

/// Parse a single JSON object reply, cleaning it if the raw text fails.
///
/// # Errors
///
/// Returns `TutorError::InvalidResponse` when neither form parses.
pub fn parse_object<T: DeserializeOwned>(text: &str) -> Result<T, TutorError> {
    let stripped = strip_code_fences(text);
    serde_json::from_str(&stripped)
        .or_else(|_| serde_json::from_str(&clean_model_json(&stripped)))
        .map_err(|err| TutorError::InvalidResponse(err.to_string()))
}
