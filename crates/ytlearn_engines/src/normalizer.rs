#![forbid(unsafe_code)]

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Parsed(Value),
    Unparsed(String),
}

impl Normalized {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Unparsed(_) => None,
        }
    }

    /// Unwraps `{"<key>": ...}` when present, otherwise keeps the object itself.
    pub fn keyed(self, key: &str) -> Self {
        match self {
            Self::Parsed(Value::Object(mut map)) => match map.remove(key) {
                Some(inner) => Self::Parsed(inner),
                None => Self::Parsed(Value::Object(map)),
            },
            other => other,
        }
    }

    /// Typed view of the parsed value; `None` when unparsed or wrong-shaped.
    pub fn into_typed<T: DeserializeOwned>(self) -> Option<T> {
        match self {
            Self::Parsed(value) => serde_json::from_value(value).ok(),
            Self::Unparsed(_) => None,
        }
    }
}

/// Strategies run in order until one parses: the text as-is, the body of a
/// Markdown code fence, the first balanced `{...}` span, and each of those again
/// after light repair. When all fail the raw text comes back as
/// [`Normalized::Unparsed`].
pub fn parse_json(raw: &str) -> Normalized {
    let trimmed = raw.trim().trim_start_matches('\u{feff}').trim();
    let fenced = fenced_body(trimmed);
    let mut candidates: Vec<&str> = vec![trimmed];
    if let Some(body) = fenced {
        candidates.push(body);
    }
    if let Some(span) = first_balanced_object(fenced.unwrap_or(trimmed)) {
        candidates.push(span);
    }
    if fenced.is_some() {
        if let Some(span) = first_balanced_object(trimmed) {
            candidates.push(span);
        }
    }

    for candidate in &candidates {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            return Normalized::Parsed(value);
        }
    }
    for candidate in &candidates {
        let repaired = repair(candidate);
        if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
            debug!("model output parsed after repair");
            return Normalized::Parsed(value);
        }
    }
    debug!(len = raw.len(), "model output is not recoverable json");
    Normalized::Unparsed(raw.to_string())
}

/// `parse_json` followed by [`Normalized::keyed`].
pub fn parse_json_keyed(raw: &str, key: &str) -> Normalized {
    parse_json(raw).keyed(key)
}

/// Body of the first fenced block (```json ... ``` or ``` ... ```).
pub fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let content_start = after_fence.find('\n').map(|nl| nl + 1)?;
    let content = &after_fence[content_start..];
    let end = content.find("```")?;
    Some(content[..end].trim())
}

/// First `{...}` span whose braces balance, ignoring braces inside strings.
pub fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Complete HTML document inside model output: fences and surrounding prose
/// are dropped, everything from `<!DOCTYPE` (or `<html`) through the last
/// `</html>` is kept.
pub fn extract_html_document(raw: &str) -> Option<String> {
    let text = fenced_body(raw).unwrap_or(raw);
    let lower = text.to_ascii_lowercase();
    let start = lower.find("<!doctype").or_else(|| lower.find("<html"))?;
    let end = lower
        .rfind("</html>")
        .filter(|end| *end > start)
        .map(|end| end + "</html>".len())
        .unwrap_or(text.len());
    let document = text[start..end].trim();
    if document.is_empty() {
        return None;
    }
    Some(document.to_string())
}

fn repair(text: &str) -> String {
    let unquoted: String = text
        .chars()
        .map(|ch| match ch {
            '\u{201c}' | '\u{201d}' | '\u{201e}' => '"',
            other => other,
        })
        .collect();
    strip_trailing_commas(&unquoted)
}

fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for (idx, &ch) in chars.iter().enumerate() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        if ch == '"' {
            in_string = true;
        }
        if ch == ',' {
            let next = chars[idx + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}
