use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{CourtSeerError, Result};

/// Structured answer pulled out of an oracle's raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedVerdict {
    pub winner: String,
    /// 0-100.
    pub confidence: u8,
    pub reason: String,
}

/// Extracts `{"winner", "confidence", "reason"}` from free-form model output.
///
/// Tolerates markdown fences, prose around the object, single-quoted
/// literals, Python-style `True`/`False`/`None` and trailing commas. Any
/// failure is reported as [`CourtSeerError::ParseFailure`]; nothing panics.
pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(raw: &str) -> Result<ParsedVerdict> {
        let text = Self::strip_fences(raw.trim());

        let candidate = Self::candidate(text)
            .ok_or_else(|| CourtSeerError::parse_failure("no JSON object in response"))?;

        let value = match serde_json::from_str::<Value>(candidate) {
            Ok(value) => value,
            Err(strict_err) => {
                debug!("Strict decode failed ({}), trying permissive decode", strict_err);
                serde_json::from_str::<Value>(&Self::permissive_json(candidate)).map_err(|e| {
                    CourtSeerError::parse_failure(format!("undecodable object: {}", e))
                })?
            }
        };

        let object = value
            .as_object()
            .ok_or_else(|| CourtSeerError::parse_failure("response is not a JSON object"))?;

        Self::verdict_from(object)
    }

    /// Interior of the first fenced block, preferring a ```json fence.
    fn strip_fences(text: &str) -> &str {
        let inner = if let Some(start) = text.find("```json") {
            &text[start + "```json".len()..]
        } else if let Some(start) = text.find("```") {
            &text[start + "```".len()..]
        } else {
            return text;
        };

        match inner.find("```") {
            Some(end) => inner[..end].trim(),
            None => inner.trim(),
        }
    }

    /// First `{` through last `}`.
    fn candidate(text: &str) -> Option<&str> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        (end > start).then(|| &text[start..=end])
    }

    fn verdict_from(object: &Map<String, Value>) -> Result<ParsedVerdict> {
        let winner = object
            .get("winner")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .ok_or_else(|| CourtSeerError::parse_failure("missing or empty `winner`"))?;

        let confidence = object
            .get("confidence")
            .and_then(Self::confidence_from)
            .ok_or_else(|| CourtSeerError::parse_failure("missing or non-numeric `confidence`"))?;

        let reason = match object.get("reason") {
            Some(Value::String(reason)) => reason.trim().to_string(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Ok(ParsedVerdict {
            winner: winner.to_string(),
            confidence,
            reason,
        })
    }

    /// Accepts integers, floats, numeric strings and percent strings.
    /// Fractions strictly between 0 and 1 are read as probabilities.
    fn confidence_from(value: &Value) -> Option<u8> {
        let raw = match value {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
            _ => return None,
        };

        if !raw.is_finite() {
            return None;
        }

        let percent = if raw > 0.0 && raw < 1.0 { raw * 100.0 } else { raw };
        Some(percent.round().clamp(0.0, 100.0) as u8)
    }

    /// Rewrites a Python-literal-ish object into JSON.
    fn permissive_json(candidate: &str) -> String {
        let chars: Vec<char> = candidate.chars().collect();
        let mut out = String::with_capacity(candidate.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '"' => {
                    // Copy a JSON string verbatim.
                    out.push(c);
                    i += 1;
                    while i < chars.len() {
                        let d = chars[i];
                        out.push(d);
                        i += 1;
                        if d == '\\' && i < chars.len() {
                            out.push(chars[i]);
                            i += 1;
                        } else if d == '"' {
                            break;
                        }
                    }
                }
                '\'' => {
                    out.push('"');
                    i += 1;
                    while i < chars.len() {
                        let d = chars[i];
                        i += 1;
                        match d {
                            '\\' if i < chars.len() => {
                                let escaped = chars[i];
                                i += 1;
                                if escaped == '\'' {
                                    out.push('\'');
                                } else {
                                    out.push('\\');
                                    out.push(escaped);
                                }
                            }
                            '"' => out.push_str("\\\""),
                            '\'' => break,
                            _ => out.push(d),
                        }
                    }
                    out.push('"');
                }
                ',' => {
                    let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                    if !matches!(next, Some('}') | Some(']')) {
                        out.push(c);
                    }
                    i += 1;
                }
                c if c.is_ascii_alphabetic() => {
                    let start = i;
                    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    match word.as_str() {
                        "True" => out.push_str("true"),
                        "False" => out.push_str("false"),
                        "None" => out.push_str("null"),
                        _ => out.push_str(&word),
                    }
                }
                _ => {
                    out.push(c);
                    i += 1;
                }
            }
        }

        out
    }
}
