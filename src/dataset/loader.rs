//! Tolerant JSON array loader
//!
//! Datasets are maintained by hand and occasionally arrive with syntax
//! damage. Loading goes through three stages and stops at the first that
//! yields entries:
//!
//! 1. strict parse of the whole array
//! 2. the same after removing trailing commas
//! 3. each top-level object of the repaired text parsed on its own,
//!    dropping the ones that fail

use serde::de::DeserializeOwned;
use crate::utils::{ForensicsError, Result};

/// An entry that could not be used, by position in the source array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct LoadOutcome<T> {
    pub entries: Vec<T>,
    pub skipped: Vec<SkippedEntry>,
    /// Whether any repair or recovery stage was needed
    pub repaired: bool,
}

pub fn load_entries<T: DeserializeOwned>(text: &str, label: &str) -> Result<LoadOutcome<T>> {
    let outcome = match serde_json::from_str::<Vec<serde_json::Value>>(text) {
        Ok(values) => convert_values(values, false),
        Err(strict_err) => {
            tracing::warn!("{} is not valid JSON ({}), attempting repair", label, strict_err);

            let repaired = strip_trailing_commas(text);
            match serde_json::from_str::<Vec<serde_json::Value>>(&repaired) {
                Ok(values) => convert_values(values, true),
                Err(_) => recover_objects(&repaired, label)?,
            }
        }
    };

    for skipped in &outcome.skipped {
        tracing::warn!("Skipped {} entry #{}: {}", label, skipped.index, skipped.reason);
    }

    if outcome.entries.is_empty() && !outcome.skipped.is_empty() {
        return Err(ForensicsError::DatasetUnavailable(format!(
            "{}: all {} entries are unusable",
            label,
            outcome.skipped.len()
        )));
    }

    if outcome.repaired {
        tracing::info!(
            "Recovered {} {} entries ({} skipped)",
            outcome.entries.len(),
            label,
            outcome.skipped.len()
        );
    }

    Ok(outcome)
}

fn convert_values<T: DeserializeOwned>(values: Vec<serde_json::Value>, repaired: bool) -> LoadOutcome<T> {
    let mut outcome = LoadOutcome {
        entries: Vec::with_capacity(values.len()),
        skipped: Vec::new(),
        repaired,
    };

    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(entry) => outcome.entries.push(entry),
            Err(e) => outcome.skipped.push(SkippedEntry { index, reason: e.to_string() }),
        }
    }

    outcome
}

fn recover_objects<T: DeserializeOwned>(text: &str, label: &str) -> Result<LoadOutcome<T>> {
    let body = match text.find('[') {
        Some(start) => &text[start + 1..],
        None => {
            return Err(ForensicsError::DatasetUnavailable(format!(
                "{}: no top-level array found",
                label
            )))
        }
    };

    let mut outcome = LoadOutcome {
        entries: Vec::new(),
        skipped: Vec::new(),
        repaired: true,
    };

    for (index, chunk) in split_objects(body).into_iter().enumerate() {
        match chunk {
            Chunk::Object(slice) => match serde_json::from_str(slice) {
                Ok(entry) => outcome.entries.push(entry),
                Err(e) => outcome.skipped.push(SkippedEntry { index, reason: e.to_string() }),
            },
            Chunk::Garbage(slice) => outcome.skipped.push(SkippedEntry {
                index,
                reason: format!("unparseable text '{}'", preview(slice)),
            }),
        }
    }

    Ok(outcome)
}

#[derive(Debug, PartialEq)]
enum Chunk<'a> {
    Object(&'a str),
    Garbage(&'a str),
}

/// Split the body of an array into top-level `{...}` objects.
///
/// Braces inside string literals are ignored. Anything between objects other
/// than whitespace, commas and the closing bracket is reported as garbage.
fn split_objects(body: &str) -> Vec<Chunk<'_>> {
    let mut chunks = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0usize;
    let mut stray: Option<usize> = None;

    for (i, c) in body.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                if depth == 0 && stray.is_none() {
                    stray = Some(i);
                }
            }
            '{' => {
                if depth == 0 {
                    if let Some(s) = stray.take() {
                        chunks.push(Chunk::Garbage(body[s..i].trim()));
                    }
                    start = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    chunks.push(Chunk::Object(&body[start..=i]));
                }
            }
            ',' | ']' if depth == 0 => {
                if let Some(s) = stray.take() {
                    chunks.push(Chunk::Garbage(body[s..i].trim()));
                }
                if c == ']' {
                    return chunks;
                }
            }
            c if depth == 0 && !c.is_whitespace() && stray.is_none() => stray = Some(i),
            _ => {}
        }
    }

    if depth > 0 {
        chunks.push(Chunk::Object(&body[start..]));
    } else if let Some(s) = stray {
        chunks.push(Chunk::Garbage(body[s..].trim()));
    }

    chunks
}

/// Remove commas that directly precede `]` or `}` outside string literals
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some(']') | Some('}')) {
                continue;
            }
        }
        out.push(c);
    }

    out
}

fn preview(text: &str) -> String {
    let mut short: String = text.chars().take(40).collect();
    if text.chars().count() > 40 {
        short.push_str("...");
    }
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
        #[serde(default)]
        tag: String,
    }

    #[test]
    fn test_strict_parse() {
        let outcome: LoadOutcome<Item> = load_entries(r#"[{"id": 1}, {"id": 2}]"#, "items").unwrap();
        assert_eq!(outcome.entries.len(), 2);
        assert!(outcome.skipped.is_empty());
        assert!(!outcome.repaired);
    }

    #[test]
    fn test_empty_array_is_valid() {
        let outcome: LoadOutcome<Item> = load_entries("[]", "items").unwrap();
        assert!(outcome.entries.is_empty());
    }

    #[test]
    fn test_trailing_commas_repaired() {
        let text = r#"[{"id": 1, "tag": "a,}"}, {"id": 2,},]"#;
        let outcome: LoadOutcome<Item> = load_entries(text, "items").unwrap();
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.entries[0].tag, "a,}");
        assert!(outcome.repaired);
    }

    #[test]
    fn test_wrong_shape_entry_skipped() {
        let outcome: LoadOutcome<Item> =
            load_entries(r#"[{"id": 1}, {"id": "x"}, {"id": 3}]"#, "items").unwrap();
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].index, 1);
    }

    #[test]
    fn test_corrupt_entry_recovered_individually() {
        let text = r#"[
            {"id": 1},
            {"id": 2,, "tag": "broken"},
            {"id": 3, "tag": "has {braces} inside"}
        ]"#;
        let outcome: LoadOutcome<Item> = load_entries(text, "items").unwrap();
        assert_eq!(outcome.entries, vec![
            Item { id: 1, tag: String::new() },
            Item { id: 3, tag: "has {braces} inside".into() },
        ]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].index, 1);
    }

    #[test]
    fn test_recovery_keeps_comma_repairs() {
        let text = r#"[{"id": 1,}, {"id": 2,, "tag": "x"}, {"id": 3,}]"#;
        let outcome: LoadOutcome<Item> = load_entries(text, "items").unwrap();
        let ids: Vec<u32> = outcome.entries.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].index, 1);
        assert!(outcome.repaired);
    }

    #[test]
    fn test_garbage_between_objects_reported() {
        let text = r#"[{"id": 1}, oops, {"id": 2}"#;
        let outcome: LoadOutcome<Item> = load_entries(text, "items").unwrap();
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
    }

    #[test]
    fn test_no_array_is_unavailable() {
        let result: Result<LoadOutcome<Item>> = load_entries("not json at all", "items");
        assert!(matches!(result, Err(ForensicsError::DatasetUnavailable(_))));
    }

    #[test]
    fn test_all_entries_corrupt_is_unavailable() {
        let result: Result<LoadOutcome<Item>> = load_entries(r#"[{"id": }, {"id": ,}]"#, "items");
        assert!(matches!(result, Err(ForensicsError::DatasetUnavailable(_))));
    }
}
