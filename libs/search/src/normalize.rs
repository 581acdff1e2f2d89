//! Result normalizer
//!
//! Turns raw hits into plain source documents with highlighted fragments
//! merged back in, so clients can render `<mark>` tags in place of the
//! stored field values.
//!
//! Merge rules:
//! - a highlight key is a dotted path; all but the last segment address
//!   nested objects, the last one names the field
//! - keys whose last segment is an identity field (`id`) are never merged
//! - array fields only have the elements replaced that occur verbatim inside
//!   the fragment; scalar fields are overwritten

use crate::models::SearchHit;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Field names that highlighting must never overwrite
pub const EXCLUDED_FIELDS: &[&str] = &["id"];

/// What a single merge did to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The key names an excluded field; document untouched
    Excluded,
    /// The field was overwritten (or inserted) with the fragment
    Replaced,
    /// The field is an array; this many elements were replaced
    ArrayElements(usize),
}

/// Failure to address a highlight path inside a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Empty highlight path")]
    Empty,

    #[error("Segment '{segment}' of '{path}' does not exist")]
    Missing { path: String, segment: String },

    #[error("Segment '{segment}' of '{path}' is not inside an object")]
    NotAnObject { path: String, segment: String },
}

/// Merge one highlighted fragment into `document` at the dotted `path`.
pub fn merge_highlight(
    document: &mut JsonValue,
    path: &str,
    fragment: &str,
) -> Result<MergeOutcome, PathError> {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((field, parents)) = segments.split_last() else {
        return Err(PathError::Empty);
    };
    if field.is_empty() {
        return Err(PathError::Empty);
    }

    if EXCLUDED_FIELDS.contains(field) {
        return Ok(MergeOutcome::Excluded);
    }

    let mut target = document;
    for segment in parents {
        let object = target
            .as_object_mut()
            .ok_or_else(|| not_an_object(path, segment))?;
        target = object.get_mut(*segment).ok_or_else(|| PathError::Missing {
            path: path.to_string(),
            segment: segment.to_string(),
        })?;
    }

    let container = target
        .as_object_mut()
        .ok_or_else(|| not_an_object(path, field))?;

    if let Some(JsonValue::Array(elements)) = container.get_mut(*field) {
        let mut replaced = 0;
        for element in elements.iter_mut() {
            if element_contained_in(element, fragment) {
                *element = JsonValue::String(fragment.to_string());
                replaced += 1;
            }
        }
        return Ok(MergeOutcome::ArrayElements(replaced));
    }

    container.insert(field.to_string(), JsonValue::String(fragment.to_string()));
    Ok(MergeOutcome::Replaced)
}

fn not_an_object(path: &str, segment: &str) -> PathError {
    PathError::NotAnObject {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}

/// Substring containment of an array element inside the fragment. Numbers and
/// booleans compare by their JSON text; nested structures never match.
fn element_contained_in(element: &JsonValue, fragment: &str) -> bool {
    match element {
        JsonValue::String(s) => fragment.contains(s.as_str()),
        JsonValue::Number(n) => fragment.contains(&n.to_string()),
        JsonValue::Bool(b) => fragment.contains(if *b { "true" } else { "false" }),
        _ => false,
    }
}

/// Normalize one hit into its source document.
///
/// Paths that cannot be addressed are logged and skipped; the remaining
/// keys are still merged.
pub fn normalize_hit(hit: SearchHit) -> JsonValue {
    let mut document = hit
        .source
        .unwrap_or_else(|| JsonValue::Object(Map::new()));

    let Some(highlight) = hit.highlight else {
        return document;
    };

    for (path, fragments) in &highlight {
        // Whole-field highlighting yields a single fragment per field
        let Some(fragment) = fragments.first() else {
            continue;
        };
        if let Err(e) = merge_highlight(&mut document, path, fragment) {
            tracing::warn!(
                hit_id = hit.id.as_deref().unwrap_or(""),
                path = %path,
                error = %e,
                "Skipping highlight that does not fit the source document"
            );
        }
    }

    document
}

/// Normalize all hits, preserving backend order.
pub fn normalize_hits(hits: Vec<SearchHit>) -> Vec<JsonValue> {
    hits.into_iter().map(normalize_hit).collect()
}
