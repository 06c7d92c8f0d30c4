//! Front-matter splitting for post documents.
//!
//! A post document may open with a delimiter-bounded YAML block:
//!
//! ```text
//! ---
//! title: Hello
//! created: 2024-01-01
//! ---
//! body text...
//! ```
//!
//! Splitting is purely textual; decoding the block into a typed schema
//! happens in `post.rs` / `series.rs`.

/// Front-matter delimiter line.
pub const DELIMITER: &str = "---";

/// Split a document into its front-matter block and body.
///
/// Returns `(Some(block), body)` when the document opens with a delimiter
/// line and a closing delimiter follows. Documents without a leading
/// delimiter, or with an unterminated block, yield `(None, content)`:
/// the whole file is body and the metadata map is considered empty.
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let mut offset = 0;
    let mut lines = content.split_inclusive('\n');

    match lines.next() {
        Some(first) if first.trim() == DELIMITER => offset += first.len(),
        _ => return (None, content),
    }

    let block_start = offset;
    for line in lines {
        if line.trim() == DELIMITER {
            let block = &content[block_start..offset];
            let body = &content[offset + line.len()..];
            return (Some(block), body);
        }
        offset += line.len();
    }

    // Unterminated block: no metadata, whole file is body.
    (None, content)
}

/// Whether a decoded YAML document carries no metadata at all.
///
/// Covers empty files (`null`) and documents that are an empty mapping.
pub fn is_empty_document(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Null => true,
        serde_yaml::Value::Mapping(map) => map.is_empty(),
        _ => false,
    }
}
