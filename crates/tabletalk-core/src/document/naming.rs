//! Collision-resistant blob names and safe path segments.
//!
//! All functions here are pure.

/// Separator between the id part and the original-name part of a stored name.
pub const SEPARATOR: char = '-';

const MAX_SEGMENT_LEN: usize = 64;
const MAX_FILE_NAME_LEN: usize = 120;

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Sanitizes an id into a directory name.
///
/// Keeps `[A-Za-z0-9._-]`, caps the length, and never yields an empty
/// string, `.` or `..`.
pub fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| is_safe(*c)).take(MAX_SEGMENT_LEN).collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Filters a stored file name down to the safe set without truncating it.
///
/// Used when a stored name comes back from the caller and is joined onto a path.
pub fn sanitize_stored_name(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| is_safe(*c)).collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Sanitizes a document id for use as a blob-name prefix.
///
/// `-` becomes `_` so the first separator in a stored name always ends the id.
pub fn sanitize_document_id(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| is_safe(*c))
        .map(|c| if c == SEPARATOR { '_' } else { c })
        .take(MAX_SEGMENT_LEN)
        .collect();
    if cleaned.is_empty() {
        "doc".to_string()
    } else {
        cleaned
    }
}

/// Sanitizes an original file name, keeping its extension when truncating.
pub fn sanitize_file_name(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| is_safe(*c)).collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return "file".to_string();
    }
    if cleaned.len() <= MAX_FILE_NAME_LEN {
        return cleaned;
    }

    // ASCII only from here on, byte slicing is safe
    match cleaned.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() < 16 => {
            let keep = MAX_FILE_NAME_LEN - ext.len() - 1;
            format!("{}.{}", &stem[..keep.min(stem.len())], ext)
        }
        _ => cleaned[..MAX_FILE_NAME_LEN].to_string(),
    }
}

/// Builds `<sanitized-id>-<sanitized-original-name>`.
pub fn stored_file_name(document_id: &str, original_file_name: &str) -> String {
    format!(
        "{}{}{}",
        sanitize_document_id(document_id),
        SEPARATOR,
        sanitize_file_name(original_file_name)
    )
}

/// Recovers the (sanitized) original name by stripping through the first separator.
pub fn original_name_from_stored(stored_file_name: &str) -> &str {
    stored_file_name
        .split_once(SEPARATOR)
        .map(|(_, rest)| rest)
        .unwrap_or(stored_file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_segment_strips_unsafe_characters() {
        assert_eq!(sanitize_segment("proj/../x y"), "proj..xy");
        assert_eq!(sanitize_segment("../.."), "_");
        assert_eq!(sanitize_segment(".."), "_");
        assert_eq!(sanitize_segment("///"), "_");
        assert_eq!(sanitize_segment(&"a".repeat(200)).len(), 64);
    }

    #[test]
    fn test_document_id_never_contains_separator() {
        assert_eq!(sanitize_document_id("doc-1"), "doc_1");
        assert_eq!(sanitize_document_id("???"), "doc");
    }

    #[test]
    fn test_file_name_truncation_keeps_extension() {
        let long = format!("{}.xlsx", "q".repeat(300));
        let name = sanitize_file_name(&long);
        assert_eq!(name.len(), 120);
        assert!(name.ends_with(".xlsx"));
        assert_eq!(sanitize_file_name("résumé 2024.csv"), "rsum2024.csv");
        assert_eq!(sanitize_file_name("ü"), "file");
    }

    #[test]
    fn test_round_trip_original_name() {
        let stored = stored_file_name("doc-1", "report.pdf");
        assert_eq!(stored, "doc_1-report.pdf");
        assert_eq!(original_name_from_stored(&stored), "report.pdf");

        let stored = stored_file_name("a1b2", "my-data-v2.csv");
        assert_eq!(original_name_from_stored(&stored), "my-data-v2.csv");
    }

    #[test]
    fn test_same_original_name_different_ids_do_not_collide() {
        assert_ne!(
            stored_file_name("id-1", "sales.csv"),
            stored_file_name("id-2", "sales.csv")
        );
    }
}
