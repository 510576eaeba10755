//! Identifier helpers shared by both stages: graph-schema tokens, the
//! `primekg_key` cross-reference and null normalization of raw fields.

/// Prefix for tokens that would otherwise be empty or start with a digit.
pub const TOKEN_MARKER: &str = "T";

/// Spellings that tabular exports use for a missing value.
const NULL_SENTINELS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "<NA>", "#N/A",
];

/// Normalize a raw field: missing, blank and null-sentinel values all
/// become `None`. Present values are returned untouched.
///
/// Whitespace-only values count as missing too, so a row whose type is
/// `" "` is dropped rather than labelled with the bare marker.
pub fn present(raw: Option<&str>) -> Option<&str> {
    let value = raw?;
    let trimmed = value.trim();
    if trimmed.is_empty() || NULL_SENTINELS.contains(&trimmed) {
        None
    } else {
        Some(value)
    }
}

/// Map any string onto `[A-Za-z_][A-Za-z0-9_]*`, usable as a Neo4j label
/// or relationship type.
///
/// Runs of characters outside `[A-Za-z0-9_]` and runs of underscores both
/// collapse to one `_`; leading and trailing underscores are dropped. A
/// digit-leading result gets `T_` in front, an empty one becomes `T`.
pub fn sanitize(raw: Option<&str>) -> String {
    let raw = raw.unwrap_or("").trim();
    let mut token = String::with_capacity(raw.len() + 2);

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            token.push(c);
        } else if !token.is_empty() && !token.ends_with('_') {
            token.push('_');
        }
    }
    if token.ends_with('_') {
        token.pop();
    }

    match token.chars().next() {
        None => TOKEN_MARKER.to_string(),
        Some(first) if first.is_ascii_digit() => format!("{}_{}", TOKEN_MARKER, token),
        Some(_) => token,
    }
}

/// Stable lookup key: `source:id`, or `id` alone when it is already
/// colon-qualified (e.g. `SBO:0000185`) or the source is blank.
/// Returns an empty string when there is no id.
pub fn build_key(source: Option<&str>, id: Option<&str>) -> String {
    let source = source.unwrap_or("").trim();
    let id = id.unwrap_or("").trim();

    if id.is_empty() {
        return String::new();
    }
    if id.contains(':') || source.is_empty() {
        return id.to_string();
    }
    format!("{}:{}", source, id)
}
