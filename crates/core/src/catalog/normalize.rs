//! String normalization shared by search filters, item writes and CSV import.

/// Separator accepted inside a single tag input ("dc, batman").
pub const TAG_SEPARATOR: char = ',';

/// Trim and lower-case a comparison value.
///
/// Returns `None` for empty or whitespace-only input. Lower-casing uses the
/// Unicode default mapping, so results do not depend on the host locale.
pub fn normalize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Trim a stored text value, keeping its case. Blank becomes `None`.
pub fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Normalize a collection of raw tag inputs.
///
/// Each input may carry several tags separated by commas. Pieces are
/// normalized, blanks dropped, duplicates removed keeping the first
/// occurrence, and the result is capped at `max` entries.
pub fn normalize_tags<I, S>(inputs: I, max: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: Vec<String> = Vec::new();

    for input in inputs {
        for piece in input.as_ref().split(TAG_SEPARATOR) {
            if tags.len() >= max {
                return tags;
            }
            if let Some(tag) = normalize(piece) {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
    }

    tags
}
