/// `%term%` for `ILIKE`, with the wildcard characters of `term` escaped.
/// Blank terms yield `None` so the filter is skipped.
pub fn like_pattern(term: Option<&str>) -> Option<String> {
    let term = term?.trim();
    if term.is_empty() {
        return None;
    }

    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}
