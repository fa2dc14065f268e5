/// Largest edit distance at which a filename segment is reported as a
/// possible misspelling of the job identifier.
pub(super) const MAX_NEAR_MISS_DISTANCE: usize = 2;

/// First whitespace-separated segment of `file_name` that is close to, but
/// not necessarily equal to, `sheet_name`.
pub(super) fn near_miss_segment<'a>(sheet_name: &str, file_name: &'a str) -> Option<&'a str> {
    file_name
        .split_whitespace()
        .find(|segment| strsim::levenshtein(sheet_name, segment) <= MAX_NEAR_MISS_DISTANCE)
}
