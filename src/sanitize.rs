pub const DESCRIPTION_MAX_CHARS: usize = 250;

/// Collapses whitespace runs, trims, and cuts to at most `max_chars` characters.
///
/// Total over any input: the result never has leading, trailing or repeated
/// whitespace and never splits a character.
pub fn sanitize_description(raw: &str, max_chars: usize) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars).trim_end().to_string()
}

/// Cuts to `max_chars` characters on a char boundary.
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}
