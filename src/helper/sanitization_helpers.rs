use std::collections::HashSet;

/// Strips all HTML tags from input, for titles, names and other
/// single-line labels. The result is plain text: ammonia's entity escaping
/// is undone, so `R&D` is stored as typed. Body text is stored as typed.
pub fn strip_all_html(input: &str) -> String {
    let cleaned = ammonia::Builder::new().tags(HashSet::new()).clean(input).to_string();
    html_escape::decode_html_entities(&cleaned).trim().to_string()
}
