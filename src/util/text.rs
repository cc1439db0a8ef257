use regex::Regex;

/// Collapses every run of whitespace (including newlines) into a single space.
pub fn compact_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub fn strip_html(input: &str) -> String {
    let tag_re = Regex::new(r"<[^>]+>").expect("regex");
    let no_tags = tag_re.replace_all(input, " ");
    let decoded = no_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    compact_whitespace(&decoded)
}

/// Returns the trimmed label, or `None` when nothing is left.
pub fn clean_label(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
