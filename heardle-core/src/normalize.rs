/// Canonical form used for every guess/track comparison:
/// surrounding whitespace trimmed, Unicode lower case.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// True when nothing but whitespace is left to compare.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
