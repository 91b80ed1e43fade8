//! Text normalization helpers.

/// Trims whitespace, a UTF-8 byte-order mark and surrounding quotes from a header cell.
pub fn strip_header_noise(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .trim()
        .trim_matches('"')
        .trim()
        .to_string()
}

/// Title-cases each word: first letter upper, rest lower.
///
/// Letters following an apostrophe or hyphen start a new word, so
/// `o'brien-smith` becomes `O'Brien-Smith`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
