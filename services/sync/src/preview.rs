/// Cut a preview down to at most `max_chars` characters, never splitting a
/// multi-byte character.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => trimmed[..byte_idx].to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_preview("hello", 200), "hello");
    }

    #[test]
    fn long_text_is_cut_to_limit() {
        let long = "x".repeat(500);
        let cut = truncate_preview(&long, 200);
        assert_eq!(cut.chars().count(), 200);
    }

    #[test]
    fn never_splits_multibyte_characters() {
        let umlauts = "ä".repeat(300);
        let cut = truncate_preview(&umlauts, 200);
        assert_eq!(cut.chars().count(), 200);
        assert!(cut.is_char_boundary(cut.len()));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(truncate_preview("  Sehr geehrte Damen  ", 200), "Sehr geehrte Damen");
    }
}
