//! Concept-key normalization.
//!
//! Every node identity in the concept and consciousness graphs is a
//! normalized key: lowercase, diacritics stripped, surrounding whitespace
//! trimmed and internal whitespace collapsed. Normalizing an already
//! normalized key is a no-op.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize free text into a concept key.
///
/// ```
/// use cerebro::normalize::normalize_key;
///
/// assert_eq!(normalize_key("  Carnívoro "), "carnivoro");
/// assert_eq!(normalize_key("Qué  pasa si"), "que pasa si");
/// ```
pub fn normalize_key(text: &str) -> String {
    let stripped: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        // Lowercasing can reintroduce decomposable characters.
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `text` is already in normalized form.
pub fn is_normalized(text: &str) -> bool {
    normalize_key(text) == text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics_and_case() {
        assert_eq!(normalize_key("TIGRE"), "tigre");
        assert_eq!(normalize_key("Canción"), "cancion");
        assert_eq!(normalize_key("Pingüino"), "pinguino");
        assert_eq!(normalize_key("Ñandú"), "nandu");
    }

    #[test]
    fn trims_and_collapses_whitespace() {
        assert_eq!(normalize_key("  felino \t carnívoro\n"), "felino carnivoro");
        assert_eq!(normalize_key("   "), "");
    }

    #[test]
    fn idempotent() {
        for input in [
            "Árbol",
            "  ÉSTE es   un Test ",
            "ﬁesta",
            "Straße",
            "İstanbul",
            "",
            "a\u{0301}\u{0301}",
        ] {
            let once = normalize_key(input);
            assert_eq!(normalize_key(&once), once, "not idempotent for {input:?}");
            assert!(is_normalized(&once));
        }
    }
}
