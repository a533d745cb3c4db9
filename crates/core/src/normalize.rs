//! Name normalization shared by every lookup in the engine.
//!
//! Players type item, attribute, and skill names free-form, with arbitrary
//! casing and with or without accents. All matching goes through a single
//! normalization: NFD-decompose, drop combining marks, lowercase, trim.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a free-text name for lookup.
///
/// `"Água Limpa "` and `"agua limpa"` normalize to the same key.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Compare two names under normalization.
pub fn names_match(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_trims() {
        assert_eq!(normalize("  Canned Food "), "canned food");
    }

    #[test]
    fn test_strips_diacritics() {
        assert_eq!(normalize("Água"), "agua");
        assert_eq!(normalize("ração"), "racao");
        assert_eq!(normalize("Resistência"), "resistencia");
    }

    #[test]
    fn test_names_match_is_insensitive() {
        assert!(names_match("GARRAFA D'ÁGUA", "garrafa d'agua"));
        assert!(!names_match("water", "waters"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }
}
