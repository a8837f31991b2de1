//! Text normalization for relevance matching and merge keys.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold text for matching
///
/// - Removes diacritics (NFKD, combining marks dropped)
/// - Converts to lowercase, with Turkish dotless i folded to `i`
/// - Collapses whitespace
pub fn fold(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ı' { 'i' } else { c })
        .collect();

    collapse_whitespace(&folded)
}

/// Fold text and drop everything but letters, digits and single spaces.
///
/// Used for merge keys, where punctuation differences between catalogs
/// ("Dune: Messiah" vs "Dune Messiah") must not split a book in two.
pub fn normalize_key(text: &str) -> String {
    let cleaned: String = fold(text)
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    collapse_whitespace(&cleaned)
}

/// Whitespace-delimited tokens of the folded text
pub fn tokens(text: &str) -> Vec<String> {
    fold(text).split_whitespace().map(str::to_string).collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_removes_diacritics() {
        assert_eq!(fold("Kürk Mantolu Madonna"), "kurk mantolu madonna");
        assert_eq!(fold("Çalıkuşu"), "calikusu");
        assert_eq!(fold("Les Misérables"), "les miserables");
        assert_eq!(fold("ŞEYH GALİP"), "seyh galip");
    }

    #[test]
    fn test_fold_collapses_whitespace() {
        assert_eq!(fold("  The   Hobbit \n"), "the hobbit");
        assert_eq!(fold(""), "");
    }

    #[test]
    fn test_normalize_key_strips_punctuation() {
        assert_eq!(normalize_key("Dune: Messiah"), "dune messiah");
        assert_eq!(normalize_key("Dune Messiah"), "dune messiah");
        assert_eq!(normalize_key("O'Brien, Flann"), "o brien flann");
    }

    #[test]
    fn test_tokens() {
        assert_eq!(tokens("Suç ve  Ceza"), vec!["suc", "ve", "ceza"]);
        assert!(tokens("   ").is_empty());
    }
}
