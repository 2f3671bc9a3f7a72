use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Case-insensitive substring check.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Lowercase `s` and strip diacritics ("Élodie" → "elodie").
pub fn fold(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase()
}

/// Order display names the way a French reader expects: accents and case are
/// ignored first, and only break ties.
pub fn collate(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

/// Key used to match speaker names across sources: trimmed, folded, with
/// whitespace, hyphens and periods removed.
pub fn normalize_name(name: &str) -> String {
    fold(name.trim())
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_accents_and_case() {
        assert_eq!(fold("Élodie Gonçalves"), "elodie goncalves");
    }

    #[test]
    fn collate_ignores_accents() {
        let mut names = vec!["Zoé", "émile", "Eric", "Adrien"];
        names.sort_by(|a, b| collate(a, b));
        assert_eq!(names, vec!["Adrien", "émile", "Eric", "Zoé"]);
    }

    #[test]
    fn collate_is_total_on_ties() {
        assert_eq!(collate("Jean", "jean"), Ordering::Less);
        assert_eq!(collate("Jean", "Jean"), Ordering::Equal);
    }

    #[test]
    fn normalize_name_removes_separators() {
        assert_eq!(normalize_name("  Jean-Pierre  D. Silva "), "jeanpierredsilva");
        assert_eq!(normalize_name("JEAN PIERRE d silva"), "jeanpierredsilva");
    }

    #[test]
    fn contains_ignore_case_works() {
        assert!(contains_ignore_case("Lyon KBV", "lyon"));
        assert!(!contains_ignore_case("Nice KBV", "lyon"));
    }
}
