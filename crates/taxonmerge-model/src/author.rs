//! Fuzzy author comparison.
//!
//! Two authorships are treated as the same author when their canonical forms
//! agree. The canonical form drops years, brackets, initials and punctuation,
//! expands known abbreviations and lower-cases the lot, so `L.`, `Linnaeus`
//! and `(Linnaeus, 1758)` all collapse to `linnaeus`.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Abbreviations that are common enough to expand out of the box.
const DEFAULT_AUTHOR_MAP: &[(&str, &str)] = &[
    ("l", "linnaeus"),
    ("linn", "linnaeus"),
    ("dc", "de candolle"),
    ("benth", "bentham"),
    ("hook", "hooker"),
    ("hookf", "hooker"),
    ("rbr", "brown"),
    ("fmuell", "mueller"),
    ("lindl", "lindley"),
    ("sm", "smith"),
    ("willd", "willdenow"),
];

#[derive(Debug, Clone)]
pub struct AuthorComparator {
    abbreviations: HashMap<String, String>,
}

impl Default for AuthorComparator {
    fn default() -> Self {
        Self::with_author_map(std::iter::empty::<(String, String)>())
    }
}

impl AuthorComparator {
    /// A comparator without any abbreviation expansion.
    pub fn plain() -> Self {
        Self {
            abbreviations: HashMap::new(),
        }
    }

    /// The default abbreviations plus `extra`, which override them.
    pub fn with_author_map<I, K, V>(extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut abbreviations: HashMap<String, String> = DEFAULT_AUTHOR_MAP
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (k, v) in extra {
            abbreviations.insert(squash(k.as_ref()), v.as_ref().trim().to_lowercase());
        }
        Self { abbreviations }
    }

    /// Canonical form used for equality, hashing never sees it.
    pub fn canonical(&self, author: &str) -> String {
        let folded: String = author
            .chars()
            .map(fold_char)
            .map(|c| match c {
                '(' | ')' | '[' | ']' | ',' | ';' | ':' => ' ',
                _ => c,
            })
            .collect();
        let mut words: Vec<String> = Vec::new();
        for raw in folded.split_whitespace() {
            let lower = raw.to_lowercase();
            if lower == "and" || lower == "et" || lower == "&" {
                words.push("&".to_string());
                continue;
            }
            if lower == "ex" {
                // Only the publishing author after `ex` counts.
                words.clear();
                continue;
            }
            let key = squash(&lower);
            if key.is_empty() || key.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if let Some(full) = self.abbreviations.get(&key) {
                words.push(full.clone());
                continue;
            }
            // Initials like `J.` or `J.E.`
            if lower.ends_with('.') && key.len() <= 2 && lower.matches('.').count() >= key.len() {
                continue;
            }
            words.push(key);
        }
        while words.first().map(|w| w == "&").unwrap_or(false) {
            words.remove(0);
        }
        while words.last().map(|w| w == "&").unwrap_or(false) {
            words.pop();
        }
        words.join(" ")
    }

    pub fn equivalent(&self, a: &str, b: &str) -> bool {
        a == b || self.canonical(a) == self.canonical(b)
    }

    /// Order two optional authors. Absent authors sort first.
    pub fn compare(&self, a: Option<&str>, b: Option<&str>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => self.canonical(a).cmp(&self.canonical(b)),
        }
    }
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn fold_char(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'Ç' => 'C',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'Ñ' => 'N',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations_and_years_collapse() {
        let cmp = AuthorComparator::default();
        assert_eq!(cmp.canonical("L."), "linnaeus");
        assert_eq!(cmp.canonical("(Linnaeus, 1758)"), "linnaeus");
        assert!(cmp.equivalent("L.", "Linnaeus"));
        assert!(cmp.equivalent("Smith and Jones", "Smith & Jones"));
        assert!(!cmp.equivalent("Smith", "Jones"));
    }

    #[test]
    fn initials_and_ex_authors_are_dropped() {
        let cmp = AuthorComparator::plain();
        assert_eq!(cmp.canonical("J.E. Smith"), "smith");
        assert_eq!(cmp.canonical("Hook. ex Benth."), "benth");
        assert_eq!(cmp.canonical("Müller"), "muller");
    }

    #[test]
    fn missing_authors_sort_first() {
        let cmp = AuthorComparator::default();
        assert_eq!(cmp.compare(None, Some("L.")), Ordering::Less);
        assert_eq!(cmp.compare(Some("L."), Some("Linnaeus")), Ordering::Equal);
    }
}
