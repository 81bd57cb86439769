//! Athlete name canonicalisation.
//!
//! Scraped tables, rosters and call-ups all spell names differently
//! ("Pérez", "PEREZ", "Sergio Perez PER"). [`NameNormalizer::normalize`]
//! folds them onto one lookup key. An empty key means "no match" and must
//! never be treated as a wildcard.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::domain::Discipline;

/// How much of a name identifies an athlete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameKeyMode {
    /// Surnames are unique on the grid.
    Surname,
    /// Surnames collide (siblings), the full name is required.
    FullName,
}

impl NameKeyMode {
    pub fn default_for(discipline: Discipline) -> Self {
        match discipline {
            Discipline::Formula => NameKeyMode::Surname,
            Discipline::Moto => NameKeyMode::FullName,
        }
    }
}

/// Lowercase, strip diacritics, drop punctuation and collapse whitespace.
pub fn fold(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        match c {
            'ß' => out.push_str("ss"),
            'æ' | 'Æ' => out.push_str("ae"),
            'ø' | 'Ø' => out.push('o'),
            'ł' | 'Ł' => out.push('l'),
            'đ' | 'Đ' => out.push('d'),
            '\'' | '’' | '`' => {}
            c if c.is_alphanumeric() => out.extend(c.to_lowercase()),
            _ => out.push(' '),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Timing screens append a three-letter code: "Max Verstappen VER".
fn strip_timing_code(raw: &str) -> &str {
    let trimmed = raw.trim_end();
    match trimmed.rsplit_once(char::is_whitespace) {
        Some((head, code))
            if code.len() == 3
                && code.chars().all(|c| c.is_ascii_uppercase())
                && head.chars().any(|c| c.is_lowercase()) =>
        {
            head
        }
        _ => trimmed,
    }
}

/// Maps raw athlete names to canonical lookup keys.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    mode: NameKeyMode,
    /// Folded misspelling -> folded canonical spelling.
    corrections: HashMap<String, String>,
}

impl NameNormalizer {
    pub fn new(mode: NameKeyMode) -> Self {
        Self {
            mode,
            corrections: HashMap::new(),
        }
    }

    pub fn for_discipline(discipline: Discipline) -> Self {
        Self::new(NameKeyMode::default_for(discipline))
    }

    /// Add known scraped misspellings. Both sides are folded, so the table
    /// can be written with accents and any casing.
    pub fn with_corrections<I, K, V>(mut self, corrections: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (wrong, right) in corrections {
            let wrong = fold(wrong.as_ref());
            let right = fold(right.as_ref());
            if !wrong.is_empty() && !right.is_empty() {
                self.corrections.insert(wrong, right);
            }
        }
        self
    }

    pub fn mode(&self) -> NameKeyMode {
        self.mode
    }

    fn correct(&self, folded: String) -> String {
        match self.corrections.get(&folded) {
            Some(right) => right.clone(),
            None => folded,
        }
    }

    /// Canonical key for `raw`, or an empty string when nothing usable is left.
    pub fn normalize(&self, raw: &str) -> String {
        let folded = self.correct(fold(strip_timing_code(raw)));
        if folded.is_empty() {
            return folded;
        }
        let key = match self.mode {
            NameKeyMode::FullName => folded,
            NameKeyMode::Surname => folded
                .rsplit(' ')
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        self.correct(key)
    }

    /// `normalize` for an optional cell; `None` and blanks give the empty key.
    pub fn normalize_opt(&self, raw: Option<&str>) -> String {
        raw.map(|r| self.normalize(r)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_diacritics_and_punctuation() {
        assert_eq!(fold("  Sergio   Pérez "), "sergio perez");
        assert_eq!(fold("Nico HÜLKENBERG"), "nico hulkenberg");
        assert_eq!(fold("Aleix Espargaró"), "aleix espargaro");
        assert_eq!(fold("Fabio Di-Giannantonio"), "fabio di giannantonio");
        assert_eq!(fold("Pato O'Ward"), "pato oward");
        assert_eq!(fold("Kevin Magnussen, DEN"), "kevin magnussen den");
        assert_eq!(fold("Bjørn Dæhlie"), "bjorn daehlie");
    }

    #[test]
    fn surname_mode_keys_on_last_token() {
        let n = NameNormalizer::new(NameKeyMode::Surname);
        assert_eq!(n.normalize("Max Verstappen"), "verstappen");
        assert_eq!(n.normalize("VERSTAPPEN"), "verstappen");
        assert_eq!(n.normalize("Max Verstappen VER"), "verstappen");
        assert_eq!(n.normalize("Sergio Pérez"), n.normalize("PEREZ"));
    }

    #[test]
    fn full_name_mode_separates_siblings() {
        let n = NameNormalizer::new(NameKeyMode::FullName);
        assert_eq!(n.normalize("Marc Márquez"), "marc marquez");
        assert_ne!(n.normalize("Marc Marquez"), n.normalize("Alex Marquez"));
    }

    #[test]
    fn corrections_apply_before_keying() {
        let n = NameNormalizer::new(NameKeyMode::Surname)
            .with_corrections([("Max Verstapen", "Max Verstappen"), ("Zhou Guanyu", "Guanyu Zhou")]);
        assert_eq!(n.normalize("max verstapen"), "verstappen");
        assert_eq!(n.normalize("ZHOU Guanyu"), "zhou");
    }

    #[test]
    fn surname_level_corrections_apply_to_key() {
        let n = NameNormalizer::new(NameKeyMode::Surname).with_corrections([("hulkenburg", "hulkenberg")]);
        assert_eq!(n.normalize("Nico Hulkenburg"), "hulkenberg");
    }

    #[test]
    fn unparseable_input_is_empty_key() {
        let n = NameNormalizer::new(NameKeyMode::FullName);
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize(" -- "), "");
        assert_eq!(n.normalize_opt(None), "");
    }
}
