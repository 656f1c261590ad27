//! Reduction of English words to their dictionary base form.

use std::collections::HashMap;
use std::fmt::Debug;

use lazy_static::lazy_static;

/// Reduces an already lowercased word to its lemma.
pub trait Lemmatizer: Send + Sync + Debug {
    /// Returns the lemma of `word`, or the word itself when no rule applies.
    fn lemmatize(&self, word: &str) -> String;

    /// Identifier recorded alongside trained models; [`lemmatizer_by_name`] maps it back.
    fn name(&self) -> &'static str;
}

/// Rebuilds a lemmatizer from the name a model was saved with.
pub fn lemmatizer_by_name(name: &str) -> Option<Box<dyn Lemmatizer>> {
    match name {
        "EnglishLemmatizer" => Some(Box::new(EnglishLemmatizer::new())),
        "IdentityLemmatizer" => Some(Box::new(IdentityLemmatizer)),
        _ => None,
    }
}

lazy_static! {
    /// Irregular plurals that suffix detachment cannot recover.
    static ref IRREGULAR_NOUNS: HashMap<&'static str, &'static str> = [
        ("men", "man"),
        ("women", "woman"),
        ("children", "child"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("mice", "mouse"),
        ("people", "person"),
        ("knives", "knife"),
        ("leaves", "leaf"),
        ("lives", "life"),
        ("wives", "wife"),
        ("halves", "half"),
        ("calves", "calf"),
        ("shelves", "shelf"),
        ("scarves", "scarf"),
        ("loaves", "loaf"),
        ("thieves", "thief"),
        ("wolves", "wolf"),
        ("hooves", "hoof"),
        ("elves", "elf"),
        ("oxen", "ox"),
        ("indices", "index"),
        ("criteria", "criterion"),
    ]
    .into_iter()
    .collect();
}

/// Rule-based noun lemmatizer for English.
///
/// Irregular forms are looked up first; regular plurals are then reduced by
/// suffix detachment (`-sses`, `-ies`, `-ches`, `-shes`, `-xes`, `-zzes`, `-s`).
/// Words shorter than four characters and words ending in `-ss`, `-us` or
/// `-is` are left alone since they are rarely plurals.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLemmatizer;

impl EnglishLemmatizer {
    pub fn new() -> Self {
        Self
    }

    fn strip(word: &str, suffix: &str, replacement: &str) -> String {
        format!("{}{}", &word[..word.len() - suffix.len()], replacement)
    }
}

impl Lemmatizer for EnglishLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        if let Some(lemma) = IRREGULAR_NOUNS.get(word) {
            return (*lemma).to_string();
        }
        if let Some(prefix) = word.strip_suffix("women") {
            return format!("{}woman", prefix);
        }
        if word.chars().count() < 4 || !word.chars().all(char::is_alphabetic) {
            return word.to_string();
        }

        if word.ends_with("sses") {
            Self::strip(word, "es", "")
        } else if word.ends_with("ies") && word.len() > 4 {
            Self::strip(word, "ies", "y")
        } else if word.ends_with("ches") || word.ends_with("shes") || word.ends_with("xes") || word.ends_with("zzes") {
            Self::strip(word, "es", "")
        } else if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            word.to_string()
        } else if word.ends_with('s') {
            Self::strip(word, "s", "")
        } else {
            word.to_string()
        }
    }

    fn name(&self) -> &'static str {
        "EnglishLemmatizer"
    }
}

/// Leaves every word as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLemmatizer;

impl Lemmatizer for IdentityLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        word.to_string()
    }

    fn name(&self) -> &'static str {
        "IdentityLemmatizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        let lemmatizer = EnglishLemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("bags"), "bag");
        assert_eq!(lemmatizer.lemmatize("shoes"), "shoe");
        assert_eq!(lemmatizer.lemmatize("dresses"), "dress");
        assert_eq!(lemmatizer.lemmatize("accessories"), "accessory");
        assert_eq!(lemmatizer.lemmatize("watches"), "watch");
        assert_eq!(lemmatizer.lemmatize("boxes"), "box");
    }

    #[test]
    fn test_irregular_plurals() {
        let lemmatizer = EnglishLemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("women"), "woman");
        assert_eq!(lemmatizer.lemmatize("sportswomen"), "sportswoman");
        assert_eq!(lemmatizer.lemmatize("knives"), "knife");
        assert_eq!(lemmatizer.lemmatize("feet"), "foot");
    }

    #[test]
    fn test_words_left_alone() {
        let lemmatizer = EnglishLemmatizer::new();
        for word in ["dress", "bus", "tennis", "bag", "51", "tote"] {
            assert_eq!(lemmatizer.lemmatize(word), word);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        for lemmatizer in [Box::new(EnglishLemmatizer::new()) as Box<dyn Lemmatizer>, Box::new(IdentityLemmatizer)] {
            let rebuilt = lemmatizer_by_name(lemmatizer.name()).unwrap();
            assert_eq!(rebuilt.name(), lemmatizer.name());
            assert_eq!(rebuilt.lemmatize("bags"), lemmatizer.lemmatize("bags"));
        }
        assert_eq!(IdentityLemmatizer.lemmatize("bags"), "bags");
        assert!(lemmatizer_by_name("PorterStemmer").is_none());
    }
}
