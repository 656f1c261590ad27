use std::collections::{BTreeMap, BTreeSet, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::lemmatizer::{lemmatizer_by_name, EnglishLemmatizer, Lemmatizer};

/// Bag-of-words representation of one product: every present feature maps to `true`.
pub type FeatureMapping = BTreeMap<String, bool>;

/// A category name as it appears in the corpus.
pub type Label = String;

/// Training data: one feature mapping and its label per corpus row, in file order.
pub type FeatureSet = Vec<(FeatureMapping, Label)>;

/// English stopwords (the NLTK `english` list).
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// ASCII punctuation characters.
pub const ASCII_PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

lazy_static! {
    /// Runs of word characters, or runs of anything that is neither a word character nor whitespace.
    static ref WORD_PUNCT: Regex = Regex::new(r"\w+|[^\w\s]+").expect("valid tokenizer pattern");
}

/// Extracts features from product text for training and classification.
pub trait Featurizer: Send + Sync {
    /// Builds the feature mapping for one product.
    fn featurize(&self, name: &str, description: Option<&str>, keywords: Option<&str>) -> FeatureMapping;

    /// Identifier recorded in build metadata.
    fn name(&self) -> &'static str;
}

/// Wraps a keyword token so it can never collide with a body token.
///
/// Body tokens come out of the tokenizer as either all word characters or
/// all non-word characters, so a key mixing both (like `KEYWORD(bag)`) is
/// only ever produced here.
pub fn keyword_feature(token: &str) -> String {
    format!("KEYWORD({})", token)
}

/// The parts of a [`ProductFeatures`] that change its output, saved with
/// every model so inference featurizes exactly as training did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturizerSettings {
    pub stopwords: BTreeSet<String>,
    pub punctuation: BTreeSet<char>,
    /// [`Lemmatizer::name`] of the lemmatizer in use
    pub lemmatizer: String,
}

/// Bag-of-words featurizer for product records.
///
/// Text is split into word and punctuation runs, lowercased and lemmatized.
/// Tokens made only of punctuation, and stopwords, are dropped. Name and
/// description share one bag; keywords get their own namespace.
///
/// ```
/// use apparel::ProductFeatures;
/// use apparel::classifier::Featurizer;
///
/// let features = ProductFeatures::new().featurize("Leather Tote Bags", None, Some("handbag"));
/// assert!(features.contains_key("bag"));
/// assert!(features.contains_key("KEYWORD(handbag)"));
/// ```
#[derive(Debug)]
pub struct ProductFeatures {
    stopwords: HashSet<String>,
    punctuation: HashSet<char>,
    lemmatizer: Box<dyn Lemmatizer>,
}

impl Default for ProductFeatures {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductFeatures {
    /// Creates a featurizer with the English stopword list and ASCII punctuation
    pub fn new() -> Self {
        Self {
            stopwords: ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            punctuation: ASCII_PUNCTUATION.chars().collect(),
            lemmatizer: Box::new(EnglishLemmatizer::new()),
        }
    }

    /// Replaces the stopword list
    pub fn with_stopwords<I, S>(mut self, stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stopwords = stopwords.into_iter().map(|w| w.into().to_lowercase()).collect();
        self
    }

    /// Replaces the set of characters treated as punctuation
    pub fn with_punctuation(mut self, punctuation: &str) -> Self {
        self.punctuation = punctuation.chars().collect();
        self
    }

    pub fn with_lemmatizer(mut self, lemmatizer: Box<dyn Lemmatizer>) -> Self {
        self.lemmatizer = lemmatizer;
        self
    }

    /// Lowercases a word and reduces it to its lemma
    pub fn normalize(&self, word: &str) -> String {
        self.lemmatizer.lemmatize(&word.to_lowercase())
    }

    /// Splits text into normalized tokens, skipping punctuation and stopwords.
    ///
    /// A word is dropped if either its lowercased form or its lemma is a stopword.
    pub fn tokenize<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        WORD_PUNCT.find_iter(text).filter_map(move |m| {
            let lowered = m.as_str().to_lowercase();
            if self.is_punctuation(&lowered) || self.stopwords.contains(&lowered) {
                return None;
            }
            let token = self.lemmatizer.lemmatize(&lowered);
            if self.is_punctuation(&token) || self.stopwords.contains(&token) {
                return None;
            }
            Some(token)
        })
    }

    /// Snapshot of the stopwords, punctuation and lemmatizer in use
    pub fn settings(&self) -> FeaturizerSettings {
        FeaturizerSettings {
            stopwords: self.stopwords.iter().cloned().collect(),
            punctuation: self.punctuation.iter().copied().collect(),
            lemmatizer: self.lemmatizer.name().to_string(),
        }
    }

    /// Rebuilds the featurizer a model was trained with.
    ///
    /// # Errors
    /// - `ModelLoad` if the lemmatizer name is not one this crate provides
    pub fn from_settings(settings: &FeaturizerSettings) -> Result<Self, ClassifierError> {
        let lemmatizer = lemmatizer_by_name(&settings.lemmatizer)
            .ok_or_else(|| ClassifierError::ModelLoad(format!("Unknown lemmatizer '{}'", settings.lemmatizer)))?;
        Ok(Self {
            stopwords: settings.stopwords.iter().cloned().collect(),
            punctuation: settings.punctuation.iter().copied().collect(),
            lemmatizer,
        })
    }

    fn is_punctuation(&self, token: &str) -> bool {
        !token.is_empty() && token.chars().all(|c| self.punctuation.contains(&c))
    }
}

impl Featurizer for ProductFeatures {
    fn featurize(&self, name: &str, description: Option<&str>, keywords: Option<&str>) -> FeatureMapping {
        let mut tokens: BTreeSet<String> = self.tokenize(name).collect();
        if let Some(description) = description {
            tokens.extend(self.tokenize(description));
        }

        let keywords: BTreeSet<String> = keywords
            .filter(|k| !k.is_empty())
            .map(|k| self.tokenize(k).collect())
            .unwrap_or_default();

        let mut features = FeatureMapping::new();
        for token in tokens {
            features.insert(token, true);
        }
        for keyword in keywords {
            features.insert(keyword_feature(&keyword), true);
        }
        features
    }

    fn name(&self) -> &'static str {
        "ProductFeatures"
    }
}
