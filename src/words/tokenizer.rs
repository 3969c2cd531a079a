//! Tweet Tokenizer
//!
//! Turns one raw document into the words that get counted:
//!
//! 1. `@handle ` mentions are removed.
//! 2. The text is segmented into words and stopwords of the configured language are dropped.
//! 3. What is left is lowercased and split on whitespace.
//! 4. Tokens outside 3..=16 characters, or on the denylist, are discarded.
//!
//! Pure and deterministic: the output depends only on the text, the language and the denylist.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

pub const MIN_TOKEN_CHARS: usize = 3;
pub const MAX_TOKEN_CHARS: usize = 16;

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\S+?\s").expect("mention pattern is valid"));

// Letters, combining marks, hyphen, underscore and apostrophe. Anything else separates words.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{Mc}\p{Mn}\-_']+").expect("word pattern is valid"));

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "alone", "along",
    "already", "also", "although", "always", "am", "among", "an", "and", "another", "any",
    "anyone", "anything", "are", "aren't", "around", "as", "at", "back", "be", "became",
    "because", "become", "been", "before", "being", "below", "between", "both", "but", "by",
    "can", "can't", "cannot", "could", "couldn't", "did", "didn't", "do", "does", "doesn't",
    "doing", "don't", "down", "during", "each", "either", "else", "enough", "even", "ever",
    "every", "few", "for", "from", "further", "get", "gets", "got", "had", "hadn't", "has",
    "hasn't", "have", "haven't", "having", "he", "he'd", "he'll", "he's", "her", "here",
    "here's", "hers", "herself", "him", "himself", "his", "how", "how's", "however", "i",
    "i'd", "i'll", "i'm", "i've", "if", "in", "into", "is", "isn't", "it", "it's", "its",
    "itself", "just", "let's", "like", "many", "may", "me", "might", "more", "most", "much",
    "must", "mustn't", "my", "myself", "never", "no", "nor", "not", "now", "of", "off", "often",
    "on", "once", "only", "or", "other", "others", "ought", "our", "ours", "ourselves", "out",
    "over", "own", "per", "perhaps", "rather", "really", "same", "shall", "shan't", "she",
    "she'd", "she'll", "she's", "should", "shouldn't", "since", "so", "some", "something",
    "still", "such", "than", "that", "that's", "the", "their", "theirs", "them", "themselves",
    "then", "there", "there's", "these", "they", "they'd", "they'll", "they're", "they've",
    "this", "those", "though", "through", "thus", "to", "too", "under", "until", "up", "upon",
    "us", "very", "via", "was", "wasn't", "we", "we'd", "we'll", "we're", "we've", "well",
    "were", "weren't", "what", "what's", "when", "when's", "where", "where's", "whether",
    "which", "while", "who", "who's", "whom", "whose", "why", "why's", "will", "with",
    "within", "without", "won't", "would", "wouldn't", "yet", "you", "you'd", "you'll",
    "you're", "you've", "your", "yours", "yourself", "yourselves",
];

/// Stopword list for a language code. Unknown languages get no stopword pass.
pub fn stopwords_for(language: &str) -> &'static [&'static str] {
    match language {
        "en" => ENGLISH_STOPWORDS,
        _ => &[],
    }
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: HashSet<&'static str>,
    denylist: HashSet<String>,
}

impl Tokenizer {
    pub fn new<I, S>(language: &str, denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stopwords: stopwords_for(language).iter().copied().collect(),
            denylist: denylist
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let without_mentions = MENTION.replace_all(text, "");
        let cleaned = self.remove_stopwords(&without_mentions);

        cleaned
            .to_lowercase()
            .split_whitespace()
            .filter(|token| self.keep(token))
            .map(|token| token.to_string())
            .collect()
    }

    fn remove_stopwords(&self, text: &str) -> String {
        WORD.find_iter(text)
            .map(|m| m.as_str())
            .filter(|word| !self.stopwords.contains(word.to_lowercase().as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn keep(&self, token: &str) -> bool {
        let chars = token.chars().count();
        !token.is_empty()
            && (MIN_TOKEN_CHARS..=MAX_TOKEN_CHARS).contains(&chars)
            && !self.denylist.contains(token)
    }
}
