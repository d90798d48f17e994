use std::collections::HashSet;
use std::sync::OnceLock;

static STOP_WORDS: OnceLock<HashSet<String>> = OnceLock::new();

/// Words that carry no search intent in a listing query on top of the
/// regular English stop words.
const DOMAIN_STOP_WORDS: &[&str] = &[
    "property",
    "properties",
    "home",
    "homes",
    "listing",
    "listings",
    "looking",
    "want",
    "need",
    "buy",
    "buying",
    "purchase",
    "sale",
    "sell",
    "rent",
    "find",
    "show",
    "search",
    "available",
    "price",
    "priced",
    "budget",
    "range",
    "rupees",
    "inr",
    "near",
    "around",
    "between",
    "under",
    "below",
    "above",
    "upto",
    "within",
];

fn get_stop_words() -> &'static HashSet<String> {
    STOP_WORDS.get_or_init(|| {
        stop_words::get(stop_words::LANGUAGE::English)
            .into_iter()
            .map(|x| x.to_string())
            .chain(DOMAIN_STOP_WORDS.iter().map(|x| x.to_string()))
            .collect()
    })
}

pub fn is_stop_word(word: &str) -> bool {
    get_stop_words().contains(word)
}

/// A character filter receives the original text and can transform it by adding,
/// removing, or changing characters before it is tokenized.
pub trait CharacterFilter: Send + Sync {
    fn filter(&self, text: String) -> String;
}

/// Replaces everything that is not alphanumeric or whitespace with a space, so
/// `"sea-view,"` and `"₹"` never glue onto neighbouring words.
#[derive(Debug, Default)]
pub struct SymbolCharFilter;

impl CharacterFilter for SymbolCharFilter {
    fn filter(&self, text: String) -> String {
        text.chars()
            .map(|c| {
                if c.is_alphanumeric() || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect()
    }
}

/// A tokenizer receives a stream of characters, breaks it up into individual tokens (usually individual words),
/// and outputs a stream of tokens.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: String) -> Vec<String>;
}

pub struct WhiteSpaceTokenizer;

impl Tokenizer for WhiteSpaceTokenizer {
    fn tokenize(&self, text: String) -> Vec<String> {
        text.split_whitespace()
            .map(|w| w.to_string())
            .collect::<Vec<String>>()
    }
}

/// A token filter receives the token stream and may add, remove, or change tokens.
pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken>;
}

pub struct StopWordTokenFilter;

impl TokenFilter for StopWordTokenFilter {
    fn filter(&self, mut tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens.retain(|w| !is_stop_word(&w.term));
        tokens
    }
}

/// Strips punctuation from tokens and filters out tokens that become empty or are too short
pub struct PunctuationStripFilter {
    min_length: usize,
}

impl PunctuationStripFilter {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Default for PunctuationStripFilter {
    fn default() -> Self {
        Self { min_length: 3 }
    }
}

impl TokenFilter for PunctuationStripFilter {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens
            .into_iter()
            .filter_map(|mut token| {
                let trimmed: String = token
                    .term
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_string();

                if trimmed.chars().count() >= self.min_length
                    && trimmed.chars().any(|c| c.is_alphanumeric())
                {
                    token.term = trimmed;
                    Some(token)
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Filters out tokens that are purely numeric (like "123", "45.67", etc.)
pub struct NumericTokenFilter;

impl TokenFilter for NumericTokenFilter {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens
            .into_iter()
            .filter(|token| token.term.chars().any(|c| c.is_alphabetic()))
            .collect()
    }
}

/// Keeps the first occurrence of every term.
pub struct DedupTokenFilter;

impl TokenFilter for DedupTokenFilter {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken> {
        let mut seen = HashSet::new();
        tokens
            .into_iter()
            .filter(|token| seen.insert(token.term.clone()))
            .collect()
    }
}

/// Pure text analysis pipeline - no async, no I/O, just text transformations
pub struct TextAnalyzer {
    char_filters: Vec<Box<dyn CharacterFilter>>,
    tokenizer: Box<dyn Tokenizer>,
    token_filters: Vec<Box<dyn TokenFilter>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextToken {
    pub term: String,
    pub pos: usize,
}

impl TextAnalyzer {
    pub fn new(
        char_filters: Vec<Box<dyn CharacterFilter>>,
        tokenizer: Box<dyn Tokenizer>,
        token_filters: Vec<Box<dyn TokenFilter>>,
    ) -> Self {
        Self {
            char_filters,
            tokenizer,
            token_filters,
        }
    }

    /// The pipeline used for leftover query keywords: tokens of three or more
    /// characters, no numbers, no stop words, no repeats. Expects lower-cased
    /// text, as produced by the query parser.
    pub fn keywords() -> Self {
        Self::new(
            vec![Box::new(SymbolCharFilter)],
            Box::new(WhiteSpaceTokenizer),
            vec![
                Box::new(PunctuationStripFilter::default()),
                Box::new(NumericTokenFilter),
                Box::new(StopWordTokenFilter),
                Box::new(DedupTokenFilter),
            ],
        )
    }

    pub fn char_filter(&self, mut content: String) -> String {
        for filter in self.char_filters.iter() {
            content = filter.filter(content);
        }
        content
    }

    pub fn tokenize(&self, content: String) -> Vec<TextToken> {
        let tokens = self.tokenizer.tokenize(content);
        tokens
            .iter()
            .enumerate()
            .map(|(idx, tok)| TextToken {
                term: tok.clone(),
                pos: idx,
            })
            .collect()
    }

    pub fn token_filter(&self, mut tokens: Vec<TextToken>) -> Vec<TextToken> {
        for filter in self.token_filters.iter() {
            tokens = filter.filter(tokens);
        }
        tokens
    }

    /// Analyzes raw content and returns a list of tokens
    pub fn analyze(&self, raw_content: String) -> Vec<TextToken> {
        let content = self.char_filter(raw_content);
        let tokens = self.tokenize(content);
        self.token_filter(tokens)
    }
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        Self::keywords()
    }
}
