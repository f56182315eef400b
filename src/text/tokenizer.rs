//! Tokenizer: raw text → lower-cased candidate words.
//!
//! Pipeline:
//! 1. Optionally strip markup (`scraper` HTML fragment parse, `<script>` and
//!    `<style>` bodies dropped)
//! 2. Optionally rejoin words hyphenated across a line wrap (`infor-\nmation`)
//! 3. NFKC-normalize and lower-case
//! 4. Split at every non-alphanumeric character
//!
//! The prepared text is owned by a [`TokenStream`], so the token sequence can
//! be walked lazily any number of times.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use unicode_normalization::UnicodeNormalization;

/// A letter, a hyphen, a line break with optional surrounding blanks, a letter.
static RE_WRAP_HYPHEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{Alphabetic})-[ \t]*\r?\n[ \t]*(\p{Alphabetic})").unwrap());

/// Preparation steps applied before splitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Treat the input as HTML/XHTML and keep only its text nodes.
    pub strip_markup: bool,
    /// Rejoin words broken by a hyphen at a line end (paginated text).
    pub rejoin_hyphenated: bool,
}

impl TokenizerOptions {
    pub const PLAIN: Self = Self {
        strip_markup: false,
        rejoin_hyphenated: false,
    };

    pub const MARKUP: Self = Self {
        strip_markup: true,
        rejoin_hyphenated: false,
    };

    pub const PAGINATED: Self = Self {
        strip_markup: false,
        rejoin_hyphenated: true,
    };
}

/// Splits text into candidate words.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer {
    options: TokenizerOptions,
}

impl Tokenizer {
    pub fn new(options: TokenizerOptions) -> Self {
        Self { options }
    }

    /// Prepare `text` and return a restartable token stream over it.
    pub fn tokens(&self, text: &str) -> TokenStream {
        let mut prepared = if self.options.strip_markup {
            strip_markup(text)
        } else {
            text.to_string()
        };
        if self.options.rejoin_hyphenated {
            prepared = rejoin_hyphenated(&prepared);
        }
        let folded: String = prepared.nfkc().collect::<String>().to_lowercase();
        TokenStream { text: folded }
    }
}

/// Normalized text ready to be split. Each call to [`TokenStream::iter`]
/// starts a fresh pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream {
    text: String,
}

impl TokenStream {
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a str;
    type IntoIter = Box<dyn Iterator<Item = &'a str> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Keep only the text nodes of an HTML fragment, separated by spaces.
pub fn strip_markup(html: &str) -> String {
    // The tree builder drops table tags outside a table and merges the text
    // around them, so every tag boundary gets a separator first.
    let spaced = html.replace('<', " <");
    let fragment = Html::parse_fragment(&spaced);
    let mut out = String::with_capacity(html.len());
    for node in fragment.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| matches!(e.name(), "script" | "style")))
            .unwrap_or(false);
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

/// Rejoin words split by a hyphen at a line wrap.
pub fn rejoin_hyphenated(text: &str) -> String {
    RE_WRAP_HYPHEN.replace_all(text, "$1$2").into_owned()
}
