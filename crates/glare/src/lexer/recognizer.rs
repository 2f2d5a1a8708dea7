//! Terminal recognizers.
//!
//! A recognizer answers one question: does its terminal match at `pos`, and
//! how many bytes does it consume? Literal and pattern recognizers are pure;
//! custom recognizers additionally receive and may replace an opaque
//! [`CarriedState`] that travels with each parse head.

use compact_str::CompactString;
use regex::Regex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque state threaded through custom recognizers.
///
/// Each parse head carries its own value, so forks never observe each
/// other's updates.
#[derive(Clone, Default)]
pub struct CarriedState(Option<Arc<dyn Any + Send + Sync>>);

impl CarriedState {
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Arc::new(value)))
    }

    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|v| v.downcast_ref::<T>())
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for CarriedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("CarriedState(..)"),
            None => f.write_str("CarriedState(None)"),
        }
    }
}

/// A successful match.
#[derive(Debug, Clone)]
pub struct RecognizerMatch {
    /// Length in bytes of the matched text.
    pub len: usize,
    /// Replacement carried state; `None` keeps the current one.
    pub state: Option<CarriedState>,
}

impl RecognizerMatch {
    #[must_use]
    pub const fn new(len: usize) -> Self {
        Self { len, state: None }
    }

    #[must_use]
    pub fn with_state(mut self, state: CarriedState) -> Self {
        self.state = Some(state);
        self
    }
}

/// Caller-supplied recognition logic, for tokens a regular expression
/// cannot describe (nested comments, indentation, here-docs, ...).
pub trait Recognize: Send + Sync {
    fn recognize(&self, input: &str, pos: usize, state: &CarriedState) -> Option<RecognizerMatch>;
}

impl<F> Recognize for F
where
    F: Fn(&str, usize, &CarriedState) -> Option<RecognizerMatch> + Send + Sync,
{
    fn recognize(&self, input: &str, pos: usize, state: &CarriedState) -> Option<RecognizerMatch> {
        self(input, pos, state)
    }
}

#[derive(Clone)]
pub enum Recognizer {
    /// `EOF` and `EMPTY`; never matches.
    Reserved,
    Literal {
        text: CompactString,
        ignore_case: bool,
        /// Requires a non-word character (or end of input) after the match.
        keyword: bool,
    },
    Pattern {
        source: CompactString,
        regex: Regex,
    },
    Custom(Arc<dyn Recognize>),
}

impl Recognizer {
    #[must_use]
    pub fn literal(text: impl Into<CompactString>) -> Self {
        Self::Literal {
            text: text.into(),
            ignore_case: false,
            keyword: false,
        }
    }

    /// Compiles `pattern` anchored at the match position.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!(r"\A(?:{pattern})"))?;
        Ok(Self::Pattern {
            source: pattern.into(),
            regex,
        })
    }

    #[must_use]
    pub fn custom(recognizer: impl Recognize + 'static) -> Self {
        Self::Custom(Arc::new(recognizer))
    }

    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    /// Attempts a match at `pos`.
    ///
    /// Zero-length matches are reported as they are; the dispatcher decides
    /// whether they count.
    #[must_use]
    pub fn recognize(&self, input: &str, pos: usize, state: &CarriedState) -> Option<RecognizerMatch> {
        let rest = input.get(pos..)?;
        match self {
            Self::Reserved => None,
            Self::Literal {
                text,
                ignore_case,
                keyword,
            } => {
                let len = if *ignore_case {
                    caseless_prefix_len(rest, text)?
                } else if rest.starts_with(text.as_str()) {
                    text.len()
                } else {
                    return None;
                };
                if *keyword && rest[len..].chars().next().is_some_and(is_word_char) {
                    return None;
                }
                Some(RecognizerMatch::new(len))
            }
            Self::Pattern { regex, .. } => regex.find(rest).map(|m| RecognizerMatch::new(m.end())),
            Self::Custom(custom) => custom
                .recognize(input, pos, state)
                .filter(|m| rest.is_char_boundary(m.len)),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte length of the prefix of `haystack` equal to `needle` ignoring case.
fn caseless_prefix_len(haystack: &str, needle: &str) -> Option<usize> {
    let mut consumed = 0;
    let mut rest = haystack.chars();
    for expected in needle.chars() {
        let actual = rest.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        consumed += actual.len_utf8();
    }
    Some(consumed)
}

impl fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserved => f.write_str("Reserved"),
            Self::Literal {
                text,
                ignore_case,
                keyword,
            } => f
                .debug_struct("Literal")
                .field("text", text)
                .field("ignore_case", ignore_case)
                .field("keyword", keyword)
                .finish(),
            Self::Pattern { source, .. } => f.debug_tuple("Pattern").field(source).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl fmt::Display for Recognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserved => f.write_str("<reserved>"),
            Self::Literal { text, .. } => write!(f, "'{text}'"),
            Self::Pattern { source, .. } => write!(f, "/{source}/"),
            Self::Custom(_) => f.write_str("<custom>"),
        }
    }
}
