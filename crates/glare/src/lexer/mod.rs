//! # Lexer
//!
//! Scannerless tokenization: there is no separate tokenizer pass. At each
//! parse step the [`Dispatcher`] asks the automaton which terminals are
//! admissible in the current state, runs only their [`Recognizer`]s at the
//! current position, and picks the winner(s).
//!
//! Layout terminals (whitespace, comments) are skipped before every
//! attempt and never reach the parser.

mod dispatcher;
mod recognizer;
mod token;

pub use dispatcher::{Dispatcher, Lexed, Tokens};
pub use recognizer::{CarriedState, Recognize, Recognizer, RecognizerMatch};
pub use token::Token;
