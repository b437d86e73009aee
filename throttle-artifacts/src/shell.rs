//! POSIX shell quoting for generated scripts and privileged command sequences.

use std::path::Path;

/// Quote `word` so `/bin/sh` reads it back as exactly one argument.
///
/// Words made only of characters that are never special to the shell are
/// returned unchanged, which keeps the generated script readable.
pub fn quote(word: &str) -> String {
    if !word.is_empty() && word.chars().all(is_safe) {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}

pub fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

/// Quote every word and join with single spaces.
pub fn join<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| quote(w.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '@' | '%' | '+' | '=' | ',')
}
