//! Shared text utilities.
//!
//! One tokenizer serves as the reference token count for the keyword
//! extractor's chunking and the summarizer's length routing, so both see
//! the same counts for the same body.

/// Splits text into whitespace-delimited tokens.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Reference token count for length routing.
#[must_use]
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Splits text into sentences on terminal punctuation.
///
/// A terminator only ends a sentence when followed by whitespace or the
/// end of input, so decimals and tickers like `BRK.B` stay intact.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let boundary = chars.peek().map_or(true, |next| next.is_whitespace());
            if boundary {
                let sentence = current.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                current.clear();
            }
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Splits a token stream into consecutive windows of `size` tokens with
/// `overlap` tokens shared between neighbours.
///
/// With `overlap` zero the windows are disjoint. The last window may be
/// shorter than `size`.
#[must_use]
pub fn token_windows(tokens: &[String], size: usize, overlap: usize) -> Vec<Vec<String>> {
    if tokens.is_empty() || size == 0 {
        return Vec::new();
    }
    let stride = size.saturating_sub(overlap).max(1);

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(tokens.len());
        windows.push(tokens[start..end].to_vec());
        if end == tokens.len() {
            break;
        }
        start += stride;
    }
    windows
}
