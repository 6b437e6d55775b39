//! Text chunking for oracle payloads and display-line splitting.
//!
//! Both directions are pure and total:
//!
//! - [`chunk`] cuts a string into fixed-size character windows so that a single
//!   oracle call never receives more than `limit` characters.
//! - [`to_lines`] turns a translated string back into display lines, cleaning
//!   up whitespace and dropping lines that end up empty.

/// Default character budget for a single oracle call.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Split `text` into consecutive chunks of exactly `limit` characters.
///
/// Boundaries are fixed offsets counted in `char`s, not words, so the last
/// chunk may be shorter. Concatenating the result in order reproduces `text`.
/// A `limit` of zero is treated as one.
pub fn chunk(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == limit {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split translated text into display lines.
///
/// Lines are separated by `\n` or `\r\n`. Each line has tabs and form feeds
/// turned into spaces, whitespace runs collapsed to a single space, and is
/// trimmed. Lines that are empty after cleaning are dropped.
pub fn to_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .collect()
}

fn clean_line(line: &str) -> String {
    line.replace(['\t', '\u{000C}'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
