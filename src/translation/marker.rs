//! Tagged-line codec that carries origin indices through a translator.
//!
//! Wire shape of one unit:
//!
//! ```text
//! §<index>\n<text>\n
//! ```
//!
//! Grammar used by [`parse`]:
//! - a header is a line whose first character is `§`, followed by optional
//!   spaces, one or more ASCII digits, and optional trailing whitespace
//! - a body is every line after a header up to the next header or the end of
//!   the stream, minus exactly one trailing line break; that break is `\r\n`
//!   only when the header itself ended in `\r\n`, otherwise a bare `\n`
//! - text before the first header is discarded

/// Delimiter opening every header line.
pub const DELIMITER: char = '§';

/// Wrap one unit of text.
pub fn wrap(index: usize, text: &str) -> String {
    format!("{}{}\n{}\n", DELIMITER, index, text)
}

/// Length in bytes of `wrap(index, text)` without allocating it.
pub fn wrapped_len(index: usize, text: &str) -> usize {
    DELIMITER.len_utf8() + digits(index) + 1 + text.len() + 1
}

/// Recover `(index, text)` pairs in stream order.
pub fn parse(stream: &str) -> Vec<(usize, String)> {
    let mut units = Vec::new();
    let mut current: Option<Pending> = None;

    for line in stream.split_inclusive('\n') {
        if let Some(index) = header_index(line) {
            if let Some(pending) = current.take() {
                units.push(pending.finish());
            }
            current = Some(Pending {
                index,
                body: String::new(),
                crlf: line.ends_with("\r\n"),
            });
        } else if let Some(pending) = current.as_mut() {
            pending.body.push_str(line);
        }
    }
    if let Some(pending) = current {
        units.push(pending.finish());
    }
    units
}

struct Pending {
    index: usize,
    body: String,
    crlf: bool,
}

impl Pending {
    /// Drop the separator that closes the body, keeping any `\r` that is
    /// part of the text.
    fn finish(mut self) -> (usize, String) {
        if self.body.ends_with('\n') {
            self.body.pop();
            if self.crlf && self.body.ends_with('\r') {
                self.body.pop();
            }
        }
        (self.index, self.body)
    }
}

fn header_index(line: &str) -> Option<usize> {
    let rest = line.strip_prefix(DELIMITER)?;
    let digits = rest.trim_start_matches(' ').trim_end();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn digits(mut n: usize) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}
