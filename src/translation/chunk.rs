//! Size-bounded batching of wrapped entries.

use crate::comments::ExtractedText;
use crate::translation::marker;

/// One translator call's worth of wrapped entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position among the chunks of one request.
    pub index: usize,
    /// Concatenated wrapped entries.
    pub body: String,
    /// Origin indices in the order they were appended.
    pub origins: Vec<usize>,
}

/// Pack `entries` into chunks of at most `max_bytes`.
///
/// Entries are appended to the open chunk while the result stays within the
/// bound. An entry that alone exceeds the bound gets a chunk of its own and is
/// never split. No chunk is ever empty.
pub fn chunk(entries: &[ExtractedText], max_bytes: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut body = String::new();
    let mut origins = Vec::new();

    for entry in entries {
        let wrapped_len = marker::wrapped_len(entry.index, &entry.text);
        if !origins.is_empty() && body.len() + wrapped_len > max_bytes {
            chunks.push(Chunk {
                index: chunks.len(),
                body: std::mem::take(&mut body),
                origins: std::mem::take(&mut origins),
            });
        }
        body.push_str(&marker::wrap(entry.index, &entry.text));
        origins.push(entry.index);
    }
    if !origins.is_empty() {
        chunks.push(Chunk {
            index: chunks.len(),
            body,
            origins,
        });
    }
    chunks
}
