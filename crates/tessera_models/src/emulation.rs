//! Streaming emulation for backends without native streaming.

use tessera_core::StreamChunk;
use tessera_interface::ChunkStream;

/// Whitespace-delimited pieces carried by one emulated chunk.
const WORDS_PER_CHUNK: usize = 8;

/// Split a complete answer into chunks whose concatenation is the answer.
///
/// # Examples
///
/// ```
/// use tessera_models::split_for_emulation;
///
/// let text = "one two three four five six seven eight nine ten";
/// let chunks = split_for_emulation(text);
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks.concat(), text);
/// ```
pub fn split_for_emulation(text: &str) -> Vec<String> {
    let pieces: Vec<&str> = text.split_inclusive(char::is_whitespace).collect();
    pieces
        .chunks(WORDS_PER_CHUNK)
        .map(|group| group.concat())
        .collect()
}

/// Stream a buffered answer as a sequence of chunks.
pub fn emulated_stream(text: String) -> ChunkStream {
    let chunks: Vec<_> = split_for_emulation(&text)
        .into_iter()
        .map(|chunk| Ok(StreamChunk::new(chunk)))
        .collect();
    Box::pin(futures_util::stream::iter(chunks))
}
