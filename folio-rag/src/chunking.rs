//! Splitting CMS documents into embeddable chunks.

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Returned chunks carry text, source and metadata but no embedding; the
/// pipeline attaches embeddings before storing them.
pub trait Chunker: Send + Sync {
    /// Split a document. Returns an empty `Vec` for blank documents.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Separators tried in order, from paragraphs down to words.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

/// Splits on paragraph breaks first, then lines, sentences and words, and
/// packs the pieces into chunks of at most `chunk_size` characters.
///
/// Each chunk after the first starts with up to `chunk_overlap` characters
/// taken from the end of the previous one, cut at a word boundary.
/// Chunk IDs are `{document_id}_{index}`; chunks inherit the document's
/// source and metadata plus a `chunk_index` entry.
#[derive(Debug, Clone)]
pub struct ParagraphChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl ParagraphChunker {
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk (at least 1)
    /// * `chunk_overlap` - characters carried over between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Break `text` into pieces no longer than `limit` characters.
fn split_pieces<'a>(text: &'a str, limit: usize, separators: &[&str]) -> Vec<&'a str> {
    if char_len(text) <= limit {
        return vec![text];
    }
    let Some((separator, rest)) = separators.split_first() else {
        return hard_split(text, limit);
    };

    let mut pieces = Vec::new();
    for segment in text.split_inclusive(separator) {
        if char_len(segment) <= limit {
            pieces.push(segment);
        } else {
            pieces.extend(split_pieces(segment, limit, rest));
        }
    }
    pieces
}

/// Split at character boundaries when no separator is left.
fn hard_split(text: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == limit {
            pieces.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Trailing part of `text`, at most `overlap` characters, starting at a word.
fn overlap_tail(text: &str, overlap: usize) -> &str {
    if overlap == 0 {
        return "";
    }
    let total = char_len(text);
    if total <= overlap {
        return text;
    }
    let cut = text.char_indices().nth(total - overlap).map_or(text.len(), |(i, _)| i);
    let tail = &text[cut..];
    if text[..cut].ends_with(char::is_whitespace) {
        return tail;
    }
    match tail.find(char::is_whitespace) {
        Some(ws) => tail[ws..].trim_start(),
        None => tail,
    }
}

impl ParagraphChunker {
    fn pack(&self, text: &str) -> Vec<String> {
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();

        for piece in split_pieces(text, self.chunk_size, SEPARATORS) {
            if !current.is_empty() && char_len(&current) + char_len(piece) > self.chunk_size {
                let finished = std::mem::take(&mut current);
                let tail = overlap_tail(finished.trim_end(), self.chunk_overlap);
                if char_len(tail) + 1 + char_len(piece) <= self.chunk_size && !tail.is_empty() {
                    current.push_str(tail);
                    current.push(' ');
                }
                chunks.push(finished);
            }
            current.push_str(piece);
        }
        chunks.push(current);

        chunks
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }
}

impl Chunker for ParagraphChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        self.pack(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), i.to_string());
                Chunk {
                    id: format!("{}_{i}", document.id),
                    text,
                    source: document.source.clone(),
                    embedding: Vec::new(),
                    metadata,
                    document_id: document.id.clone(),
                }
            })
            .collect()
    }
}
