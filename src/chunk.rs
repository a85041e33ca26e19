//! Grouping of changed lines into chunks and token-level highlighting.
//!
//! A chunk is a maximal run of Added/Removed lines; any context, metadata or
//! header line closes it. Chunks are the unit handed to the token aligner,
//! whose edit script is folded back into per-line byte ranges here.

use std::collections::HashMap;
use std::ops::Range;

use crate::align::{EditOp, edit_script};
use crate::classify::{DiffLine, LineKind};
use crate::token::{self, Token, TokenKind};

/// Indices of a chunk's lines within the classified stream. Removed lines
/// keep their relative order independently of interleaved Added lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub removed: Vec<usize>,
    pub added: Vec<usize>,
}

/// Byte ranges to foreground-highlight, keyed by stream line index.
pub type LineHighlights = HashMap<usize, Vec<Range<usize>>>;

/// Partition the stream into chunks in stream order.
pub fn build_chunks(lines: &[DiffLine]) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = Chunk {
        removed: Vec::new(),
        added: Vec::new(),
    };

    for (idx, line) in lines.iter().enumerate() {
        match line.kind {
            LineKind::Removed => current.removed.push(idx),
            LineKind::Added => current.added.push(idx),
            _ => {
                if !current.removed.is_empty() || !current.added.is_empty() {
                    chunks.push(std::mem::replace(
                        &mut current,
                        Chunk {
                            removed: Vec::new(),
                            added: Vec::new(),
                        },
                    ));
                }
            }
        }
    }
    if !current.removed.is_empty() || !current.added.is_empty() {
        chunks.push(current);
    }
    chunks
}

struct Placed<'a> {
    line: usize,
    token: Token<'a>,
}

fn side_tokens<'a>(lines: &'a [DiffLine], indices: &[usize]) -> Vec<Placed<'a>> {
    let mut placed = Vec::new();
    for &li in indices {
        for tok in token::tokenize(&lines[li].text) {
            placed.push(Placed { line: li, token: tok });
        }
    }
    placed
}

fn mark(placed: &[Placed<'_>], range: Range<usize>, map: &mut LineHighlights) {
    for p in &placed[range] {
        match p.token.kind {
            // Whitespace-only changes stay visually quiet; the newline
            // marker has no visible extent
            TokenKind::Space | TokenKind::Newline => {}
            TokenKind::Word | TokenKind::Punct => {
                map.entry(p.line).or_default().push(p.token.range());
            }
        }
    }
}

/// Compute token-level highlight ranges for every chunk.
///
/// One-sided chunks (pure insertions or deletions) get no spans: the
/// line-level coloring already says everything.
pub fn token_highlights(lines: &[DiffLine], chunks: &[Chunk]) -> LineHighlights {
    let mut map = LineHighlights::new();

    for chunk in chunks {
        if chunk.removed.is_empty() || chunk.added.is_empty() {
            continue;
        }

        let a = side_tokens(lines, &chunk.removed);
        let b = side_tokens(lines, &chunk.added);
        let a_keys: Vec<&str> = a.iter().map(|p| p.token.text).collect();
        let b_keys: Vec<&str> = b.iter().map(|p| p.token.text).collect();

        for op in edit_script(&a_keys, &b_keys, |t| token::is_junk(t)) {
            match op {
                EditOp::Equal { .. } => {}
                EditOp::Delete { a: ra } => mark(&a, ra, &mut map),
                EditOp::Insert { b: rb } => mark(&b, rb, &mut map),
                EditOp::Replace { a: ra, b: rb } => {
                    mark(&a, ra, &mut map);
                    mark(&b, rb, &mut map);
                }
            }
        }
    }

    for ranges in map.values_mut() {
        coalesce(ranges);
    }
    map.retain(|_, ranges| !ranges.is_empty());
    map
}

/// Sort and merge touching or overlapping ranges.
fn coalesce(ranges: &mut Vec<Range<usize>>) {
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for r in ranges.drain(..) {
        match merged.last_mut() {
            Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
            _ => merged.push(r),
        }
    }
    *ranges = merged;
}
