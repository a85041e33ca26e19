//! Edit-script computation between two token sequences.
//!
//! A longest-common-subsequence matcher with a junk predicate: junk elements
//! (whitespace tokens) never seed a match, so pure re-indentation does not
//! break up the alignment of the surrounding code. Junk that happens to agree
//! on both sides is still absorbed at the edges of a match. No off-the-shelf
//! diff crate exposes these junk semantics, hence the explicit implementation.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

/// One step of an edit script over two token sequences.
///
/// Ranges are token index ranges into the respective input slice. Applying
/// the ops in order visits every index of both sequences exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Equal { a: Range<usize>, b: Range<usize> },
    Delete { a: Range<usize> },
    Insert { b: Range<usize> },
    Replace { a: Range<usize>, b: Range<usize> },
}

#[derive(Debug, Clone, Copy)]
struct MatchBlock {
    a: usize,
    b: usize,
    len: usize,
}

/// Compute an edit script between `a` and `b`.
///
/// `is_junk` marks elements that must not seed matches. The result covers
/// both sequences completely and in order.
pub fn edit_script<K, J>(a: &[K], b: &[K], is_junk: J) -> Vec<EditOp>
where
    K: Eq + Hash,
    J: Fn(&K) -> bool,
{
    let mut b2j: HashMap<&K, Vec<usize>> = HashMap::new();
    for (j, key) in b.iter().enumerate() {
        if !is_junk(key) {
            b2j.entry(key).or_default().push(j);
        }
    }

    let blocks = matching_blocks(a, b, &b2j, &is_junk);

    let mut ops = Vec::new();
    let (mut ai, mut bj) = (0, 0);
    for block in blocks {
        if ai < block.a && bj < block.b {
            ops.push(EditOp::Replace {
                a: ai..block.a,
                b: bj..block.b,
            });
        } else if ai < block.a {
            ops.push(EditOp::Delete { a: ai..block.a });
        } else if bj < block.b {
            ops.push(EditOp::Insert { b: bj..block.b });
        }
        if block.len > 0 {
            ops.push(EditOp::Equal {
                a: block.a..block.a + block.len,
                b: block.b..block.b + block.len,
            });
        }
        ai = block.a + block.len;
        bj = block.b + block.len;
    }
    ops
}

/// Find all maximal matching blocks, sorted and coalesced, with a trailing
/// zero-length sentinel at the sequence ends.
fn matching_blocks<K, J>(
    a: &[K],
    b: &[K],
    b2j: &HashMap<&K, Vec<usize>>,
    is_junk: &J,
) -> Vec<MatchBlock>
where
    K: Eq + Hash,
    J: Fn(&K) -> bool,
{
    let mut queue = vec![(0, a.len(), 0, b.len())];
    let mut found = Vec::new();

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let m = longest_match(a, b, b2j, is_junk, alo, ahi, blo, bhi);
        if m.len == 0 {
            continue;
        }
        if alo < m.a && blo < m.b {
            queue.push((alo, m.a, blo, m.b));
        }
        if m.a + m.len < ahi && m.b + m.len < bhi {
            queue.push((m.a + m.len, ahi, m.b + m.len, bhi));
        }
        found.push(m);
    }

    found.sort_by_key(|m| (m.a, m.b));

    // Coalesce blocks that ended up adjacent on both sides
    let mut blocks: Vec<MatchBlock> = Vec::new();
    for m in found {
        match blocks.last_mut() {
            Some(last) if last.a + last.len == m.a && last.b + last.len == m.b => {
                last.len += m.len;
            }
            _ => blocks.push(m),
        }
    }

    blocks.push(MatchBlock {
        a: a.len(),
        b: b.len(),
        len: 0,
    });
    blocks
}

/// Longest matching block within `a[alo..ahi]` and `b[blo..bhi]`.
///
/// The dynamic-programming pass only chains through non-junk elements (junk
/// never appears in `b2j`); agreeing junk is then absorbed at both edges so
/// the final block can still cover identical whitespace.
fn longest_match<K, J>(
    a: &[K],
    b: &[K],
    b2j: &HashMap<&K, Vec<usize>>,
    is_junk: &J,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> MatchBlock
where
    K: Eq + Hash,
    J: Fn(&K) -> bool,
{
    let mut besti = alo;
    let mut bestj = blo;
    let mut bestsize = 0;
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for i in alo..ahi {
        let mut newj2len = HashMap::new();
        if let Some(indices) = b2j.get(&a[i]) {
            for &j in indices {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let run = match j.checked_sub(1).and_then(|p| j2len.get(&p)) {
                    Some(len) => len + 1,
                    None => 1,
                };
                newj2len.insert(j, run);
                if run > bestsize {
                    besti = i + 1 - run;
                    bestj = j + 1 - run;
                    bestsize = run;
                }
            }
        }
        j2len = newj2len;
    }

    // Extend over agreeing non-junk first, then agreeing junk
    while besti > alo && bestj > blo && !is_junk(&b[bestj - 1]) && a[besti - 1] == b[bestj - 1] {
        besti -= 1;
        bestj -= 1;
        bestsize += 1;
    }
    while besti + bestsize < ahi
        && bestj + bestsize < bhi
        && !is_junk(&b[bestj + bestsize])
        && a[besti + bestsize] == b[bestj + bestsize]
    {
        bestsize += 1;
    }
    while besti > alo && bestj > blo && is_junk(&b[bestj - 1]) && a[besti - 1] == b[bestj - 1] {
        besti -= 1;
        bestj -= 1;
        bestsize += 1;
    }
    while besti + bestsize < ahi
        && bestj + bestsize < bhi
        && is_junk(&b[bestj + bestsize])
        && a[besti + bestsize] == b[bestj + bestsize]
    {
        bestsize += 1;
    }

    MatchBlock {
        a: besti,
        b: bestj,
        len: bestsize,
    }
}
