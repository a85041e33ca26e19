//! Detection of lines that moved rather than changed.
//!
//! Works over the whole classified stream at once: uniqueness of a line body
//! is judged across the entire diff (moves often cross file boundaries in a
//! combined diff), then each unique removed/added pair seeds a group that
//! grows greedily through matching neighbors. Two-pass by design: collect
//! first, annotate second, so no decision is made on partial information.

use std::collections::HashMap;

use crate::classify::{DiffLine, LineKind};

/// A set of lines judged to have been relocated rather than edited.
///
/// Index lists point into the classified line vector and never overlap with
/// another group's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveGroup {
    pub id: u32,
    pub old_indices: Vec<usize>,
    pub new_indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occurrence {
    Unique(usize),
    Many,
}

fn record(map: &mut HashMap<String, Occurrence>, body: &str, idx: usize) {
    map.entry(body.to_string())
        .and_modify(|o| *o = Occurrence::Many)
        .or_insert(Occurrence::Unique(idx));
}

/// Find move groups and tag every absorbed line with its group id.
pub fn detect_moves(lines: &mut [DiffLine]) -> Vec<MoveGroup> {
    // Pass 1: collect. File ids keep expansion from leaking across files,
    // since line numbers restart there.
    let mut file_ids = vec![0u32; lines.len()];
    let mut file_id = 0u32;
    for (idx, line) in lines.iter().enumerate() {
        if matches!(line.kind, LineKind::FileHeader { .. }) {
            file_id += 1;
        }
        file_ids[idx] = file_id;
    }

    let bodies: Vec<String> = lines.iter().map(|l| l.text.trim().to_string()).collect();

    let mut old_uniques: HashMap<String, Occurrence> = HashMap::new();
    let mut new_uniques: HashMap<String, Occurrence> = HashMap::new();
    // (file, line number) -> stream index, covering context lines too so
    // expansion can travel through them
    let mut old_by_num: HashMap<(u32, u32), usize> = HashMap::new();
    let mut new_by_num: HashMap<(u32, u32), usize> = HashMap::new();

    for (idx, line) in lines.iter().enumerate() {
        match line.kind {
            LineKind::Removed => record(&mut old_uniques, &bodies[idx], idx),
            LineKind::Added => record(&mut new_uniques, &bodies[idx], idx),
            _ => {}
        }
        if let Some(n) = line.old_num {
            old_by_num.entry((file_ids[idx], n)).or_insert(idx);
        }
        if let Some(n) = line.new_num {
            new_by_num.entry((file_ids[idx], n)).or_insert(idx);
        }
    }

    // Pass 2: anchor and expand, in first-appearance order of the added side.
    let mut groups = Vec::new();
    for idx in 0..lines.len() {
        if lines[idx].kind != LineKind::Added {
            continue;
        }
        let body = bodies[idx].as_str();
        if new_uniques.get(body) != Some(&Occurrence::Unique(idx)) {
            continue;
        }
        let Some(&Occurrence::Unique(old_idx)) = old_uniques.get(body) else {
            continue;
        };
        if lines[idx].move_group.is_some() || lines[old_idx].move_group.is_some() {
            continue;
        }

        let id = groups.len() as u32;
        let mut group = MoveGroup {
            id,
            old_indices: vec![old_idx],
            new_indices: vec![idx],
        };
        lines[old_idx].move_group = Some(id);
        lines[idx].move_group = Some(id);

        let (Some(anchor_old), Some(anchor_new)) = (lines[old_idx].old_num, lines[idx].new_num)
        else {
            groups.push(group);
            continue;
        };
        let old_file = file_ids[old_idx];
        let new_file = file_ids[idx];

        let matches = |o: u32, n: u32, lines: &[DiffLine]| -> Option<(usize, usize)> {
            let &oi = old_by_num.get(&(old_file, o))?;
            let &ni = new_by_num.get(&(new_file, n))?;
            if oi != ni && (lines[oi].move_group.is_some() || lines[ni].move_group.is_some()) {
                return None;
            }
            if oi == ni && lines[oi].move_group.is_some() {
                return None;
            }
            (bodies[oi] == bodies[ni]).then_some((oi, ni))
        };

        // Grow backward, then forward, absorbing matching neighbors even
        // when they are context lines or not globally unique.
        let (mut o, mut n) = (anchor_old, anchor_new);
        while o > 0 && n > 0 {
            let Some((oi, ni)) = matches(o - 1, n - 1, lines) else {
                break;
            };
            lines[oi].move_group = Some(id);
            lines[ni].move_group = Some(id);
            group.old_indices.push(oi);
            group.new_indices.push(ni);
            o -= 1;
            n -= 1;
        }
        let (mut o, mut n) = (anchor_old, anchor_new);
        loop {
            let Some((oi, ni)) = matches(o + 1, n + 1, lines) else {
                break;
            };
            lines[oi].move_group = Some(id);
            lines[ni].move_group = Some(id);
            group.old_indices.push(oi);
            group.new_indices.push(ni);
            o += 1;
            n += 1;
        }

        group.old_indices.sort_unstable();
        group.new_indices.sort_unstable();
        groups.push(group);
    }

    groups
}
