//! repo::merge
//!
//! Line-based text diff and merge.
//!
//! # Two-way
//!
//! Without a common base every region where the sides differ becomes a
//! conflict hunk.
//!
//! # Three-way
//!
//! With a base, both sides are aligned against it. Regions changed on one
//! side only take that side; regions changed identically on both sides are
//! taken once; the rest become conflict hunks.
//!
//! # Markers
//!
//! ```text
//! <<<<<<< HEAD
//! ours
//! ||||||| BASE      (diff3 style only)
//! base
//! =======
//! theirs
//! >>>>>>> MERGE_HEAD
//! ```

use similar::{capture_diff_slices, Algorithm, DiffTag, TextDiff};

use crate::core::config::ConflictStyle;

pub const MARKER_OURS: &str = "<<<<<<< HEAD";
pub const MARKER_BASE: &str = "||||||| BASE";
pub const MARKER_SEPARATOR: &str = "=======";
pub const MARKER_THEIRS: &str = ">>>>>>> MERGE_HEAD";

/// Lines of context around each unified diff hunk.
const CONTEXT_RADIUS: usize = 3;

/// Result of merging one file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMerge {
    /// Merged bytes, including conflict markers if any.
    pub text: Vec<u8>,
    /// Number of conflict hunks.
    pub conflicts: usize,
}

impl TextMerge {
    pub fn is_clean(&self) -> bool {
        self.conflicts == 0
    }
}

/// Split content into lines, each keeping its `\n` terminator.
///
/// Lines are raw bytes; content that is not UTF-8 merges unchanged.
fn split_lines(content: &[u8]) -> Vec<&[u8]> {
    if content.is_empty() {
        return Vec::new();
    }
    content.split_inclusive(|&b| b == b'\n').collect()
}

/// Terminate the last line if needed so a marker can follow.
fn end_line(out: &mut Vec<u8>) {
    if out.last().is_some_and(|&b| b != b'\n') {
        out.push(b'\n');
    }
}

fn push_chunk(out: &mut Vec<u8>, lines: &[&[u8]]) {
    for line in lines {
        out.extend_from_slice(line);
    }
}

fn push_marker(out: &mut Vec<u8>, marker: &str) {
    end_line(out);
    out.extend_from_slice(marker.as_bytes());
    out.push(b'\n');
}

fn push_conflict(out: &mut Vec<u8>, ours: &[&[u8]], base: Option<&[&[u8]]>, theirs: &[&[u8]]) {
    push_marker(out, MARKER_OURS);
    push_chunk(out, ours);
    if let Some(base) = base {
        push_marker(out, MARKER_BASE);
        push_chunk(out, base);
    }
    push_marker(out, MARKER_SEPARATOR);
    push_chunk(out, theirs);
    push_marker(out, MARKER_THEIRS);
}

/// Unified diff between two texts, one output line per element.
///
/// Identical texts produce no lines.
pub fn unified_diff(from: &str, to: &str, from_label: &str, to_label: &str) -> Vec<String> {
    let diff = TextDiff::from_lines(from, to);
    let text = diff
        .unified_diff()
        .context_radius(CONTEXT_RADIUS)
        .header(from_label, to_label)
        .to_string();
    text.lines().map(str::to_string).collect()
}

/// Merge two contents without a common base.
///
/// ```
/// use mgit::repo::merge::merge_two_way;
///
/// let merged = merge_two_way(b"a\nb\nc\n", b"a\nB\nc\n");
/// assert_eq!(merged.conflicts, 1);
/// assert_eq!(
///     merged.text,
///     b"a\n<<<<<<< HEAD\nb\n=======\nB\n>>>>>>> MERGE_HEAD\nc\n"
/// );
/// ```
pub fn merge_two_way(ours: &[u8], theirs: &[u8]) -> TextMerge {
    let ours_lines = split_lines(ours);
    let theirs_lines = split_lines(theirs);
    let ops = capture_diff_slices(Algorithm::Myers, &ours_lines, &theirs_lines);

    let mut text = Vec::new();
    let mut conflicts = 0;
    // Start of the pending differing region in each side.
    let mut hunk: Option<(usize, usize)> = None;

    for op in &ops {
        let (tag, old, new) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                if let Some((o, t)) = hunk.take() {
                    push_conflict(&mut text, &ours_lines[o..old.start], None, &theirs_lines[t..new.start]);
                    conflicts += 1;
                }
                push_chunk(&mut text, &ours_lines[old]);
            }
            DiffTag::Delete | DiffTag::Insert | DiffTag::Replace => {
                hunk.get_or_insert((old.start, new.start));
            }
        }
    }
    if let Some((o, t)) = hunk {
        push_conflict(&mut text, &ours_lines[o..], None, &theirs_lines[t..]);
        conflicts += 1;
    }

    TextMerge { text, conflicts }
}

/// For each line of `base`, the index of the matching line in `other`.
fn match_lines(base: &[&[u8]], other: &[&[u8]]) -> Vec<Option<usize>> {
    let mut matches = vec![None; base.len()];
    for op in capture_diff_slices(Algorithm::Myers, base, other) {
        let (tag, old, new) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            for (b, o) in old.zip(new) {
                matches[b] = Some(o);
            }
        }
    }
    matches
}

/// Merge two contents that both descend from `base`.
///
/// ```
/// use mgit::core::config::ConflictStyle;
/// use mgit::repo::merge::merge_three_way;
///
/// let base = b"one\ntwo\nthree\n";
/// let ours = b"ONE\ntwo\nthree\n";
/// let theirs = b"one\ntwo\nTHREE\n";
/// let merged = merge_three_way(base, ours, theirs, ConflictStyle::Merge);
/// assert!(merged.is_clean());
/// assert_eq!(merged.text, b"ONE\ntwo\nTHREE\n");
/// ```
pub fn merge_three_way(base: &[u8], ours: &[u8], theirs: &[u8], style: ConflictStyle) -> TextMerge {
    let base_lines = split_lines(base);
    let ours_lines = split_lines(ours);
    let theirs_lines = split_lines(theirs);

    let to_ours = match_lines(&base_lines, &ours_lines);
    let to_theirs = match_lines(&base_lines, &theirs_lines);

    let mut text = Vec::new();
    let mut conflicts = 0;
    let (mut b, mut o, mut t) = (0, 0, 0);

    loop {
        // Next base line kept unchanged by both sides.
        let stable = (b..base_lines.len()).find_map(|i| Some((i, to_ours[i]?, to_theirs[i]?)));

        let (end_b, end_o, end_t) = match stable {
            Some((i, io, it)) if i == b && io == o && it == t => {
                text.extend_from_slice(base_lines[i]);
                b += 1;
                o += 1;
                t += 1;
                continue;
            }
            Some(next) => next,
            None => (base_lines.len(), ours_lines.len(), theirs_lines.len()),
        };

        let chunk_base = &base_lines[b..end_b];
        let chunk_ours = &ours_lines[o..end_o];
        let chunk_theirs = &theirs_lines[t..end_t];

        if chunk_ours == chunk_base {
            push_chunk(&mut text, chunk_theirs);
        } else if chunk_theirs == chunk_base || chunk_ours == chunk_theirs {
            push_chunk(&mut text, chunk_ours);
        } else {
            let base_section = match style {
                ConflictStyle::Diff3 => Some(chunk_base),
                ConflictStyle::Merge => None,
            };
            push_conflict(&mut text, chunk_ours, base_section, chunk_theirs);
            conflicts += 1;
        }

        if stable.is_none() {
            break;
        }
        b = end_b;
        o = end_o;
        t = end_t;
    }

    TextMerge { text, conflicts }
}
