//! Line classification for unified diff streams.
//!
//! A prefix-driven state machine assigns every input line exactly one
//! [`LineKind`]. Classification is total: a line that matches no pattern
//! becomes [`LineKind::Other`] and passes through untouched, so malformed
//! input degrades to plain text instead of failing.

use std::borrow::Cow;

/// Starting line numbers captured from a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkNums {
    pub old_start: u32,
    pub new_start: u32,
}

/// The closed set of line kinds. Every consumer matches exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `diff --git a/old b/new`
    FileHeader { old_path: String, new_path: String },
    /// `@@ -a,b +c,d @@ section`; `nums` is `None` when the ranges are
    /// unparsable, in which case location reformatting is skipped
    HunkHeader {
        nums: Option<HunkNums>,
        section: String,
    },
    /// Body line prefixed with `+`
    Added,
    /// Body line prefixed with `-`
    Removed,
    /// Body line prefixed with a space
    Context,
    /// `commit <hash>` log framing
    Commit,
    /// Mode/rename/copy/similarity metadata
    Meta,
    /// `index`, `---` and `+++` lines: omitted in normal mode, dimmed in
    /// interactive mode
    Dropped,
    /// Anything else (log messages, binary notices, blank lines)
    Other,
}

impl LineKind {
    /// Short tag used by the debug dump.
    pub fn name(&self) -> &'static str {
        match self {
            LineKind::FileHeader { .. } => "file",
            LineKind::HunkHeader { .. } => "hunk",
            LineKind::Added => "add",
            LineKind::Removed => "rem",
            LineKind::Context => "ctx",
            LineKind::Commit => "commit",
            LineKind::Meta => "meta",
            LineKind::Dropped => "dropped",
            LineKind::Other => "other",
        }
    }
}

/// One classified input line.
///
/// `raw` is the line exactly as read (it may carry pre-existing color
/// sequences, which passthrough kinds preserve). `text` is the
/// marker-stripped body for Added/Removed/Context lines and the
/// color-stripped line otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub raw: String,
    pub text: String,
    pub kind: LineKind,
    pub old_num: Option<u32>,
    pub new_num: Option<u32>,
    pub move_group: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Preamble,
    FileHeaderRegion,
    HunkHeader,
    InHunk,
}

const META_PREFIXES: &[&str] = &[
    "old mode",
    "new mode",
    "deleted file mode",
    "new file mode",
    "copy from",
    "copy to",
    "rename from",
    "rename to",
    "similarity index",
    "dissimilarity index",
];

/// Stateful line classifier. Feed lines in stream order.
#[derive(Debug)]
pub struct Classifier {
    state: State,
    old_num: u32,
    new_num: u32,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Classifier {
            state: State::Preamble,
            old_num: 0,
            new_num: 0,
        }
    }

    /// Classify the next raw line. Never fails.
    pub fn classify(&mut self, raw: &str) -> DiffLine {
        let plain = strip_sgr(raw);
        let mut old_num = None;
        let mut new_num = None;

        let kind = if plain.is_empty() {
            LineKind::Other
        } else if let Some(rest) = plain.strip_prefix("diff --git ") {
            self.state = State::FileHeaderRegion;
            let (old_path, new_path) = parse_git_paths(rest);
            LineKind::FileHeader { old_path, new_path }
        } else if is_commit_line(&plain) {
            self.state = State::Preamble;
            LineKind::Commit
        } else if self.state == State::Preamble {
            // Nothing below engages until a file header has been seen, so
            // headerless hunk-like text (prose, plain `diff -u` output)
            // degrades to passthrough
            LineKind::Other
        } else if let Some((nums, section)) = parse_hunk_header(&plain) {
            if let Some(h) = nums {
                // Zero starts (file creation/deletion) keep the running counter
                if h.old_start > 0 {
                    self.old_num = h.old_start;
                }
                if h.new_start > 0 {
                    self.new_num = h.new_start;
                }
            }
            self.state = State::HunkHeader;
            LineKind::HunkHeader { nums, section }
        } else if plain.starts_with("---") || plain.starts_with("+++") || plain.starts_with("index ")
        {
            // Must outrank the one-character body markers
            LineKind::Dropped
        } else if META_PREFIXES.iter().any(|p| plain.starts_with(p)) {
            LineKind::Meta
        } else if matches!(self.state, State::HunkHeader | State::InHunk) {
            if plain.starts_with('+') {
                self.state = State::InHunk;
                new_num = Some(self.new_num);
                self.new_num += 1;
                LineKind::Added
            } else if plain.starts_with('-') {
                self.state = State::InHunk;
                old_num = Some(self.old_num);
                self.old_num += 1;
                LineKind::Removed
            } else if plain.starts_with(' ') {
                self.state = State::InHunk;
                old_num = Some(self.old_num);
                new_num = Some(self.new_num);
                self.old_num += 1;
                self.new_num += 1;
                LineKind::Context
            } else {
                LineKind::Other
            }
        } else {
            LineKind::Other
        };

        let text = match kind {
            LineKind::Added | LineKind::Removed | LineKind::Context => plain[1..].to_string(),
            _ => plain.into_owned(),
        };

        DiffLine {
            raw: raw.to_string(),
            text,
            kind,
            old_num,
            new_num,
            move_group: None,
        }
    }
}

/// Classify every line of the input in stream order.
pub fn classify_all(input: &str) -> Vec<DiffLine> {
    let mut classifier = Classifier::new();
    input.lines().map(|raw| classifier.classify(raw)).collect()
}

/// Remove SGR color sequences (`ESC [ ... m`), leaving everything else.
pub fn strip_sgr(line: &str) -> Cow<'_, str> {
    if !line.contains('\u{1b}') {
        return Cow::Borrowed(line);
    }
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(pos) = rest.find('\u{1b}') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(params) = after.strip_prefix('[') {
            let end = params
                .find(|c: char| !c.is_ascii_digit() && c != ';')
                .unwrap_or(params.len());
            if params[end..].starts_with('m') {
                rest = &params[end + 1..];
                continue;
            }
        }
        // Not an SGR sequence: keep the escape character
        out.push('\u{1b}');
        rest = after;
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn is_commit_line(plain: &str) -> bool {
    match plain.strip_prefix("commit ") {
        Some(rest) => {
            rest.len() >= 40
                && rest.as_bytes()[..40]
                    .iter()
                    .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
        }
        None => false,
    }
}

/// Split the remainder of a `diff --git` line into old and new paths,
/// eating the `a/`/`b/` prefixes when present (they are absent under
/// `--no-index`).
fn parse_git_paths(rest: &str) -> (String, String) {
    let (old, new) = match rest.split_once(" b/") {
        Some(parts) => parts,
        None => rest.rsplit_once(' ').unwrap_or((rest, rest)),
    };
    let old = old.strip_prefix("a/").unwrap_or(old);
    (old.to_string(), new.to_string())
}

/// Recognize `@@ <ranges> @@ <section>`. Returns `None` when the line is not
/// a hunk header at all; a recognized header with bad range fields yields
/// `Some((None, section))`.
fn parse_hunk_header(plain: &str) -> Option<(Option<HunkNums>, String)> {
    let rest = plain.strip_prefix("@@ ")?;
    let end = rest.find(" @@")?;
    let section = rest[end + 3..]
        .strip_prefix(' ')
        .unwrap_or(&rest[end + 3..])
        .to_string();
    Some((parse_hunk_ranges(&rest[..end]), section))
}

fn parse_hunk_ranges(ranges: &str) -> Option<HunkNums> {
    let (old_part, new_part) = ranges.split_once(' ')?;
    let old_start = parse_range_start(old_part.strip_prefix('-')?)?;
    let new_start = parse_range_start(new_part.strip_prefix('+')?)?;
    Some(HunkNums {
        old_start,
        new_start,
    })
}

/// Start of a range like `136,0` or `137`.
fn parse_range_start(range: &str) -> Option<u32> {
    range.split(',').next()?.parse().ok()
}
