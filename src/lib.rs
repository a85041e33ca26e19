//! diff-tint recolors unified diffs for the terminal.
//!
//! The pipeline is a pure, single-pass-per-diff batch computation: the whole
//! input is classified first (movement detection needs global knowledge of
//! line uniqueness), then rendered line by line. Everything degrades
//! gracefully: unrecognized input passes through verbatim and only I/O can
//! fail.

use error_set::error_set;

pub mod align;
pub mod chunk;
pub mod classify;
pub mod moved;
pub mod render;
pub mod token;

pub use classify::{DiffLine, LineKind, classify_all};
pub use render::Palette;

error_set! {
    /// Top-level error for diff-tint operations. The transformation itself
    /// never fails; only the surrounding I/O can.
    DiffTintError := {
        #[display("Failed to read input: {message}")]
        ReadFailed { message: String },
        #[display("Failed to write output: {message}")]
        WriteFailed { message: String },
    }
}

/// Operating mode, selected by flag or environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Full recoloring; metadata lines the reader does not need are omitted
    #[default]
    Normal,
    /// Like Normal, but dims instead of omitting: the consuming tool slices
    /// output by absolute line position, so the line count must match the
    /// input exactly
    Interactive,
    /// Copy input to output unchanged
    Passthrough,
    /// Print each line's classified kind and a literal rendering
    Debug,
}

/// Invocation options threaded through the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub mode: Mode,
    pub palette: Palette,
}

/// Transform one diff stream into its colored rendering.
///
/// # Examples
/// ```
/// use diff_tint::{Options, filter_diff};
///
/// let input = "diff --git a/src/a.py b/src/a.py\n@@ -10,3 +10,4 @@\n";
/// let output = filter_diff(input, &Options::default());
/// assert!(output.contains("src/a.py:10:"));
/// ```
pub fn filter_diff(input: &str, options: &Options) -> String {
    match options.mode {
        Mode::Passthrough => input.to_string(),
        Mode::Debug => debug_dump(input),
        Mode::Normal | Mode::Interactive => {
            let interactive = options.mode == Mode::Interactive;
            let mut lines = classify::classify_all(input);
            moved::detect_moves(&mut lines);
            let chunks = chunk::build_chunks(&lines);
            let highlights = chunk::token_highlights(&lines, &chunks);

            let mut renderer = render::Renderer::new(&options.palette, interactive);
            let mut out = String::new();
            for (idx, line) in lines.iter().enumerate() {
                let spans = highlights.get(&idx).map(Vec::as_slice);
                if let Some(rendered) = renderer.render_line(line, spans) {
                    out.push_str(&rendered);
                    out.push('\n');
                }
            }
            out
        }
    }
}

/// One `kind: "literal"` line per input line.
fn debug_dump(input: &str) -> String {
    let mut out = String::new();
    for line in classify::classify_all(input) {
        out.push_str(line.kind.name());
        out.push_str(": ");
        out.push_str(&format!("{:?}\n", classify::strip_sgr(&line.raw)));
    }
    out
}
